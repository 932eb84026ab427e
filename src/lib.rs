//! rolodex: a contacts-management HTTP API.
//!
//! CRUD over a `contacts` collection behind session-based authentication,
//! with both local email/password login and Google OAuth sign-in. The
//! persistence and session stores are collaborator contracts (`store`,
//! `identity::session`); a memory-backed reference implementation drives
//! the server binary and the test suite.

pub mod config;
pub mod contacts;
pub mod error;
pub mod identity;
pub mod server;
pub mod store;
pub mod util;
