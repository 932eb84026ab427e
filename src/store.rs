//! Persistence collaborator contracts.
//!
//! The crate does not wrap a database driver; these traits are the
//! find/insert/update/delete surface the handlers depend on, over the
//! `contacts` and `users` collections. `memory::MemoryStore` is the
//! reference implementation backing the server binary and the test suite.

use anyhow::Result;

use crate::contacts::{Contact, ContactFields};
use crate::identity::{FederatedProfile, NewLocalUser, User};

pub mod memory;

pub trait ContactStore: Send + Sync {
    fn list(&self) -> Result<Vec<Contact>>;
    fn find_by_id(&self, id: &str) -> Result<Option<Contact>>;
    /// Assigns the identifier and returns the created record.
    fn insert(&self, fields: ContactFields) -> Result<Contact>;
    /// Returns the updated record; `None` when the id does not resolve.
    /// The identifier itself never changes.
    fn update(&self, id: &str, fields: ContactFields) -> Result<Option<Contact>>;
    /// Returns whether a record was removed.
    fn delete(&self, id: &str) -> Result<bool>;
}

pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Returns `None` when the email uniqueness constraint rejects the
    /// insert.
    fn insert_local(&self, user: NewLocalUser) -> Result<Option<User>>;
    /// Lookup-or-create by federation provider id, as one atomic step:
    /// concurrent calls for the same new provider id yield one record.
    fn find_or_create_federated(&self, profile: FederatedProfile) -> Result<User>;
}
