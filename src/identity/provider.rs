//! Auth session operations: register, login, logout, OAuth sign-in, and the
//! serialize/deserialize bridge between a session token and a principal.
//! The session stores only the principal identifier; the full record is
//! looked up again on every resolution.

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::password::{hash_password, verify_password};
use crate::identity::principal::{FederatedProfile, NewLocalUser, User};
use crate::identity::session::{SessionStore, SessionToken};
use crate::store::UserStore;
use crate::util::valid_email;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// One error for unknown email and for hash mismatch.
fn credentials_error() -> AppError {
    AppError::authentication("invalid_credentials", "invalid email or password")
}

/// Create a local user. Does not log the caller in.
pub fn register(users: &dyn UserStore, req: &RegisterRequest) -> AppResult<User> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation(
            "missing_fields",
            "username, email and password are required",
        ));
    }
    if !valid_email(email) {
        return Err(AppError::validation("invalid_email", "invalid email address"));
    }
    let password_hash = hash_password(&req.password)?;
    let created = users.insert_local(NewLocalUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
    })?;
    match created {
        Some(user) => {
            info!("auth.register user={}", user.id);
            Ok(user)
        }
        None => Err(AppError::validation("email_taken", "email already registered")),
    }
}

/// Verify credentials and issue a session referencing the principal id.
pub fn login(
    users: &dyn UserStore,
    sessions: &dyn SessionStore,
    req: &LoginRequest,
) -> AppResult<(User, SessionToken)> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("missing_fields", "email and password are required"));
    }
    let Some(user) = users.find_by_email(email)? else {
        return Err(credentials_error());
    };
    // A federated-only record has no hash; it fails the same way.
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(credentials_error());
    };
    if !verify_password(hash, &req.password) {
        return Err(credentials_error());
    }
    let token = sessions.issue(&user.id)?;
    info!("auth.login user={}", user.id);
    Ok((user, token))
}

/// Destroy the current session. The caller clears its cookie regardless;
/// a store that cannot delete surfaces as a server fault.
pub fn logout(sessions: &dyn SessionStore, token: Option<&str>) -> AppResult<()> {
    let Some(token) = token else { return Ok(()) };
    sessions
        .destroy(token)
        .map_err(|e| AppError::upstream("session_delete_failed", e.to_string()))?;
    Ok(())
}

/// Lookup-or-create by federation provider id, then issue a session. The
/// store performs the lookup-or-create as one atomic step, so two
/// concurrent callbacks for the same new provider id yield one record.
pub fn oauth_sign_in(
    users: &dyn UserStore,
    sessions: &dyn SessionStore,
    profile: FederatedProfile,
) -> AppResult<(User, SessionToken)> {
    let user = users.find_or_create_federated(profile)?;
    let token = sessions.issue(&user.id)?;
    info!("auth.oauth user={}", user.id);
    Ok((user, token))
}

/// Deserialize a session token back to a full principal. A token whose
/// principal no longer exists invalidates the session instead of failing
/// the pipeline.
pub fn resolve_session(
    users: &dyn UserStore,
    sessions: &dyn SessionStore,
    token: &str,
) -> AppResult<User> {
    let Some(user_id) = sessions.resolve(token)? else {
        return Err(AppError::authorization(
            "not_authenticated",
            "you must be logged in to access this resource",
        ));
    };
    match users.find_by_id(&user_id)? {
        Some(user) => Ok(user),
        None => {
            let _ = sessions.destroy(token);
            Err(AppError::session("stale_session", "session no longer valid"))
        }
    }
}
