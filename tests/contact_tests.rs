//! Contact CRUD integration tests against the memory reference store, plus
//! the access-control gate ordering property.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::NaiveDate;

use rolodex::contacts::{self, ContactFields};
use rolodex::identity::MemorySessionStore;
use rolodex::server::{self, AppState};
use rolodex::store::memory::MemoryStore;
use rolodex::store::ContactStore;

fn minimal_fields() -> ContactFields {
    ContactFields {
        first_name: "A".into(),
        last_name: "B".into(),
        email: "a@b.com".into(),
        ..Default::default()
    }
}

fn full_fields() -> ContactFields {
    ContactFields {
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        email: "grace@navy.mil".into(),
        favorite_color: Some("blue".into()),
        birthday: NaiveDate::from_ymd_opt(1906, 12, 9),
        phone: Some("+1 555 0100".into()),
        address: Some("1 Fleet St".into()),
        city: Some("Arlington".into()),
        country: Some("US".into()),
    }
}

#[test]
fn create_then_get_returns_equal_record() -> Result<()> {
    let store = MemoryStore::new();
    let created = contacts::create_contact(&store, full_fields()).expect("create");
    assert!(!created.id.is_empty());

    let fetched = contacts::get_contact(&store, &created.id).expect("get");
    assert_eq!(fetched, created);
    // Every submitted field round-trips.
    let submitted = full_fields();
    assert_eq!(fetched.first_name, submitted.first_name);
    assert_eq!(fetched.email, submitted.email);
    assert_eq!(fetched.favorite_color, submitted.favorite_color);
    assert_eq!(fetched.birthday, submitted.birthday);
    assert_eq!(fetched.country, submitted.country);
    Ok(())
}

#[test]
fn unknown_identifiers_are_not_found() {
    let store = MemoryStore::new();
    let missing = uuid::Uuid::new_v4().to_string();

    let err = contacts::get_contact(&store, &missing).unwrap_err();
    assert_eq!(err.http_status(), 404);
    let err = contacts::update_contact(&store, &missing, minimal_fields()).unwrap_err();
    assert_eq!(err.http_status(), 404);
    let err = contacts::delete_contact(&store, &missing).unwrap_err();
    assert_eq!(err.http_status(), 404);
}

#[test]
fn malformed_identifier_is_a_validation_error() {
    let store = MemoryStore::new();
    for op_status in [
        contacts::get_contact(&store, "not-a-key").unwrap_err().http_status(),
        contacts::update_contact(&store, "not-a-key", minimal_fields())
            .unwrap_err()
            .http_status(),
        contacts::delete_contact(&store, "not-a-key").unwrap_err().http_status(),
    ] {
        assert_eq!(op_status, 400);
    }
}

#[test]
fn invalid_payloads_are_rejected_and_not_persisted() {
    let store = MemoryStore::new();

    let mut missing_name = minimal_fields();
    missing_name.first_name = String::new();
    assert_eq!(contacts::create_contact(&store, missing_name).unwrap_err().http_status(), 400);

    let mut bad_email = minimal_fields();
    bad_email.email = "nope".into();
    assert_eq!(contacts::create_contact(&store, bad_email).unwrap_err().http_status(), 400);

    assert!(contacts::list_contacts(&store).unwrap().is_empty());
}

#[test]
fn update_keeps_the_identifier_and_applies_fields_exactly() -> Result<()> {
    let store = MemoryStore::new();
    let created = contacts::create_contact(&store, full_fields())?;

    let mut changes = minimal_fields();
    changes.first_name = "Grace M".into();
    changes.email = "grace@example.com".into();
    // favorite color and birthday intentionally omitted
    let updated = contacts::update_contact(&store, &created.id, changes)?;
    assert_eq!(updated.id, created.id);

    let fetched = contacts::get_contact(&store, &created.id)?;
    assert_eq!(fetched.first_name, "Grace M");
    assert_eq!(fetched.email, "grace@example.com");
    assert_eq!(fetched.favorite_color, None, "omitted fields do not linger");
    assert_eq!(fetched.birthday, None);
    Ok(())
}

#[test]
fn update_validation_matches_create() {
    let store = MemoryStore::new();
    let created = contacts::create_contact(&store, minimal_fields()).unwrap();
    let mut bad = minimal_fields();
    bad.email = "broken".into();
    let err = contacts::update_contact(&store, &created.id, bad).unwrap_err();
    assert_eq!(err.http_status(), 400);
    // The record is untouched.
    let fetched = contacts::get_contact(&store, &created.id).unwrap();
    assert_eq!(fetched.email, "a@b.com");
}

#[test]
fn delete_removes_the_record_and_repeats_as_not_found() {
    let store = MemoryStore::new();
    let created = contacts::create_contact(&store, minimal_fields()).unwrap();

    contacts::delete_contact(&store, &created.id).expect("first delete");
    assert_eq!(contacts::get_contact(&store, &created.id).unwrap_err().http_status(), 404);
    assert_eq!(contacts::delete_contact(&store, &created.id).unwrap_err().http_status(), 404);
}

#[test]
fn list_returns_every_record_unfiltered() -> Result<()> {
    let store = MemoryStore::new();
    let mut ids = Vec::new();
    for email in ["a@b.com", "b@b.com", "c@b.com"] {
        let mut f = minimal_fields();
        f.email = email.into();
        ids.push(contacts::create_contact(&store, f)?.id);
    }
    let listed = contacts::list_contacts(&store)?;
    assert_eq!(listed.len(), 3);
    for id in ids {
        assert!(listed.iter().any(|c| c.id == id));
    }
    Ok(())
}

fn state_with(store: Arc<MemoryStore>) -> AppState {
    AppState {
        contacts: store.clone(),
        users: store,
        sessions: Arc::new(MemorySessionStore::default()),
        oauth: None,
        oauth_states: Arc::new(tokio::sync::RwLock::new(HashMap::<String, Instant>::new())),
    }
}

#[test]
fn unauthenticated_requests_are_rejected_at_the_gate() {
    let store = Arc::new(MemoryStore::new());
    let created = contacts::create_contact(store.as_ref(), minimal_fields()).unwrap();
    let state = state_with(store.clone());

    // No cookie at all.
    let err = server::require_principal(&state, &axum::http::HeaderMap::new()).unwrap_err();
    assert_eq!(err.http_status(), 401);

    // A cookie carrying a token the session store never issued.
    let mut headers = axum::http::HeaderMap::new();
    headers.insert("cookie", "rolodex_session=forged-token".parse().unwrap());
    let err = server::require_principal(&state, &headers).unwrap_err();
    assert_eq!(err.http_status(), 401);

    // The gate failed, so the protected operation never ran: the record is
    // still in the store.
    assert!(store.find_by_id(&created.id).unwrap().is_some());
}
