//! Memory-backed reference store. Stands in for the document store during
//! development and in the test suite; data does not survive a restart.
//! Uniqueness constraints (local email, federation provider id) are
//! enforced under the collection's write lock.

use std::collections::HashMap;

use anyhow::Result;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::contacts::{Contact, ContactFields};
use crate::identity::{FederatedProfile, NewLocalUser, User};
use crate::store::{ContactStore, UserStore};

#[derive(Default)]
pub struct MemoryStore {
    contacts: RwLock<HashMap<String, Contact>>,
    users: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}

impl ContactStore for MemoryStore {
    fn list(&self) -> Result<Vec<Contact>> {
        Ok(self.contacts.read().values().cloned().collect())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Contact>> {
        Ok(self.contacts.read().get(id).cloned())
    }

    fn insert(&self, fields: ContactFields) -> Result<Contact> {
        let contact = Contact::from_fields(Self::new_id(), fields);
        self.contacts.write().insert(contact.id.clone(), contact.clone());
        Ok(contact)
    }

    fn update(&self, id: &str, fields: ContactFields) -> Result<Option<Contact>> {
        let mut map = self.contacts.write();
        if !map.contains_key(id) {
            return Ok(None);
        }
        let contact = Contact::from_fields(id.to_string(), fields);
        map.insert(id.to_string(), contact.clone());
        Ok(Some(contact))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.contacts.write().remove(id).is_some())
    }
}

impl UserStore for MemoryStore {
    fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read();
        Ok(users
            .values()
            .find(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .cloned())
    }

    fn insert_local(&self, user: NewLocalUser) -> Result<Option<User>> {
        let mut users = self.users.write();
        let taken = users
            .values()
            .any(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(&user.email)));
        if taken {
            return Ok(None);
        }
        let record = User {
            id: Self::new_id(),
            username: Some(user.username),
            email: Some(user.email),
            password_hash: Some(user.password_hash),
            ..Default::default()
        };
        users.insert(record.id.clone(), record.clone());
        Ok(Some(record))
    }

    fn find_or_create_federated(&self, profile: FederatedProfile) -> Result<User> {
        // Scan and insert under one write lock; this is the uniqueness
        // constraint on the provider id.
        let mut users = self.users.write();
        if let Some(existing) = users
            .values()
            .find(|u| u.provider_id.as_deref() == Some(profile.provider_id.as_str()))
        {
            return Ok(existing.clone());
        }
        let record = User {
            id: Self::new_id(),
            provider_id: Some(profile.provider_id),
            display_name: profile.display_name,
            given_name: profile.given_name,
            family_name: profile.family_name,
            avatar_url: profile.avatar_url,
            ..Default::default()
        };
        users.insert(record.id.clone(), record.clone());
        Ok(record)
    }
}
