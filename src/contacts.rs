//! Contact model, field validation, and the resource operations the HTTP
//! handlers delegate to.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::store::ContactStore;
use crate::util::valid_email;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_color: Option<String>,
    /// ISO-8601 calendar date on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Contact {
    /// Attach a store-assigned identifier to a validated payload.
    pub fn from_fields(id: String, fields: ContactFields) -> Self {
        Self {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            favorite_color: fields.favorite_color,
            birthday: fields.birthday,
            phone: fields.phone,
            address: fields.address,
            city: fields.city,
            country: fields.country,
        }
    }
}

/// Create/update payload: everything but the identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl ContactFields {
    /// Required fields non-empty, email well-formed. Applied on both create
    /// and update.
    pub fn validate(&self) -> AppResult<()> {
        if self.first_name.trim().is_empty()
            || self.last_name.trim().is_empty()
            || self.email.trim().is_empty()
        {
            return Err(AppError::validation(
                "missing_fields",
                "first name, last name and email are required",
            ));
        }
        if !valid_email(self.email.trim()) {
            return Err(AppError::validation("invalid_email", "invalid email address"));
        }
        Ok(())
    }
}

fn check_id(id: &str) -> AppResult<()> {
    uuid::Uuid::parse_str(id)
        .map_err(|_| AppError::validation("invalid_contact_id", "invalid contact id"))?;
    Ok(())
}

pub fn list_contacts(store: &dyn ContactStore) -> AppResult<Vec<Contact>> {
    Ok(store.list()?)
}

pub fn get_contact(store: &dyn ContactStore, id: &str) -> AppResult<Contact> {
    check_id(id)?;
    store
        .find_by_id(id)?
        .ok_or_else(|| AppError::not_found("contact_not_found", "contact not found"))
}

pub fn create_contact(store: &dyn ContactStore, fields: ContactFields) -> AppResult<Contact> {
    fields.validate()?;
    Ok(store.insert(fields)?)
}

pub fn update_contact(
    store: &dyn ContactStore,
    id: &str,
    fields: ContactFields,
) -> AppResult<Contact> {
    check_id(id)?;
    fields.validate()?;
    store
        .update(id, fields)?
        .ok_or_else(|| AppError::not_found("contact_not_found", "contact not found"))
}

pub fn delete_contact(store: &dyn ContactStore, id: &str) -> AppResult<()> {
    check_id(id)?;
    if store.delete(id)? {
        Ok(())
    } else {
        Err(AppError::not_found("contact_not_found", "contact not found"))
    }
}
