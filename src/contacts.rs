use serde::{Deserialize, Serialize};

use crate::utils;

/// A trusted contact. The list is persisted wholesale as a JSON blob, so the
/// field names stay camelCase to keep the blob compatible with what the web
/// shell already stores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl Contact {
    /// Returns `None` when the input is not a valid contact: the name must be
    /// non-blank and at least one of phone/email must be present. The id is
    /// the creation time in epoch ms; callers keeping a list must bump it on
    /// collision (see `Storage::add_contact`).
    pub fn new(name: &str, phone: Option<String>, email: Option<String>) -> Option<Contact> {
        let phone = non_blank(phone);
        let email = non_blank(email);
        if name.trim().is_empty() || (phone.is_none() && email.is_none()) {
            return None;
        }
        Some(Contact {
            id: utils::now_ms().to_string(),
            name: name.to_string(),
            phone,
            email,
            is_verified: false,
        })
    }

    /// Phone first, then email. At least one exists for a valid contact.
    pub fn reachable_at(&self) -> Option<&str> {
        self.phone.as_deref().or(self.email.as_deref())
    }
}
