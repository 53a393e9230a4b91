//! Consolidated view of one identity component

use idlk_common::db::Contact;
use serde::Serialize;

/// Primary id plus every distinct email, phone and secondary id in the component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub primary_contact_id: i64,
    pub emails: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub secondary_contact_ids: Vec<i64>,
}

impl IdentityView {
    /// Aggregate a component rooted at `root`
    ///
    /// `members` may or may not include the root itself. Values are listed
    /// root first, then secondaries oldest first, each value once.
    pub fn from_component(root: &Contact, members: &[Contact]) -> Self {
        let mut secondaries: Vec<&Contact> = members.iter().filter(|c| c.id != root.id).collect();
        secondaries.sort_by_key(|c| (c.created_at, c.id));

        let mut view = Self {
            primary_contact_id: root.id,
            emails: Vec::new(),
            phone_numbers: Vec::new(),
            secondary_contact_ids: Vec::with_capacity(secondaries.len()),
        };

        view.absorb(root);
        for contact in secondaries {
            view.absorb(contact);
            view.secondary_contact_ids.push(contact.id);
        }
        view
    }

    fn absorb(&mut self, contact: &Contact) {
        push_distinct(&mut self.emails, contact.email.as_deref());
        push_distinct(&mut self.phone_numbers, contact.phone_number.as_deref());
    }
}

fn push_distinct(values: &mut Vec<String>, value: Option<&str>) {
    if let Some(value) = value {
        if !value.is_empty() && !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
}
