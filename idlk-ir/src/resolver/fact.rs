//! Normalized input to a resolve call

use idlk_common::config::NoveltyMode;
use idlk_common::db::Contact;
use idlk_common::{Error, Result};

/// The (email, phone) pair a caller submitted, trimmed, with blanks dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFact {
    email: Option<String>,
    phone_number: Option<String>,
}

impl ContactFact {
    /// Normalize raw input
    ///
    /// Fails with [`Error::NoIdentifyingField`] when neither field survives.
    pub fn new(email: Option<&str>, phone_number: Option<&str>) -> Result<Self> {
        let fact = Self {
            email: normalize(email),
            phone_number: normalize(phone_number),
        };

        if fact.email.is_none() && fact.phone_number.is_none() {
            return Err(Error::NoIdentifyingField);
        }
        Ok(fact)
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// Whether `contact` already records this fact, so no new row is needed
    pub fn is_recorded_by(&self, contact: &Contact, mode: NoveltyMode) -> bool {
        field_matches(self.email(), contact.email.as_deref(), mode)
            && field_matches(self.phone_number(), contact.phone_number.as_deref(), mode)
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn field_matches(given: Option<&str>, stored: Option<&str>, mode: NoveltyMode) -> bool {
    match (given, mode) {
        (None, NoveltyMode::PresentFields) => true,
        _ => given == stored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use idlk_common::db::LinkPrecedence;
    use idlk_common::time;

    fn stored(email: Option<&str>, phone: Option<&str>) -> Contact {
        let now = time::now();
        Contact {
            id: 1,
            email: email.map(str::to_string),
            phone_number: phone.map(str::to_string),
            link_precedence: LinkPrecedence::Primary,
            linked_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_values_are_trimmed() {
        let fact = ContactFact::new(Some("  doc@time.com "), Some("\t999999\n")).unwrap();
        assert_eq!(fact.email(), Some("doc@time.com"));
        assert_eq!(fact.phone_number(), Some("999999"));
    }

    #[test]
    fn test_blank_values_become_absent() {
        let fact = ContactFact::new(Some("   "), Some("123")).unwrap();
        assert_eq!(fact.email(), None);
        assert_eq!(fact.phone_number(), Some("123"));
    }

    #[test]
    fn test_no_identifying_field() {
        assert!(matches!(ContactFact::new(None, None), Err(Error::NoIdentifyingField)));
        assert!(matches!(ContactFact::new(Some(""), Some("  ")), Err(Error::NoIdentifyingField)));
    }

    #[test]
    fn test_exact_mode_requires_stored_null_for_omitted_field() {
        let fact = ContactFact::new(Some("a@x.com"), None).unwrap();

        assert!(fact.is_recorded_by(&stored(Some("a@x.com"), None), NoveltyMode::Exact));
        assert!(!fact.is_recorded_by(&stored(Some("a@x.com"), Some("111")), NoveltyMode::Exact));
    }

    #[test]
    fn test_present_fields_mode_ignores_omitted_field() {
        let fact = ContactFact::new(Some("a@x.com"), None).unwrap();

        assert!(fact.is_recorded_by(&stored(Some("a@x.com"), Some("111")), NoveltyMode::PresentFields));
        assert!(!fact.is_recorded_by(&stored(Some("b@x.com"), Some("111")), NoveltyMode::PresentFields));
    }

    #[test]
    fn test_both_fields_compared_in_either_mode() {
        let fact = ContactFact::new(Some("a@x.com"), Some("222")).unwrap();
        let contact = stored(Some("a@x.com"), Some("111"));

        assert!(!fact.is_recorded_by(&contact, NoveltyMode::Exact));
        assert!(!fact.is_recorded_by(&contact, NoveltyMode::PresentFields));
        assert!(fact.is_recorded_by(&stored(Some("a@x.com"), Some("222")), NoveltyMode::Exact));
    }
}
