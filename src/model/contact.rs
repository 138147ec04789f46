//! Emergency contacts: the responders alerts are routed to.

use serde::{Deserialize, Serialize};

/// Escalation level at or below which a contact is notified immediately.
/// Contacts above this level form the escalation tier.
pub const IMMEDIATE_TIER_MAX_LEVEL: u8 = 2;

/// How a contact prefers to be reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Email,
    Sms,
    Voice,
    Chat,
}

impl std::fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactMethod::Email => write!(f, "email"),
            ContactMethod::Sms => write!(f, "sms"),
            ContactMethod::Voice => write!(f, "voice"),
            ContactMethod::Chat => write!(f, "chat"),
        }
    }
}

/// A responder in the escalation chain. Reference data; read-only from
/// the engine's perspective.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Unique contact ID
    pub id: String,
    /// Owning organization
    pub organization_id: String,
    /// Display name
    pub contact_name: String,
    /// Email address
    pub email: Option<String>,
    /// Phone number (SMS and voice)
    pub phone: Option<String>,
    /// Chat handle or webhook target
    pub chat_handle: Option<String>,
    /// Preferred delivery method
    pub preferred_contact_method: ContactMethod,
    /// Position in the escalation chain (1 = first responder)
    pub escalation_level: u8,
    /// Whether the contact is currently on rotation
    pub is_active: bool,
}

impl EmergencyContact {
    /// Create a new active contact.
    pub fn new(
        organization_id: &str,
        id: &str,
        contact_name: &str,
        preferred_contact_method: ContactMethod,
        escalation_level: u8,
    ) -> Self {
        Self {
            id: id.to_string(),
            organization_id: organization_id.to_string(),
            contact_name: contact_name.to_string(),
            email: None,
            phone: None,
            chat_handle: None,
            preferred_contact_method,
            escalation_level,
            is_active: true,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Set the phone number.
    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    /// Set the chat handle.
    pub fn with_chat_handle(mut self, handle: &str) -> Self {
        self.chat_handle = Some(handle.to_string());
        self
    }

    /// Whether this contact is notified as soon as an alert fires.
    pub fn is_immediate_tier(&self) -> bool {
        self.escalation_level <= IMMEDIATE_TIER_MAX_LEVEL
    }

    /// The address for a given delivery method, if configured.
    pub fn address_for(&self, method: ContactMethod) -> Option<&str> {
        match method {
            ContactMethod::Email => self.email.as_deref(),
            ContactMethod::Sms | ContactMethod::Voice => self.phone.as_deref(),
            ContactMethod::Chat => self.chat_handle.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_split() {
        let first = EmergencyContact::new("org-1", "c-1", "Ana", ContactMethod::Email, 1);
        let second = EmergencyContact::new("org-1", "c-2", "Ben", ContactMethod::Sms, 2);
        let manager = EmergencyContact::new("org-1", "c-3", "Cleo", ContactMethod::Voice, 3);

        assert!(first.is_immediate_tier());
        assert!(second.is_immediate_tier());
        assert!(!manager.is_immediate_tier());
    }

    #[test]
    fn test_address_for_method() {
        let contact = EmergencyContact::new("org-1", "c-1", "Ana", ContactMethod::Email, 1)
            .with_email("ana@example.com")
            .with_phone("+15550100");

        assert_eq!(contact.address_for(ContactMethod::Email), Some("ana@example.com"));
        assert_eq!(contact.address_for(ContactMethod::Sms), Some("+15550100"));
        assert_eq!(contact.address_for(ContactMethod::Voice), Some("+15550100"));
        assert_eq!(contact.address_for(ContactMethod::Chat), None);
    }
}
