//! User domain type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jersey_shop_core::Email;

/// The authenticated principal, mirrored from the auth backend.
///
/// The store treats this as opaque beyond identity and metadata; it is owned
/// by the auth backend and replaced wholesale on sign-in/sign-up, session
/// checks, and optimistic profile edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID assigned by the auth backend.
    pub id: Uuid,
    /// User's email address.
    pub email: Email,
    /// Display name from user metadata.
    #[serde(default)]
    pub full_name: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serde_roundtrip() {
        let user = User {
            id: Uuid::new_v4(),
            email: Email::parse("fan@example.com").unwrap(),
            full_name: Some("Jordan Fan".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        let parsed: User = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, user);
    }

    #[test]
    fn test_user_full_name_defaults_to_none() {
        let json = r#"{
            "id": "4b1a6e8e-7e5e-4f3a-9a1e-2c3d4e5f6a7b",
            "email": "fan@example.com",
            "created_at": "2025-01-15T10:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.full_name.is_none());
    }
}
