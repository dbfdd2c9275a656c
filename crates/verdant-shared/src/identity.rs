use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated user's profile record as the client mirrors it.
///
/// The authoritative copy lives server-side; the client persists this copy
/// next to the bearer credential and keeps the two in lockstep: both set on
/// login/signup, both cleared on logout or failed verification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// First name, as used to prefill the checkout form.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Last name, empty if the profile only carries one name.
    pub fn last_name(&self) -> &str {
        self.name.split_whitespace().nth(1).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> UserProfile {
        UserProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: "test@example.com".into(),
            phone_number: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn splits_name_for_checkout() {
        let p = profile("Asha Rao");
        assert_eq!(p.first_name(), "Asha");
        assert_eq!(p.last_name(), "Rao");

        let single = profile("Asha");
        assert_eq!(single.first_name(), "Asha");
        assert_eq!(single.last_name(), "");
    }

    #[test]
    fn wire_id_field_is_underscored() {
        let p = profile("Asha Rao");
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("id").is_none());
    }
}
