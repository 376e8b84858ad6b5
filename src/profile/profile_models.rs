use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown";

/// Display identity of a participant, looked up by user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Full name, then username, then "Unknown".
    pub fn display_name(&self) -> String {
        let full_name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let full_name = full_name.trim();
        if !full_name.is_empty() {
            return full_name.to_string();
        }

        match self.username.as_deref().map(str::trim) {
            Some(username) if !username.is_empty() => username.to_string(),
            _ => UNKNOWN_DISPLAY_NAME.to_string(),
        }
    }
}

/// Display name and avatar for a possibly-missing profile.
pub fn resolve_identity(profile: Option<&Profile>) -> (String, Option<String>) {
    match profile {
        Some(p) => (p.display_name(), p.avatar_url.clone()),
        None => (UNKNOWN_DISPLAY_NAME.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(first: Option<&str>, last: Option<&str>, username: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            username: username.map(String::from),
            avatar_url: None,
        }
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let p = profile(Some("Ada"), Some("Obi"), Some("ada_o"));
        assert_eq!(p.display_name(), "Ada Obi");
    }

    #[test]
    fn test_display_name_trims_partial_name() {
        let p = profile(Some("Ada"), None, Some("ada_o"));
        assert_eq!(p.display_name(), "Ada");

        let p = profile(None, Some("  Obi "), None);
        assert_eq!(p.display_name(), "Obi");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let p = profile(Some(" "), Some(""), Some("ada_o"));
        assert_eq!(p.display_name(), "ada_o");
    }

    #[test]
    fn test_display_name_falls_back_to_unknown() {
        let p = profile(None, None, Some("   "));
        assert_eq!(p.display_name(), UNKNOWN_DISPLAY_NAME);
    }

    #[test]
    fn test_missing_profile_resolves_to_unknown_without_avatar() {
        assert_eq!(resolve_identity(None), ("Unknown".to_string(), None));
    }
}
