use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered account. Integration tokens are opaque and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    #[serde(skip_serializing, default)]
    pub hashed_password: String,
    pub is_active: bool,
    pub is_superuser: bool,
    #[serde(skip_serializing, default)]
    pub google_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub slack_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub canvas_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields needed to insert a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub hashed_password: String,
}

/// Public view of a user, with presence flags for each external integration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub has_google: bool,
    pub has_slack: bool,
    pub has_canvas: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        let connected = |token: &Option<String>| token.as_deref().is_some_and(|t| !t.is_empty());
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            created_at: user.created_at,
            updated_at: user.updated_at,
            has_google: connected(&user.google_token),
            has_slack: connected(&user.slack_token),
            has_canvas: connected(&user.canvas_token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            email: "alice@example.com".into(),
            username: "alice".into(),
            full_name: Some("Alice".into()),
            hashed_password: "$2b$04$hash".into(),
            is_active: true,
            is_superuser: false,
            google_token: Some("g-token".into()),
            slack_token: Some(String::new()),
            canvas_token: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_user_serialization_hides_secrets() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("google_token").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_user_response_integration_flags() {
        let response = UserResponse::from(&sample_user());
        assert!(response.has_google);
        assert!(!response.has_slack, "empty token counts as disconnected");
        assert!(!response.has_canvas);
    }
}
