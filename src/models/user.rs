use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de;

/// User object returned by `POST /login`, kept verbatim: fields the site
/// does not read survive in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default, deserialize_with = "de::text")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "de::text")]
    pub phone: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub user_type: String,
}

/// Body of `PUT /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}

/// User record as listed by the REST server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiUser {
    #[serde(deserialize_with = "de::text")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(deserialize_with = "de::text")]
    pub phone: String,
    pub user_type: String,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    #[default]
    Admin,
    Superadmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            _ => Err(format!("invalid admin role: {}", s)),
        }
    }
}

/// Entry of the local admin list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub username: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
}

/// What the admin session remembers about the signed-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub username: String,
    pub role: AdminRole,
}

impl AdminSession {
    pub fn is_superadmin(&self) -> bool {
        self.role == AdminRole::Superadmin
    }
}

impl From<&AdminAccount> for AdminSession {
    fn from(account: &AdminAccount) -> Self {
        Self {
            username: account.username.clone(),
            role: account.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_user_keeps_unknown_fields() {
        let json = r#"{"id":42,"name":"Ama","email":"ama@example.com","user_type":"customer","city":"Kandy"}"#;
        let user: SessionUser = serde_json::from_str(json).unwrap();

        assert_eq!(user.id, "42");
        assert_eq!(user.extra["city"], "Kandy");

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["user_type"], "customer");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = SessionUser {
            email: "ama@example.com".into(),
            ..Default::default()
        };
        assert_eq!(user.display_name(), "ama@example.com");
    }

    #[test]
    fn user_update_is_empty_on_default() {
        assert!(UserUpdate::default().is_empty());
        assert!(
            !UserUpdate {
                phone: Some("0771234567".into()),
                ..Default::default()
            }
            .is_empty()
        );
    }
}
