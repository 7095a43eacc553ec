use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Role, User};

/// Request body for creating a user from the admin surface.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
}

/// Full-profile update; omitted password leaves the hash untouched.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar_url: u.avatar_url,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_user_and_round_trips() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"username":"ann","password":"longenough","email":"a@b.co","full_name":"Ann"}"#,
        )
        .expect("deserialize");
        assert_eq!(req.role, Role::User);

        let admin: Role = serde_json::from_str(r#""ADMIN""#).expect("role");
        assert_eq!(admin, Role::Admin);
        assert_eq!(serde_json::to_string(&admin).expect("json"), r#""ADMIN""#);
    }

    #[test]
    fn response_never_carries_the_password_hash() {
        let json = serde_json::to_string(&UserResponse {
            id: Uuid::new_v4(),
            username: "ann".into(),
            email: "a@b.co".into(),
            full_name: "Ann".into(),
            avatar_url: None,
            role: Role::User,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        })
        .expect("json");
        assert!(!json.contains("password"));
        assert!(json.contains("ann"));
    }
}
