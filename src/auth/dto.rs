use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;

/// Request body for user registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for auto-login. The token also travels in the Authorization header;
/// the body copy is informational and the server only trusts the header.
#[derive(Debug, Serialize, Deserialize)]
pub struct AutoLoginRequest {
    pub token: Option<String>,
}

/// Body for the two-phase forgot-password endpoint: `{email}` requests a
/// reset token, `{token, newPassword}` redeems one.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
    pub token: Option<String>,
    pub new_password: Option<String>,
}

/// Response returned after registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

/// Response returned after login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub user: PublicUser,
}

/// Response returned by auto-login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AutoLoginResponse {
    pub success: bool,
    pub user: PublicUser,
}

/// Generic `{success, message}` envelope (logout, forgot-password).
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleResponse {
    pub success: bool,
    pub message: String,
}

/// Response for the profile-photo upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChangePhotoResponse {
    pub message: String,
    pub file: UploadedFile,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_name: String,
    pub url: String,
}

/// Public part of the user returned to clients. The password hash and
/// reset-token fields never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub status: String,
    pub profile_picture: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            status: user.status.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_hides_secrets() {
        let user = User::new_for_tests("a@x.com", "argon2-hash");
        let public = PublicUser::from(&user);
        let json = serde_json::to_string(&public).unwrap();
        assert!(json.contains("a@x.com"));
        assert!(!json.contains("argon2-hash"));
    }

    #[test]
    fn forgot_password_accepts_both_shapes() {
        let issue: ForgotPasswordRequest =
            serde_json::from_str(r#"{"email":"a@x.com"}"#).unwrap();
        assert_eq!(issue.email.as_deref(), Some("a@x.com"));
        assert!(issue.token.is_none());

        let redeem: ForgotPasswordRequest =
            serde_json::from_str(r#"{"token":"t","newPassword":"Np1!aaaa"}"#).unwrap();
        assert_eq!(redeem.token.as_deref(), Some("t"));
        assert_eq!(redeem.new_password.as_deref(), Some("Np1!aaaa"));
    }
}
