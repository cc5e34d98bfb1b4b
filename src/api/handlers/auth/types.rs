//! Request and response bodies for the auth surface.

use crate::domain::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Deserialize, Debug)]
pub struct SendLinkRequest {
    pub email: String,
    pub role: Role,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ValidateRequest {
    pub code: String,
    /// Optional role filter: when set, a code minted for another role does
    /// not redeem.
    pub role: Option<Role>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
}

impl ValidateResponse {
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            valid: false,
            email: None,
            role: None,
            submission_id: None,
        }
    }
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct PasswordLoginRequest {
    pub password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub email: String,
    pub role: Role,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct DashboardAuthRequest {
    pub password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct DashboardAuthResponse {
    pub authenticated: bool,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SessionResponse {
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
}
