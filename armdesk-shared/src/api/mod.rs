use serde::{Deserialize, Serialize};

use crate::domain;

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

/// All backend routes live under this prefix.
pub const API_PREFIX: &str = "/api";

// Auth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResp {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Error body shape used by the backend for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub detail: String,
}

/// Generic success/message envelope returned by mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResp {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

// Buildings and proevents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDto {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub start_time: Option<String>,
}

impl From<BuildingDto> for domain::Building {
    fn from(d: BuildingDto) -> Self {
        domain::Building {
            id: d.id,
            name: d.name,
            start_time: d.start_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProEventDto {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
    pub reactive_state: i32,
    #[serde(default)]
    pub is_ignored: bool,
}

impl From<ProEventDto> for domain::ProEvent {
    fn from(d: ProEventDto) -> Self {
        domain::ProEvent {
            id: d.id,
            name: d.name,
            building_id: d.building_id,
            state: domain::ArmState::from_reactive(d.reactive_state),
            is_ignored: d.is_ignored,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleUpdateReq {
    pub building_id: i64,
    pub start_time: String,
}

/// One staged ignore-flag change. The list item id and the device primary
/// key are carried as separate fields even though they coincide in the
/// observed data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IgnoreEditDto {
    pub item_id: i64,
    pub building_id: i64,
    pub device_id: i64,
    pub ignore: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkIgnoreReq {
    pub items: Vec<IgnoreEditDto>,
}

// Query templates. An absent updated_at means the template is still at the
// server-shipped default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetaDto {
    pub query_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryListResp {
    pub queries: Vec<QueryMetaDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDto {
    pub query_name: String,
    pub query_sql: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySaveReq {
    pub query_name: String,
    pub query_sql: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTestResp {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub query_sql: Option<String>,
}

// User management
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreateReq {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdateReq {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordReq {
    pub current_password: String,
    pub new_password: String,
}
