//! Role Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Role ID type
pub type RoleId = RecordId;

/// Role model (Admin / Manager / Collector / Technician, plus custom roles)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RoleId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: i64,
}

/// Create role payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub description: Option<String>,
}

/// Update role payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
