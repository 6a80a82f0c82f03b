use serde::{Deserialize, Serialize};

use crate::{id::RoleId, permissions::Permissions};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Rank of the role, higher positions take precedence
    #[serde(default)]
    pub position: i64,
    pub permissions: Permissions,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub managed: bool,
}
