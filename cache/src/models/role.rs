use harmony_models::{
    id::{GuildId, RoleId},
    permissions::Permissions,
    role::Role,
};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CachedRole {
    pub id: RoleId,
    pub guild_id: GuildId,
    pub name: String,
    pub position: i64,
    pub permissions: Permissions,
    pub color: u32,
    pub hoist: bool,
    pub managed: bool,
}

impl CachedRole {
    pub fn from_role(guild_id: GuildId, role: Role) -> Self {
        Self {
            id: role.id,
            guild_id,
            name: role.name,
            position: role.position,
            permissions: role.permissions,
            color: role.color,
            hoist: role.hoist,
            managed: role.managed,
        }
    }
}
