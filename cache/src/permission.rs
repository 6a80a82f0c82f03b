use harmony_models::{
    channel::{PermissionOverwrite, PermissionOverwriteType},
    id::{RoleId, UserId},
    permissions::Permissions,
};
use std::{collections::HashMap, sync::Arc};

use crate::{CachedGuild, CachedRole};

/// Computes the permissions of a member across the whole guild.
///
/// The owner holds every permission. Everyone else starts from the `@everyone`
/// role and ORs in the permissions of each assigned role, visited from the
/// highest position down. Roles missing from `roles` are skipped since the
/// cache may lag behind the server. `ADMINISTRATOR` grants everything.
pub fn guild_wide_permissions(
    guild: &CachedGuild,
    roles: &HashMap<RoleId, Arc<CachedRole>>,
    member_id: &UserId,
    member_roles: &[RoleId],
) -> Permissions {
    if *member_id == guild.owner_id {
        return Permissions::all();
    }

    let mut permissions = roles
        .get(&guild.id.everyone_role())
        .map_or_else(Permissions::empty, |r| r.permissions);

    let mut assigned = member_roles
        .iter()
        .filter_map(|id| roles.get(id))
        .collect::<Vec<_>>();
    assigned.sort_by(|a, b| b.position.cmp(&a.position));
    for role in assigned {
        permissions |= role.permissions;
    }

    if permissions.contains(Permissions::ADMINISTRATOR) {
        return Permissions::all();
    }
    permissions
}

/// Computes the permissions of a member inside a channel with the given overwrites.
///
/// Overwrites are layered on top of the guild wide permissions: the `@everyone`
/// overwrite first, then the combined overwrites of the member's roles, then the
/// member specific overwrite. Each layer removes its denied bits before adding
/// its allowed bits.
pub fn channel_permissions(
    guild: &CachedGuild,
    roles: &HashMap<RoleId, Arc<CachedRole>>,
    member_id: &UserId,
    member_roles: &[RoleId],
    overwrites: &[PermissionOverwrite],
) -> Permissions {
    let mut permissions = guild_wide_permissions(guild, roles, member_id, member_roles);
    if permissions == Permissions::all() {
        return permissions;
    }

    let everyone = guild.id.everyone_role();
    let mut member_allow = Permissions::empty();
    let mut member_deny = Permissions::empty();
    let mut roles_allow = Permissions::empty();
    let mut roles_deny = Permissions::empty();

    for overwrite in overwrites {
        match overwrite.target() {
            PermissionOverwriteType::Role(role) => {
                if role == everyone {
                    permissions.remove(overwrite.deny);
                    permissions.insert(overwrite.allow);
                    continue;
                }

                if !member_roles.contains(&role) {
                    continue;
                }

                roles_allow.insert(overwrite.allow);
                roles_deny.insert(overwrite.deny);
            }
            PermissionOverwriteType::Member(user) if user == *member_id => {
                member_allow.insert(overwrite.allow);
                member_deny.insert(overwrite.deny);
            }
            PermissionOverwriteType::Member(_) => {}
        }
    }
    permissions.remove(roles_deny);
    permissions.insert(roles_allow);
    permissions.remove(member_deny);
    permissions.insert(member_allow);

    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_models::{
        channel::OverwriteKind,
        id::{GuildId, RegionId},
    };

    fn guild() -> CachedGuild {
        CachedGuild {
            id: GuildId::from("100"),
            name: "Harmony".into(),
            icon: None,
            owner_id: UserId::from("1"),
            region: RegionId::from("us-west"),
            afk_channel_id: None,
            afk_timeout: 300,
        }
    }

    fn role(id: &str, position: i64, permissions: Permissions) -> (RoleId, Arc<CachedRole>) {
        let role = CachedRole {
            id: RoleId::from(id),
            guild_id: GuildId::from("100"),
            name: id.to_string(),
            position,
            permissions,
            color: 0,
            hoist: false,
            managed: false,
        };
        (role.id.clone(), Arc::new(role))
    }

    fn overwrite(id: &str, kind: OverwriteKind, allow: Permissions, deny: Permissions) -> PermissionOverwrite {
        PermissionOverwrite {
            id: id.into(),
            kind,
            allow,
            deny,
        }
    }

    #[test]
    fn owner_without_roles_has_everything() {
        let roles = HashMap::new();
        let perms = guild_wide_permissions(&guild(), &roles, &UserId::from("1"), &[]);
        assert!(perms.contains(Permissions::MANAGE_SERVER));
        assert_eq!(perms, Permissions::all());
    }

    #[test]
    fn conflicting_roles_are_unioned() {
        let roles = [
            role("100", 0, Permissions::READ_MESSAGES),
            role("moderator", 5, Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS),
            role("muted", 1, Permissions::empty()),
        ]
        .into_iter()
        .collect::<HashMap<_, _>>();
        let member_roles = [RoleId::from("muted"), RoleId::from("moderator")];

        let perms = guild_wide_permissions(&guild(), &roles, &UserId::from("2"), &member_roles);
        assert_eq!(
            perms,
            Permissions::READ_MESSAGES | Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS
        );
    }

    #[test]
    fn stale_roles_are_skipped() {
        let roles = [role("100", 0, Permissions::READ_MESSAGES)]
            .into_iter()
            .collect::<HashMap<_, _>>();
        let perms = guild_wide_permissions(&guild(), &roles, &UserId::from("2"), &[RoleId::from("gone")]);
        assert_eq!(perms, Permissions::READ_MESSAGES);
    }

    #[test]
    fn administrator_grants_everything() {
        let roles = [role("admin", 3, Permissions::ADMINISTRATOR)]
            .into_iter()
            .collect::<HashMap<_, _>>();
        let perms = guild_wide_permissions(&guild(), &roles, &UserId::from("2"), &[RoleId::from("admin")]);
        assert_eq!(perms, Permissions::all());
    }

    #[test]
    fn conflicting_overwrites_deny_then_allow() {
        let roles = [
            role("100", 0, Permissions::READ_MESSAGES | Permissions::SEND_MESSAGES),
            role("helper", 2, Permissions::MANAGE_MESSAGES),
            role("guest", 1, Permissions::empty()),
        ]
        .into_iter()
        .collect::<HashMap<_, _>>();
        let member_roles = [RoleId::from("helper"), RoleId::from("guest")];
        let overwrites = [
            overwrite("100", OverwriteKind::Role, Permissions::empty(), Permissions::SEND_MESSAGES),
            // one role denies what another role allows, the allow wins
            overwrite("guest", OverwriteKind::Role, Permissions::empty(), Permissions::SEND_MESSAGES | Permissions::READ_MESSAGES),
            overwrite("helper", OverwriteKind::Role, Permissions::SEND_MESSAGES, Permissions::empty()),
            overwrite("2", OverwriteKind::Member, Permissions::EMBED_LINKS, Permissions::MANAGE_MESSAGES),
            overwrite("3", OverwriteKind::Member, Permissions::all(), Permissions::empty()),
        ];

        let perms = channel_permissions(&guild(), &roles, &UserId::from("2"), &member_roles, &overwrites);
        assert_eq!(perms, Permissions::SEND_MESSAGES | Permissions::EMBED_LINKS);
    }

    #[test]
    fn owner_ignores_overwrites() {
        let roles = HashMap::new();
        let overwrites = [overwrite("1", OverwriteKind::Member, Permissions::empty(), Permissions::all())];
        let perms = channel_permissions(&guild(), &roles, &UserId::from("1"), &[], &overwrites);
        assert_eq!(perms, Permissions::all());
    }
}
