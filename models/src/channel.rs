use serde::{Deserialize, Serialize};

use crate::{
    id::{ChannelId, GuildId, RoleId, UserId},
    permissions::Permissions,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteKind {
    Role,
    Member,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PermissionOverwrite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OverwriteKind,
    pub allow: Permissions,
    pub deny: Permissions,
}

/// The resolved target of a [`PermissionOverwrite`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PermissionOverwriteType {
    Role(RoleId),
    Member(UserId),
}

impl PermissionOverwrite {
    pub fn target(&self) -> PermissionOverwriteType {
        match self.kind {
            OverwriteKind::Role => PermissionOverwriteType::Role(RoleId::new(self.id.clone())),
            OverwriteKind::Member => PermissionOverwriteType::Member(UserId::new(self.id.clone())),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TextChannel {
    pub id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub name: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VoiceChannel {
    pub id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub name: String,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub user_limit: Option<u32>,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GuildChannel {
    Text(TextChannel),
    Voice(VoiceChannel),
}

impl GuildChannel {
    pub fn id(&self) -> &ChannelId {
        match self {
            GuildChannel::Text(c) => &c.id,
            GuildChannel::Voice(c) => &c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GuildChannel::Text(c) => &c.name,
            GuildChannel::Voice(c) => &c.name,
        }
    }

    pub fn guild_id(&self) -> Option<&GuildId> {
        match self {
            GuildChannel::Text(c) => c.guild_id.as_ref(),
            GuildChannel::Voice(c) => c.guild_id.as_ref(),
        }
    }

    pub fn permission_overwrites(&self) -> &[PermissionOverwrite] {
        match self {
            GuildChannel::Text(c) => &c.permission_overwrites,
            GuildChannel::Voice(c) => &c.permission_overwrites,
        }
    }

    /// Fills in the owning guild when the payload was nested inside a guild and carried none
    pub fn set_guild_id(&mut self, guild_id: GuildId) {
        match self {
            GuildChannel::Text(c) => c.guild_id = Some(guild_id),
            GuildChannel::Voice(c) => c.guild_id = Some(guild_id),
        }
    }
}

/// The kind of channel to create
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Text,
    Voice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_kind_comes_from_type_tag() {
        let voice: GuildChannel = serde_json::from_str(
            r#"{"type":"voice","id":"2","name":"General","bitrate":64000}"#,
        )
        .unwrap();
        assert!(matches!(voice, GuildChannel::Voice(ref v) if v.bitrate == Some(64000)));
        assert_eq!(voice.guild_id(), None);

        let text: GuildChannel = serde_json::from_str(
            r#"{"type":"text","id":"3","name":"general","permission_overwrites":[{"id":"9","type":"member","allow":0,"deny":2048}]}"#,
        )
        .unwrap();
        assert_eq!(
            text.permission_overwrites()[0].target(),
            PermissionOverwriteType::Member(UserId::from("9"))
        );
    }
}
