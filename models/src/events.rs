use serde::Deserialize;

use crate::{
    channel::GuildChannel,
    guild::Guild,
    id::{ChannelId, GuildId, RegionId, RoleId, UserId},
    role::Role,
    user::{Member, User},
};

/// Push notifications delivered by the event dispatcher, each keyed by the
/// guild, the entity kind and the entity id
#[derive(Clone, Debug)]
pub enum Event {
    Ready(Ready),
    GuildCreate(Box<Guild>),
    GuildUpdate(Box<GuildUpdate>),
    GuildDelete(GuildDelete),
    ChannelCreate(ChannelUpsert),
    ChannelUpdate(ChannelUpsert),
    ChannelDelete(ChannelDelete),
    RoleCreate(RoleUpsert),
    RoleUpdate(RoleUpsert),
    RoleDelete(RoleDelete),
    MemberAdd(MemberAdd),
    MemberUpdate(MemberUpdate),
    MemberRemove(MemberRemove),
    MemberChunk(MemberChunk),
    UserUpdate(User),
}

impl Event {
    pub const fn kind(&self) -> &'static str {
        match self {
            Event::Ready(_) => "Ready",
            Event::GuildCreate(_) => "GuildCreate",
            Event::GuildUpdate(_) => "GuildUpdate",
            Event::GuildDelete(_) => "GuildDelete",
            Event::ChannelCreate(_) => "ChannelCreate",
            Event::ChannelUpdate(_) => "ChannelUpdate",
            Event::ChannelDelete(_) => "ChannelDelete",
            Event::RoleCreate(_) => "RoleCreate",
            Event::RoleUpdate(_) => "RoleUpdate",
            Event::RoleDelete(_) => "RoleDelete",
            Event::MemberAdd(_) => "MemberAdd",
            Event::MemberUpdate(_) => "MemberUpdate",
            Event::MemberRemove(_) => "MemberRemove",
            Event::MemberChunk(_) => "MemberChunk",
            Event::UserUpdate(_) => "UserUpdate",
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Ready {
    pub user: User,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GuildUpdate {
    pub id: GuildId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub owner_id: UserId,
    pub region: RegionId,
    #[serde(default)]
    pub afk_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub afk_timeout: u32,
}

impl From<&Guild> for GuildUpdate {
    fn from(guild: &Guild) -> Self {
        Self {
            id: guild.id.clone(),
            name: guild.name.clone(),
            icon: guild.icon.clone(),
            owner_id: guild.owner_id.clone(),
            region: guild.region.clone(),
            afk_channel_id: guild.afk_channel_id.clone(),
            afk_timeout: guild.afk_timeout,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GuildDelete {
    pub id: GuildId,
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChannelUpsert {
    pub guild_id: GuildId,
    pub channel: GuildChannel,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChannelDelete {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RoleUpsert {
    pub guild_id: GuildId,
    pub role: Role,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RoleDelete {
    pub guild_id: GuildId,
    pub role_id: RoleId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MemberAdd {
    pub guild_id: GuildId,
    pub member: Member,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MemberUpdate {
    pub guild_id: GuildId,
    pub user: User,
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub nick: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MemberRemove {
    pub guild_id: GuildId,
    pub user: User,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MemberChunk {
    pub guild_id: GuildId,
    pub members: Vec<Member>,
}
