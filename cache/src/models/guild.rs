use harmony_models::{
    events::GuildUpdate,
    guild::Guild,
    id::{ChannelId, GuildId, RegionId, UserId},
};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CachedGuild {
    pub id: GuildId,
    pub name: String,
    pub icon: Option<String>,
    pub owner_id: UserId,
    pub region: RegionId,
    pub afk_channel_id: Option<ChannelId>,
    pub afk_timeout: u32,
}

impl From<&Guild> for CachedGuild {
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

impl CachedGuild {
    pub(crate) fn apply(&mut self, update: &GuildUpdate) {
        self.name = update.name.clone();
        self.icon = update.icon.clone();
        self.owner_id = update.owner_id.clone();
        self.region = update.region.clone();
        self.afk_channel_id = update.afk_channel_id.clone();
        self.afk_timeout = update.afk_timeout;
    }
}
