use harmony_models::{
    events::{
        ChannelDelete, ChannelUpsert, Event, GuildDelete, GuildUpdate, MemberAdd, MemberChunk,
        MemberRemove, MemberUpdate, Ready, RoleDelete, RoleUpsert,
    },
    guild::Guild,
    user::User,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::{Cache, CacheError};

pub trait UpdateCache {
    fn update(&self, cache: &Cache) -> Result<(), CacheError>;
}

impl UpdateCache for Event {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.0.stats.record_event(self.kind());

        match self {
            Event::Ready(v) => c.update(v),
            Event::GuildCreate(v) => c.update(v.as_ref()),
            Event::GuildUpdate(v) => c.update(v.as_ref()),
            Event::GuildDelete(v) => c.update(v),
            Event::ChannelCreate(v) | Event::ChannelUpdate(v) => c.update(v),
            Event::ChannelDelete(v) => c.update(v),
            Event::RoleCreate(v) | Event::RoleUpdate(v) => c.update(v),
            Event::RoleDelete(v) => c.update(v),
            Event::MemberAdd(v) => c.update(v),
            Event::MemberUpdate(v) => c.update(v),
            Event::MemberRemove(v) => c.update(v),
            Event::MemberChunk(v) => c.update(v),
            Event::UserUpdate(v) => c.update(v),
        }
    }
}

impl UpdateCache for Ready {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        info!(user = %self.user.id, "Session ready");
        c.cache_current_user(self.user.clone());
        Ok(())
    }
}

impl UpdateCache for Guild {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        debug!(id = %self.id, "Received event for Guild Create for");
        c.cache_guild(self.clone());
        Ok(())
    }
}

impl UpdateCache for GuildUpdate {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        debug!(id = %self.id, "Received event for Guild Update for");

        match c.0.guilds.get_mut(&self.id) {
            Some(mut guild) => {
                let guild = Arc::make_mut(&mut guild);
                guild.apply(self);
                Ok(())
            }
            None => Err(CacheError::UnknownGuild(self.id.clone())),
        }
    }
}

impl UpdateCache for GuildDelete {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        debug!(id = %self.id, unavailable = self.unavailable, "Received event for Guild Delete for");
        c.delete_guild(&self.id);
        Ok(())
    }
}

impl UpdateCache for ChannelUpsert {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.cache_guild_channel(&self.guild_id, self.channel.clone());
        Ok(())
    }
}

impl UpdateCache for ChannelDelete {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.delete_guild_channel(&self.guild_id, &self.channel_id);
        Ok(())
    }
}

impl UpdateCache for RoleUpsert {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.cache_role(&self.guild_id, self.role.clone());
        Ok(())
    }
}

impl UpdateCache for RoleDelete {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.delete_role(&self.guild_id, &self.role_id);
        Ok(())
    }
}

impl UpdateCache for MemberAdd {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.cache_member(&self.guild_id, self.member.clone());
        Ok(())
    }
}

impl UpdateCache for MemberUpdate {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        debug!(id = %self.user.id, "Received event for Member Update for");
        let user = c.cache_user(self.user.clone());
        if let Some(mut member) = c.0.members.get_mut(&(self.guild_id.clone(), user.id.clone())) {
            let member = Arc::make_mut(&mut member);
            member.nick = self.nick.clone();
            member.roles = self.roles.clone();
            member.user = user;
        }
        Ok(())
    }
}

impl UpdateCache for MemberRemove {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        c.delete_member(&self.guild_id, &self.user.id);
        Ok(())
    }
}

impl UpdateCache for MemberChunk {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        if self.members.is_empty() {
            return Ok(());
        }
        info!(id = %self.guild_id, count = self.members.len(), "Received event for Guild Members Chunk for");
        c.cache_members(&self.guild_id, self.members.clone());
        Ok(())
    }
}

impl UpdateCache for User {
    fn update(&self, c: &Cache) -> Result<(), CacheError> {
        let is_current = c.current_user().map_or(false, |u| u.id == self.id);
        if is_current {
            c.cache_current_user(self.clone());
        } else {
            c.cache_user(self.clone());
        }
        Ok(())
    }
}
