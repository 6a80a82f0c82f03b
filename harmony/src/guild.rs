use harmony_cache::{CachedGuild, CachedRole};
use harmony_http::{RatelimitMode, Route};
use harmony_models::{
    channel::{ChannelType, GuildChannel},
    events::GuildUpdate,
    guild::{Guild as GuildPayload, Image, Region},
    id::{ChannelId, GuildId, RegionId, RoleId, UserId},
    permissions::Permissions,
    role::Role,
    user::{Ban, User},
};
use serde_json::{json, Map, Value};
use std::{ops::RangeInclusive, sync::Arc};
use tracing::{debug, warn};

use crate::{
    error::{Error, ErrorKind},
    session::Session,
};

const BAN_DELETE_DAYS: RangeInclusive<u8> = 0..=7;
const NAME_LENGTH: RangeInclusive<usize> = 2..=100;

/// The fields of a guild to change. Fields left as `None` are not touched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuildEdit {
    pub name: Option<String>,
    pub region: Option<RegionId>,
    pub icon: Option<Image>,
    /// `Some(None)` removes the AFK channel
    pub afk_channel_id: Option<Option<ChannelId>>,
    pub afk_timeout: Option<u32>,
}

impl GuildEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn region(mut self, region: impl Into<RegionId>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn icon(mut self, icon: Image) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn afk_channel(mut self, channel: Option<ChannelId>) -> Self {
        self.afk_channel_id = Some(channel);
        self
    }

    pub fn afk_timeout(mut self, seconds: u32) -> Self {
        self.afk_timeout = Some(seconds);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.region.is_none()
            && self.icon.is_none()
            && self.afk_channel_id.is_none()
            && self.afk_timeout.is_none()
    }

    fn into_body(self) -> Value {
        let mut body = Map::new();
        if let Some(name) = self.name {
            body.insert("name".into(), Value::String(name));
        }
        if let Some(region) = self.region {
            body.insert("region".into(), Value::String(region.0));
        }
        if let Some(icon) = self.icon {
            body.insert("icon".into(), icon.to_data_uri().map_or(Value::Null, Value::String));
        }
        if let Some(afk_channel) = self.afk_channel_id {
            body.insert(
                "afk_channel_id".into(),
                afk_channel.map_or(Value::Null, |c| Value::String(c.0)),
            );
        }
        if let Some(timeout) = self.afk_timeout {
            body.insert("afk_timeout".into(), Value::from(timeout));
        }
        Value::Object(body)
    }
}

/// A handle on one guild of a [`Session`].
///
/// Accessors read the session cache and never touch the network. Mutations
/// validate their arguments, check the permissions of the current user against
/// the cache, pass the rate-limit gate and only then reach the transport. The
/// cache is merged with the server's answer once the call is acknowledged.
#[derive(Clone)]
pub struct Guild {
    session: Session,
    id: GuildId,
    mode: RatelimitMode,
}

impl Guild {
    pub(crate) fn new(session: Session, id: GuildId, mode: RatelimitMode) -> Self {
        Self { session, id, mode }
    }

    /// Use a different rate-limit mode for the calls made through this handle
    #[must_use]
    pub fn ratelimit_mode(mut self, mode: RatelimitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn id(&self) -> &GuildId {
        &self.id
    }

    fn cached(&self) -> Result<Arc<CachedGuild>, Error> {
        self.session
            .cache()
            .guild(&self.id)
            .ok_or_else(|| Error::not_found(format!("guild {}", self.id)))
    }

    pub fn name(&self) -> Option<String> {
        self.session.cache().guild(&self.id).map(|g| g.name.clone())
    }

    pub fn owner_id(&self) -> Option<UserId> {
        self.session.cache().guild(&self.id).map(|g| g.owner_id.clone())
    }

    /// The owner of the guild, failing when the owner is not a cached member
    pub fn owner(&self) -> Result<Arc<User>, Error> {
        let guild = self.cached()?;
        self.user_by_id(&guild.owner_id)
            .ok_or_else(|| Error::not_found(format!("owner {} of guild {}", guild.owner_id, self.id)))
    }

    pub fn icon(&self) -> Option<String> {
        self.session.cache().guild(&self.id).and_then(|g| g.icon.clone())
    }

    pub fn icon_url(&self) -> Option<String> {
        let icon = self.icon()?;
        Some(format!(
            "{}/icons/{}/{}.jpg",
            self.session.config().cdn_base,
            self.id,
            icon
        ))
    }

    pub fn afk_timeout(&self) -> Option<u32> {
        self.session.cache().guild(&self.id).map(|g| g.afk_timeout)
    }

    pub fn afk_channel(&self) -> Option<Arc<GuildChannel>> {
        let channel_id = self.session.cache().guild(&self.id)?.afk_channel_id.clone()?;
        self.voice_channel_for_id(&channel_id)
    }

    pub fn region(&self) -> Option<Arc<Region>> {
        let guild = self.session.cache().guild(&self.id)?;
        self.session.cache().region(&guild.region)
    }

    /// Text channels, in cache order
    pub fn channels(&self) -> Vec<Arc<GuildChannel>> {
        self.session
            .cache()
            .guild_channels(&self.id)
            .into_iter()
            .filter(|c| matches!(c.as_ref(), GuildChannel::Text(_)))
            .collect()
    }

    pub fn channel_by_id(&self, channel_id: &ChannelId) -> Option<Arc<GuildChannel>> {
        self.session
            .cache()
            .channel(&self.id, channel_id)
            .filter(|c| matches!(c.as_ref(), GuildChannel::Text(_)))
    }

    /// Voice channels, in cache order
    pub fn voice_channels(&self) -> Vec<Arc<GuildChannel>> {
        self.session
            .cache()
            .guild_channels(&self.id)
            .into_iter()
            .filter(|c| matches!(c.as_ref(), GuildChannel::Voice(_)))
            .collect()
    }

    pub fn voice_channel_for_id(&self, channel_id: &ChannelId) -> Option<Arc<GuildChannel>> {
        self.session
            .cache()
            .channel(&self.id, channel_id)
            .filter(|c| matches!(c.as_ref(), GuildChannel::Voice(_)))
    }

    /// Members of the guild, in cache order
    pub fn users(&self) -> Vec<Arc<User>> {
        self.session
            .cache()
            .members(&self.id)
            .iter()
            .map(|m| Arc::clone(&m.user))
            .collect()
    }

    pub fn user_by_id(&self, user_id: &UserId) -> Option<Arc<User>> {
        self.session
            .cache()
            .member(&self.id, user_id)
            .map(|m| Arc::clone(&m.user))
    }

    /// Roles of the guild, in cache order
    pub fn roles(&self) -> Vec<Arc<CachedRole>> {
        self.session.cache().guild_roles(&self.id)
    }

    pub fn role_for_id(&self, role_id: &RoleId) -> Option<Arc<CachedRole>> {
        self.session.cache().role(&self.id, role_id)
    }

    /// Guild wide permissions of a member as far as the cache knows
    pub fn permissions_for(&self, user_id: &UserId) -> Option<Permissions> {
        self.session.cache().member_permissions(&self.id, user_id)
    }

    /// Permissions of the current user inside one channel
    pub fn permissions_in(&self, channel_id: &ChannelId) -> Option<Permissions> {
        let user = self.session.cache().current_user()?;
        self.session
            .cache()
            .member_channel_permissions(&self.id, &user.id, channel_id)
    }

    /// Fail fast when the cache says the current user lacks `needed`.
    /// Without enough cached state the decision is left to the server.
    fn require(&self, needed: Permissions) -> Result<(), Error> {
        let user = match self.session.cache().current_user() {
            Some(user) => user,
            None => {
                debug!(guild = %self.id, "Current user unknown, skipping permission check");
                return Ok(());
            }
        };
        match self.permissions_for(&user.id) {
            Some(permissions) if permissions.contains(needed) => Ok(()),
            Some(permissions) => {
                debug!(guild = %self.id, needed = ?needed, "Missing permissions");
                Err(Error::missing_permissions(needed - permissions))
            }
            None => {
                debug!(guild = %self.id, user = %user.id, "Member not cached, skipping permission check");
                Ok(())
            }
        }
    }

    pub async fn create_role(&self) -> Result<Arc<CachedRole>, Error> {
        self.require(Permissions::MANAGE_ROLES)?;
        let role = self
            .session
            .execute_as::<Role>(Route::CreateRole { guild_id: &self.id }, None, self.mode)
            .await?;
        Ok(self.session.cache().cache_role(&self.id, role))
    }

    /// The users banned from the guild. The server decides whether the caller may see them.
    pub async fn banned_users(&self) -> Result<Vec<User>, Error> {
        let bans = self
            .session
            .execute_as::<Vec<Ban>>(Route::GetBans { guild_id: &self.id }, None, self.mode)
            .await?;
        Ok(bans.into_iter().map(|b| b.user).collect())
    }

    pub async fn ban_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.ban_user_with_days(user_id, 0).await
    }

    /// Ban a user, deleting their messages of the last `delete_message_days` days (0 to 7)
    pub async fn ban_user_with_days(&self, user_id: &UserId, delete_message_days: u8) -> Result<(), Error> {
        if !BAN_DELETE_DAYS.contains(&delete_message_days) {
            return Err(Error::invalid_argument(format!(
                "delete_message_days must be between 0 and 7, got {}",
                delete_message_days
            )));
        }
        self.require(Permissions::BAN_MEMBERS)?;
        self.session
            .execute(
                Route::CreateBan {
                    guild_id: &self.id,
                    user_id,
                    delete_message_days,
                },
                None,
                self.mode,
            )
            .await?;
        Ok(())
    }

    pub async fn pardon_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.require(Permissions::BAN_MEMBERS)?;
        self.session
            .execute(
                Route::RemoveBan {
                    guild_id: &self.id,
                    user_id,
                },
                None,
                self.mode,
            )
            .await?;
        Ok(())
    }

    pub async fn kick_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.require(Permissions::KICK_MEMBERS)?;
        self.session
            .execute(
                Route::RemoveMember {
                    guild_id: &self.id,
                    user_id,
                },
                None,
                self.mode,
            )
            .await?;
        Ok(())
    }

    /// Replace every role of a member with `role_ids`
    pub async fn edit_user_roles(&self, user_id: &UserId, role_ids: &[RoleId]) -> Result<(), Error> {
        let unknown = role_ids
            .iter()
            .filter(|id| self.role_for_id(id).is_none())
            .map(RoleId::as_str)
            .collect::<Vec<_>>();
        if !unknown.is_empty() {
            return Err(Error::invalid_argument(format!(
                "unknown roles in guild {}: {}",
                self.id,
                unknown.join(", ")
            )));
        }
        self.require(Permissions::MANAGE_ROLES)?;

        self.session
            .execute(
                Route::UpdateMember {
                    guild_id: &self.id,
                    user_id,
                },
                Some(json!({ "roles": role_ids })),
                self.mode,
            )
            .await?;

        if !self
            .session
            .cache()
            .cache_member_roles(&self.id, user_id, role_ids.to_vec())
        {
            debug!(guild = %self.id, user = %user_id, "Edited roles of a member missing from the cache");
        }
        Ok(())
    }

    /// Change the guild settings named in `edit`. An empty edit does nothing.
    pub async fn edit(&self, edit: GuildEdit) -> Result<(), Error> {
        if edit.is_empty() {
            debug!(guild = %self.id, "Empty guild edit, nothing to send");
            return Ok(());
        }
        if let Some(name) = &edit.name {
            validate_name(name)?;
        }
        if let Some(region) = &edit.region {
            if region.as_str().is_empty() {
                return Err(Error::invalid_argument("region must not be empty"));
            }
        }
        if let Some(Some(channel_id)) = &edit.afk_channel_id {
            if self.voice_channel_for_id(channel_id).is_none() {
                return Err(Error::invalid_argument(format!(
                    "{} is not a voice channel of guild {}",
                    channel_id, self.id
                )));
            }
        }
        self.require(Permissions::MANAGE_SERVER)?;

        let payload = self
            .session
            .execute(
                Route::UpdateGuild { guild_id: &self.id },
                Some(edit.into_body()),
                self.mode,
            )
            .await?;
        match serde_json::from_value::<GuildPayload>(payload) {
            Ok(guild) => {
                if let Err(why) = self.session.cache().update(&GuildUpdate::from(&guild)) {
                    warn!(guild = %self.id, reason = %why, "Could not merge edited guild");
                }
            }
            Err(why) => {
                warn!(guild = %self.id, reason = %why, "Edited guild acknowledged without a guild body");
            }
        }
        Ok(())
    }

    /// Delete the guild when the current user owns it, leave it otherwise.
    /// A guild that is already gone counts as success.
    pub async fn delete_or_leave(&self) -> Result<(), Error> {
        let result = self
            .session
            .execute(Route::DeleteGuild { guild_id: &self.id }, None, self.mode)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) if matches!(err.kind(), ErrorKind::NotFound { .. }) => {
                debug!(guild = %self.id, "Guild already gone");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn create_channel(&self, name: &str) -> Result<Arc<GuildChannel>, Error> {
        self.create_guild_channel(name, ChannelType::Text).await
    }

    pub async fn create_voice_channel(&self, name: &str) -> Result<Arc<GuildChannel>, Error> {
        self.create_guild_channel(name, ChannelType::Voice).await
    }

    async fn create_guild_channel(&self, name: &str, kind: ChannelType) -> Result<Arc<GuildChannel>, Error> {
        validate_name(name)?;
        self.require(Permissions::MANAGE_CHANNELS)?;

        let channel = self
            .session
            .execute_as::<GuildChannel>(
                Route::CreateChannel { guild_id: &self.id },
                Some(json!({ "name": name, "type": kind })),
                self.mode,
            )
            .await?;
        Ok(self.session.cache().cache_guild_channel(&self.id, channel))
    }

    /// Hand the guild over to another member. Concurrent transfers race at the
    /// server, callers are expected to serialize them.
    pub async fn transfer_ownership(&self, new_owner_id: &UserId) -> Result<(), Error> {
        if self.session.cache().member(&self.id, new_owner_id).is_none() {
            return Err(Error::invalid_argument(format!(
                "{} is not a member of guild {}",
                new_owner_id, self.id
            )));
        }
        let guild = self.cached()?;
        if let Some(user) = self.session.cache().current_user() {
            if user.id != guild.owner_id {
                debug!(guild = %self.id, "Only the owner can transfer the guild");
                return Err(Error::owner_only());
            }
        }

        let payload = self
            .session
            .execute(
                Route::UpdateGuild { guild_id: &self.id },
                Some(json!({ "owner_id": new_owner_id })),
                self.mode,
            )
            .await?;

        let merged = match serde_json::from_value::<GuildPayload>(payload) {
            Ok(guild) => self.session.cache().update(&GuildUpdate::from(&guild)),
            Err(_) => self.session.cache().set_guild_owner(&self.id, new_owner_id.clone()),
        };
        if let Err(why) = merged {
            warn!(guild = %self.id, reason = %why, "Could not merge new owner");
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    let length = name.chars().count();
    if NAME_LENGTH.contains(&length) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "name must be between 2 and 100 characters, got {}",
            length
        )))
    }
}

