#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::implicit_hasher,
    clippy::missing_panics_doc
)]

mod event;
mod models;
mod permission;

use dashmap::{mapref::entry::Entry, DashMap};
use harmony_models::{
    channel::GuildChannel,
    guild::{Guild, Region},
    id::{ChannelId, GuildId, RegionId, RoleId, UserId},
    permissions::Permissions,
    role::Role,
    stats::Stats,
    user::{Member, User},
};
use std::{
    collections::{HashMap, HashSet},
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    hash::Hash,
    sync::{Arc, Mutex},
};

pub use event::UpdateCache;
pub use models::{guild::CachedGuild, member::CachedMember, role::CachedRole};
pub use permission::{channel_permissions, guild_wide_permissions};

/// Append an id to the ordered list of a guild's resources
fn push_guild_item<V: PartialEq>(map: &DashMap<GuildId, Vec<V>>, guild: &GuildId, v: V) {
    let mut items = map.entry(guild.clone()).or_insert_with(Vec::new);
    if !items.contains(&v) {
        items.push(v);
    }
}

fn remove_guild_item<V: PartialEq>(map: &DashMap<GuildId, Vec<V>>, guild: &GuildId, v: &V) {
    if let Some(mut items) = map.get_mut(guild) {
        items.retain(|i| i != v);
    }
}

/// The ids listed for a guild that are missing from `keep`
fn stale_items<V: Clone + Eq + Hash>(map: &DashMap<GuildId, Vec<V>>, guild: &GuildId, keep: &HashSet<&V>) -> Vec<V> {
    map.get(guild).map_or_else(Vec::new, |items| {
        items.iter().filter(|i| !keep.contains(i)).cloned().collect()
    })
}

/// Add or modify an element that maps the resource ids to their respective structures.
/// The flag is set when the key was not present before.
fn upsert_item<K: Eq + Hash, V: PartialEq>(map: &DashMap<K, Arc<V>>, k: K, v: V) -> (Arc<V>, bool) {
    match map.entry(k) {
        Entry::Occupied(e) if **e.get() == v => (Arc::clone(e.get()), false),
        Entry::Occupied(mut e) => {
            let v = Arc::new(v);
            e.insert(Arc::clone(&v));
            (v, false)
        }
        Entry::Vacant(e) => {
            let v = Arc::new(v);
            e.insert(Arc::clone(&v));
            (v, true)
        }
    }
}

pub struct CacheRef {
    guilds: DashMap<GuildId, Arc<CachedGuild>>,
    channels: DashMap<(GuildId, ChannelId), Arc<GuildChannel>>,
    members: DashMap<(GuildId, UserId), Arc<CachedMember>>,
    roles: DashMap<(GuildId, RoleId), Arc<CachedRole>>,
    users: DashMap<UserId, Arc<User>>,
    regions: DashMap<RegionId, Arc<Region>>,

    guild_channels: DashMap<GuildId, Vec<ChannelId>>,
    guild_members: DashMap<GuildId, Vec<UserId>>,
    guild_roles: DashMap<GuildId, Vec<RoleId>>,

    current_user: Mutex<Option<Arc<User>>>,

    stats: Arc<Stats>,
}

/// A wrapper around the structure holding all the cached entities, cheap to clone and share across tasks.
///
/// Reads never block each other. Writes lock only the shard of the collection being touched.
#[derive(Clone)]
pub struct Cache(Arc<CacheRef>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// An update referenced a guild that was never cached
    UnknownGuild(GuildId),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CacheError::UnknownGuild(id) => write!(f, "Guild {} is not present in the cache", id),
        }
    }
}

impl StdError for CacheError {}

impl Cache {
    #[must_use]
    pub fn new(stats: Arc<Stats>) -> Self {
        Self(Arc::new(CacheRef {
            guilds: DashMap::new(),
            channels: DashMap::new(),
            members: DashMap::new(),
            roles: DashMap::new(),
            users: DashMap::new(),
            regions: DashMap::new(),
            guild_channels: DashMap::new(),
            guild_members: DashMap::new(),
            guild_roles: DashMap::new(),
            current_user: Mutex::new(None),
            stats,
        }))
    }

    pub fn stats(&self) -> &Arc<Stats> {
        &self.0.stats
    }

    /// Returns the user this session is authenticated as
    pub fn current_user(&self) -> Option<Arc<User>> {
        self.0
            .current_user
            .lock()
            .expect("current user poisoned")
            .clone()
    }

    /// Get an immutable reference to the guild struct
    pub fn guild(&self, guild_id: &GuildId) -> Option<Arc<CachedGuild>> {
        self.0.guilds.get(guild_id).map(|g| Arc::clone(g.value()))
    }

    /// Get a list of all guild ids inside the cache
    pub fn guilds(&self) -> Vec<GuildId> {
        self.0.guilds.iter().map(|g| g.key().clone()).collect()
    }

    /// Get a channel of a guild, text or voice
    pub fn channel(&self, guild_id: &GuildId, channel_id: &ChannelId) -> Option<Arc<GuildChannel>> {
        self.0
            .channels
            .get(&(guild_id.clone(), channel_id.clone()))
            .map(|c| Arc::clone(c.value()))
    }

    /// Get the channels of a guild in the order they were first cached
    pub fn guild_channels(&self, guild_id: &GuildId) -> Vec<Arc<GuildChannel>> {
        let ids = self
            .0
            .guild_channels
            .get(guild_id)
            .map_or_else(Vec::new, |gc| gc.value().clone());
        ids.iter()
            .filter_map(|id| self.channel(guild_id, id))
            .collect()
    }

    /// Get an immutable reference to a certain user in a certain guild
    pub fn member(&self, guild_id: &GuildId, user_id: &UserId) -> Option<Arc<CachedMember>> {
        self.0
            .members
            .get(&(guild_id.clone(), user_id.clone()))
            .map(|m| Arc::clone(m.value()))
    }

    /// Get the members of a guild in the order they were first cached
    pub fn members(&self, guild_id: &GuildId) -> Vec<Arc<CachedMember>> {
        let ids = self
            .0
            .guild_members
            .get(guild_id)
            .map_or_else(Vec::new, |gm| gm.value().clone());
        ids.iter()
            .filter_map(|id| self.member(guild_id, id))
            .collect()
    }

    pub fn role(&self, guild_id: &GuildId, role_id: &RoleId) -> Option<Arc<CachedRole>> {
        self.0
            .roles
            .get(&(guild_id.clone(), role_id.clone()))
            .map(|r| Arc::clone(r.value()))
    }

    /// Get the roles of a guild in the order they were first cached
    pub fn guild_roles(&self, guild_id: &GuildId) -> Vec<Arc<CachedRole>> {
        let ids = self
            .0
            .guild_roles
            .get(guild_id)
            .map_or_else(Vec::new, |gr| gr.value().clone());
        ids.iter()
            .filter_map(|id| self.role(guild_id, id))
            .collect()
    }

    /// Get an immutable reference to a certain user
    pub fn user(&self, user_id: &UserId) -> Option<Arc<User>> {
        self.0.users.get(user_id).map(|u| Arc::clone(u.value()))
    }

    pub fn region(&self, region_id: &RegionId) -> Option<Arc<Region>> {
        self.0.regions.get(region_id).map(|r| Arc::clone(r.value()))
    }

    pub fn regions(&self) -> Vec<Arc<Region>> {
        self.0.regions.iter().map(|r| Arc::clone(r.value())).collect()
    }

    /// Update a resource inside a cache
    pub fn update<T: UpdateCache>(&self, value: &T) -> Result<(), CacheError> {
        value.update(self)
    }

    /// The guild wide permissions of a member, `None` when the guild or the member is not cached
    pub fn member_permissions(&self, guild_id: &GuildId, user_id: &UserId) -> Option<Permissions> {
        let guild = self.guild(guild_id)?;
        if guild.owner_id == *user_id {
            return Some(Permissions::all());
        }
        let member = self.member(guild_id, user_id)?;
        let roles = self.role_map(guild_id);
        Some(guild_wide_permissions(&guild, &roles, user_id, &member.roles))
    }

    /// The permissions of a member inside one channel of the guild
    pub fn member_channel_permissions(
        &self,
        guild_id: &GuildId,
        user_id: &UserId,
        channel_id: &ChannelId,
    ) -> Option<Permissions> {
        let guild = self.guild(guild_id)?;
        let channel = self.channel(guild_id, channel_id)?;
        if guild.owner_id == *user_id {
            return Some(Permissions::all());
        }
        let member = self.member(guild_id, user_id)?;
        let roles = self.role_map(guild_id);
        Some(channel_permissions(
            &guild,
            &roles,
            user_id,
            &member.roles,
            channel.permission_overwrites(),
        ))
    }

    fn role_map(&self, guild_id: &GuildId) -> HashMap<RoleId, Arc<CachedRole>> {
        self.guild_roles(guild_id)
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect()
    }

    pub fn cache_current_user(&self, current_user: User) {
        let user = self.cache_user(current_user);
        let mut current = self.0.current_user.lock().expect("current user poisoned");
        *current = Some(user);
    }

    pub fn cache_user(&self, user: User) -> Arc<User> {
        match self.0.users.get(&user.id) {
            Some(u) if **u == user => return Arc::clone(&u),
            _ => {}
        }

        let user = Arc::new(user);
        if self.0.users.insert(user.id.clone(), Arc::clone(&user)).is_none() {
            self.0.stats.resource_counts.users.inc();
        }
        user
    }

    pub fn cache_guild_channel(&self, guild: &GuildId, mut channel: GuildChannel) -> Arc<GuildChannel> {
        if channel.guild_id().is_none() {
            channel.set_guild_id(guild.clone());
        }
        let id = channel.id().clone();
        let (cached, new) = upsert_item(&self.0.channels, (guild.clone(), id.clone()), channel);
        if new {
            push_guild_item(&self.0.guild_channels, guild, id);
            self.0.stats.resource_counts.channels.inc();
        }
        cached
    }

    fn cache_guild_channels(&self, guild: &GuildId, channels: impl IntoIterator<Item = GuildChannel>) {
        for channel in channels {
            self.cache_guild_channel(guild, channel);
        }
    }

    pub fn cache_role(&self, guild: &GuildId, role: Role) -> Arc<CachedRole> {
        let role = CachedRole::from_role(guild.clone(), role);
        let id = role.id.clone();
        let (cached, new) = upsert_item(&self.0.roles, (guild.clone(), id.clone()), role);
        if new {
            push_guild_item(&self.0.guild_roles, guild, id);
            self.0.stats.resource_counts.roles.inc();
        }
        cached
    }

    fn cache_roles(&self, guild: &GuildId, roles: impl IntoIterator<Item = Role>) {
        for role in roles {
            self.cache_role(guild, role);
        }
    }

    pub fn cache_member(&self, guild: &GuildId, member: Member) -> Arc<CachedMember> {
        let key = (guild.clone(), member.user.id.clone());
        match self.0.members.get(&key) {
            Some(m) if **m == member => return Arc::clone(&m),
            _ => {}
        }

        let user = self.cache_user(member.user);
        let cached = Arc::new(CachedMember {
            roles: member.roles,
            nick: member.nick,
            user,
        });
        if self.0.members.insert(key, Arc::clone(&cached)).is_none() {
            push_guild_item(&self.0.guild_members, guild, cached.user.id.clone());
        }
        cached
    }

    fn cache_members(&self, guild: &GuildId, members: impl IntoIterator<Item = Member>) {
        for member in members {
            self.cache_member(guild, member);
        }
    }

    /// Replace the role assignments of a cached member, returns `false` if the member is not cached
    pub fn cache_member_roles(&self, guild: &GuildId, user: &UserId, roles: Vec<RoleId>) -> bool {
        match self.0.members.get_mut(&(guild.clone(), user.clone())) {
            Some(mut member) => {
                let member = Arc::make_mut(&mut member);
                member.roles = roles;
                true
            }
            None => false,
        }
    }

    pub fn cache_regions(&self, regions: impl IntoIterator<Item = Region>) {
        for region in regions {
            self.0.regions.insert(region.id.clone(), Arc::new(region));
        }
    }

    /// Record a new owner for a cached guild
    pub fn set_guild_owner(&self, guild_id: &GuildId, owner_id: UserId) -> Result<(), CacheError> {
        let mut guild = self
            .0
            .guilds
            .get_mut(guild_id)
            .ok_or_else(|| CacheError::UnknownGuild(guild_id.clone()))?;
        Arc::make_mut(&mut guild).owner_id = owner_id;
        Ok(())
    }

    fn cache_guild(&self, guild: Guild) -> Option<Arc<CachedGuild>> {
        let guild_id = guild.id.clone();
        let cached = CachedGuild::from(&guild);

        // A guild create is a full snapshot, anything it does not list is gone
        let channel_ids = guild.channels.iter().map(GuildChannel::id).collect::<HashSet<_>>();
        for id in stale_items(&self.0.guild_channels, &guild_id, &channel_ids) {
            self.delete_guild_channel(&guild_id, &id);
        }
        let role_ids = guild.roles.iter().map(|r| &r.id).collect::<HashSet<_>>();
        for id in stale_items(&self.0.guild_roles, &guild_id, &role_ids) {
            self.delete_role(&guild_id, &id);
        }

        self.cache_guild_channels(&guild_id, guild.channels);
        self.cache_roles(&guild_id, guild.roles);
        self.cache_members(&guild_id, guild.members);

        let old = self.0.guilds.insert(guild_id, Arc::new(cached));
        if old.is_none() {
            self.0.stats.resource_counts.guilds.inc();
        }
        old
    }

    fn delete_guild_channel(&self, guild: &GuildId, channel_id: &ChannelId) -> Option<Arc<GuildChannel>> {
        let (_, channel) = self.0.channels.remove(&(guild.clone(), channel_id.clone()))?;
        remove_guild_item(&self.0.guild_channels, guild, channel_id);
        self.0.stats.resource_counts.channels.dec();
        Some(channel)
    }

    fn delete_role(&self, guild: &GuildId, role_id: &RoleId) -> Option<Arc<CachedRole>> {
        let (_, role) = self.0.roles.remove(&(guild.clone(), role_id.clone()))?;
        remove_guild_item(&self.0.guild_roles, guild, role_id);
        self.0.stats.resource_counts.roles.dec();
        Some(role)
    }

    fn delete_member(&self, guild: &GuildId, user_id: &UserId) -> Option<Arc<CachedMember>> {
        let (_, member) = self.0.members.remove(&(guild.clone(), user_id.clone()))?;
        remove_guild_item(&self.0.guild_members, guild, user_id);
        Some(member)
    }

    fn delete_guild(&self, guild_id: &GuildId) -> Option<Arc<CachedGuild>> {
        let guild = self.0.guilds.remove(guild_id).map(|(_, g)| g);
        if let Some((_, ids)) = self.0.guild_channels.remove(guild_id) {
            for id in ids {
                if self.0.channels.remove(&(guild_id.clone(), id)).is_some() {
                    self.0.stats.resource_counts.channels.dec();
                }
            }
        }
        if let Some((_, ids)) = self.0.guild_roles.remove(guild_id) {
            for id in ids {
                if self.0.roles.remove(&(guild_id.clone(), id)).is_some() {
                    self.0.stats.resource_counts.roles.dec();
                }
            }
        }
        if let Some((_, ids)) = self.0.guild_members.remove(guild_id) {
            for id in ids {
                self.0.members.remove(&(guild_id.clone(), id));
            }
        }
        if guild.is_some() {
            self.0.stats.resource_counts.guilds.dec();
        }
        guild
    }
}
