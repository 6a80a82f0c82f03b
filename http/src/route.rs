use harmony_models::id::{GuildId, UserId};
use std::fmt::{Display, Formatter, Result as FmtResult};
use urlencoding::encode;

use crate::ratelimit::BucketKey;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Every endpoint the guild facade talks to
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Route<'a> {
    CreateBan {
        guild_id: &'a GuildId,
        user_id: &'a UserId,
        delete_message_days: u8,
    },
    CreateChannel {
        guild_id: &'a GuildId,
    },
    CreateRole {
        guild_id: &'a GuildId,
    },
    DeleteGuild {
        guild_id: &'a GuildId,
    },
    GetBans {
        guild_id: &'a GuildId,
    },
    GetVoiceRegions,
    RemoveBan {
        guild_id: &'a GuildId,
        user_id: &'a UserId,
    },
    RemoveMember {
        guild_id: &'a GuildId,
        user_id: &'a UserId,
    },
    UpdateGuild {
        guild_id: &'a GuildId,
    },
    UpdateMember {
        guild_id: &'a GuildId,
        user_id: &'a UserId,
    },
}

impl Route<'_> {
    pub const fn method(&self) -> Method {
        match self {
            Route::CreateBan { .. } => Method::Put,
            Route::CreateChannel { .. } | Route::CreateRole { .. } => Method::Post,
            Route::DeleteGuild { .. } | Route::RemoveBan { .. } | Route::RemoveMember { .. } => {
                Method::Delete
            }
            Route::GetBans { .. } | Route::GetVoiceRegions => Method::Get,
            Route::UpdateGuild { .. } | Route::UpdateMember { .. } => Method::Patch,
        }
    }

    /// The rate-limit bucket of the route. Routes under a guild are limited per guild.
    pub fn bucket(&self) -> BucketKey {
        let (route, major) = match self {
            Route::CreateBan { guild_id, .. } | Route::RemoveBan { guild_id, .. } => {
                ("guilds/{guild_id}/bans/{user_id}", Some(*guild_id))
            }
            Route::CreateChannel { guild_id } => ("guilds/{guild_id}/channels", Some(*guild_id)),
            Route::CreateRole { guild_id } => ("guilds/{guild_id}/roles", Some(*guild_id)),
            Route::DeleteGuild { guild_id } | Route::UpdateGuild { guild_id } => {
                ("guilds/{guild_id}", Some(*guild_id))
            }
            Route::GetBans { guild_id } => ("guilds/{guild_id}/bans", Some(*guild_id)),
            Route::GetVoiceRegions => ("voice/regions", None),
            Route::RemoveMember { guild_id, .. } | Route::UpdateMember { guild_id, .. } => {
                ("guilds/{guild_id}/members/{user_id}", Some(*guild_id))
            }
        };
        BucketKey {
            route,
            major: major.cloned(),
        }
    }
}

impl Display for Route<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Route::CreateBan {
                guild_id,
                user_id,
                delete_message_days,
            } => write!(
                f,
                "guilds/{}/bans/{}?delete-message-days={}",
                encode(guild_id.as_str()),
                encode(user_id.as_str()),
                delete_message_days
            ),
            Route::CreateChannel { guild_id } => {
                write!(f, "guilds/{}/channels", encode(guild_id.as_str()))
            }
            Route::CreateRole { guild_id } => write!(f, "guilds/{}/roles", encode(guild_id.as_str())),
            Route::DeleteGuild { guild_id } | Route::UpdateGuild { guild_id } => {
                write!(f, "guilds/{}", encode(guild_id.as_str()))
            }
            Route::GetBans { guild_id } => write!(f, "guilds/{}/bans", encode(guild_id.as_str())),
            Route::GetVoiceRegions => f.write_str("voice/regions"),
            Route::RemoveBan { guild_id, user_id } => write!(
                f,
                "guilds/{}/bans/{}",
                encode(guild_id.as_str()),
                encode(user_id.as_str())
            ),
            Route::RemoveMember { guild_id, user_id } | Route::UpdateMember { guild_id, user_id } => {
                write!(
                    f,
                    "guilds/{}/members/{}",
                    encode(guild_id.as_str()),
                    encode(user_id.as_str())
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_and_buckets() {
        let guild_id = GuildId::from("81384788765712384");
        let user_id = UserId::from("80351110224678912");
        let ban = Route::CreateBan {
            guild_id: &guild_id,
            user_id: &user_id,
            delete_message_days: 7,
        };
        assert_eq!(
            ban.to_string(),
            "guilds/81384788765712384/bans/80351110224678912?delete-message-days=7"
        );
        assert_eq!(ban.method(), Method::Put);

        let pardon = Route::RemoveBan {
            guild_id: &guild_id,
            user_id: &user_id,
        };
        assert_eq!(ban.bucket(), pardon.bucket());
        assert_eq!(pardon.bucket().major, Some(guild_id.clone()));
        assert_eq!(Route::GetVoiceRegions.bucket().major, None);
    }

    #[test]
    fn ids_are_escaped() {
        let guild_id = GuildId::from("a/b");
        assert_eq!(Route::GetBans { guild_id: &guild_id }.to_string(), "guilds/a%2Fb/bans");
    }
}
