use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Server assigned id of a guild
    GuildId
);
opaque_id!(
    /// Id of a text or voice channel, unique within its guild
    ChannelId
);
opaque_id!(RoleId);
opaque_id!(UserId);
opaque_id!(
    /// Voice region identifier such as `us-west`
    RegionId
);

impl GuildId {
    /// The `@everyone` role of a guild shares the id of the guild itself
    pub fn everyone_role(&self) -> RoleId {
        RoleId(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everyone_role_shares_guild_id() {
        let guild = GuildId::new("81384788765712384");
        assert_eq!(guild.everyone_role(), RoleId::from("81384788765712384"));
    }

    #[test]
    fn ids_are_transparent_strings() {
        let id: UserId = serde_json::from_str("\"80351110224678912\"").unwrap();
        assert_eq!(id.as_str(), "80351110224678912");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"80351110224678912\"");
    }
}
