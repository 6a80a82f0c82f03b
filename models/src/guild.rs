use serde::{Deserialize, Serialize};

use crate::{
    channel::GuildChannel,
    id::{ChannelId, GuildId, RegionId, UserId},
    role::Role,
    user::Member,
};

/// A guild as delivered by the service, either on creation or as the
/// response to a guild mutation
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Guild {
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
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub channels: Vec<GuildChannel>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    #[serde(default)]
    pub vip: bool,
    #[serde(default)]
    pub optimal: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub custom: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    pub const fn mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
        }
    }
}

/// A guild icon to upload
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Image {
    /// Clears the current icon
    Remove,
    Data { format: ImageFormat, bytes: Vec<u8> },
}

impl Image {
    pub fn png(bytes: impl Into<Vec<u8>>) -> Self {
        Image::Data {
            format: ImageFormat::Png,
            bytes: bytes.into(),
        }
    }

    pub fn jpeg(bytes: impl Into<Vec<u8>>) -> Self {
        Image::Data {
            format: ImageFormat::Jpeg,
            bytes: bytes.into(),
        }
    }

    /// The value sent in the `icon` field, `None` meaning an explicit null
    pub fn to_data_uri(&self) -> Option<String> {
        match self {
            Image::Remove => None,
            Image::Data { format, bytes } => Some(format!(
                "data:{};base64,{}",
                format.mime(),
                base64::encode(bytes)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_data_uri() {
        assert_eq!(
            Image::png(b"abc".to_vec()).to_data_uri().as_deref(),
            Some("data:image/png;base64,YWJj")
        );
        assert_eq!(Image::Remove.to_data_uri(), None);
    }

    #[test]
    fn guild_payload_without_collections() {
        let guild: Guild = serde_json::from_str(
            r#"{"id":"1","name":"Harmony","owner_id":"5","region":"us-west","afk_timeout":300}"#,
        )
        .unwrap();
        assert!(guild.roles.is_empty());
        assert_eq!(guild.afk_channel_id, None);
        assert_eq!(guild.afk_timeout, 300);
    }
}
