#![allow(dead_code)]

use harmony::{
    http::{Error as HttpError, Request, Response, ResponseFuture, Transport},
    models::{
        channel::{GuildChannel, TextChannel, VoiceChannel},
        events::{Event, Ready},
        guild::{Guild, Region},
        id::{ChannelId, GuildId, RegionId, RoleId, UserId},
        permissions::Permissions,
        role::Role,
        stats::Stats,
        user::{Member, User},
    },
    Config, Session,
};
use serde_json::Value;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Records every request and answers from a queue, `null` once the queue is empty
#[derive(Default)]
pub struct FakeTransport {
    requests: Mutex<Vec<Request>>,
    responses: Mutex<VecDeque<Result<Response, HttpError>>>,
}

impl FakeTransport {
    pub fn push_ok(&self, payload: Value) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(Response::new(payload)));
    }

    pub fn push_err(&self, err: HttpError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn request(&self, request: Request) -> ResponseFuture<'_> {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Response::new(Value::Null)));
        Box::pin(async move { response })
    }
}

pub const GUILD: &str = "10";
pub const OWNER: &str = "1";
pub const MEMBER: &str = "2";

pub fn user(id: &str) -> User {
    User {
        id: UserId::from(id),
        username: format!("user-{}", id),
        discriminator: "0001".into(),
        avatar: None,
        bot: false,
    }
}

pub fn role(id: &str, position: i64, permissions: Permissions) -> Role {
    Role {
        id: RoleId::from(id),
        name: id.into(),
        position,
        permissions,
        color: 0,
        hoist: false,
        managed: false,
    }
}

pub fn text(id: &str, name: &str) -> GuildChannel {
    GuildChannel::Text(TextChannel {
        id: ChannelId::from(id),
        guild_id: None,
        name: name.into(),
        topic: None,
        position: 0,
        permission_overwrites: Vec::new(),
    })
}

pub fn voice(id: &str, name: &str) -> GuildChannel {
    GuildChannel::Voice(VoiceChannel {
        id: ChannelId::from(id),
        guild_id: None,
        name: name.into(),
        position: 1,
        bitrate: Some(64000),
        user_limit: None,
        permission_overwrites: Vec::new(),
    })
}

/// Guild 10 owned by user 1. User 2 only holds the `mod` role.
pub fn guild() -> Guild {
    Guild {
        id: GuildId::from(GUILD),
        name: "Harmony".into(),
        icon: Some("abcdef".into()),
        owner_id: UserId::from(OWNER),
        region: RegionId::from("us-west"),
        afk_channel_id: Some(ChannelId::from("v1")),
        afk_timeout: 300,
        roles: vec![
            role(GUILD, 0, Permissions::READ_MESSAGES | Permissions::SEND_MESSAGES),
            role("mod", 1, Permissions::KICK_MEMBERS),
        ],
        channels: vec![text("c1", "general"), voice("v1", "lounge"), text("c2", "rules")],
        members: vec![
            Member {
                user: user(OWNER),
                roles: Vec::new(),
                nick: None,
            },
            Member {
                user: user(MEMBER),
                roles: vec![RoleId::from("mod")],
                nick: None,
            },
        ],
    }
}

pub fn config() -> Config {
    Config::default()
        .token("Bot test")
        .bucket(2, Duration::from_secs(5))
        .max_wait(Duration::from_secs(10))
}

/// A session logged in as `current_user` with guild 10 cached
pub fn session(current_user: &str) -> (Session, Arc<FakeTransport>) {
    session_with(config(), current_user)
}

pub fn session_with(config: Config, current_user: &str) -> (Session, Arc<FakeTransport>) {
    let transport = Arc::new(FakeTransport::default());
    let session = Session::new(
        config,
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::new(Stats::new().unwrap()),
    );
    session
        .update(&Event::Ready(Ready {
            user: user(current_user),
        }))
        .unwrap();
    session
        .update(&Event::GuildCreate(Box::new(guild())))
        .unwrap();
    session.cache().cache_regions(vec![Region {
        id: RegionId::from("us-west"),
        name: "US West".into(),
        vip: false,
        optimal: true,
        deprecated: false,
        custom: false,
    }]);
    (session, transport)
}
