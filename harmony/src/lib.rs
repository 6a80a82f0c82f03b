#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod config;
pub mod error;
pub mod guild;
pub mod session;

pub use config::{Config, ConfigError};
pub use error::{Error, ErrorKind};
pub use guild::{Guild, GuildEdit};
pub use session::Session;

pub use harmony_cache as cache;
pub use harmony_http as http;
pub use harmony_models as models;
