#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod channel;
pub mod events;
pub mod guild;
pub mod id;
pub mod permissions;
pub mod role;
pub mod stats;
pub mod user;
