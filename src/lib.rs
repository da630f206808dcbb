//! Prayer clock: a browser client that keeps a prayer-time board current
//! against a time service, plus the offline cache used by its service worker.
//!
//! The engine ([`poller`], [`view_model`], [`format`], [`preferences`]) is
//! plain Rust behind small traits ([`http::HttpClient`], [`clock::WallClock`],
//! [`chime::Chime`], [`preferences::KeyValueStore`]), so it runs the same in
//! the browser and under `cargo test`.

pub mod chime;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod geolocation;
pub mod http;
pub mod logging;
pub mod payload;
pub mod poller;
pub mod preferences;
pub mod scheduler;
pub mod view_model;
pub mod worker;
