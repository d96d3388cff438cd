//! Severity-partitioned logging.
//!
//! A [`LeveledRouter`](router::LeveledRouter) owns one rotating JSON file
//! per severity (`debug.log`, `info.log`, `warn.log`, `error.log`) plus an
//! optional console mirror, and fans every record out to exactly the
//! destinations whose predicate accepts it. The router can be installed
//! process-wide ([`global`]), handed around explicitly, or fed from
//! `tracing` through [`layer::LeveledLayer`].

pub mod level;
pub mod record;
pub mod encoder;
pub mod sink;
pub mod rotate;
pub mod file_sink;
pub mod console_sink;
pub mod memory_sink;
pub mod noop_sink;
pub mod router;
pub mod layer;

pub mod config;
pub mod env;
pub mod global;
pub mod init;

#[cfg(feature = "scaffold")]
pub mod command;
#[cfg(feature = "scaffold")]
pub mod template;
#[cfg(feature = "scaffold")]
pub mod scaffold;
