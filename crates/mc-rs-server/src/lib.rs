//! Server-side glue for container windows: configuration, logging, player
//! sessions and crash dumps.

pub mod config;
pub mod crash_dump;
pub mod logging;
pub mod session;

pub use config::{ConfigError, ServerConfig};
pub use crash_dump::{install_panic_hook, CrashDump, CrashDumpError, CrashError};
pub use session::{EntityIds, PlayerSession, SessionSnapshot};
