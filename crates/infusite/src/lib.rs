//! `infusite` - insulin pump catheter site rotation
//!
//! This library keeps a capped history of catheter applications, suggests the
//! next insertion site, and computes usage statistics over the history.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod storage;
pub mod suggestion;
pub mod summary;

pub use catalog::{Location, Side, Zone};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{History, Record};
pub use storage::{BlobStore, MemoryStore, RecordStore, SqliteStore};
pub use suggestion::{average_interval_hours, usage_stats, SuggestionEngine, UsageStats};
