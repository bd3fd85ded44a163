//! Polling a Herpstat SpyderWeb and decoding its status.
//!
//! A [`PollCoordinator`] is asked for a fresh reading by whoever serves the
//! metrics. It consults the [`RateGate`], fetches `/RAWSTATUS` through a
//! [`RetryingFetcher`], decodes the body into a [`Snapshot`] and publishes
//! it to the [`SnapshotCache`]. Nothing here runs on its own schedule.

pub mod cache;
pub mod clock;
pub mod config;
pub mod data;
pub mod decoder;
pub mod fetcher;
pub mod gate;
pub mod poller;

// Re-export commonly used items
pub use cache::SnapshotCache;
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::DeviceConfig;
pub use data::{OutputInfo, Snapshot, SystemInfo};
pub use decoder::decode;
pub use fetcher::{HttpStatusSource, RetryPolicy, RetryingFetcher, StatusSource};
pub use gate::RateGate;
pub use poller::{PollCoordinator, PollOutcome};
