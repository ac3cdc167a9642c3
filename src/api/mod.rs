//! Public geolocation API
//!
//! `geolocation` is the façade; `current` holds the acquisition policy and
//! `watch` the registry of continuous subscriptions.

pub mod current;
pub mod geolocation;
pub mod types;
pub mod watch;

pub use current::{check_freshness, AcquisitionPolicy};
pub use geolocation::Geolocation;
pub use types::{AcquisitionRequest, GeoError, GeoResult};
pub use watch::{ErrorCallback, FixCallback, WatchRegistry};
