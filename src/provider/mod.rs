//! Platform location provider abstraction
//!
//! A platform binding (Android `LocationManager`, iOS `CLLocationManager`, a
//! desktop GPS daemon) implements [`LocationProvider`]. The acquisition policy
//! and the watch registry only ever talk to this trait.

pub mod interface;
pub mod replay;
pub mod mock;
pub mod error;

pub use interface::{FixSink, LocationProvider, ProviderEvent, ProviderFuture};
pub use replay::ReplayProvider;
pub use mock::MockProvider;
pub use error::{ProviderError, ProviderResult};
