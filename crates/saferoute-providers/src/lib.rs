pub mod alerts;
pub mod classify;
pub mod geocode;
pub mod osrm;
mod traits;

pub use alerts::{convert_alerts, HttpAlertsSource, RawAlert};
pub use geocode::{NominatimClient, Place};
pub use osrm::OsrmClient;
pub use traits::{AlertsSource, Profile, ProviderError, ProviderRoute, RoutingProvider};
