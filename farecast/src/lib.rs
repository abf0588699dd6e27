//! # Farecast
//!
//! Ride fare estimation client built on the Farecast reducer architecture.
//!
//! Each screen is a reducer over owned state:
//!
//! - [`smart::SmartBookingReducer`]: pickup and drop fields with place
//!   suggestions, a narrated smart prediction, and the ride-status dialog
//! - [`manual::ManualReducer`]: a hand-filled form sent to the plain
//!   prediction endpoint
//! - [`ride_status::RideStatusReducer`]: the simulated ride lifecycle
//!
//! Remote services are injected through [`environment::BookingEnvironment`];
//! [`client`] holds the HTTP implementations and [`mocks`] the in-memory ones.
//!
//! ## Example
//!
//! ```ignore
//! use farecast::prelude::*;
//!
//! let config = FarecastConfig::from_env();
//! let env = BookingEnvironment::with_system_clock(
//!     Arc::new(HttpFareClient::new(&config.api)?),
//!     Arc::new(NominatimClient::new(&config.places, &config.api)?),
//!     config.timings,
//! );
//! let store = Store::new(SmartBookingState::default(), SmartBookingReducer::new(), env);
//! store.send(SmartAction::Pickup(LocationAction::TextChanged("MG Road".into()))).await?;
//! ```

pub mod client;
pub mod config;
pub mod environment;
pub mod error;
pub mod location;
pub mod manual;
pub mod mocks;
pub mod normalize;
pub mod ride_status;
pub mod smart;
pub mod types;

pub use client::{HttpFareClient, NominatimClient};
pub use config::{FarecastConfig, Timings};
pub use environment::{BookingEnvironment, FareApi, PlaceSearch};
pub use error::{ConfigError, FareError, NormalizeError};
pub use normalize::{RawRideInput, normalize};

/// Commonly used types
pub mod prelude {
    pub use crate::client::{HttpFareClient, NominatimClient};
    pub use crate::config::{FarecastConfig, Timings};
    pub use crate::environment::{BookingEnvironment, FareApi, PlaceSearch};
    pub use crate::location::{LocationAction, LocationField, LocationState};
    pub use crate::manual::{ChoiceField, ManualAction, ManualReducer, ManualState};
    pub use crate::ride_status::{RideStage, RideStatusAction, RideStatusReducer, RideStatusState};
    pub use crate::smart::{SmartAction, SmartBookingReducer, SmartBookingState};
    pub use crate::types::*;
    pub use farecast_runtime::Store;
    pub use std::sync::Arc;
}
