//! Manual prediction: every ride condition chosen by hand.
//!
//! The form keeps raw selections; submission is ignored until every field is
//! filled, then the input is normalized and sent. There is no narration, only
//! a loading flag. The surge badge comes from the demand the user picked,
//! not from the response.

use crate::environment::BookingEnvironment;
use crate::error::FareError;
use crate::normalize::{RawRideInput, normalize};
use crate::types::{DemandLevel, ManualEstimate, ManualPredictResponse, Notification, RidePayload};
use farecast_core::{Effect, EffectId, Reducer, SmallVec, async_effect, smallvec};
use std::sync::Arc;

/// Cancellation id of the manual prediction request
pub const MANUAL_REQUEST: EffectId = EffectId::new("manual/request");

/// Notification for a failed prediction
pub const FAILURE_MESSAGE: &str =
    "Failed to fetch prediction. Please check your connection and try again.";

/// Notification for a form the normalizer rejects
pub const INVALID_FORM_MESSAGE: &str = "Some ride details are not recognised. Please review the form.";

/// Smallest selectable distance, in km
pub const MIN_DISTANCE_KM: f64 = 1.0;
/// Largest selectable distance, in km
pub const MAX_DISTANCE_KM: f64 = 50.0;
/// Initial distance, in km
pub const DEFAULT_DISTANCE_KM: f64 = 5.0;

/// Clamp to the slider range and snap to 0.5 km steps
#[must_use]
pub fn snap_distance(km: f64) -> f64 {
    (km.clamp(MIN_DISTANCE_KM, MAX_DISTANCE_KM) * 2.0).round() / 2.0
}

/// A choice field of the manual form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceField {
    /// `bike` / `taxi`
    RideType,
    /// `morning` / `afternoon` / `evening` / `night`
    TimeOfDay,
    /// `weekday` / `weekend`
    DayType,
    /// `low` / `medium` / `high`
    Demand,
    /// `low` / `moderate` / `heavy`
    Traffic,
    /// `clear` / `rainy` / `foggy`
    Weather,
}

impl ChoiceField {
    /// Values the form offers for this field
    #[must_use]
    pub const fn options(self) -> &'static [&'static str] {
        match self {
            Self::RideType => &["bike", "taxi"],
            Self::TimeOfDay => &["morning", "afternoon", "evening", "night"],
            Self::DayType => &["weekday", "weekend"],
            Self::Demand => &["low", "medium", "high"],
            Self::Traffic => &["low", "moderate", "heavy"],
            Self::Weather => &["clear", "rainy", "foggy"],
        }
    }
}

/// Manual prediction screen state
#[derive(Debug, Clone, PartialEq)]
pub struct ManualState {
    /// Raw form input
    pub form: RawRideInput,
    /// Whether a request is in flight
    pub loading: bool,
    /// Last successful estimate
    pub estimate: Option<ManualEstimate>,
    /// Last payload sent
    pub last_payload: Option<RidePayload>,
    /// Notifications raised so far, oldest first
    pub notifications: Vec<Notification>,
    submission: u64,
}

impl Default for ManualState {
    fn default() -> Self {
        Self {
            form: RawRideInput {
                distance_km: Some(DEFAULT_DISTANCE_KM),
                ..RawRideInput::default()
            },
            loading: false,
            estimate: None,
            last_payload: None,
            notifications: Vec::new(),
            submission: 0,
        }
    }
}

impl ManualState {
    /// Whether the form may be submitted
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.loading && self.form.is_complete()
    }
}

/// Manual prediction actions
#[derive(Debug, Clone, PartialEq)]
pub enum ManualAction {
    /// A choice field changed
    Select {
        /// Which field
        field: ChoiceField,
        /// Raw value
        value: String,
    },
    /// The pickup zone text changed
    PickupZoneChanged(String),
    /// The distance slider moved
    DistanceChanged(f64),
    /// The user asked for a price
    Submit,
    /// The service answered
    EstimateReceived {
        /// Submission the request belongs to
        submission: u64,
        /// Service response
        response: ManualPredictResponse,
    },
    /// The request failed
    EstimateFailed {
        /// Submission the request belongs to
        submission: u64,
        /// Failure, logged only
        error: FareError,
    },
}

/// Reducer for [`ManualState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualReducer;

impl Reducer for ManualReducer {
    type State = ManualState;
    type Action = ManualAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ManualAction::Select { field, value } => {
                let slot = match field {
                    ChoiceField::RideType => &mut state.form.ride_type,
                    ChoiceField::TimeOfDay => &mut state.form.time_of_day,
                    ChoiceField::DayType => &mut state.form.day_type,
                    ChoiceField::Demand => &mut state.form.demand_level,
                    ChoiceField::Traffic => &mut state.form.traffic_condition,
                    ChoiceField::Weather => &mut state.form.weather_condition,
                };
                *slot = Some(value);
                SmallVec::new()
            },

            ManualAction::PickupZoneChanged(text) => {
                state.form.pickup_zone = Some(text);
                SmallVec::new()
            },

            ManualAction::DistanceChanged(km) => {
                if km.is_finite() {
                    state.form.distance_km = Some(snap_distance(km));
                }
                SmallVec::new()
            },

            ManualAction::Submit => {
                if !state.can_submit() {
                    tracing::debug!(loading = state.loading, "Manual submission not allowed");
                    return SmallVec::new();
                }

                let payload = match normalize(&state.form) {
                    Ok(payload) => payload,
                    Err(error) => {
                        tracing::warn!(%error, "Manual form rejected");
                        state.notifications.push(Notification::warning(INVALID_FORM_MESSAGE));
                        return SmallVec::new();
                    },
                };

                state.submission += 1;
                state.loading = true;
                state.last_payload = Some(payload.clone());
                let submission = state.submission;
                tracing::info!(submission, ?payload, "Manual prediction submitted");

                let fare_api = Arc::clone(&env.fare_api);
                smallvec![
                    async_effect!(Some(match fare_api.predict(payload).await {
                        Ok(response) => ManualAction::EstimateReceived {
                            submission,
                            response,
                        },
                        Err(error) => ManualAction::EstimateFailed { submission, error },
                    }))
                    .cancellable(MANUAL_REQUEST)
                ]
            },

            ManualAction::EstimateReceived {
                submission,
                response,
            } => {
                if !state.loading || submission != state.submission {
                    return SmallVec::new();
                }
                let demand_status = state
                    .last_payload
                    .as_ref()
                    .map_or(DemandLevel::Low, |payload| payload.demand_level);

                tracing::info!(
                    submission,
                    fare = response.final_fare,
                    surge = response.surge_multiplier,
                    "Manual prediction received"
                );
                state.loading = false;
                state.estimate = Some(ManualEstimate {
                    fare: response.final_fare,
                    surge_multiplier: response.surge_multiplier,
                    demand_status,
                    estimated_at: env.clock.now(),
                });
                SmallVec::new()
            },

            ManualAction::EstimateFailed { submission, error } => {
                if !state.loading || submission != state.submission {
                    return SmallVec::new();
                }
                tracing::warn!(submission, %error, "Manual prediction failed");
                state.loading = false;
                state.notifications.push(Notification::error(FAILURE_MESSAGE));
                SmallVec::new()
            },
        }
    }
}
