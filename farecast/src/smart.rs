//! Smart booking: fare prediction from pickup/drop text.
//!
//! A submission runs two things side by side:
//!
//! - the prediction request, under [`SMART_REQUEST`];
//! - a cosmetic narration that advances through [`NARRATION_STEPS`] on a
//!   fixed cadence, under [`NARRATION`].
//!
//! When the response arrives the narration is cancelled, "Finalizing..." is
//! shown, and the result is committed after the settle delay (under
//! [`SETTLE`]). A failure cancels the narration, restores the result shown
//! before the submission and raises one notification.
//!
//! A new submission supersedes the previous one: starting the cancellable
//! effects again aborts the old timer and request, and every late action
//! carries its submission number so leftovers are ignored.

use crate::environment::BookingEnvironment;
use crate::error::FareError;
use crate::location::{LocationAction, LocationField, LocationReducer, LocationState};
use crate::ride_status::{RideStatusAction, RideStatusReducer, RideStatusState};
use crate::types::{Notification, PredictionResult, RideType, SmartPredictRequest, SmartPredictResponse};
use farecast_core::composition::{Scoped, scope};
use farecast_core::{Effect, EffectId, Reducer, SmallVec, smallvec};
use std::sync::Arc;

/// Progress narration, in order
pub const NARRATION_STEPS: [&str; 5] = [
    "Fetching real coordinates & routes...",
    "Calculating distance on live map...",
    "Checking local weather...",
    "Analyzing traffic conditions...",
    "Generating final price...",
];

/// Narration shown while the settle delay runs
pub const FINALIZING: &str = "Finalizing...";

/// Notification for a submission with an empty field
pub const INCOMPLETE_MESSAGE: &str = "Please enter both pickup and drop locations";

/// Notification for a failed prediction
pub const FAILURE_MESSAGE: &str =
    "Failed to suggest price. Please try simpler location names or check network.";

/// Cancellation id of the narration timer
pub const NARRATION: EffectId = EffectId::new("smart/narration");

/// Cancellation id of the settle delay
pub const SETTLE: EffectId = EffectId::new("smart/settle");

/// Cancellation id of the prediction request
pub const SMART_REQUEST: EffectId = EffectId::new("smart/request");

/// Smart booking screen state
#[derive(Debug, Clone, PartialEq)]
pub struct SmartBookingState {
    /// Pickup field
    pub pickup: LocationState,
    /// Drop field
    pub drop: LocationState,
    /// Selected vehicle class
    pub ride_type: RideType,
    /// Whether a submission is in flight
    pub loading: bool,
    /// Current narration line while loading
    pub narration: Option<&'static str>,
    /// Committed result
    pub prediction: Option<PredictionResult>,
    /// Last request sent
    pub last_request: Option<SmartPredictRequest>,
    /// Notifications raised so far, oldest first
    pub notifications: Vec<Notification>,
    /// Ride-status dialog
    pub ride: RideStatusState,
    narration_step: usize,
    previous_prediction: Option<PredictionResult>,
    submission: u64,
}

impl Default for SmartBookingState {
    fn default() -> Self {
        Self {
            pickup: LocationState::new(LocationField::Pickup),
            drop: LocationState::new(LocationField::Drop),
            ride_type: RideType::default(),
            loading: false,
            narration: None,
            prediction: None,
            last_request: None,
            notifications: Vec::new(),
            ride: RideStatusState::default(),
            narration_step: 0,
            previous_prediction: None,
            submission: 0,
        }
    }
}

impl SmartBookingState {
    /// Number of submissions started
    #[must_use]
    pub const fn submission(&self) -> u64 {
        self.submission
    }

    fn is_current(&self, submission: u64) -> bool {
        self.loading && submission == self.submission
    }
}

/// Smart booking actions
#[derive(Debug, Clone, PartialEq)]
pub enum SmartAction {
    /// Pickup field action
    Pickup(LocationAction),
    /// Drop field action
    Drop(LocationAction),
    /// The user picked a vehicle class
    RideTypeSelected(RideType),
    /// The user asked for a price
    Submit,
    /// The narration timer fired
    NarrationTick {
        /// Submission that started the timer
        submission: u64,
    },
    /// The service answered
    PredictionReceived {
        /// Submission the request belongs to
        submission: u64,
        /// Service response
        response: SmartPredictResponse,
    },
    /// The request failed
    PredictionFailed {
        /// Submission the request belongs to
        submission: u64,
        /// Failure, logged only
        error: FareError,
    },
    /// The settle delay ended
    CommitPrediction {
        /// Submission the result belongs to
        submission: u64,
        /// Result to show
        result: PredictionResult,
    },
    /// The user confirmed the shown price
    ConfirmBooking,
    /// Ride-status dialog action
    RideStatus(RideStatusAction),
}

type Effects = SmallVec<[Effect<SmartAction>; 4]>;

/// Reducer for [`SmartBookingState`]
pub struct SmartBookingReducer {
    pickup: Scoped<SmartBookingState, SmartAction, LocationReducer>,
    drop: Scoped<SmartBookingState, SmartAction, LocationReducer>,
    ride: Scoped<SmartBookingState, SmartAction, RideStatusReducer>,
}

impl Default for SmartBookingReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl SmartBookingReducer {
    /// Create the reducer with its embedded field and dialog reducers
    #[must_use]
    pub fn new() -> Self {
        Self {
            pickup: scope(
                LocationReducer,
                |state: &mut SmartBookingState| &mut state.pickup,
                |action: SmartAction| match action {
                    SmartAction::Pickup(inner) => Some(inner),
                    _ => None,
                },
                SmartAction::Pickup,
            ),
            drop: scope(
                LocationReducer,
                |state: &mut SmartBookingState| &mut state.drop,
                |action: SmartAction| match action {
                    SmartAction::Drop(inner) => Some(inner),
                    _ => None,
                },
                SmartAction::Drop,
            ),
            ride: scope(
                RideStatusReducer,
                |state: &mut SmartBookingState| &mut state.ride,
                |action: SmartAction| match action {
                    SmartAction::RideStatus(inner) => Some(inner),
                    _ => None,
                },
                SmartAction::RideStatus,
            ),
        }
    }

    fn submit(state: &mut SmartBookingState, env: &BookingEnvironment) -> Effects {
        if state.pickup.text.trim().is_empty() || state.drop.text.trim().is_empty() {
            state.notifications.push(Notification::warning(INCOMPLETE_MESSAGE));
            return SmallVec::new();
        }

        // Field text goes out as typed
        let request = SmartPredictRequest {
            pickup: state.pickup.text.clone(),
            drop: state.drop.text.clone(),
            ride_type: state.ride_type,
            pickup_coords: state.pickup.coordinates,
            drop_coords: state.drop.coordinates,
        };

        if state.loading {
            tracing::info!(superseded = state.submission, "Superseding in-flight prediction");
        }
        state.submission += 1;
        let submission = state.submission;

        // The last good result comes back if this attempt fails
        if let Some(shown) = state.prediction.take() {
            state.previous_prediction = Some(shown);
        }
        state.loading = true;
        state.narration_step = 0;
        state.narration = Some(NARRATION_STEPS[0]);
        state.last_request = Some(request.clone());

        tracing::info!(
            submission,
            ride_type = %request.ride_type,
            pickup_resolved = request.pickup_coords.is_some(),
            drop_resolved = request.drop_coords.is_some(),
            "Smart prediction submitted"
        );

        let fare_api = Arc::clone(&env.fare_api);
        smallvec![
            Effect::Cancel(SETTLE),
            Effect::Interval {
                period: env.timings.narration_interval,
                action: Box::new(SmartAction::NarrationTick { submission }),
            }
            .cancellable(NARRATION),
            Effect::Future(Box::pin(async move {
                Some(match fare_api.smart_predict(request).await {
                    Ok(response) => SmartAction::PredictionReceived {
                        submission,
                        response,
                    },
                    Err(error) => SmartAction::PredictionFailed { submission, error },
                })
            }))
            .cancellable(SMART_REQUEST),
        ]
    }
}

impl Reducer for SmartBookingReducer {
    type State = SmartBookingState;
    type Action = SmartAction;
    type Environment = BookingEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SmartAction::Pickup(_) => self.pickup.reduce(state, action, env),
            SmartAction::Drop(_) => self.drop.reduce(state, action, env),
            SmartAction::RideStatus(_) => self.ride.reduce(state, action, env),

            SmartAction::RideTypeSelected(ride_type) => {
                state.ride_type = ride_type;
                SmallVec::new()
            },

            SmartAction::Submit => Self::submit(state, env),

            SmartAction::NarrationTick { submission } => {
                if !state.is_current(submission) || state.narration == Some(FINALIZING) {
                    return SmallVec::new();
                }
                if state.narration_step + 1 < NARRATION_STEPS.len() {
                    state.narration_step += 1;
                    state.narration = Some(NARRATION_STEPS[state.narration_step]);
                }
                SmallVec::new()
            },

            SmartAction::PredictionReceived {
                submission,
                response,
            } => {
                if !state.is_current(submission) {
                    tracing::debug!(submission, "Ignoring superseded prediction");
                    return SmallVec::new();
                }

                let ride_type = state
                    .last_request
                    .as_ref()
                    .map_or(state.ride_type, |request| request.ride_type);
                let result = PredictionResult::from_response(response, ride_type, env.clock.now());
                state.narration = Some(FINALIZING);

                smallvec![
                    Effect::Cancel(NARRATION),
                    Effect::Delay {
                        duration: env.timings.settle_delay,
                        action: Box::new(SmartAction::CommitPrediction { submission, result }),
                    }
                    .cancellable(SETTLE),
                ]
            },

            SmartAction::CommitPrediction { submission, result } => {
                if !state.is_current(submission) {
                    return SmallVec::new();
                }

                tracing::info!(
                    submission,
                    final_fare = result.final_fare,
                    surge = result.surge_multiplier,
                    "Smart prediction committed"
                );
                state.loading = false;
                state.narration = None;
                state.previous_prediction = None;
                state.prediction = Some(result);
                SmallVec::new()
            },

            SmartAction::PredictionFailed { submission, error } => {
                if !state.is_current(submission) {
                    return SmallVec::new();
                }

                tracing::warn!(submission, %error, "Smart prediction failed");
                state.loading = false;
                state.narration = None;
                state.prediction = state.previous_prediction.take();
                state.notifications.push(Notification::error(FAILURE_MESSAGE));
                smallvec![Effect::Cancel(NARRATION)]
            },

            SmartAction::ConfirmBooking => {
                if state.prediction.is_none() || state.loading {
                    tracing::debug!("Nothing to book");
                    return SmallVec::new();
                }
                self.ride
                    .reduce(state, SmartAction::RideStatus(RideStatusAction::Open), env)
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use crate::mocks::{MockFareApi, MockPlaceSearch, place, smart_response};
    use farecast_testing::{ReducerTest, assertions, test_clock};

    fn env() -> BookingEnvironment {
        BookingEnvironment::new(
            Arc::new(MockFareApi::new()),
            Arc::new(MockPlaceSearch::default()),
            Arc::new(test_clock()),
            Timings::default(),
        )
    }

    fn filled() -> Vec<SmartAction> {
        vec![
            SmartAction::Pickup(LocationAction::TextChanged("MG Road".to_string())),
            SmartAction::Drop(LocationAction::TextChanged("Airport".to_string())),
        ]
    }

    #[test]
    fn empty_locations_warn_without_request() {
        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .given_actions([SmartAction::Pickup(LocationAction::TextChanged("MG Road".to_string()))])
            .when_action(SmartAction::Submit)
            .then_state(|state| {
                assert!(!state.loading);
                assert_eq!(state.notifications, vec![Notification::warning(INCOMPLETE_MESSAGE)]);
                assert!(state.last_request.is_none());
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 0))
            .run();
    }

    #[test]
    fn submit_starts_narration_and_request() {
        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .given_actions(filled())
            .when_action(SmartAction::Submit)
            .then_state(|state| {
                assert!(state.loading);
                assert_eq!(state.narration, Some(NARRATION_STEPS[0]));
                let request = state.last_request.clone().unwrap();
                assert_eq!(request.pickup_coords, None);
                assert_eq!(request.drop_coords, None);
            })
            .then_effects(|effects| {
                assertions::assert_runs_under(effects, &NARRATION);
                assertions::assert_runs_under(effects, &SMART_REQUEST);
                assertions::assert_cancels(effects, &SETTLE);
            })
            .run();
    }

    #[test]
    fn field_text_is_sent_as_typed() {
        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .given_actions([
                SmartAction::Pickup(LocationAction::TextChanged(" MG Road ".to_string())),
                SmartAction::Drop(LocationAction::TextChanged("Airport  ".to_string())),
            ])
            .when_action(SmartAction::Submit)
            .then_state(|state| {
                let request = state.last_request.clone().unwrap();
                assert_eq!(request.pickup, " MG Road ");
                assert_eq!(request.drop, "Airport  ");
            })
            .run();
    }

    #[test]
    fn selected_coordinates_are_submitted() {
        let mut actions = filled();
        actions.push(SmartAction::Pickup(LocationAction::SuggestionSelected(place(
            "MG Road, Bengaluru",
            12.9756,
            77.6066,
        ))));

        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .given_actions(actions)
            .when_action(SmartAction::Submit)
            .then_state(|state| {
                let request = state.last_request.clone().unwrap();
                assert_eq!(request.pickup, "MG Road, Bengaluru");
                assert!(request.pickup_coords.is_some());
                assert!(request.drop_coords.is_none());
            })
            .run();
    }

    #[test]
    fn response_cancels_narration_before_settling() {
        let mut actions = filled();
        actions.push(SmartAction::Submit);

        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .given_actions(actions)
            .when_action(SmartAction::PredictionReceived {
                submission: 1,
                response: smart_response(180.0, 1.2),
            })
            .then_state(|state| {
                assert_eq!(state.narration, Some(FINALIZING));
                assert!(state.loading);
                assert!(state.prediction.is_none());
            })
            .then_effects(|effects| {
                assert!(effects[0].cancels(&NARRATION));
                assert!(effects[1].runs_under(&SETTLE));
            })
            .run();
    }

    #[test]
    fn narration_stops_at_the_last_step() {
        let mut actions = filled();
        actions.push(SmartAction::Submit);
        actions.extend((0..10).map(|_| SmartAction::NarrationTick { submission: 1 }));

        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .given_actions(actions)
            .when_action(SmartAction::NarrationTick { submission: 1 })
            .then_state(|state| assert_eq!(state.narration, Some(NARRATION_STEPS[4])))
            .run();
    }

    #[test]
    fn failure_notifies_once() {
        let mut actions = filled();
        actions.push(SmartAction::Submit);

        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .given_actions(actions)
            .when_action(SmartAction::PredictionFailed {
                submission: 1,
                error: FareError::Status {
                    status: 500,
                    message: "boom".to_string(),
                },
            })
            .then_state(|state| {
                assert!(!state.loading);
                assert_eq!(state.narration, None);
                assert_eq!(state.notifications, vec![Notification::error(FAILURE_MESSAGE)]);
            })
            .then_effects(|effects| assertions::assert_cancels(effects, &NARRATION))
            .run();
    }

    #[test]
    fn superseded_responses_are_ignored() {
        let mut actions = filled();
        actions.push(SmartAction::Submit);
        actions.push(SmartAction::Submit);

        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .given_actions(actions)
            .when_action(SmartAction::PredictionReceived {
                submission: 1,
                response: smart_response(180.0, 1.2),
            })
            .then_state(|state| {
                assert_eq!(state.submission(), 2);
                assert_eq!(state.narration, Some(NARRATION_STEPS[0]));
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 0))
            .run();
    }

    #[test]
    fn booking_requires_a_result() {
        ReducerTest::new(SmartBookingReducer::new())
            .with_env(env())
            .given_state(SmartBookingState::default())
            .when_action(SmartAction::ConfirmBooking)
            .then_state(|state| assert!(!state.ride.is_open()))
            .run();
    }
}
