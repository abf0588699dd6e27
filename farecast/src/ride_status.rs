//! Simulated ride lifecycle shown after a booking is confirmed.
//!
//! Opening the dialog starts at [`RideStage::Booked`] and schedules every
//! transition at once, measured from the moment of opening:
//!
//! | offset | stage |
//! |--------|-------|
//! | 2 s    | [`RideStage::Searching`] |
//! | 4 s    | [`RideStage::Assigned`]  |
//! | 6 s    | [`RideStage::Arriving`]  |
//! | 8 s    | closed ([`RideStatusAction::TimelineElapsed`]) |
//!
//! All scheduled transitions run under [`RIDE_TIMELINE`]. Closing or
//! dismissing cancels them; reopening starts a fresh activation from
//! `Booked`.

use crate::environment::BookingEnvironment;
use farecast_core::{Effect, EffectId, Reducer, SmallVec, smallvec};
use serde::{Deserialize, Serialize};

/// Cancellation id of the scheduled stage transitions
pub const RIDE_TIMELINE: EffectId = EffectId::new("ride/timeline");

/// Visible stage of the simulated ride
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RideStage {
    /// Booking confirmed
    Booked,
    /// Looking for a driver
    Searching,
    /// Driver assigned
    Assigned,
    /// Driver on the way
    Arriving,
}

impl RideStage {
    /// Label shown in the dialog
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Booked => "Ride booked",
            Self::Searching => "Searching for a driver...",
            Self::Assigned => "Driver assigned",
            Self::Arriving => "Driver arriving",
        }
    }
}

/// How the last activation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideOutcome {
    /// The timeline ran to the end
    Completed,
    /// The user dismissed the dialog
    Dismissed,
    /// The host closed the dialog
    Closed,
}

/// Ride-status dialog state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RideStatusState {
    /// Current stage; `None` while the dialog is closed
    pub stage: Option<RideStage>,
    /// Stages visited by the current (or last) activation, in order
    pub visited: Vec<RideStage>,
    /// How the last activation ended
    pub outcome: Option<RideOutcome>,
    activation: u64,
}

impl RideStatusState {
    /// Whether the dialog is showing
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.stage.is_some()
    }

    /// Number of times the dialog was opened
    #[must_use]
    pub const fn activation(&self) -> u64 {
        self.activation
    }
}

/// Ride-status actions
#[derive(Debug, Clone, PartialEq)]
pub enum RideStatusAction {
    /// Open the dialog and start the timeline
    Open,
    /// A scheduled transition fired
    StageReached {
        /// Activation that scheduled it
        activation: u64,
        /// Stage to enter
        stage: RideStage,
    },
    /// The final scheduled transition fired; the host should close
    TimelineElapsed {
        /// Activation that scheduled it
        activation: u64,
    },
    /// The user dismissed the dialog early
    Dismiss,
    /// The host closed the dialog
    Close,
}

/// Reducer for [`RideStatusState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RideStatusReducer;

impl RideStatusReducer {
    fn deactivate(state: &mut RideStatusState, outcome: RideOutcome) -> SmallVec<[Effect<RideStatusAction>; 4]> {
        if state.stage.take().is_some() {
            tracing::info!(activation = state.activation, ?outcome, "Ride status closed");
            state.outcome = Some(outcome);
        }
        smallvec![Effect::Cancel(RIDE_TIMELINE)]
    }
}

impl Reducer for RideStatusReducer {
    type State = RideStatusState;
    type Action = RideStatusAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RideStatusAction::Open => {
                state.activation += 1;
                state.stage = Some(RideStage::Booked);
                state.visited = vec![RideStage::Booked];
                state.outcome = None;

                let activation = state.activation;
                let [searching, assigned, arriving, close] = env.timings.ride_timeline;
                tracing::info!(activation, "Ride booked");

                let stage = |after, stage| Effect::Delay {
                    duration: after,
                    action: Box::new(RideStatusAction::StageReached { activation, stage }),
                };

                // Restarting the id drops whatever an earlier activation left scheduled
                smallvec![
                    Effect::merge(vec![
                        stage(searching, RideStage::Searching),
                        stage(assigned, RideStage::Assigned),
                        stage(arriving, RideStage::Arriving),
                        Effect::Delay {
                            duration: close,
                            action: Box::new(RideStatusAction::TimelineElapsed { activation }),
                        },
                    ])
                    .cancellable(RIDE_TIMELINE)
                ]
            },

            RideStatusAction::StageReached { activation, stage } => {
                let Some(current) = state.stage else {
                    return SmallVec::new();
                };
                if activation != state.activation || stage <= current {
                    tracing::debug!(activation, ?stage, "Ignoring stale ride transition");
                    return SmallVec::new();
                }

                tracing::info!(activation, ?stage, "Ride stage reached");
                state.stage = Some(stage);
                state.visited.push(stage);
                SmallVec::new()
            },

            RideStatusAction::TimelineElapsed { activation } => {
                if activation != state.activation || state.stage.is_none() {
                    return SmallVec::new();
                }
                tracing::info!(activation, "Ride timeline elapsed");
                state.stage = None;
                state.outcome = Some(RideOutcome::Completed);
                SmallVec::new()
            },

            RideStatusAction::Dismiss => Self::deactivate(state, RideOutcome::Dismissed),
            RideStatusAction::Close => Self::deactivate(state, RideOutcome::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timings;
    use crate::mocks::{MockFareApi, MockPlaceSearch};
    use farecast_testing::{ReducerTest, assertions, test_clock};
    use std::sync::Arc;
    use std::time::Duration;

    fn env() -> BookingEnvironment {
        BookingEnvironment::new(
            Arc::new(MockFareApi::new()),
            Arc::new(MockPlaceSearch::default()),
            Arc::new(test_clock()),
            Timings::default(),
        )
    }

    #[test]
    fn open_schedules_every_transition_from_activation() {
        ReducerTest::new(RideStatusReducer)
            .with_env(env())
            .given_state(RideStatusState::default())
            .when_action(RideStatusAction::Open)
            .then_state(|state| {
                assert_eq!(state.stage, Some(RideStage::Booked));
                assert_eq!(state.activation(), 1);
            })
            .then_effects(|effects| {
                assertions::assert_runs_under(effects, &RIDE_TIMELINE);
                assert_eq!(
                    assertions::delayed_actions(effects),
                    vec![
                        (
                            Duration::from_secs(2),
                            RideStatusAction::StageReached { activation: 1, stage: RideStage::Searching }
                        ),
                        (
                            Duration::from_secs(4),
                            RideStatusAction::StageReached { activation: 1, stage: RideStage::Assigned }
                        ),
                        (
                            Duration::from_secs(6),
                            RideStatusAction::StageReached { activation: 1, stage: RideStage::Arriving }
                        ),
                        (Duration::from_secs(8), RideStatusAction::TimelineElapsed { activation: 1 }),
                    ]
                );
            })
            .run();
    }

    #[test]
    fn dismiss_cancels_the_timeline() {
        ReducerTest::new(RideStatusReducer)
            .with_env(env())
            .given_state(RideStatusState::default())
            .given_actions([RideStatusAction::Open])
            .when_action(RideStatusAction::Dismiss)
            .then_state(|state| {
                assert!(!state.is_open());
                assert_eq!(state.outcome, Some(RideOutcome::Dismissed));
            })
            .then_effects(|effects| assertions::assert_cancels(effects, &RIDE_TIMELINE))
            .run();
    }

    #[test]
    fn transitions_from_an_earlier_activation_are_ignored() {
        ReducerTest::new(RideStatusReducer)
            .with_env(env())
            .given_state(RideStatusState::default())
            .given_actions([RideStatusAction::Open, RideStatusAction::Close, RideStatusAction::Open])
            .when_action(RideStatusAction::StageReached {
                activation: 1,
                stage: RideStage::Assigned,
            })
            .then_state(|state| {
                assert_eq!(state.stage, Some(RideStage::Booked));
                assert_eq!(state.visited, vec![RideStage::Booked]);
            })
            .run();
    }

    #[test]
    fn stages_never_move_backwards() {
        ReducerTest::new(RideStatusReducer)
            .with_env(env())
            .given_state(RideStatusState::default())
            .given_actions([
                RideStatusAction::Open,
                RideStatusAction::StageReached { activation: 1, stage: RideStage::Assigned },
            ])
            .when_action(RideStatusAction::StageReached {
                activation: 1,
                stage: RideStage::Searching,
            })
            .then_state(|state| assert_eq!(state.stage, Some(RideStage::Assigned)))
            .run();
    }
}
