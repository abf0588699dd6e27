//! # Farecast Core
//!
//! Core traits and types for the Farecast reducer architecture.
//!
//! Every screen of the fare estimator (smart booking, manual prediction, ride
//! status) is modelled as an owned state struct that only changes through a
//! reducer. Timers and network calls are returned from the reducer as
//! [`Effect`](effect::Effect) descriptions and executed by the runtime.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state for a screen instance
//! - **Action**: All possible inputs to a reducer (user input, timer firings, responses)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution), optionally cancellable
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```ignore
//! use farecast_core::*;
//!
//! impl Reducer for RideStatusReducer {
//!     type State = RideStatusState;
//!     type Action = RideStatusAction;
//!     type Environment = BookingEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut RideStatusState,
//!         action: RideStatusAction,
//!         env: &BookingEnvironment,
//!     ) -> SmallVec<[Effect<RideStatusAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Reducer composition (embedding child reducers in a parent)
pub mod composition;

/// Identifiers for cancellable effects
pub mod effect_id;

/// Declarative macros for building effects
pub mod effect_macros;

pub use effect::Effect;
pub use effect_id::EffectId;
pub use environment::{Clock, SystemClock};
pub use reducer::Reducer;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use super::EffectId;
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (for timelines, settle delays, dismissal grace periods)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Periodic action
        ///
        /// Dispatches `action` every `period`, the first time one period after
        /// the effect starts. Never completes on its own: wrap it in
        /// [`Effect::Cancellable`] and cancel it.
        Interval {
            /// Time between firings
            period: Duration,
            /// Action to dispatch on every firing
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run `effect` under a cancellation id
        ///
        /// Starting a cancellable effect first cancels everything still running
        /// under the same id, so at most one generation of work per id is alive.
        Cancellable {
            /// Cancellation id
            id: EffectId,
            /// The effect to run
            effect: Box<Effect<Action>>,
        },

        /// Cancel every running effect registered under the id
        ///
        /// A cancelled effect never dispatches its action.
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Interval { period, action } => f
                    .debug_struct("Effect::Interval")
                    .field("period", period)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Tag this effect with a cancellation id
        #[must_use]
        pub fn cancellable(self, id: impl Into<EffectId>) -> Effect<Action> {
            Effect::Cancellable {
                id: id.into(),
                effect: Box::new(self),
            }
        }

        /// Whether this effect (or anything nested in it) cancels `id`
        #[must_use]
        pub fn cancels(&self, id: &EffectId) -> bool {
            match self {
                Effect::Cancel(cancelled) => cancelled == id,
                Effect::Cancellable { effect, .. } => effect.cancels(id),
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().any(|e| e.cancels(id))
                },
                _ => false,
            }
        }

        /// Whether this effect (or anything nested in it) runs under `id`
        #[must_use]
        pub fn runs_under(&self, id: &EffectId) -> bool {
            match self {
                Effect::Cancellable { id: own, effect } => own == id || effect.runs_under(id),
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().any(|e| e.runs_under(id))
                },
                _ => false,
            }
        }
    }

    impl<Action: Send + 'static> Effect<Action> {
        /// Transform the actions this effect produces
        ///
        /// Used to embed a child reducer's effects in a parent's action type.
        /// Cancellation ids are kept as they are.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: Fn(Action) -> B + Clone + Send + Sync + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => {
                    Effect::Parallel(effects.into_iter().map(|e| e.map(f.clone())).collect())
                },
                Effect::Sequential(effects) => {
                    Effect::Sequential(effects.into_iter().map(|e| e.map(f.clone())).collect())
                },
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Interval { period, action } => Effect::Interval {
                    period,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => Effect::Future(Box::pin(async move { fut.await.map(f) })),
                Effect::Cancellable { id, effect } => Effect::Cancellable {
                    id,
                    effect: Box::new(effect.map(f)),
                },
                Effect::Cancel(id) => Effect::Cancel(id),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts wall-clock time for testability
    ///
    /// Only used for timestamps recorded in state. Timers are driven by the
    /// runtime's async clock, not by this trait.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::EffectId;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Child {
        Tick,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[test]
    fn map_rewraps_delay_actions() {
        let effect = Effect::Delay {
            duration: Duration::from_secs(2),
            action: Box::new(Child::Tick),
        }
        .map(Parent::Child);

        match effect {
            Effect::Delay { duration, action } => {
                assert_eq!(duration, Duration::from_secs(2));
                assert_eq!(*action, Parent::Child(Child::Tick));
            },
            other => unreachable!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn map_keeps_cancellation_ids() {
        let id = EffectId::new("narration");
        let effect = Effect::Interval {
            period: Duration::from_millis(800),
            action: Box::new(Child::Tick),
        }
        .cancellable(id.clone())
        .map(Parent::Child);

        assert!(effect.runs_under(&id));
        assert!(!effect.cancels(&id));
    }

    #[test]
    fn cancels_looks_inside_groups() {
        let id = EffectId::new("ride-timeline");
        let effect: Effect<Child> = Effect::merge(vec![Effect::None, Effect::Cancel(id.clone())]);

        assert!(effect.cancels(&id));
        assert!(!effect.cancels(&EffectId::new("other")));
    }

    #[tokio::test]
    async fn map_applies_to_future_output() {
        let effect = Effect::Future(Box::pin(async { Some(Child::Tick) })).map(Parent::Child);

        let Effect::Future(fut) = effect else {
            unreachable!("map must keep the future variant");
        };
        assert_eq!(fut.await, Some(Parent::Child(Child::Tick)));
    }
}
