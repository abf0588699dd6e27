//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants, mostly
//! for the timers that drive narrations, dismissals, and ride timelines.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use farecast_core::async_effect;
///
/// async_effect! {
///     match api.smart_predict(request).await {
///         Ok(prediction) => Some(SmartAction::PredictionReceived { submission, prediction }),
///         Err(error) => Some(SmartAction::PredictionFailed { submission, reason: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use farecast_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(2),
///     action: RideStatusAction::StageReached { activation, stage: RideStage::Searching }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Cancellable` wrapping another effect
///
/// # Example
///
/// ```rust,ignore
/// use farecast_core::{cancellable, delay};
///
/// cancellable! {
///     id: DISMISS_ID,
///     effect: delay! { duration: grace, action: LocationAction::HideSuggestions }
/// }
/// ```
#[macro_export]
macro_rules! cancellable {
    (
        id: $id:expr,
        effect: $effect:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: ::std::convert::Into::into($id),
            effect: ::std::boxed::Box::new($effect),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::EffectId;
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum TestAction {
        AsyncResult { value: i32 },
        StageReached,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::AsyncResult { value: 42 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(2),
            action: TestAction::StageReached
        };

        assert!(matches!(effect, Effect::Delay { .. }));
    }

    #[test]
    fn test_cancellable_macro() {
        let effect = cancellable! {
            id: "ride/timeline",
            effect: delay! {
                duration: Duration::from_secs(8),
                action: TestAction::StageReached
            }
        };

        assert!(effect.runs_under(&EffectId::new("ride/timeline")));
    }
}
