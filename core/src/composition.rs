//! Reducer composition utilities
//!
//! A screen is usually built from smaller reducers: the smart booking screen
//! owns two location fields and a ride-status dialog, each with its own state,
//! actions, and timers. [`scope`] embeds such a child reducer in a parent:
//!
//! - a **state lens** picks the child's state out of the parent's state,
//! - an **action prism** extracts the child's action from a parent action,
//! - an **embed** function wraps the child's effect-produced actions back into
//!   the parent's action type.
//!
//! # Example
//!
//! ```
//! use farecast_core::{Effect, Reducer, SmallVec, smallvec};
//! use farecast_core::composition::scope;
//!
//! #[derive(Clone, Default)]
//! struct Field {
//!     text: String,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum FieldAction {
//!     Edit(String),
//! }
//!
//! struct FieldReducer;
//!
//! impl Reducer for FieldReducer {
//!     type State = Field;
//!     type Action = FieldAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Field, action: FieldAction, _env: &()) -> SmallVec<[Effect<FieldAction>; 4]> {
//!         let FieldAction::Edit(text) = action;
//!         state.text = text;
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Form {
//!     pickup: Field,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum FormAction {
//!     Pickup(FieldAction),
//! }
//!
//! let pickup = scope(
//!     FieldReducer,
//!     |form: &mut Form| &mut form.pickup,
//!     |action: FormAction| match action {
//!         FormAction::Pickup(inner) => Some(inner),
//!     },
//!     FormAction::Pickup,
//! );
//!
//! let mut form = Form::default();
//! let _ = pickup.reduce(&mut form, FormAction::Pickup(FieldAction::Edit("MG Road".into())), &());
//! assert_eq!(form.pickup.text, "MG Road");
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Embeds a child reducer's state and actions in a parent.
///
/// Parent actions that the prism does not recognise produce no effects and
/// leave the state untouched.
pub fn scope<PS, PA, R>(
    reducer: R,
    state: fn(&mut PS) -> &mut R::State,
    extract: fn(PA) -> Option<R::Action>,
    embed: fn(R::Action) -> PA,
) -> Scoped<PS, PA, R>
where
    R: Reducer,
{
    Scoped {
        reducer,
        state,
        extract,
        embed,
    }
}

/// Re-target a batch of child effects at the parent's action type.
#[must_use]
pub fn lift_effects<A, B>(effects: SmallVec<[Effect<A>; 4]>, embed: fn(A) -> B) -> SmallVec<[Effect<B>; 4]>
where
    A: Send + 'static,
    B: Send + 'static,
{
    effects.into_iter().map(|effect| effect.map(embed)).collect()
}

/// A child reducer focused on part of a parent's state and actions.
///
/// Created by [`scope`].
pub struct Scoped<PS, PA, R>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut PS) -> &mut R::State,
    extract: fn(PA) -> Option<R::Action>,
    embed: fn(R::Action) -> PA,
}

impl<PS, PA, R> Scoped<PS, PA, R>
where
    R: Reducer,
{
    /// The wrapped child reducer
    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.reducer
    }
}

impl<PS, PA, R> Reducer for Scoped<PS, PA, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    PA: Send + 'static,
{
    type State = PS;
    type Action = PA;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(child_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let child_state = (self.state)(state);
        let effects = self.reducer.reduce(child_state, child_action, env);
        lift_effects(effects, self.embed)
    }
}
