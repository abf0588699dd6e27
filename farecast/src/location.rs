//! Location field with place suggestions.
//!
//! One [`LocationState`] per field (pickup, drop). Typing clears the
//! remembered coordinates; only picking a suggestion sets them. Lookups run
//! for queries of at least `min_query_len` characters, each new query
//! cancelling the previous one. Lookup failures are swallowed and leave the
//! list empty.
//!
//! Losing focus hides the list after a short grace period so that a click on
//! a suggestion, which arrives after the blur, still selects it. A lookup that
//! answers once the list has been dismissed keeps its candidates hidden until
//! the field is focused again.

use crate::environment::BookingEnvironment;
use crate::error::FareError;
use crate::types::{Coordinates, LocationSuggestion};
use farecast_core::{Effect, EffectId, Reducer, SmallVec, cancellable, delay, smallvec};
use std::sync::Arc;

/// Which field a [`LocationState`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationField {
    /// Pickup location
    Pickup,
    /// Drop location
    Drop,
}

impl LocationField {
    /// Cancellation id of the field's suggestion lookup
    #[must_use]
    pub const fn search_id(self) -> EffectId {
        match self {
            Self::Pickup => EffectId::new("location/pickup/search"),
            Self::Drop => EffectId::new("location/drop/search"),
        }
    }

    /// Cancellation id of the field's delayed dismissal
    #[must_use]
    pub const fn dismiss_id(self) -> EffectId {
        match self {
            Self::Pickup => EffectId::new("location/pickup/dismiss"),
            Self::Drop => EffectId::new("location/drop/dismiss"),
        }
    }
}

/// The text of a field and the coordinates bound to it
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSelection {
    /// Field text
    pub text: String,
    /// Set only by picking a suggestion
    pub coordinates: Option<Coordinates>,
}

/// State of one location field
#[derive(Debug, Clone, PartialEq)]
pub struct LocationState {
    /// Which field this is
    pub field: LocationField,
    /// Current text
    pub text: String,
    /// Coordinates of the picked suggestion, cleared on every edit
    pub coordinates: Option<Coordinates>,
    /// Candidates for the current text
    pub suggestions: Vec<LocationSuggestion>,
    /// Whether the candidate list is showing
    pub show_suggestions: bool,
    /// Whether the field has focus
    pub focused: bool,
    query_generation: u64,
}

impl LocationState {
    /// An empty field
    #[must_use]
    pub const fn new(field: LocationField) -> Self {
        Self {
            field,
            text: String::new(),
            coordinates: None,
            suggestions: Vec::new(),
            show_suggestions: false,
            focused: false,
            query_generation: 0,
        }
    }

    /// Text and coordinates as submitted
    #[must_use]
    pub fn selection(&self) -> LocationSelection {
        LocationSelection {
            text: self.text.clone(),
            coordinates: self.coordinates,
        }
    }
}

/// Location field actions
#[derive(Debug, Clone, PartialEq)]
pub enum LocationAction {
    /// The user edited the text
    TextChanged(String),
    /// A lookup answered
    SuggestionsLoaded {
        /// Query the lookup was started for
        generation: u64,
        /// Candidates found
        suggestions: Vec<LocationSuggestion>,
    },
    /// A lookup failed
    SuggestionsFailed {
        /// Query the lookup was started for
        generation: u64,
        /// Failure, logged only
        error: FareError,
    },
    /// The user picked a candidate
    SuggestionSelected(LocationSuggestion),
    /// The field lost focus
    FocusLost,
    /// The field gained focus
    FocusGained,
    /// The dismissal grace period ended
    HideSuggestions,
}

/// Reducer for [`LocationState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationReducer;

impl Reducer for LocationReducer {
    type State = LocationState;
    type Action = LocationAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let field = state.field;

        match action {
            LocationAction::TextChanged(text) => {
                state.text = text;
                state.coordinates = None;
                state.focused = true;
                state.query_generation += 1;

                let query = state.text.trim().to_string();
                if query.chars().count() < env.timings.min_query_len {
                    state.suggestions.clear();
                    state.show_suggestions = false;
                    return smallvec![Effect::Cancel(field.search_id())];
                }

                let generation = state.query_generation;
                let places = Arc::clone(&env.places);
                let debounce = env.timings.suggestion_debounce;

                smallvec![
                    Effect::Future(Box::pin(async move {
                        if !debounce.is_zero() {
                            tokio::time::sleep(debounce).await;
                        }
                        Some(match places.search(query).await {
                            Ok(suggestions) => LocationAction::SuggestionsLoaded {
                                generation,
                                suggestions,
                            },
                            Err(error) => LocationAction::SuggestionsFailed { generation, error },
                        })
                    }))
                    .cancellable(field.search_id())
                ]
            },

            LocationAction::SuggestionsLoaded {
                generation,
                suggestions,
            } => {
                if generation != state.query_generation {
                    return SmallVec::new();
                }
                state.show_suggestions = state.focused && !suggestions.is_empty();
                state.suggestions = suggestions;
                SmallVec::new()
            },

            LocationAction::SuggestionsFailed { generation, error } => {
                tracing::debug!(?field, %error, "Suggestion lookup failed");
                if generation == state.query_generation {
                    state.suggestions.clear();
                    state.show_suggestions = false;
                }
                SmallVec::new()
            },

            LocationAction::SuggestionSelected(suggestion) => {
                tracing::debug!(?field, place = %suggestion.display_name, "Suggestion selected");
                state.text = suggestion.display_name;
                state.coordinates = Some(suggestion.coordinates);
                state.suggestions.clear();
                state.show_suggestions = false;
                state.query_generation += 1;

                smallvec![
                    Effect::Cancel(field.search_id()),
                    Effect::Cancel(field.dismiss_id()),
                ]
            },

            LocationAction::FocusLost => smallvec![cancellable! {
                id: field.dismiss_id(),
                effect: delay! {
                    duration: env.timings.dismiss_grace,
                    action: LocationAction::HideSuggestions
                }
            }],

            LocationAction::FocusGained => {
                state.focused = true;
                if !state.suggestions.is_empty() {
                    state.show_suggestions = true;
                }
                smallvec![Effect::Cancel(field.dismiss_id())]
            },

            LocationAction::HideSuggestions => {
                state.focused = false;
                state.show_suggestions = false;
                SmallVec::new()
            },
        }
    }
}
