//! Identifiers for cancellable effects.
//!
//! An [`EffectId`] names a family of running effects (a narration timer, a
//! pending suggestion lookup, a ride timeline) so a reducer can cancel them
//! later without holding on to task handles.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Name of a cancellable effect.
///
/// `EffectId` is a newtype over a copy-on-write string so the common case of
/// a `'static` literal never allocates.
///
/// # Examples
///
/// ```
/// use farecast_core::EffectId;
///
/// let id = EffectId::new("smart/narration");
/// assert_eq!(id.as_str(), "smart/narration");
/// assert_eq!(id, EffectId::from("smart/narration"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(Cow<'static, str>);

impl EffectId {
    /// Create an id from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create an id from a name built at runtime.
    #[must_use]
    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for EffectId {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EffectId {
    fn from(name: String) -> Self {
        Self::owned(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn borrowed_and_owned_ids_compare_equal() {
        let borrowed = EffectId::new("location/pickup/search");
        let owned = EffectId::owned(format!("location/{}/search", "pickup"));
        assert_eq!(borrowed, owned);

        let mut set = HashSet::new();
        set.insert(borrowed);
        assert!(set.contains(&owned));
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(EffectId::new("ride/timeline").to_string(), "ride/timeline");
    }

    proptest::proptest! {
        #[test]
        fn owned_ids_keep_their_name(name in "[a-z/]{0,32}") {
            let id = EffectId::owned(name.clone());
            proptest::prop_assert_eq!(id.as_str(), name.as_str());
            proptest::prop_assert_eq!(id.to_string(), name);
        }
    }
}
