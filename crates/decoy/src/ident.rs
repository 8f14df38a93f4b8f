// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity-compared shared values.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Shared value that compares by identity rather than by contents.
///
/// Argument and return comparisons use the type's own `PartialEq`. Wrap an
/// object in `Identity` when two distinct objects with equal contents must
/// count as different arguments.
///
/// ```
/// use decoy::Identity;
///
/// let a = Identity::new(vec![1, 2]);
/// let b = Identity::new(vec![1, 2]);
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// ```
pub struct Identity<T: ?Sized>(Arc<T>);

impl<T> Identity<T> {
    /// Allocate a new shared value.
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl<T: ?Sized> Identity<T> {
    /// Adopt an existing `Arc`; clones of it compare equal.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self(value)
    }

    /// The underlying `Arc`.
    pub fn as_arc(&self) -> &Arc<T> {
        &self.0
    }
}

impl<T: ?Sized> Clone for Identity<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for Identity<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for Identity<T> {}

impl<T: ?Sized> Deref for Identity<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Identity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity").field(&&*self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adopted_arc_compares_by_pointer() {
        let shared = Arc::new(String::from("payload"));
        let a = Identity::from_arc(Arc::clone(&shared));
        let b = Identity::from_arc(shared);
        let c = Identity::new(String::from("payload"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Arc::ptr_eq(a.as_arc(), b.as_arc()));
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn unsized_values_are_supported() {
        let slice: Arc<[u8]> = Arc::from(vec![1, 2, 3]);
        let a = Identity::from_arc(Arc::clone(&slice));
        assert_eq!(a, Identity::from_arc(slice));
        assert_eq!(format!("{a:?}"), "Identity([1, 2, 3])");
    }
}
