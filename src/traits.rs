//! The generic mapping entry point shared by all generated conversions.
//!
//! Generated assign and construct functions never inline nested
//! conversions; a property whose type is itself projected is mapped through
//! [`MapTo`], so recursive projection graphs terminate without duplicating
//! mapping bodies, and generic pairs can bound their parameters on it.

/// Bidirectional-capable mapping of `self` into a `T`.
///
/// The generator implements this in both directions for every projected
/// pair. The blanket identity impl makes every clonable type map to itself,
/// which is what lets a generic parameter be instantiated with an
/// unprojected type (`Page<String>` maps to `PageDto<String>` with the
/// strings cloned through the identity).
pub trait MapTo<T> {
    /// Construct a mapped value.
    fn map_to(&self) -> T;

    /// Assign into an existing value, overwriting the mapped fields.
    fn assign_to(&self, target: &mut T);
}

impl<T: Clone> MapTo<T> for T {
    fn map_to(&self) -> T {
        self.clone()
    }

    fn assign_to(&self, target: &mut T) {
        *target = self.clone();
    }
}

/// Hook points around generated assignment, enabled per type with the
/// `hooks` annotation flag. Both methods default to doing nothing; an
/// opted-in type provides one `impl MapHooks<Target> for Source` block and
/// overrides what it needs. Regeneration never touches that block.
pub trait MapHooks<T> {
    fn before_assign(&self, _target: &mut T) {}

    fn after_assign(&self, _target: &mut T) {}
}
