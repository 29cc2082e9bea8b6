//! Capability required from anything that can be threaded into a reply tree.

use std::fmt::Debug;
use std::hash::Hash;

/// An item with an identity and an optional parent identity.
///
/// `parent_id` returns `None` for items that start a thread. A parent id that
/// matches no other item in the same collection is treated the same way.
pub trait Identifiable {
    type Id: Eq + Hash + Clone + Debug;

    fn id(&self) -> &Self::Id;

    fn parent_id(&self) -> Option<&Self::Id>;
}

impl<T: Identifiable + ?Sized> Identifiable for &T {
    type Id = T::Id;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }

    fn parent_id(&self) -> Option<&Self::Id> {
        (**self).parent_id()
    }
}
