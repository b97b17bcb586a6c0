//! Change-tracking property storage.

use crate::{id::ComponentId, scheduler::Scheduler};

/// A property value that reports its owner dirty whenever it changes.
///
/// Writing a value equal to the current one is a no-op. This keeps
/// idempotent writes from the relation engine from scheduling further work,
/// which is what lets a settle pass reach its fixpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCell<T> {
    value: T,
}

impl<T: PartialEq> PropertyCell<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Returns the current value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Stores `value` and marks `owner` dirty if it differs from the current value.
    ///
    /// Returns whether the value changed.
    pub(crate) fn set(&mut self, value: T, owner: ComponentId, scheduler: &mut Scheduler) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        scheduler.mark_dirty(owner);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{id::ShapeId, scheduler::ManualClock};

    #[test]
    fn test_set_marks_owner_dirty_on_change() {
        let mut scheduler = Scheduler::new(Box::new(ManualClock));
        let owner = ComponentId::from(ShapeId::new(1));
        let mut cell = PropertyCell::new(1.0f32);

        assert!(cell.set(2.0, owner, &mut scheduler));
        assert_eq!(*cell.get(), 2.0);
        assert!(scheduler.is_dirty(owner));
    }

    #[test]
    fn test_set_equal_value_is_noop() {
        let mut scheduler = Scheduler::new(Box::new(ManualClock));
        let owner = ComponentId::from(ShapeId::new(1));
        let mut cell = PropertyCell::new(String::from("label"));

        assert!(!cell.set(String::from("label"), owner, &mut scheduler));
        assert!(!scheduler.is_dirty(owner));
        assert!(!scheduler.frame_requested());
    }
}
