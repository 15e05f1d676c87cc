// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scoped listener attachment.

use std::fmt;

/// An attached listener. Dropping the subscription detaches it.
#[must_use = "dropping a subscription detaches its listener immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Subscription {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach now rather than at end of scope.
    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn detaches_once_on_drop() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        {
            let _sub = Subscription::new(move || seen.set(seen.get() + 1));
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn explicit_detach() {
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let sub = Subscription::new(move || seen.set(seen.get() + 1));
        sub.detach();
        assert_eq!(count.get(), 1);
    }
}
