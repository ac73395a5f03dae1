//! Deferred completion for the registration lifecycle.
//!
//! [`Deferred`] is the ticket handed out by the deferred registration facade:
//! a single-threaded promise that resolves exactly once, runs its callbacks
//! in attach order, and hands attached-after-resolution callbacks the value
//! immediately. No runtime is involved; resolution happens synchronously
//! inside `setup`.

use std::cell::RefCell;
use std::rc::Rc;

enum State<T> {
    Pending(Vec<Box<dyn FnOnce(&T)>>),
    Resolved(T),
}

/// A value that becomes available exactly once, later.
///
/// Clones share the same underlying slot.
pub struct Deferred<T> {
    state: Rc<RefCell<State<T>>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Clone> Deferred<T> {
    /// Creates an unresolved deferred.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State::Pending(Vec::new()))),
        }
    }

    /// Creates an already-resolved deferred.
    pub fn resolved(value: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(State::Resolved(value))),
        }
    }

    /// Attaches a callback.
    ///
    /// Pending: the callback runs when the deferred resolves, after all
    /// callbacks attached earlier. Resolved: the callback runs immediately.
    pub fn then(&self, callback: impl FnOnce(&T) + 'static) {
        let mut state = self.state.borrow_mut();
        match &mut *state {
            State::Pending(callbacks) => callbacks.push(Box::new(callback)),
            State::Resolved(value) => {
                let value = value.clone();
                drop(state);
                callback(&value);
            }
        }
    }

    /// The resolved value, if resolution has happened.
    pub fn get(&self) -> Option<T> {
        match &*self.state.borrow() {
            State::Resolved(value) => Some(value.clone()),
            State::Pending(_) => None,
        }
    }

    /// True once the deferred has resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.state.borrow(), State::Resolved(_))
    }

    /// Resolves with `value`, firing callbacks in attach order.
    ///
    /// Resolution is one-way; a deferred only ever resolves once (the single
    /// setup call site upholds this).
    pub(crate) fn resolve(&self, value: T) {
        let callbacks = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                State::Pending(callbacks) => {
                    let callbacks = std::mem::take(callbacks);
                    *state = State::Resolved(value.clone());
                    callbacks
                }
                State::Resolved(_) => {
                    debug_assert!(false, "deferred resolved twice");
                    return;
                }
            }
        };
        // Borrow released before callbacks run; a callback may attach more.
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T: Clone> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.state.borrow() {
            State::Pending(callbacks) => format!("pending ({} waiting)", callbacks.len()),
            State::Resolved(_) => "resolved".to_string(),
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}
