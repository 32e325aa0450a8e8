//! Callback registry - keeps bridged host functions alive
//!
//! Every host function handed to Lua is retained here. The Lua closure only
//! holds a weak reference, so releasing an entry (explicitly, or by releasing
//! the runtime handle) makes the closure fail instead of keeping the host
//! function alive for the life of the Lua state.

use crate::value::HostFunction;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::debug;

/// Registry handle of a bridged host function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A host function reachable from Lua
#[derive(Debug)]
pub struct BridgedCallable {
    id: CallbackId,
    function: HostFunction,
}

impl BridgedCallable {
    pub fn id(&self) -> CallbackId {
        self.id
    }

    pub fn function(&self) -> &HostFunction {
        &self.function
    }

    /// Arity hint carried from the host function
    pub fn arity(&self) -> Option<usize> {
        self.function.arity()
    }
}

/// Retained host functions, keyed by id and by closure identity
#[derive(Default)]
pub struct CallbackRegistry {
    next_id: Cell<u64>,
    entries: RefCell<HashMap<CallbackId, Rc<BridgedCallable>>>,
    by_identity: RefCell<HashMap<usize, CallbackId>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain `function`, reusing the existing entry when the same closure
    /// was bridged before.
    pub fn retain(&self, function: &HostFunction) -> (CallbackId, Weak<BridgedCallable>) {
        let identity = function.identity();

        if let Some(id) = self.by_identity.borrow().get(&identity).copied() {
            if let Some(entry) = self.entries.borrow().get(&id) {
                return (id, Rc::downgrade(entry));
            }
        }

        let id = CallbackId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let entry = Rc::new(BridgedCallable {
            id,
            function: function.clone(),
        });
        let weak = Rc::downgrade(&entry);

        self.entries.borrow_mut().insert(id, entry);
        self.by_identity.borrow_mut().insert(identity, id);
        debug!(%id, name = function.name(), "retained host function");

        (id, weak)
    }

    /// Release an entry. Returns `false` if the id was not live.
    pub fn release(&self, id: CallbackId) -> bool {
        let removed = self.entries.borrow_mut().remove(&id);
        match removed {
            Some(entry) => {
                self.by_identity
                    .borrow_mut()
                    .remove(&entry.function.identity());
                debug!(%id, name = entry.function.name(), "released host function");
                true
            }
            None => false,
        }
    }

    /// Release every entry
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.by_identity.borrow_mut().clear();
    }

    pub fn get(&self, id: CallbackId) -> Option<Rc<BridgedCallable>> {
        self.entries.borrow().get(&id).cloned()
    }

    /// Id of a retained function, if any
    pub fn id_of(&self, function: &HostFunction) -> Option<CallbackId> {
        self.by_identity
            .borrow()
            .get(&function.identity())
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("live", &self.len())
            .field("next_id", &self.next_id.get())
            .finish()
    }
}
