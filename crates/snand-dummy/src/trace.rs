//! Bus trace shared between a dummy chip and a test

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::vec::Vec;

use crate::DummyNand;

/// One command seen on the emulated bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEvent {
    /// Thread that issued the command
    pub thread: ThreadId,
    /// Opcode
    pub opcode: u8,
    /// Address phase, if any
    pub address: Option<u32>,
}

/// Cloneable handle on the list of commands a [`DummyNand`] executed
#[derive(Debug, Clone, Default)]
pub struct BusTrace {
    events: Arc<Mutex<Vec<BusEvent>>>,
}

impl BusTrace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<BusEvent>> {
        // A panicking test thread must not hide the events it recorded
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn record(&self, opcode: u8, address: Option<u32>) {
        self.lock().push(BusEvent {
            thread: thread::current().id(),
            opcode,
            address,
        });
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<BusEvent> {
        self.lock().clone()
    }

    /// Forget the recorded events
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl DummyNand {
    /// Record every command from now on, returning the trace handle
    pub fn enable_trace(&mut self) -> BusTrace {
        let trace = BusTrace::new();
        self.trace = Some(trace.clone());
        trace
    }
}
