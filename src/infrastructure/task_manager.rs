use std::future::Future;
use tokio::task::JoinHandle;

/// Background task kinds owned by one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSlot {
    /// Handshake plus inbound read loop
    Reader = 0,
    /// Keepalive ping interval
    Heartbeat = 1,
    /// Pending reconnect delay
    Reconnect = 2,
}

/// Holds at most one task per slot and aborts them on teardown
#[derive(Default)]
pub struct TaskManager {
    handles: [Option<JoinHandle<()>>; 3],
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn into a slot, aborting whatever occupied it
    pub fn spawn<F>(&mut self, slot: TaskSlot, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel(slot);
        self.handles[slot as usize] = Some(tokio::spawn(future));
    }

    /// Abort the task in a slot; true if one was running
    pub fn cancel(&mut self, slot: TaskSlot) -> bool {
        match self.handles[slot as usize].take() {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                running
            }
            None => false,
        }
    }

    /// Forget a slot's handle without aborting it.
    ///
    /// Used by a task that is about to finish on its own and must not abort
    /// itself mid-transition.
    pub fn release(&mut self, slot: TaskSlot) {
        self.handles[slot as usize] = None;
    }

    pub fn is_live(&self, slot: TaskSlot) -> bool {
        self.handles[slot as usize]
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort every tracked task without waiting
    pub fn abort_all(&mut self) {
        for handle in self.handles.iter_mut() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.abort_all();
    }
}
