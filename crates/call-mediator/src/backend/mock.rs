//! A recording, scriptable [`BackendHandle`] for tests.

use std::sync::Mutex;

use super::{BackendCommand, BackendHandle};

/// Records every command handed to it; tests assert against
/// [`MockBackend::issued`] and feed synthetic events back into the worker
/// through the normal client-visible channel.
pub struct MockBackend {
    issued: Mutex<Vec<BackendCommand>>,
    /// When `false`, [`BackendHandle::issue`] reports the command as
    /// undeliverable, simulating a dead backend connection.
    accepting: Mutex<bool>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            issued: Mutex::new(Vec::new()),
            accepting: Mutex::new(true),
        }
    }

    pub fn issued(&self) -> Vec<BackendCommand> {
        self.issued.lock().unwrap().clone()
    }

    pub fn last_issued(&self) -> Option<BackendCommand> {
        self.issued.lock().unwrap().last().cloned()
    }

    pub fn set_accepting(&self, accepting: bool) {
        *self.accepting.lock().unwrap() = accepting;
    }
}

impl BackendHandle for MockBackend {
    fn issue(&self, command: BackendCommand) -> bool {
        let accepting = *self.accepting.lock().unwrap();
        if accepting {
            self.issued.lock().unwrap().push(command);
        }
        accepting
    }
}
