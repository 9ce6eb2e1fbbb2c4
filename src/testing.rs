//! Test doubles for the engine and display seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::display::{DisplayHost, SurfaceId};
use crate::engine::{Completer, SessionContext, VerificationEngine, VerificationResult};
use crate::error::VerificationError;
use crate::request::VerificationRequest;

/// Poll `cond` until it holds, panicking after two seconds.
pub async fn wait_until(cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// What a [`ScriptedEngine`] does on `initialize`.
pub enum Script {
    /// Complete immediately with the given result.
    Complete(VerificationResult),
    /// Keep the completer so the test can complete it later.
    Hold,
    /// Drop the completer without completing.
    Drop,
    /// Return an error from `initialize`.
    FailInit(VerificationError),
}

pub struct ScriptedEngine {
    script: Script,
    calls: AtomicUsize,
    held: Mutex<Vec<Completer>>,
}

impl ScriptedEngine {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            held: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn held(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    pub fn complete_held(&self, index: usize, result: VerificationResult) -> bool {
        let completer = self.held.lock().unwrap()[index].clone();
        completer.complete(result)
    }
}

#[async_trait]
impl VerificationEngine for ScriptedEngine {
    async fn initialize(
        &self,
        _request: &VerificationRequest,
        _ctx: &SessionContext,
        completer: Completer,
    ) -> Result<(), VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Complete(result) => {
                completer.complete(result.clone());
                Ok(())
            }
            Script::Hold => {
                self.held.lock().unwrap().push(completer);
                Ok(())
            }
            Script::Drop => Ok(()),
            Script::FailInit(e) => Err(e.clone()),
        }
    }
}

/// Display host that counts presents and dismissals and can simulate the user
/// closing the surface.
pub struct RecordingDisplay {
    has_window: bool,
    capture_completers: bool,
    next_id: AtomicU64,
    presented: AtomicUsize,
    dismissed: AtomicUsize,
    active: Mutex<HashMap<SurfaceId, Option<Completer>>>,
    order: Mutex<Vec<SurfaceId>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::build(true, true)
    }

    pub fn without_window() -> Self {
        Self::build(false, true)
    }

    /// A display that does not keep the session's completer alive.
    pub fn without_completion_capture() -> Self {
        Self::build(true, false)
    }

    fn build(has_window: bool, capture_completers: bool) -> Self {
        Self {
            has_window,
            capture_completers,
            next_id: AtomicU64::new(1),
            presented: AtomicUsize::new(0),
            dismissed: AtomicUsize::new(0),
            active: Mutex::new(HashMap::new()),
            order: Mutex::new(Vec::new()),
        }
    }

    pub fn presented(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }

    pub fn dismissed(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    pub fn is_balanced(&self) -> bool {
        self.presented() == self.dismissed() && self.active() == 0
    }

    /// Simulate the user closing the most recently presented surface that is still open.
    pub fn user_closes(&self) -> bool {
        let active = self.active.lock().unwrap();
        let order = self.order.lock().unwrap();
        let completer = order
            .iter()
            .rev()
            .find_map(|id| active.get(id).cloned().flatten());
        drop(order);
        drop(active);
        match completer {
            Some(completer) => completer.complete(Err(VerificationError::Dismissed)),
            None => false,
        }
    }
}

impl DisplayHost for RecordingDisplay {
    fn present(
        &self,
        _ctx: &SessionContext,
        completer: Completer,
    ) -> Result<SurfaceId, VerificationError> {
        if !self.has_window {
            return Err(VerificationError::PresentationUnavailable);
        }
        let id = SurfaceId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let completer = self.capture_completers.then_some(completer);
        self.active.lock().unwrap().insert(id, completer);
        self.order.lock().unwrap().push(id);
        self.presented.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    fn dismiss(&self, surface: SurfaceId) {
        let removed = self.active.lock().unwrap().remove(&surface);
        assert!(removed.is_some(), "surface {:?} dismissed twice", surface);
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}
