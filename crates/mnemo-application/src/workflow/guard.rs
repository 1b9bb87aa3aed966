//! Per-session in-flight tracking.
//!
//! At most one analysis or apply may run per session. A caller claims the
//! session with [`InFlight::begin`] and holds the returned guard for the
//! duration of the work; dropping the guard releases the claim, including on
//! early return or panic. A cancel marks the claim so the holder can drop its
//! result instead of storing it.

use mnemo_core::session::{SessionId, SessionPhase};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy)]
struct Claim {
    phase: SessionPhase,
    cancelled: bool,
}

#[derive(Debug, Default, Clone)]
pub struct InFlight {
    busy: Arc<Mutex<HashMap<SessionId, Claim>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Claim>> {
        // The map holds plain data; a poisoned lock is still consistent.
        self.busy.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims `session_id` for `phase`.
    ///
    /// Returns `Err(current_phase)` when the session is already busy.
    pub fn begin(
        &self,
        session_id: &SessionId,
        phase: SessionPhase,
    ) -> Result<InFlightGuard, SessionPhase> {
        let mut busy = self.lock();
        if let Some(current) = busy.get(session_id) {
            return Err(current.phase);
        }
        busy.insert(
            session_id.clone(),
            Claim {
                phase,
                cancelled: false,
            },
        );
        Ok(InFlightGuard {
            owner: self.clone(),
            session_id: session_id.clone(),
        })
    }

    /// The in-flight phase of `session_id`, if any work is running.
    pub fn phase(&self, session_id: &SessionId) -> Option<SessionPhase> {
        self.lock().get(session_id).map(|claim| claim.phase)
    }

    /// Marks the running work on `session_id` as cancelled. Returns false
    /// when nothing is in flight.
    pub fn cancel(&self, session_id: &SessionId) -> bool {
        match self.lock().get_mut(session_id) {
            Some(claim) => {
                claim.cancelled = true;
                true
            }
            None => false,
        }
    }
}

/// Releases its session's claim on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    owner: InFlight,
    session_id: SessionId,
}

impl InFlightGuard {
    /// True once [`InFlight::cancel`] was called for this claim.
    pub fn is_cancelled(&self) -> bool {
        self.owner
            .lock()
            .get(&self.session_id)
            .is_some_and(|claim| claim.cancelled)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.session_id);
    }
}
