use mnemo_core::session::SessionId;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Generates keys for insight sessions.
///
/// Keys combine a process-wide monotonic counter with a random suffix, so two
/// events arriving in the same instant still get distinct sessions.
#[derive(Debug, Default)]
pub struct InsightIdGenerator {
    counter: AtomicU64,
}

impl InsightIdGenerator {
    const PREFIX: &'static str = "evt-";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> SessionId {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let suffix = Uuid::new_v4().simple().to_string();
        // Telegram limits callback data to 64 bytes; keep the key short.
        SessionId::new(format!("{}{}-{}", Self::PREFIX, seq, &suffix[..16]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_and_not_interactive() {
        let generator = InsightIdGenerator::new();
        let ids: HashSet<SessionId> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| !id.is_interactive()));
        assert!(ids.iter().all(|id| id.as_str().starts_with("evt-")));
    }
}
