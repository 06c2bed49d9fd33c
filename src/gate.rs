use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Process-wide single-flight admission control.
///
/// At most one [`JobPermit`] exists at a time. Acquisition never waits: a second
/// caller is turned away rather than queued.
#[derive(Debug, Clone)]
pub struct JobGate {
    slot: Arc<Semaphore>,
}

/// Exclusive right to run the pipeline. The gate is free again once this is dropped.
#[derive(Debug)]
pub struct JobPermit {
    _permit: OwnedSemaphorePermit,
}

impl JobPermit {
    pub fn release(self) {}
}

impl Default for JobGate {
    fn default() -> Self {
        Self::new()
    }
}

impl JobGate {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn try_acquire(&self) -> Option<JobPermit> {
        self.slot
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| JobPermit { _permit: permit })
    }

    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected() {
        let gate = JobGate::new();
        let first = gate.try_acquire();
        assert!(first.is_some());
        assert!(gate.is_busy());
        assert!(gate.try_acquire().is_none());
    }

    #[test]
    fn test_release_frees_the_gate() {
        let gate = JobGate::new();
        let permit = gate.try_acquire().unwrap();
        permit.release();
        assert!(!gate.is_busy());

        let again = gate.try_acquire();
        assert!(again.is_some());
    }

    #[test]
    fn test_drop_releases() {
        let gate = JobGate::new();
        {
            let _permit = gate.try_acquire().unwrap();
            assert!(gate.is_busy());
        }
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_clones_share_state() {
        let gate = JobGate::new();
        let other = gate.clone();
        let _permit = gate.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }

    #[tokio::test]
    async fn test_permit_released_when_task_fails() {
        let gate = JobGate::new();
        let task_gate = gate.clone();
        let result = tokio::spawn(async move {
            let _permit = task_gate.try_acquire().unwrap();
            panic!("job blew up");
        })
        .await;

        assert!(result.is_err());
        assert!(!gate.is_busy());
    }
}
