use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;

/// At most one run at a time. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    running: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claim the flag, or `None` if a run already holds it.
    pub fn try_acquire(&self, release_delay: Duration) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        Some(RunGuard {
            running: Arc::clone(&self.running),
            release_delay,
        })
    }
}

/// Holds the running flag until dropped, then clears it, after `release_delay` when
/// one is set and a tokio runtime is available to wait on.
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
    release_delay: Duration,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.release_delay.is_zero() {
            self.running.store(false, Ordering::Release);
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let running = Arc::clone(&self.running);
                let delay = self.release_delay;
                debug!("Releasing run guard in {:?}", delay);
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    running.store(false, Ordering::Release);
                });
            }
            Err(_) => self.running.store(false, Ordering::Release),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let flight = SingleFlight::new();
        let guard = flight.try_acquire(Duration::ZERO).unwrap();
        assert!(flight.is_running());
        assert!(flight.try_acquire(Duration::ZERO).is_none());
        assert!(flight.is_running());

        drop(guard);
        assert!(!flight.is_running());
        assert!(flight.try_acquire(Duration::ZERO).is_some());
    }

    #[test]
    fn test_release_on_panic() {
        let flight = SingleFlight::new();
        let shared = flight.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = shared.try_acquire(Duration::ZERO).unwrap();
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(!flight.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_release() {
        let flight = SingleFlight::new();
        drop(flight.try_acquire(Duration::from_secs(3)).unwrap());
        assert!(flight.is_running());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(flight.is_running());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!flight.is_running());
    }

    #[test]
    fn test_delayed_release_without_runtime_is_immediate() {
        let flight = SingleFlight::new();
        drop(flight.try_acquire(Duration::from_secs(3)).unwrap());
        assert!(!flight.is_running());
    }
}
