//! Scoped listener tasks.

use std::future::Future;

use tokio::task::JoinHandle;

/// Owns a listener task and aborts it on drop.
///
/// Guarantees a replaced or torn-down subscription can never keep
/// publishing: whoever holds the guard holds the subscription.
#[derive(Debug)]
pub struct SubscriptionGuard {
    handle: JoinHandle<()>,
}

impl SubscriptionGuard {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let alive = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&alive);
        let guard = SubscriptionGuard::spawn(async move {
            // Would run forever if not aborted.
            loop {
                tokio::time::sleep(Duration::from_millis(1)).await;
                flag.store(true, Ordering::SeqCst);
            }
        });
        assert!(!guard.is_finished());
        drop(guard);

        tokio::time::sleep(Duration::from_millis(20)).await;
        alive.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!alive.load(Ordering::SeqCst), "aborted task kept running");
    }
}
