use async_std::sync::Mutex;
use futures::channel::mpsc;
use futures::StreamExt;

/// A bounded concurrency budget for oracle calls (§5 default: 8 concurrent
/// calls, additional calls queue). Built from a bounded channel pre-loaded
/// with one token per permit rather than a dedicated semaphore crate --
/// acquiring a permit is `rx.next()`, releasing is a non-blocking `try_send`
/// back onto the same channel.
pub struct OracleLimiter {
    tx: mpsc::Sender<()>,
    rx: Mutex<mpsc::Receiver<()>>,
}

/// Held while an oracle call is in flight; returns its token to the pool on
/// drop.
pub struct Permit {
    tx: mpsc::Sender<()>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let _ = self.tx.try_send(());
    }
}

impl OracleLimiter {
    /// Builds a limiter with `capacity` permits (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (mut tx, rx) = mpsc::channel(capacity);
        for _ in 0..capacity {
            tx.try_send(()).expect("channel sized to capacity");
        }
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Waits for a free permit, suspending if the budget is exhausted.
    pub async fn acquire(&self) -> Permit {
        let mut rx = self.rx.lock().await;
        rx.next().await.expect("limiter channel never closes while self is alive");
        Permit { tx: self.tx.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_std::test]
    async fn permits_are_returned_after_drop() {
        let limiter = OracleLimiter::new(1);
        let first = limiter.acquire().await;
        drop(first);
        let _second = limiter.acquire().await;
    }
}
