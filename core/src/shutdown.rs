//! A synchronization utility for broadcasting a shutdown signal to the
//! server's background actors (Monitor, Coordinator workers).
//!
//! Ported near-verbatim from the teacher's `common::shutdown::ShutdownChannel`
//! (`(ab)uses` a zero-permit [`Semaphore`] so every clone can independently
//! observe a signal sent before it subscribed, unlike
//! [`tokio::sync::broadcast`]).

use std::sync::Arc;

use tokio::sync::Semaphore;

#[derive(Clone, Debug)]
pub struct ShutdownChannel {
    inner: Arc<Semaphore>,
}

impl ShutdownChannel {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Semaphore::new(0)),
        }
    }

    /// Sends a shutdown signal; safe to call more than once.
    pub fn send(&self) {
        self.inner.close()
    }

    /// Waits for a shutdown signal, returning immediately if one was already
    /// sent before this call.
    pub async fn recv(&self) {
        self.inner
            .acquire()
            .await
            .map_err(|_| ())
            .expect_err("semaphore should only close, never hand out permits")
    }

    pub fn try_recv(&self) -> bool {
        self.inner.is_closed()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::time;

    use super::*;

    #[test]
    fn multiple_sends_is_safe() {
        let shutdown = ShutdownChannel::new();
        shutdown.send();
        shutdown.send();
    }

    #[tokio::test(start_paused = true)]
    async fn subscribe_after_close_returns_immediately() {
        let shutdown = ShutdownChannel::new();
        shutdown.send();
        let subscriber = shutdown.clone();
        time::timeout(Duration::from_millis(10), subscriber.recv())
            .await
            .expect("recv() should return immediately after send()");
    }

    #[tokio::test(start_paused = true)]
    async fn recv_blocks_until_sent() {
        let shutdown = ShutdownChannel::new();
        assert!(!shutdown.try_recv());
        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.recv().await });
        time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());
        shutdown.send();
        handle.await.unwrap();
    }
}
