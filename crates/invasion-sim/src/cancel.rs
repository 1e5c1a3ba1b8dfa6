use std::convert::Infallible;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Cancels every linked [`CancelToken`] when dropped.
///
/// No payload ever crosses the underlying channel; tokens observe the
/// disconnect, so the signal reaches all of them at once.
#[derive(Debug)]
pub struct CancelHandle {
    _tx: Sender<Infallible>,
}

impl CancelHandle {
    /// Fires the cancellation signal.
    pub fn cancel(self) {}
}

/// Cancellation signal observable by every simulation thread.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<Infallible>,
}

impl CancelToken {
    /// Channel that becomes ready once cancellation fires; for use inside
    /// `select!` arms.
    #[must_use]
    pub fn done(&self) -> &Receiver<Infallible> {
        &self.rx
    }

    /// True once the linked [`CancelHandle`] was cancelled or dropped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleeps for `timeout`, returning true if cancellation cut it short.
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> bool {
        !matches!(self.rx.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }
}

/// Creates a linked cancellation handle/token pair.
#[must_use]
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = bounded(0);
    (CancelHandle { _tx: tx }, CancelToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_quiet_until_cancelled() {
        let (handle, token) = cancel_pair();
        assert!(!token.is_cancelled());
        assert!(!token.wait(Duration::from_millis(5)));

        handle.cancel();
        assert!(token.is_cancelled());
        assert!(token.wait(Duration::from_millis(5)));
    }

    #[test]
    fn dropping_the_handle_cancels() {
        let (handle, token) = cancel_pair();
        let clone = token.clone();
        drop(handle);
        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }
}
