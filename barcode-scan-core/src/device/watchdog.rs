use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::models::error::ScanError;

/// One-shot timer on a named background thread.
///
/// Fires `on_expire` after `timeout` unless disarmed first. Disarming only
/// drops the channel sender, so it never blocks and is safe to do from
/// inside `on_expire` itself.
pub(crate) struct Watchdog {
    cancel: Option<mpsc::Sender<()>>,
}

impl Watchdog {
    pub(crate) fn arm<F>(name: &str, timeout: Duration, on_expire: F) -> Result<Self, ScanError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<()>();
        thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(timeout) {
                    on_expire();
                }
            })
            .map_err(|e| ScanError::Unknown(format!("failed to spawn {} thread: {}", name, e)))?;

        Ok(Self { cancel: Some(tx) })
    }

    pub(crate) fn disarm(&mut self) {
        self.cancel.take();
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn fires_after_timeout() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let _watchdog = Watchdog::arm("test-watchdog", Duration::from_millis(20), move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        thread::sleep(Duration::from_millis(300));
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn disarm_prevents_firing() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let mut watchdog = Watchdog::arm("test-watchdog", Duration::from_millis(100), move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

        watchdog.disarm();
        thread::sleep(Duration::from_millis(300));
        assert!(!fired.load(Ordering::SeqCst));
    }
}
