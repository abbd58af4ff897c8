use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// Creates a connected stop handle and signal.
pub fn channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = mpsc::channel();
    (
        ShutdownHandle { tx },
        ShutdownSignal {
            rx,
            triggered: false,
        },
    )
}

/// Requests the monitor to stop. Cloneable, safe to trigger more than once.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Sender<()>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

/// Observed by the monitor loop between cycles and while sleeping.
pub struct ShutdownSignal {
    rx: Receiver<()>,
    triggered: bool,
}

impl ShutdownSignal {
    pub fn is_triggered(&mut self) -> bool {
        if !self.triggered {
            self.triggered = matches!(self.rx.try_recv(), Ok(()));
        }
        self.triggered
    }

    /// Sleeps up to `timeout`; returns true as soon as a stop is requested.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        if self.triggered {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                self.triggered = true;
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            // Nobody can stop us any more; keep the cadence.
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn untriggered_signal_waits_for_timeout() {
        let (_handle, mut signal) = channel();
        assert!(!signal.is_triggered());
        assert!(!signal.wait(Duration::from_millis(10)));
    }

    #[test]
    fn trigger_is_sticky() {
        let (handle, mut signal) = channel();
        handle.trigger();
        handle.trigger();
        assert!(signal.is_triggered());
        assert!(signal.is_triggered());
        assert!(signal.wait(Duration::from_secs(5)));
    }

    #[test]
    fn trigger_interrupts_wait() {
        let (handle, mut signal) = channel();
        let start = Instant::now();
        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.trigger();
        });
        assert!(signal.wait(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        worker.join().unwrap();
    }

    #[test]
    fn dropped_handle_still_sleeps() {
        let (handle, mut signal) = channel();
        drop(handle);
        let start = Instant::now();
        assert!(!signal.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
