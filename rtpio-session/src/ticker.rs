use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Periodic driver for report synthesis: runs the callback every
/// `period` on a background thread until the ticker is closed or
/// dropped.
///
/// The time source is injected: each tick invokes the callback with
/// `time_now()`, so the session bookkeeping (`handle_timeout`) observes
/// exactly the instants the caller's clock produces and tests substitute
/// a deterministic one. The callback typically locks the bookkeeping and
/// hands any produced report to the transport.
#[derive(Debug)]
pub struct Ticker {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<C, F>(period: Duration, time_now: C, mut f: F) -> Ticker
    where
        C: Fn() -> Instant + Send + 'static,
        F: FnMut(Instant) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(mpsc::RecvTimeoutError::Timeout) => f(time_now()),
                    // stop signal or closed channel
                    _ => break,
                }
            }
        });
        Ticker {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stops the ticker and waits for its thread to finish.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
