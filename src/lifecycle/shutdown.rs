//! Shutdown coordination for background tasks.

use tokio::sync::broadcast;

/// Fan-out stop signal for the heartbeat loops and any other long-running
/// task the caller wires up.
///
/// Each task holds a receiver and returns promptly when the signal fires,
/// including while waiting on its interval tick. Pending penalty-decay
/// timers are not tracked here; they are dropped with the runtime.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe before spawning the task that will listen.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber to stop.
    pub fn signal(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
