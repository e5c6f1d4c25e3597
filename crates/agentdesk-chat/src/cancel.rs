use tokio::sync::watch;

/// Creates a connected abort handle and cancel signal.
pub fn cancel_pair() -> (AbortHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, CancelSignal { rx })
}

/// Handle used to request cancellation of a running stream.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// The stream observes it at its next await point or between two
    /// dispatches, and the call returns `StreamError::Cancelled`.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }

    /// Returns another signal tied to this handle.
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving side of an `AbortHandle`, passed into a stream call.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// True once `abort` has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when `abort` is called.
    ///
    /// Never resolves if every handle is dropped without aborting.
    pub async fn cancelled(&mut self) {
        let observed = self.rx.wait_for(|aborted| *aborted).await.is_ok();
        if !observed {
            std::future::pending::<()>().await;
        }
    }
}
