//! Message handling, and a worker thread that runs the engine off the host's
//! thread of control.

use crate::message::{self, HostMessage, Response};
use crate::probability::Probabilities;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The engine side of the boundary. Holds one game at a time.
#[derive(Default)]
pub struct Engine {
    game: Option<Probabilities>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(&self) -> Option<&Probabilities> {
        self.game.as_ref()
    }

    /// Applies one host message. Only requests produce a response.
    ///
    /// Reveals and requests before the first `Init` are errors: they mean the
    /// host is out of sequence.
    pub fn handle(&mut self, message: HostMessage) -> anyhow::Result<Option<Response>> {
        match message {
            HostMessage::Init { mines, rows } => {
                self.game = Some(Probabilities::new(mines, &rows)?);
                Ok(None)
            }
            HostMessage::Reveal(points) => {
                let Some(game) = self.game.as_mut() else {
                    anyhow::bail!("not_initialized");
                };
                game.add_squares(&points);
                Ok(None)
            }
            HostMessage::Request(kind) => {
                let Some(game) = self.game.as_ref() else {
                    anyhow::bail!("not_initialized");
                };
                Ok(Some(game.fulfill_request(kind)))
            }
        }
    }

    /// Like [`Engine::handle`], on bcs-encoded messages.
    pub fn handle_bytes(&mut self, bts: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
        let decoded: HostMessage = message::decode(bts)?;
        match self.handle(decoded)? {
            Some(response) => Ok(Some(message::encode(&response)?)),
            None => Ok(None),
        }
    }
}

/// Handle to an engine running on its own thread.
pub struct Worker {
    tx: Sender<HostMessage>,
    rx: Receiver<Response>,
    handle: JoinHandle<anyhow::Result<()>>,
}

/// Starts an engine on a background thread.
pub fn spawn() -> Worker {
    let (tx, inbox) = mpsc::channel::<HostMessage>();
    let (outbox, rx) = mpsc::channel::<Response>();

    let handle = thread::spawn(move || -> anyhow::Result<()> {
        let mut engine = Engine::new();
        for message in inbox {
            if let Some(response) = engine.handle(message)? {
                // The host may have stopped listening; that is not an error.
                let _ = outbox.send(response);
            }
        }
        Ok(())
    });

    Worker { tx, rx, handle }
}

impl Worker {
    /// Queues a message for the engine without waiting.
    pub fn send(&self, message: HostMessage) -> anyhow::Result<()> {
        self.tx
            .send(message)
            .map_err(|_| anyhow::anyhow!("worker_gone"))
    }

    /// A response, if one has arrived.
    pub fn try_recv(&self) -> anyhow::Result<Option<Response>> {
        match self.rx.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => anyhow::bail!("worker_gone"),
        }
    }

    /// Waits up to `timeout` for a response.
    pub fn recv_timeout(&self, timeout: Duration) -> anyhow::Result<Option<Response>> {
        match self.rx.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => anyhow::bail!("worker_gone"),
        }
    }

    /// Stops the worker and reports the error that ended it, if any.
    pub fn shutdown(self) -> anyhow::Result<()> {
        let Worker { tx, rx, handle } = self;
        drop(tx);
        drop(rx);
        match handle.join() {
            Ok(result) => result,
            Err(_) => anyhow::bail!("worker_panicked"),
        }
    }
}
