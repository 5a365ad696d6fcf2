//! Cross-thread send queue drained on the platform event loop.
//!
//! Any thread may submit an [`OutboundJob`] through a cloned [`Outbox`]. The
//! [`OutboxWorker`] runs on the event loop and spawns each job as its own task,
//! so submission order is preserved while completion order is not.
//!
//! Only channel create/destroy and embed sends carry a completion channel;
//! their callers hold a [`Pending`] and wait with a bounded timeout. Everything
//! else is fire-and-forget: failures are logged here and go no further.

use crate::{ChannelId, ChannelInfo, NewChannel, Outbound, SendTarget, Status, Transport, UserId};
use herald_error::{
    DispatchError, DispatchErrorKind, RoomError, RoomErrorKind, TransportError, TransportResult,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, instrument};

/// Bound on how long callers wait for an awaited operation.
pub const AWAIT_TIMEOUT: Duration = Duration::from_secs(5);

type Reply<T> = oneshot::Sender<TransportResult<T>>;

/// One unit of outbound work.
#[derive(Debug)]
pub enum OutboundJob {
    /// Send a payload; `done` is set only when the caller awaits completion.
    Send {
        /// Destination
        target: SendTarget,
        /// Payload
        content: Outbound,
        /// Completion channel for awaited sends
        done: Option<Reply<()>>,
    },
    /// Create a channel or category.
    CreateChannel {
        /// What to create
        request: NewChannel,
        /// Completion channel
        done: Reply<ChannelInfo>,
    },
    /// Delete a channel or category.
    DeleteChannel {
        /// Channel to delete
        channel: ChannelId,
        /// Completion channel
        done: Reply<()>,
    },
    /// Grant read access on a channel.
    GrantRead {
        /// Channel
        channel: ChannelId,
        /// Member to let in
        user: UserId,
    },
    /// Change the bot's global presence.
    SetPresence {
        /// New status
        status: Status,
        /// Activity text
        activity: Option<String>,
    },
}

impl OutboundJob {
    /// Short name for logs.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Send { .. } => "send",
            Self::CreateChannel { .. } => "create channel",
            Self::DeleteChannel { .. } => "delete channel",
            Self::GrantRead { .. } => "grant read",
            Self::SetPresence { .. } => "set presence",
        }
    }

    /// Execute the job against the transport.
    pub async fn run(self, transport: Arc<dyn Transport>) {
        let operation = self.describe();
        match self {
            Self::Send {
                target,
                content,
                done,
            } => {
                let result = transport.send(target, content).await;
                match done {
                    Some(done) => deliver(done, result),
                    None => log_failure(operation, result),
                }
            }
            Self::CreateChannel { request, done } => {
                deliver(done, transport.create_channel(request).await);
            }
            Self::DeleteChannel { channel, done } => {
                deliver(done, transport.delete_channel(channel).await);
            }
            Self::GrantRead { channel, user } => {
                log_failure(operation, transport.grant_read(channel, user).await);
            }
            Self::SetPresence { status, activity } => {
                log_failure(operation, transport.set_presence(status, activity).await);
            }
        }
    }
}

fn deliver<T>(done: Reply<T>, result: TransportResult<T>) {
    // The waiter may have timed out already.
    let _ = done.send(result);
}

fn log_failure<T>(operation: &str, result: TransportResult<T>) {
    if let Err(e) = result {
        error!(operation, error = %e, "Outbound operation failed");
    }
}

/// The outbound queue has been closed by a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Outbound queue closed")]
pub struct OutboxClosed;

impl From<OutboxClosed> for DispatchError {
    #[track_caller]
    fn from(_: OutboxClosed) -> Self {
        DispatchError::new(DispatchErrorKind::QueueClosed)
    }
}

impl From<OutboxClosed> for RoomError {
    #[track_caller]
    fn from(_: OutboxClosed) -> Self {
        RoomError::new(RoomErrorKind::QueueClosed)
    }
}

/// Thread-safe submission side of the send queue.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<OutboundJob>,
}

impl Outbox {
    /// Create a queue, returning the submission side and the receiving side.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Submit a job without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxClosed`] once the worker side has gone away.
    pub fn submit(&self, job: OutboundJob) -> Result<(), OutboxClosed> {
        self.tx.send(job).map_err(|_| OutboxClosed)
    }

    /// Submit a job carrying a completion channel and return its [`Pending`].
    ///
    /// # Errors
    ///
    /// Returns [`OutboxClosed`] once the worker side has gone away.
    pub fn request<T>(
        &self,
        operation: &'static str,
        job: impl FnOnce(Reply<T>) -> OutboundJob,
    ) -> Result<Pending<T>, OutboxClosed> {
        let (done, rx) = oneshot::channel();
        self.submit(job(done))?;
        Ok(Pending {
            rx,
            operation,
            timeout: AWAIT_TIMEOUT,
        })
    }

    /// Whether the worker side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Why waiting on a [`Pending`] failed.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
pub enum AwaitError {
    /// No completion within the bound.
    #[display("Timed out after {}s waiting for {}", timeout.as_secs(), operation)]
    Timeout {
        /// Operation awaited
        operation: &'static str,
        /// Bound that elapsed
        timeout: Duration,
    },
    /// The job was abandoned (queue shut down before it ran).
    #[display("{} was abandoned", _0)]
    Abandoned(#[error(not(source))] &'static str),
    /// The platform reported a failure.
    #[display("{}", _0)]
    Transport(TransportError),
}

impl From<AwaitError> for RoomError {
    #[track_caller]
    fn from(err: AwaitError) -> Self {
        match err {
            AwaitError::Timeout { operation, timeout } => RoomError::new(RoomErrorKind::Timeout {
                operation: operation.to_string(),
                seconds: timeout.as_secs(),
            }),
            AwaitError::Abandoned(_) => RoomError::new(RoomErrorKind::QueueClosed),
            AwaitError::Transport(e) => RoomError::new(RoomErrorKind::Transport(e.message)),
        }
    }
}

impl From<AwaitError> for DispatchError {
    #[track_caller]
    fn from(err: AwaitError) -> Self {
        match err {
            AwaitError::Timeout { operation, timeout } => {
                DispatchError::new(DispatchErrorKind::Timeout {
                    operation: operation.to_string(),
                    seconds: timeout.as_secs(),
                })
            }
            AwaitError::Abandoned(_) => DispatchError::new(DispatchErrorKind::QueueClosed),
            AwaitError::Transport(e) => DispatchError::new(DispatchErrorKind::Transport(e.message)),
        }
    }
}

/// Completion of an awaited outbound job.
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<TransportResult<T>>,
    operation: &'static str,
    timeout: Duration,
}

impl<T> Pending<T> {
    /// Override the wait bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait for the job to finish.
    ///
    /// # Errors
    ///
    /// Returns [`AwaitError`] on timeout, abandonment, or platform failure.
    pub async fn wait(self) -> Result<T, AwaitError> {
        match tokio::time::timeout(self.timeout, self.rx).await {
            Ok(Ok(result)) => result.map_err(AwaitError::Transport),
            Ok(Err(_)) => Err(AwaitError::Abandoned(self.operation)),
            Err(_) => Err(AwaitError::Timeout {
                operation: self.operation,
                timeout: self.timeout,
            }),
        }
    }
}

/// Drains the send queue on the event loop.
pub struct OutboxWorker {
    rx: mpsc::UnboundedReceiver<OutboundJob>,
    transport: Arc<dyn Transport>,
}

impl OutboxWorker {
    /// Create a worker for the receiving side of an [`Outbox::channel`].
    pub fn new(rx: mpsc::UnboundedReceiver<OutboundJob>, transport: Arc<dyn Transport>) -> Self {
        Self { rx, transport }
    }

    /// Run until every [`Outbox`] is dropped.
    ///
    /// Jobs still in flight when the worker is aborted are dropped with it.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Outbound worker started");
        let mut in_flight = JoinSet::new();
        while let Some(job) = self.rx.recv().await {
            debug!(operation = job.describe(), "Spawning outbound job");
            in_flight.spawn(job.run(Arc::clone(&self.transport)));
            while in_flight.try_join_next().is_some() {}
        }
        while in_flight.join_next().await.is_some() {}
        info!("Outbound worker stopped");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
