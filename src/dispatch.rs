//! Callback delivery for chat streams.
//!
//! [`spawn`] drives a [`ChatStream`] on a tokio task and forwards each event
//! to a [`ChatHandler`]. The returned [`AbortHandle`] cancels the task; no
//! callback fires once `abort` has been called.

use futures::StreamExt;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::ClientError;
use crate::model::ChatMessage;
use crate::stream::{ChatStream, StreamEvent};

/// Receiver of chat stream outcomes.
///
/// Either `on_error` or `on_complete` is called at most once per stream, and
/// nothing is called after it.
pub trait ChatHandler: Send + 'static {
    fn on_message(&mut self, message: ChatMessage);
    fn on_error(&mut self, error: ClientError);
    fn on_complete(&mut self);
}

/// [`ChatHandler`] assembled from three closures.
///
/// # Example
/// ```
/// use chatwire::dispatch::Callbacks;
///
/// let handler = Callbacks::new(
///     |message| println!("{:?}", message.content),
///     |error| eprintln!("{error}"),
///     || println!("done"),
/// );
/// # let _ = handler;
/// ```
pub struct Callbacks<M, E, C> {
    on_message: M,
    on_error: E,
    on_complete: C,
}

impl<M, E, C> Callbacks<M, E, C>
where
    M: FnMut(ChatMessage) + Send + 'static,
    E: FnMut(ClientError) + Send + 'static,
    C: FnMut() + Send + 'static,
{
    pub fn new(on_message: M, on_error: E, on_complete: C) -> Self {
        Self {
            on_message,
            on_error,
            on_complete,
        }
    }
}

impl<M, E, C> ChatHandler for Callbacks<M, E, C>
where
    M: FnMut(ChatMessage) + Send + 'static,
    E: FnMut(ClientError) + Send + 'static,
    C: FnMut() + Send + 'static,
{
    fn on_message(&mut self, message: ChatMessage) {
        (self.on_message)(message)
    }

    fn on_error(&mut self, error: ClientError) {
        (self.on_error)(error)
    }

    fn on_complete(&mut self) {
        (self.on_complete)()
    }
}

/// Cancels a running chat stream.
#[derive(Debug)]
pub struct AbortHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AbortHandle {
    /// Stop the stream and close its connection. Idempotent.
    pub fn abort(&self) {
        if !*self.cancel.borrow() {
            debug!("chat stream aborted by caller");
        }
        self.cancel.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Wait for the stream task to end.
    pub async fn join(self) {
        // only fails if the handler panicked
        let _ = self.task.await;
    }
}

/// Drive the stream opened by `open` on a new task.
pub fn spawn<F, H>(open: F, handler: H) -> AbortHandle
where
    F: Future<Output = Result<ChatStream, ClientError>> + Send + 'static,
    H: ChatHandler,
{
    let (cancel, cancelled) = watch::channel(false);
    let task = tokio::spawn(run(open, handler, cancelled));
    AbortHandle { cancel, task }
}

async fn run<F, H>(open: F, mut handler: H, cancelled: watch::Receiver<bool>)
where
    F: Future<Output = Result<ChatStream, ClientError>> + Send,
    H: ChatHandler,
{
    let mut watcher = cancelled.clone();
    let aborted = async move {
        let handle_dropped = watcher.wait_for(|aborted| *aborted).await.is_err();
        // a dropped handle can no longer abort
        if handle_dropped {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        biased;
        _ = aborted => {}
        _ = deliver(open, &mut handler, cancelled) => {}
    }
}

async fn deliver<F, H>(open: F, handler: &mut H, cancelled: watch::Receiver<bool>)
where
    F: Future<Output = Result<ChatStream, ClientError>>,
    H: ChatHandler,
{
    let is_aborted = || *cancelled.borrow();

    let mut stream = match open.await {
        Ok(stream) => stream,
        Err(e) => {
            if !is_aborted() {
                handler.on_error(e);
            }
            return;
        }
    };

    while let Some(event) = stream.next().await {
        if is_aborted() {
            return;
        }
        match event {
            StreamEvent::Message(message) => handler.on_message(message),
            StreamEvent::Error(e) => {
                handler.on_error(e);
                return;
            }
            StreamEvent::Complete => {
                handler.on_complete();
                return;
            }
        }
    }
}
