pub mod cursor;
pub mod organizer;
pub mod resolver;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::platform::{CallbackEvent, LogicalMessageEvent, RemoteFeed};

use self::cursor::Cursor;
use self::organizer::MessageOrganizer;

/// Long-poll window requested from the server on every fetch
pub const DEFAULT_WAIT_SECS: u32 = 20;

pub type Handler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<()>> + Send + Sync>;
pub type MessageHandler = Handler<LogicalMessageEvent>;
pub type CallbackHandler = Handler<CallbackEvent>;

#[derive(Clone, Default)]
struct Handlers {
    message: Option<MessageHandler>,
    callback: Option<CallbackHandler>,
}

/// Shared handler slots. At most one handler per kind; registering again
/// replaces the previous one.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<RwLock<Handlers>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn on_message<F, Fut>(&self, handler: F)
    where
        F: Fn(LogicalMessageEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: MessageHandler =
            Arc::new(move |event: LogicalMessageEvent| handler(event).boxed());
        self.inner.write().await.message = Some(handler);
        debug!("Message handler registered");
    }

    pub async fn on_callback<F, Fut>(&self, handler: F)
    where
        F: Fn(CallbackEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let handler: CallbackHandler = Arc::new(move |event: CallbackEvent| handler(event).boxed());
        self.inner.write().await.callback = Some(handler);
        debug!("Callback handler registered");
    }

    async fn snapshot(&self) -> Handlers {
        self.inner.read().await.clone()
    }
}

/// Long-polling update loop.
///
/// Only one fetch is ever in flight. Every logical event is handed to its
/// handler as a detached tokio task, so slow handlers never hold up polling.
pub struct DispatchEngine {
    feed: Arc<dyn RemoteFeed>,
    wait_secs: u32,
    cursor: Cursor,
    registry: HandlerRegistry,
}

impl DispatchEngine {
    pub fn new(feed: Arc<dyn RemoteFeed>) -> Self {
        Self {
            feed,
            wait_secs: DEFAULT_WAIT_SECS,
            cursor: Cursor::new(),
            registry: HandlerRegistry::new(),
        }
    }

    pub fn with_wait_secs(mut self, wait_secs: u32) -> Self {
        self.wait_secs = wait_secs;
        self
    }

    /// Handle for registering handlers while the loop is running
    pub fn registry(&self) -> HandlerRegistry {
        self.registry.clone()
    }

    pub async fn on_message<F, Fut>(&self, handler: F)
    where
        F: Fn(LogicalMessageEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.registry.on_message(handler).await;
    }

    pub async fn on_callback<F, Fut>(&self, handler: F)
    where
        F: Fn(CallbackEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.registry.on_callback(handler).await;
    }

    /// Poll forever. Returns only when a fetch fails.
    pub async fn run(&mut self) -> Result<()> {
        info!("Dispatch loop started (long poll: {}s)", self.wait_secs);
        loop {
            self.poll_once().await?;
        }
    }

    /// Run one fetch/dispatch cycle and return the number of handler tasks
    /// launched.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let offset = self.cursor.current();
        let batch = self
            .feed
            .fetch(offset, self.wait_secs)
            .await
            .with_context(|| format!("Failed to fetch updates (offset {:?})", offset))?;

        if batch.is_empty() {
            return Ok(0);
        }

        // Acknowledge before dispatching anything
        self.cursor.advance(&batch);
        debug!(
            "Fetched {} updates, next offset {:?}",
            batch.len(),
            self.cursor.current()
        );

        let handlers = self.registry.snapshot().await;
        let mut organizer = MessageOrganizer::new();
        let mut launched = 0;

        for update in batch {
            if let Some(callback) = update.callback {
                match &handlers.callback {
                    Some(handler) => {
                        spawn_handler("callback", handler, callback);
                        launched += 1;
                    }
                    None => debug!("No callback handler, dropping update {}", update.id),
                }
            }
            if let Some(message) = update.message {
                let resolved = resolver::resolve(&message);
                organizer.add(message, resolved);
            }
        }

        for event in organizer.into_events() {
            match &handlers.message {
                Some(handler) => {
                    spawn_handler("message", handler, event);
                    launched += 1;
                }
                None => debug!(
                    "No message handler, dropping message {}",
                    event.anchor.message_id
                ),
            }
        }

        Ok(launched)
    }
}

/// Start `handler` on `item` as a detached task. The handler itself is called
/// here so launch order follows dispatch order.
fn spawn_handler<T>(kind: &'static str, handler: &Handler<T>, item: T) {
    let fut = handler(item);
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            error!("{} handler failed: {:#}", kind, e);
        }
    });
}
