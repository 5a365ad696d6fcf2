//! Connection lifecycle and the framework-facing API.

use crate::{
    Card, Classified, ClientHandle, Directory, DiscordConfig, Dispatcher, EventClassifier,
    Framework, Identifier, IdentifierParser, InboundEvent, Message, OutboundJob, Outbox,
    OutboxWorker, Person, Room, Status, Transport,
};
use herald_error::{
    DispatchError, DispatchErrorKind, DispatchResult, HeraldResult, IdentifierError,
    IdentifierErrorKind, IdentifierResult,
};
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Backend connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConnectionState {
    /// Constructed, not started
    Uninitialized,
    /// Started, waiting for the platform to report ready
    Connecting,
    /// Bot identity resolved; events are delivered
    Ready,
    /// Shut down; pending sends abandoned
    Disconnected,
}

/// Bridges platform events to a [`Framework`] and framework calls back to
/// the platform.
///
/// # Lifecycle
///
/// 1. [`new`](Self::new) wires the components; nothing runs yet
/// 2. [`start`](Self::start) spawns the send-queue worker (`Connecting`)
/// 3. [`on_ready`](Self::on_ready) resolves the bot identity (`Ready`)
/// 4. [`disconnect`](Self::disconnect) abandons pending sends (`Disconnected`)
pub struct Backend {
    handle: ClientHandle,
    transport: Arc<dyn Transport>,
    framework: Arc<dyn Framework>,
    dispatcher: Dispatcher,
    parser: IdentifierParser,
    classifier: EventClassifier,
    worker: Mutex<Option<OutboxWorker>>,
    worker_task: Mutex<Option<JoinHandle<()>>>,
    state: RwLock<ConnectionState>,
    bot: OnceLock<Person>,
}

impl Backend {
    /// Wire a backend from the platform client's directory and transport.
    pub fn new(
        config: &DiscordConfig,
        directory: Arc<dyn Directory>,
        transport: Arc<dyn Transport>,
        framework: Arc<dyn Framework>,
    ) -> Self {
        let (outbox, rx) = Outbox::channel();
        let handle = ClientHandle::new(directory, outbox.clone());
        let worker = OutboxWorker::new(rx, Arc::clone(&transport));

        Self {
            dispatcher: Dispatcher::new(outbox, config.message_size_limit),
            parser: IdentifierParser::new(handle.clone()),
            classifier: EventClassifier::new(handle.clone()),
            handle,
            transport,
            framework,
            worker: Mutex::new(Some(worker)),
            worker_task: Mutex::new(None),
            state: RwLock::new(ConnectionState::Uninitialized),
            bot: OnceLock::new(),
        }
    }

    /// Spawn the send-queue worker on the current runtime.
    ///
    /// Only the first call has an effect.
    #[instrument(skip(self))]
    pub fn start(&self) {
        let mut state = self.state.write();
        if *state != ConnectionState::Uninitialized {
            warn!(state = %*state, "Backend already started");
            return;
        }
        if let Some(worker) = self.worker.lock().take() {
            *self.worker_task.lock() = Some(worker.spawn());
        }
        *state = ConnectionState::Connecting;
        info!("Backend connecting");
    }

    /// The platform reported ready.
    ///
    /// The first call resolves and caches the bot identity and fires the
    /// framework's connect hook; later calls are no-ops.
    ///
    /// # Errors
    ///
    /// `NotFound` if the platform has not reported the current user.
    #[instrument(skip(self))]
    pub async fn on_ready(&self) -> HeraldResult<()> {
        {
            let mut state = self.state.write();
            match *state {
                ConnectionState::Connecting => {}
                ConnectionState::Ready => {
                    debug!("Already ready, keeping bot identity");
                    return Ok(());
                }
                other => {
                    warn!(state = %other, "Ignoring ready outside of connecting state");
                    return Ok(());
                }
            }

            let user = self.handle.directory().current_user().ok_or_else(|| {
                IdentifierError::new(IdentifierErrorKind::NotFound("current user".to_string()))
            })?;
            let bot = self
                .bot
                .get_or_init(|| Person::from_id(self.handle.clone(), user.id));
            info!(bot = %bot, "Backend ready");
            *state = ConnectionState::Ready;
        }

        self.framework.connect_callback(self).await;
        Ok(())
    }

    /// Classify a raw event and deliver it to the framework.
    ///
    /// Events arriving before ready or after disconnect are dropped.
    #[instrument(skip(self, event))]
    pub async fn handle_event(&self, event: InboundEvent) {
        let state = self.state();
        let Some(bot) = self.bot.get().filter(|_| state == ConnectionState::Ready) else {
            warn!(state = %state, "Dropping event received while not ready");
            return;
        };

        let typing_channel = match &event {
            InboundEvent::Message(raw) => Some(raw.channel_id),
            _ => None,
        };

        match self.classifier.classify(event, bot) {
            Classified::Message { message, mentions } => {
                if self.framework.process_message(self, &message).await {
                    let _typing = typing_channel.map(|channel| self.transport.start_typing(channel));
                    self.framework.callback_message(self, &message).await;
                }
                if !mentions.is_empty() {
                    self.framework
                        .callback_mention(self, &message, &mentions)
                        .await;
                }
            }
            Classified::Presence(presence) => {
                self.framework.callback_presence(self, &presence).await;
            }
            Classified::Ignored => {}
        }
    }

    /// Shut down: abandon pending sends and fire the disconnect hook.
    ///
    /// Only the first call has an effect.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) {
        {
            let mut state = self.state.write();
            if *state == ConnectionState::Disconnected {
                debug!("Already disconnected");
                return;
            }
            *state = ConnectionState::Disconnected;
        }

        let task = self.worker_task.lock().take();
        if let Some(task) = task {
            task.abort();
            // Cancellation errors are expected here.
            let _ = task.await;
        }
        self.worker.lock().take();

        info!("Backend disconnected");
        self.framework.disconnect_callback().await;
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// The bot's own identity, once ready.
    pub fn bot_identifier(&self) -> Option<&Person> {
        self.bot.get()
    }

    /// Shared client handle.
    pub fn handle(&self) -> &ClientHandle {
        &self.handle
    }

    /// Effective per-message character limit.
    pub fn message_size_limit(&self) -> usize {
        self.dispatcher.message_size_limit()
    }

    /// Send a message, split into chunks. Fire-and-forget.
    pub fn send_message(&self, message: &Message) -> DispatchResult<()> {
        self.dispatcher.send(message)
    }

    /// Send a card as one embed and wait for it to go out.
    pub async fn send_card(&self, card: &Card) -> DispatchResult<()> {
        self.dispatcher.send_card(card).await
    }

    /// Build a reply to `original` from the bot.
    ///
    /// # Errors
    ///
    /// `NotReady` before the bot identity is known, otherwise as
    /// [`Dispatcher::build_reply`].
    pub fn build_reply(
        &self,
        original: &Message,
        text: impl Into<String>,
        private: bool,
        threaded: bool,
    ) -> DispatchResult<Message> {
        let bot = self
            .bot
            .get()
            .ok_or_else(|| DispatchError::new(DispatchErrorKind::NotReady))?;
        self.dispatcher
            .build_reply(bot, original, text, private, threaded)
    }

    /// Parse an identifier token.
    pub fn build_identifier(&self, token: &str) -> IdentifierResult<Identifier> {
        self.parser.parse(token)
    }

    /// Resolve a room query in the first known guild.
    pub fn query_room(&self, query: &str) -> IdentifierResult<Identifier> {
        self.parser.query_room(query)
    }

    /// Change the bot's status and activity text. Fire-and-forget.
    #[instrument(skip(self))]
    pub fn change_presence(&self, status: Status, activity: Option<String>) -> DispatchResult<()> {
        info!("Changing presence");
        self.handle
            .outbox()
            .submit(OutboundJob::SetPresence { status, activity })?;
        Ok(())
    }

    /// Every text room the bot can see.
    pub fn rooms(&self) -> Vec<Room> {
        self.handle
            .directory()
            .channels()
            .into_iter()
            .filter(|channel| channel.guild_id.is_some() && channel.kind.is_messageable())
            .map(|channel| Room::from_id(self.handle.clone(), channel.id))
            .collect()
    }

    /// Whether the bot itself sent `message`.
    pub fn is_from_self(&self, message: &Message) -> bool {
        match (self.bot.get(), message.from.person()) {
            (Some(bot), Some(sender)) => bot.id() == sender.id(),
            _ => false,
        }
    }

    /// Address a group reply to `person` by prefixing `@name `.
    pub fn prefix_groupchat_reply(&self, message: &mut Message, person: &Person) {
        let name = person
            .username()
            .unwrap_or_else(|| person.id().to_string());
        message.body = format!("@{} {}", name, message.body);
    }

    /// Send a file to the origin of `message`. Fire-and-forget.
    ///
    /// # Errors
    ///
    /// - `Attachment` if the file cannot be read
    /// - otherwise as [`send_message`](Self::send_message)
    #[instrument(skip(self, message), fields(path = %path.as_ref().display()))]
    pub async fn upload_file(&self, message: &Message, path: impl AsRef<Path>) -> DispatchResult<()> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| {
            DispatchError::new(DispatchErrorKind::Attachment(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        self.dispatcher.upload_file(message, &name, data)
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("state", &self.state())
            .field("bot", &self.bot.get())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
