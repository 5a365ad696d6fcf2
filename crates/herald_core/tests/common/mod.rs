//! In-memory directory and transport doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use herald_core::{
    ChannelId, ChannelInfo, ChannelKind, ClientHandle, Directory, GuildId, GuildInfo, NewChannel,
    Outbound, OutboundJob, Outbox, OutboxWorker, SendTarget, Status, Transport, TypingGuard,
    UserId, UserInfo,
};
use herald_error::{TransportError, TransportResult};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

pub const GUILD: GuildId = GuildId(1000);
pub const OTHER_GUILD: GuildId = GuildId(2000);

pub const BOT: UserId = UserId(10);
pub const ALICE: UserId = UserId(11);
pub const BOB: UserId = UserId(12);
pub const CAROL: UserId = UserId(13);

pub const GENERAL: ChannelId = ChannelId(100);
pub const ANNOUNCEMENTS: ChannelId = ChannelId(101);
pub const PROJECTS: ChannelId = ChannelId(200);
pub const ALICE_DM: ChannelId = ChannelId(300);

/// Snapshot state behind [`MockDirectory`].
#[derive(Debug, Default)]
struct DirectoryState {
    current_user: Option<UserInfo>,
    users: Vec<UserInfo>,
    guilds: Vec<GuildInfo>,
    channels: Vec<ChannelInfo>,
}

/// Directory backed by plain vectors.
#[derive(Debug, Default)]
pub struct MockDirectory {
    state: RwLock<DirectoryState>,
}

impl MockDirectory {
    /// One guild with a bot, three members, two text channels, a category and a DM.
    pub fn populated() -> Self {
        let directory = Self::default();
        directory.set_current_user(user(BOT, "herald", Some(1234), true));
        directory.add_user(user(ALICE, "alice", None, false));
        directory.add_user(user(BOB, "bob", Some(42), false));
        directory.add_user(user(CAROL, "carol", Some(0), false));
        directory.add_guild(GUILD, "Test Guild");
        directory.add_channel(channel(GENERAL, "general", Some(GUILD), ChannelKind::Text));
        directory.add_channel(channel(
            ANNOUNCEMENTS,
            "announcements",
            Some(GUILD),
            ChannelKind::Announcement,
        ));
        directory.add_channel(channel(PROJECTS, "projects", Some(GUILD), ChannelKind::Category));
        directory.add_channel(channel(ALICE_DM, "alice", None, ChannelKind::Private));
        directory
    }

    pub fn set_current_user(&self, info: UserInfo) {
        let mut state = self.state.write();
        state.users.push(info.clone());
        state.current_user = Some(info);
    }

    pub fn add_user(&self, info: UserInfo) {
        self.state.write().users.push(info);
    }

    pub fn add_guild(&self, id: GuildId, name: &str) {
        self.state.write().guilds.push(GuildInfo {
            id,
            name: name.to_string(),
        });
    }

    pub fn add_channel(&self, info: ChannelInfo) {
        self.state.write().channels.push(info);
    }

    pub fn remove_channel(&self, id: ChannelId) {
        self.state.write().channels.retain(|c| c.id != id);
    }

    pub fn set_topic(&self, id: ChannelId, topic: &str) {
        if let Some(channel) = self.state.write().channels.iter_mut().find(|c| c.id == id) {
            channel.topic = Some(topic.to_string());
        }
    }
}

impl Directory for MockDirectory {
    fn current_user(&self) -> Option<UserInfo> {
        self.state.read().current_user.clone()
    }

    fn user(&self, id: UserId) -> Option<UserInfo> {
        self.state.read().users.iter().find(|u| u.id == id).cloned()
    }

    fn channel(&self, id: ChannelId) -> Option<ChannelInfo> {
        self.state.read().channels.iter().find(|c| c.id == id).cloned()
    }

    fn guild(&self, id: GuildId) -> Option<GuildInfo> {
        self.state.read().guilds.iter().find(|g| g.id == id).cloned()
    }

    fn guilds(&self) -> Vec<GuildInfo> {
        let mut guilds = self.state.read().guilds.clone();
        guilds.sort_by_key(|g| g.id);
        guilds
    }

    fn channels(&self) -> Vec<ChannelInfo> {
        self.state.read().channels.clone()
    }

    fn members(&self) -> Vec<UserInfo> {
        self.state.read().users.clone()
    }
}

/// Everything the transport was asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Send(SendTarget, Outbound),
    CreateChannel(NewChannel),
    DeleteChannel(ChannelId),
    GrantRead(ChannelId, UserId),
    SetPresence(Status, Option<String>),
    TypingStarted(ChannelId),
    TypingStopped(ChannelId),
}

/// Transport that records calls and mirrors channel changes into a [`MockDirectory`].
#[derive(Debug)]
pub struct RecordingTransport {
    directory: Arc<MockDirectory>,
    events: Arc<Mutex<Vec<Recorded>>>,
    next_id: AtomicU64,
    fail: AtomicBool,
    stall: AtomicBool,
}

impl RecordingTransport {
    pub fn new(directory: Arc<MockDirectory>) -> Self {
        Self {
            directory,
            events: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(5000),
            fail: AtomicBool::new(false),
            stall: AtomicBool::new(false),
        }
    }

    /// Make every operation fail.
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Make every operation hang forever.
    pub fn stall(&self) {
        self.stall.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().clone()
    }

    /// Text payloads sent so far, in order.
    pub fn sent_texts(&self) -> Vec<(SendTarget, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Recorded::Send(target, Outbound::Text(text)) => Some((target, text)),
                _ => None,
            })
            .collect()
    }

    /// Wait until at least `count` events are recorded.
    pub async fn wait_for(&self, count: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(1), async {
            while self.events.lock().len() < count {
                tokio::task::yield_now().await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "expected {} events, got {:?}",
            count,
            self.events()
        );
    }

    /// Let the worker drain anything already queued.
    pub async fn settle(&self) {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    async fn record(&self, event: Recorded) -> TransportResult<()> {
        self.events.lock().push(event);
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::new("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, target: SendTarget, content: Outbound) -> TransportResult<()> {
        self.record(Recorded::Send(target, content)).await
    }

    async fn create_channel(&self, request: NewChannel) -> TransportResult<ChannelInfo> {
        self.record(Recorded::CreateChannel(request.clone())).await?;
        let info = ChannelInfo {
            id: ChannelId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: request.name,
            guild_id: Some(request.guild_id),
            kind: request.kind,
            topic: None,
            parent_id: request.parent_id,
            member_ids: Vec::new(),
        };
        self.directory.add_channel(info.clone());
        Ok(info)
    }

    async fn delete_channel(&self, channel: ChannelId) -> TransportResult<()> {
        self.record(Recorded::DeleteChannel(channel)).await?;
        self.directory.remove_channel(channel);
        Ok(())
    }

    async fn grant_read(&self, channel: ChannelId, user: UserId) -> TransportResult<()> {
        self.record(Recorded::GrantRead(channel, user)).await
    }

    async fn set_presence(&self, status: Status, activity: Option<String>) -> TransportResult<()> {
        self.record(Recorded::SetPresence(status, activity)).await
    }

    fn start_typing(&self, channel: ChannelId) -> TypingGuard {
        self.events.lock().push(Recorded::TypingStarted(channel));
        let events = Arc::clone(&self.events);
        TypingGuard::new(move || events.lock().push(Recorded::TypingStopped(channel)))
    }
}

/// Directory, transport and a client handle wired together.
pub struct Fixture {
    pub directory: Arc<MockDirectory>,
    pub transport: Arc<RecordingTransport>,
    pub handle: ClientHandle,
    rx: Option<UnboundedReceiver<OutboundJob>>,
    worker: Option<JoinHandle<()>>,
}

impl Fixture {
    /// Wire a populated directory; the send queue is not drained until
    /// [`start`](Self::start).
    pub fn new() -> Self {
        Self::with_directory(MockDirectory::populated())
    }

    pub fn with_directory(directory: MockDirectory) -> Self {
        let directory = Arc::new(directory);
        let transport = Arc::new(RecordingTransport::new(Arc::clone(&directory)));
        let (outbox, rx) = Outbox::channel();
        let handle = ClientHandle::new(directory.clone(), outbox);
        Self {
            directory,
            transport,
            handle,
            rx: Some(rx),
            worker: None,
        }
    }

    /// Spawn the send-queue worker on the current runtime.
    pub fn start(mut self) -> Self {
        if let Some(rx) = self.rx.take() {
            let transport: Arc<dyn Transport> = self.transport.clone();
            self.worker = Some(OutboxWorker::new(rx, transport).spawn());
        }
        self
    }

    pub fn outbox(&self) -> Outbox {
        self.handle.outbox().clone()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

pub fn user(id: UserId, name: &str, discriminator: Option<u16>, bot: bool) -> UserInfo {
    UserInfo {
        id,
        name: name.to_string(),
        discriminator,
        bot,
    }
}

pub fn channel(id: ChannelId, name: &str, guild_id: Option<GuildId>, kind: ChannelKind) -> ChannelInfo {
    ChannelInfo {
        id,
        name: name.to_string(),
        guild_id,
        kind,
        topic: None,
        parent_id: None,
        member_ids: vec![BOT, ALICE, BOB],
    }
}
