mod common;

use async_trait::async_trait;
use common::{ALICE, ALICE_DM, BOB, BOT, GENERAL, MockDirectory, Recorded, RecordingTransport, user};
use herald_core::{
    Backend, ConnectionState, DiscordConfig, Framework, Identifier, InboundEvent, Message,
    Outbound, Person, Presence, RawMessage, RawStatus, RoomOccupant, SendTarget, Status, UserId,
};
use herald_error::DispatchErrorKind;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Framework that answers `!ping` and records every hook call.
#[derive(Debug, Default)]
struct RecordingFramework {
    calls: Mutex<Vec<String>>,
}

impl RecordingFramework {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

#[async_trait]
impl Framework for RecordingFramework {
    async fn connect_callback(&self, _backend: &Backend) {
        self.record("connect");
    }

    async fn disconnect_callback(&self) {
        self.record("disconnect");
    }

    async fn process_message(&self, _backend: &Backend, message: &Message) -> bool {
        message.body.starts_with('!')
    }

    async fn callback_message(&self, backend: &Backend, message: &Message) {
        self.record(format!("message:{}", message.body));
        if message.body == "!ping" {
            let reply = backend
                .build_reply(message, "pong", false, false)
                .expect("backend is ready");
            backend.send_message(&reply).expect("origin is sendable");
        }
    }

    async fn callback_mention(&self, _backend: &Backend, _message: &Message, mentions: &[RoomOccupant]) {
        let ids: Vec<String> = mentions.iter().map(|m| m.id().to_string()).collect();
        self.record(format!("mention:{}", ids.join(",")));
    }

    async fn callback_presence(&self, _backend: &Backend, presence: &Presence) {
        self.record(format!("presence:{}:{}", presence.person.id(), presence.status));
    }
}

struct Harness {
    directory: Arc<MockDirectory>,
    transport: Arc<RecordingTransport>,
    framework: Arc<RecordingFramework>,
    backend: Backend,
}

fn harness() -> Harness {
    let directory = Arc::new(MockDirectory::populated());
    let transport = Arc::new(RecordingTransport::new(Arc::clone(&directory)));
    let framework = Arc::new(RecordingFramework::default());
    let backend = Backend::new(
        &DiscordConfig::default(),
        directory.clone(),
        transport.clone(),
        framework.clone(),
    );
    Harness {
        directory,
        transport,
        framework,
        backend,
    }
}

async fn ready_harness() -> Harness {
    let harness = harness();
    harness.backend.start();
    harness.backend.on_ready().await.expect("current user is known");
    harness
}

fn group_message(author: UserId, content: &str) -> InboundEvent {
    InboundEvent::Message(RawMessage {
        channel_id: GENERAL,
        private: false,
        author_id: author,
        content: content.to_string(),
        mentions: Vec::new(),
        embeds: Vec::new(),
    })
}

#[tokio::test]
async fn test_lifecycle_states() {
    let harness = harness();
    assert_eq!(harness.backend.state(), ConnectionState::Uninitialized);
    assert!(harness.backend.bot_identifier().is_none());

    harness.backend.start();
    assert_eq!(harness.backend.state(), ConnectionState::Connecting);

    harness.backend.on_ready().await.expect("current user is known");
    assert_eq!(harness.backend.state(), ConnectionState::Ready);
    assert_eq!(harness.backend.bot_identifier().map(|bot| bot.id()), Some(BOT));
    assert_eq!(harness.framework.calls(), vec!["connect"]);

    harness.backend.disconnect().await;
    assert_eq!(harness.backend.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_second_ready_keeps_bot_identity() {
    let harness = ready_harness().await;

    harness
        .directory
        .set_current_user(user(UserId(77), "impostor", Some(1), true));
    harness.backend.on_ready().await.expect("second ready is a no-op");

    assert_eq!(harness.backend.bot_identifier().map(|bot| bot.id()), Some(BOT));
    assert_eq!(harness.framework.calls(), vec!["connect"]);
}

#[tokio::test]
async fn test_ready_without_current_user_fails() {
    let directory = Arc::new(MockDirectory::default());
    let transport = Arc::new(RecordingTransport::new(Arc::clone(&directory)));
    let framework = Arc::new(RecordingFramework::default());
    let backend = Backend::new(&DiscordConfig::default(), directory, transport, framework.clone());

    backend.start();
    assert!(backend.on_ready().await.is_err());
    assert_eq!(backend.state(), ConnectionState::Connecting);
    assert!(framework.calls().is_empty());
}

#[tokio::test]
async fn test_events_before_ready_are_dropped() {
    let harness = harness();
    harness.backend.start();

    harness.backend.handle_event(group_message(ALICE, "!ping")).await;
    assert!(harness.framework.calls().is_empty());
}

#[tokio::test]
async fn test_command_runs_inside_typing_scope_and_replies() {
    let harness = ready_harness().await;

    harness.backend.handle_event(group_message(ALICE, "!ping")).await;
    assert_eq!(harness.framework.calls(), vec!["connect", "message:!ping"]);

    harness.transport.wait_for(3).await;
    let events = harness.transport.events();
    let started = events
        .iter()
        .position(|e| *e == Recorded::TypingStarted(GENERAL))
        .expect("typing started");
    let stopped = events
        .iter()
        .position(|e| *e == Recorded::TypingStopped(GENERAL))
        .expect("typing stopped");
    assert!(started < stopped);
    assert!(events.contains(&Recorded::Send(
        SendTarget::Channel(GENERAL),
        Outbound::Text("pong".to_string())
    )));
}

/// Framework whose message handler panics.
struct PanickingFramework;

#[async_trait]
impl Framework for PanickingFramework {
    async fn process_message(&self, _backend: &Backend, _message: &Message) -> bool {
        true
    }

    async fn callback_message(&self, _backend: &Backend, message: &Message) {
        panic!("handler failed on {}", message.body);
    }
}

#[tokio::test]
async fn test_typing_stops_when_handler_panics() {
    let directory = Arc::new(MockDirectory::populated());
    let transport = Arc::new(RecordingTransport::new(Arc::clone(&directory)));
    let backend = Arc::new(Backend::new(
        &DiscordConfig::default(),
        directory,
        transport.clone(),
        Arc::new(PanickingFramework),
    ));
    backend.start();
    backend.on_ready().await.expect("current user is known");

    let task = {
        let backend = Arc::clone(&backend);
        tokio::spawn(async move { backend.handle_event(group_message(ALICE, "!boom")).await })
    };
    let err = task.await.expect_err("handler panic surfaces as a join error");
    assert!(err.is_panic());

    let events = transport.events();
    let started = events
        .iter()
        .position(|e| *e == Recorded::TypingStarted(GENERAL))
        .expect("typing started");
    let stopped = events
        .iter()
        .position(|e| *e == Recorded::TypingStopped(GENERAL))
        .expect("typing stopped despite the panic");
    assert!(started < stopped);
}

#[tokio::test]
async fn test_direct_command_replies_to_sender() {
    let harness = ready_harness().await;

    harness
        .backend
        .handle_event(InboundEvent::Message(RawMessage {
            channel_id: ALICE_DM,
            private: true,
            author_id: ALICE,
            content: "!ping".to_string(),
            mentions: Vec::new(),
            embeds: Vec::new(),
        }))
        .await;

    harness.transport.wait_for(3).await;
    let events = harness.transport.events();
    assert!(events.contains(&Recorded::TypingStarted(ALICE_DM)));
    assert!(events.contains(&Recorded::Send(
        SendTarget::User(ALICE),
        Outbound::Text("pong".to_string())
    )));
}

#[tokio::test]
async fn test_plain_message_is_not_dispatched() {
    let harness = ready_harness().await;

    harness.backend.handle_event(group_message(ALICE, "just chatting")).await;
    harness.transport.settle().await;

    assert_eq!(harness.framework.calls(), vec!["connect"]);
    assert!(harness.transport.events().is_empty());
}

#[tokio::test]
async fn test_mentions_are_reported_separately() {
    let harness = ready_harness().await;

    let InboundEvent::Message(mut raw) = group_message(ALICE, "hey <@12>") else {
        unreachable!();
    };
    raw.mentions = vec![BOB];
    harness.backend.handle_event(InboundEvent::Message(raw)).await;

    assert_eq!(harness.framework.calls(), vec!["connect", "mention:12"]);
}

#[tokio::test]
async fn test_presence_is_reported() {
    let harness = ready_harness().await;

    harness
        .backend
        .handle_event(InboundEvent::StatusUpdate {
            user_id: ALICE,
            before: RawStatus::Online,
            after: RawStatus::Idle,
        })
        .await;
    harness
        .backend
        .handle_event(InboundEvent::StatusUpdate {
            user_id: ALICE,
            before: RawStatus::Idle,
            after: RawStatus::Idle,
        })
        .await;

    assert_eq!(harness.framework.calls(), vec!["connect", "presence:11:away"]);
}

#[tokio::test]
async fn test_disconnect_fires_hook_once_and_closes_queue() {
    let harness = ready_harness().await;

    harness.backend.disconnect().await;
    harness.backend.disconnect().await;
    assert_eq!(harness.framework.calls(), vec!["connect", "disconnect"]);

    let bot = harness.backend.bot_identifier().expect("bot is known").clone();
    let alice = Person::from_id(harness.backend.handle().clone(), ALICE);
    let err = harness
        .backend
        .send_message(&Message::new("late", bot.into(), alice.into()))
        .expect_err("queue is closed");
    assert!(matches!(err.kind(), DispatchErrorKind::QueueClosed));

    harness.backend.handle_event(group_message(ALICE, "!ping")).await;
    assert_eq!(harness.framework.calls(), vec!["connect", "disconnect"]);
}

#[tokio::test]
async fn test_disconnect_before_start_fires_hook() {
    let harness = harness();
    harness.backend.disconnect().await;
    assert_eq!(harness.framework.calls(), vec!["disconnect"]);
}

#[tokio::test]
async fn test_build_reply_requires_ready() {
    let harness = harness();
    let alice = Person::from_id(harness.backend.handle().clone(), ALICE);
    let original = Message::new("!ping", alice.clone().into(), alice.into());

    let err = harness
        .backend
        .build_reply(&original, "pong", false, false)
        .expect_err("no bot identity yet");
    assert!(matches!(err.kind(), DispatchErrorKind::NotReady));
}

#[tokio::test]
async fn test_rooms_lists_guild_text_channels() {
    let harness = ready_harness().await;

    let mut ids: Vec<_> = harness
        .backend
        .rooms()
        .iter()
        .filter_map(|room| room.id())
        .collect();
    ids.sort();
    assert_eq!(ids, vec![GENERAL, common::ANNOUNCEMENTS]);
}

#[tokio::test]
async fn test_identifier_helpers() {
    let harness = ready_harness().await;
    let backend = &harness.backend;

    let general = backend.query_room("general").expect("room resolves");
    assert_eq!(general.room().and_then(|room| room.id()), Some(GENERAL));

    let bob = backend.build_identifier("<@12>").expect("mention parses");
    assert!(matches!(bob, Identifier::Person(ref p) if p.id() == BOB));

    let from_bot = Message::new(
        "hi",
        RoomOccupant::from_ids(backend.handle().clone(), BOT, GENERAL).into(),
        general.clone(),
    );
    let from_bob = Message::new("hi", bob.clone(), general);
    assert!(backend.is_from_self(&from_bot));
    assert!(!backend.is_from_self(&from_bob));

    let mut reply = Message::new("welcome", from_bot.from.clone(), from_bot.to.clone());
    backend.prefix_groupchat_reply(&mut reply, bob.person().expect("person"));
    assert_eq!(reply.body, "@bob welcome");
}

#[tokio::test]
async fn test_change_presence() {
    let harness = ready_harness().await;

    harness
        .backend
        .change_presence(Status::DoNotDisturb, Some("deploying".to_string()))
        .expect("queue is open");
    harness.transport.wait_for(1).await;

    assert_eq!(
        harness.transport.events(),
        vec![Recorded::SetPresence(
            Status::DoNotDisturb,
            Some("deploying".to_string())
        )]
    );
}

#[tokio::test]
async fn test_upload_file() {
    let harness = ready_harness().await;

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"build log").expect("write temp file");

    let alice = Person::from_id(harness.backend.handle().clone(), ALICE);
    let bot = harness.backend.bot_identifier().expect("bot is known").clone();
    let original = Message::new("!logs", alice.into(), bot.into());
    harness
        .backend
        .upload_file(&original, file.path())
        .await
        .expect("file is readable");
    harness.transport.wait_for(1).await;

    let events = harness.transport.events();
    let Some(Recorded::Send(target, Outbound::File { data, .. })) = events.first() else {
        panic!("expected a file, got {:?}", events);
    };
    assert_eq!(*target, SendTarget::User(ALICE));
    assert_eq!(data, b"build log");

    let err = harness
        .backend
        .upload_file(&original, "/definitely/not/here.txt")
        .await
        .expect_err("file is missing");
    assert!(matches!(err.kind(), DispatchErrorKind::Attachment(_)));
}
