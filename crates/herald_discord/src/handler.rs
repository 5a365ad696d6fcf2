//! Serenity event handler feeding the backend.
//!
//! Serenity delivers presence updates without the previous status, so the
//! handler remembers the last status it saw per user. Users it has never seen
//! are treated as having been offline.

use crate::convert::{raw_message, raw_status};
use herald_core::{Backend, ChannelId, InboundEvent, RawStatus, UserId};
use parking_lot::Mutex;
use serenity::all::{Guild, Message, MessageUpdateEvent, Presence, Ready, UserId as SerenityUserId};
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

/// Backend slot shared between the handler and the client that owns it.
///
/// The backend needs the built client's cache and HTTP handle, and the client
/// needs the handler before it can be built, so the slot is filled afterwards.
pub type BackendSlot = Arc<OnceLock<Arc<Backend>>>;

/// Event handler for the Herald bot.
pub struct HeraldHandler {
    backend: BackendSlot,
    statuses: Mutex<HashMap<SerenityUserId, RawStatus>>,
}

impl HeraldHandler {
    /// Create a handler reading its backend from `backend` once set.
    pub fn new(backend: BackendSlot) -> Self {
        Self {
            backend,
            statuses: Mutex::new(HashMap::new()),
        }
    }

    fn backend(&self) -> Option<&Arc<Backend>> {
        let backend = self.backend.get();
        if backend.is_none() {
            warn!("Event received before the backend was installed");
        }
        backend
    }

    /// Record a status and return the one it replaces.
    fn swap_status(&self, user: SerenityUserId, status: RawStatus) -> RawStatus {
        self.statuses
            .lock()
            .insert(user, status)
            .unwrap_or(RawStatus::Offline)
    }
}

#[async_trait]
impl EventHandler for HeraldHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Connected to Discord"
        );

        let Some(backend) = self.backend() else {
            return;
        };
        if let Err(e) = backend.on_ready().await {
            error!(error = %e, "Failed to complete ready handling");
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        let mut statuses = self.statuses.lock();
        for (user, presence) in &guild.presences {
            statuses.insert(*user, raw_status(presence.status));
        }
        debug!(
            guild = %guild.name,
            presences = guild.presences.len(),
            "Seeded presence memory"
        );
    }

    async fn message(&self, _ctx: Context, message: Message) {
        let Some(backend) = self.backend() else {
            return;
        };
        backend
            .handle_event(InboundEvent::Message(raw_message(&message)))
            .await;
    }

    async fn message_update(
        &self,
        _ctx: Context,
        _old: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        let Some(backend) = self.backend() else {
            return;
        };
        backend
            .handle_event(InboundEvent::MessageEdit {
                channel_id: ChannelId(event.channel_id.get()),
                message_id: event.id.get(),
            })
            .await;
    }

    async fn presence_update(&self, _ctx: Context, presence: Presence) {
        let after = raw_status(presence.status);
        let before = self.swap_status(presence.user.id, after);

        let Some(backend) = self.backend() else {
            return;
        };
        backend
            .handle_event(InboundEvent::StatusUpdate {
                user_id: UserId(presence.user.id.get()),
                before,
                after,
            })
            .await;
    }
}
