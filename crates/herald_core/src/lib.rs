//! Identity resolution and message routing core for the Herald Discord adapter.
//!
//! This crate reconciles Discord's asynchronous event model with a chat-bot
//! framework's synchronous plugin callbacks. It is platform-library agnostic:
//! everything it knows about Discord comes through the [`Directory`] and
//! [`Transport`] traits, implemented by `herald_discord` on top of serenity.
//!
//! # Components
//!
//! - **identifier**: typed `Person`, `Room`, `Category` and `RoomOccupant`
//! - **parser**: string tokens to identifiers and back
//! - **classifier**: raw platform events to normalized messages and presences
//! - **dispatcher**: chunked sends, card embeds and reply routing
//! - **outbox**: cross-thread send queue drained on the event loop
//! - **backend**: connection lifecycle and the framework-facing API
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_core::{Backend, HeraldConfig};
//!
//! let config = HeraldConfig::from_file("herald.toml")?;
//! let backend = Backend::new(config.discord(), directory, transport, framework);
//! backend.start();
//! // platform events are fed through backend.handle_event(..)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod classifier;
mod client;
mod config;
mod dispatcher;
mod framework;
mod identifier;
mod message;
mod outbox;
mod parser;

pub use backend::{Backend, ConnectionState};
pub use classifier::{Classified, EventClassifier, InboundEvent, RawMessage, RawStatus};
pub use client::{
    ChannelId, ChannelInfo, ChannelKind, ClientHandle, DISCORD_EPOCH_MS, Directory, GuildId,
    GuildInfo, NewChannel, Outbound, SendTarget, Transport, TypingGuard, UserId, UserInfo,
    snowflake_time,
};
pub use config::{DiscordConfig, HeraldConfig, IntentPreset, IntentToggle, TOKEN_ENV};
pub use dispatcher::{
    Dispatcher, PLATFORM_MESSAGE_LIMIT, render_embed, resolve_color, split_chunks,
};
pub use framework::Framework;
pub use identifier::{Category, Identifier, Person, Room, RoomOccupant};
pub use message::{Card, CardBuilder, CardBuilderError, Embed, EmbedField, Message, Presence, Status};
pub use outbox::{AWAIT_TIMEOUT, AwaitError, OutboundJob, Outbox, OutboxClosed, OutboxWorker, Pending};
pub use parser::IdentifierParser;
