//! Client handle seam between the routing core and the platform library.
//!
//! The platform client is split along the same line serenity draws between its
//! cache and its HTTP/gateway side:
//! - [`Directory`] answers snowflake-keyed lookups synchronously from the
//!   client's current view
//! - [`Transport`] performs outbound operations asynchronously on the event loop
//!
//! Identifiers never talk to a [`Transport`] directly. They go through the
//! [`ClientHandle`], which pairs the directory with the [`Outbox`] send queue.

use crate::{Embed, Outbox, Status};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_error::TransportResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Discord epoch (2015-01-01T00:00:00Z) in milliseconds since the Unix epoch.
pub const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Creation time encoded in the top 42 bits of a snowflake.
///
/// # Examples
///
/// ```
/// use herald_core::snowflake_time;
///
/// let created = snowflake_time(175928847299117063).unwrap();
/// assert_eq!(created.timestamp(), 1462015105);
/// ```
pub fn snowflake_time(id: u64) -> Option<DateTime<Utc>> {
    let millis = (id >> 22).checked_add(DISCORD_EPOCH_MS)?;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

/// Discord user snowflake.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("{}", _0)]
pub struct UserId(pub u64);

/// Discord channel snowflake.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("{}", _0)]
pub struct ChannelId(pub u64);

/// Discord guild snowflake.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[display("{}", _0)]
pub struct GuildId(pub u64);

/// Snapshot of a user as seen by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User snowflake
    pub id: UserId,
    /// Account username
    pub name: String,
    /// Legacy discriminator; `None` for accounts migrated to unique usernames
    pub discriminator: Option<u16>,
    /// Whether the account is a bot
    pub bot: bool,
}

impl UserInfo {
    /// `username#discriminator`, with `0` standing for "no discriminator".
    pub fn fullname(&self) -> String {
        match self.discriminator {
            Some(discriminator) => format!("{}#{:04}", self.name, discriminator),
            None => format!("{}#0", self.name),
        }
    }
}

/// Kinds of channels the core distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Guild text channel
    Text,
    /// Guild announcement channel
    Announcement,
    /// Guild voice channel (with its text chat)
    Voice,
    /// Channel-grouping container
    Category,
    /// One-to-one direct message channel
    Private,
    /// Thread under a text channel
    Thread,
    /// Anything the core does not route to
    Other,
}

impl ChannelKind {
    /// Whether messages can be sent to this kind of channel.
    pub fn is_messageable(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Announcement | Self::Voice | Self::Private | Self::Thread
        )
    }

    /// Whether this kind can be resolved by name as a text room.
    pub fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::Announcement)
    }
}

/// Snapshot of a channel as seen by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel snowflake
    pub id: ChannelId,
    /// Channel name
    pub name: String,
    /// Owning guild, `None` for direct message channels
    pub guild_id: Option<GuildId>,
    /// Channel kind
    pub kind: ChannelKind,
    /// Channel topic, if any
    pub topic: Option<String>,
    /// Parent category, if any
    pub parent_id: Option<ChannelId>,
    /// Members who can see the channel
    pub member_ids: Vec<UserId>,
}

/// Snapshot of a guild as seen by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildInfo {
    /// Guild snowflake
    pub id: GuildId,
    /// Guild name
    pub name: String,
}

/// Request to create a channel or category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    /// Guild to create the channel in
    pub guild_id: GuildId,
    /// Channel name
    pub name: String,
    /// `Text` or `Category`
    pub kind: ChannelKind,
    /// Category to nest the channel under
    pub parent_id: Option<ChannelId>,
}

/// Where an outbound payload goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum SendTarget {
    /// Direct message to a user
    #[display("user {}", _0)]
    User(UserId),
    /// Guild channel
    #[display("channel {}", _0)]
    Channel(ChannelId),
}

/// One outbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Plain text, already within the platform size limit
    Text(String),
    /// Structured embed
    Embed(Embed),
    /// File attachment
    File {
        /// File name shown to users
        name: String,
        /// File contents
        data: Vec<u8>,
    },
}

/// Snowflake-keyed lookups against the platform client's current view.
///
/// Lookups return `None` when the object is deleted or not cached; that is
/// not an error.
pub trait Directory: Send + Sync {
    /// The account the client is logged in as.
    fn current_user(&self) -> Option<UserInfo>;

    /// Look up a user.
    fn user(&self, id: UserId) -> Option<UserInfo>;

    /// Look up a channel.
    fn channel(&self, id: ChannelId) -> Option<ChannelInfo>;

    /// Look up a guild.
    fn guild(&self, id: GuildId) -> Option<GuildInfo>;

    /// All guilds, in a stable order.
    fn guilds(&self) -> Vec<GuildInfo>;

    /// All guild channels across all guilds.
    fn channels(&self) -> Vec<ChannelInfo>;

    /// All guild members across all guilds, one entry per user.
    fn members(&self) -> Vec<UserInfo>;
}

/// Outbound operations executed on the platform client's event loop.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a payload.
    async fn send(&self, target: SendTarget, content: Outbound) -> TransportResult<()>;

    /// Create a channel or category.
    async fn create_channel(&self, request: NewChannel) -> TransportResult<ChannelInfo>;

    /// Delete a channel or category.
    async fn delete_channel(&self, channel: ChannelId) -> TransportResult<()>;

    /// Grant a member read access to a channel.
    async fn grant_read(&self, channel: ChannelId, user: UserId) -> TransportResult<()>;

    /// Change the bot's global presence.
    async fn set_presence(&self, status: Status, activity: Option<String>) -> TransportResult<()>;

    /// Start a typing indicator in a channel; it stops when the guard drops.
    fn start_typing(&self, channel: ChannelId) -> TypingGuard;
}

/// Scoped typing indicator.
///
/// Released unconditionally when dropped, whatever happened while it was held.
pub struct TypingGuard {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl TypingGuard {
    /// Guard that runs `stop` when dropped.
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// Guard that does nothing.
    pub fn noop() -> Self {
        Self { stop: None }
    }
}

impl Drop for TypingGuard {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl fmt::Debug for TypingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypingGuard")
            .field("active", &self.stop.is_some())
            .finish()
    }
}

/// The shared client handle injected into every identifier.
///
/// One per connection session. Cloning is cheap.
#[derive(Clone)]
pub struct ClientHandle {
    directory: Arc<dyn Directory>,
    outbox: Outbox,
}

impl ClientHandle {
    /// Pair a directory with a send queue.
    pub fn new(directory: Arc<dyn Directory>, outbox: Outbox) -> Self {
        Self { directory, outbox }
    }

    /// Lookup side of the client.
    pub fn directory(&self) -> &dyn Directory {
        self.directory.as_ref()
    }

    /// Send side of the client.
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("outbox", &self.outbox)
            .finish_non_exhaustive()
    }
}
