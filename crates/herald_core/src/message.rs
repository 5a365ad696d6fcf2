//! Normalized message, card and presence types.

use crate::{Identifier, Person};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A normalized chat message.
///
/// `from` is a `Person` for direct messages and a `RoomOccupant` for group
/// messages; `to` is the bot's `Person` or a `Room` respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Message text
    pub body: String,
    /// Sender
    pub from: Identifier,
    /// Recipient
    pub to: Identifier,
    /// Opaque attachments (embeds), passed through unmodified
    pub extras: Vec<serde_json::Value>,
}

impl Message {
    /// Create a message with no extras.
    pub fn new(body: impl Into<String>, from: Identifier, to: Identifier) -> Self {
        Self {
            body: body.into(),
            from,
            to,
            extras: Vec::new(),
        }
    }

    /// Attach opaque extras.
    pub fn with_extras(mut self, extras: Vec<serde_json::Value>) -> Self {
        self.extras = extras;
        self
    }

    /// A message is direct when it is addressed to a person rather than a room.
    pub fn is_direct(&self) -> bool {
        match self.to {
            Identifier::Person(_) => true,
            Identifier::Room(_) | Identifier::Category(_) | Identifier::Occupant(_) => false,
        }
    }
}

/// Rich content rendered to a single embed.
///
/// # Examples
///
/// ```rust,ignore
/// let card = CardBuilder::default()
///     .to(Identifier::Room(room))
///     .title("Deploy finished")
///     .color("green")
///     .fields(vec![("env".to_string(), "prod".to_string())])
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct Card {
    /// Destination
    to: Identifier,
    /// Title line
    #[builder(default, setter(into, strip_option))]
    title: Option<String>,
    /// Body text
    #[builder(default, setter(into, strip_option))]
    body: Option<String>,
    /// Palette name (`red`, `green`, ...) or hex literal (`#123456`)
    #[builder(default, setter(into, strip_option))]
    color: Option<String>,
    /// Image URL
    #[builder(default, setter(into, strip_option))]
    image: Option<String>,
    /// Thumbnail URL
    #[builder(default, setter(into, strip_option))]
    thumbnail: Option<String>,
    /// Ordered key/value pairs, rendered as inline fields
    #[builder(default)]
    fields: Vec<(String, String)>,
}

/// One embed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field name
    pub name: String,
    /// Field value
    pub value: String,
    /// Render side by side with neighbouring fields
    pub inline: bool,
}

/// Platform-neutral embed built from a [`Card`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Title
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// 24-bit RGB color
    pub color: Option<u32>,
    /// Image URL
    pub image: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
    /// Fields, in order
    pub fields: Vec<EmbedField>,
}

/// Presence statuses surfaced to the framework.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Online
    #[display("online")]
    Online,
    /// Offline or invisible
    #[display("offline")]
    Offline,
    /// Idle
    #[display("away")]
    Away,
    /// Do not disturb
    #[display("dnd")]
    DoNotDisturb,
}

/// A person's status changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Presence {
    /// Who changed
    pub person: Person,
    /// New status
    pub status: Status,
}
