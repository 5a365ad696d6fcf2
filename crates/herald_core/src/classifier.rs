//! Inbound adapter from raw platform events to normalized values.

use crate::{
    ChannelId, ClientHandle, Identifier, Message, Person, Presence, Room, RoomOccupant, Status,
    UserId,
};
use tracing::{debug, warn};

/// Raw chat message as delivered by the platform client.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    /// Channel the message was posted in
    pub channel_id: ChannelId,
    /// Whether that channel is a one-to-one private channel
    pub private: bool,
    /// Author
    pub author_id: UserId,
    /// Text content
    pub content: String,
    /// Users mentioned in the message
    pub mentions: Vec<UserId>,
    /// Embeds, serialized as the platform delivered them
    pub embeds: Vec<serde_json::Value>,
}

/// Platform-side online status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawStatus {
    /// Online
    Online,
    /// Offline
    Offline,
    /// Idle
    Idle,
    /// Do not disturb
    DoNotDisturb,
    /// Invisible
    Invisible,
    /// Anything the platform adds later
    Unknown,
}

impl RawStatus {
    /// Fixed mapping to framework statuses; `None` for transitions to ignore.
    pub fn to_status(self) -> Option<Status> {
        match self {
            Self::Online => Some(Status::Online),
            Self::Offline => Some(Status::Offline),
            Self::Idle => Some(Status::Away),
            Self::DoNotDisturb => Some(Status::DoNotDisturb),
            Self::Invisible | Self::Unknown => None,
        }
    }
}

/// Raw events the classifier understands.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A message was posted.
    Message(RawMessage),
    /// A member's status may have changed.
    StatusUpdate {
        /// Member
        user_id: UserId,
        /// Previous status
        before: RawStatus,
        /// New status
        after: RawStatus,
    },
    /// A message was edited; accepted but not processed.
    MessageEdit {
        /// Channel of the edited message
        channel_id: ChannelId,
        /// Edited message
        message_id: u64,
    },
}

/// Outcome of classifying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// A chat message, plus the users it mentions as occupants of its channel.
    Message {
        /// The normalized message
        message: Message,
        /// Mentioned users, bound to the message's channel
        mentions: Vec<RoomOccupant>,
    },
    /// A presence change.
    Presence(Presence),
    /// Nothing to deliver.
    Ignored,
}

/// Turns raw platform events into messages and presences.
#[derive(Debug, Clone)]
pub struct EventClassifier {
    handle: ClientHandle,
}

impl EventClassifier {
    /// Create a classifier resolving against `handle`.
    pub fn new(handle: ClientHandle) -> Self {
        Self { handle }
    }

    /// Classify one event. `bot` is the backend's own identity, used as the
    /// recipient of direct messages.
    pub fn classify(&self, event: InboundEvent, bot: &Person) -> Classified {
        match event {
            InboundEvent::Message(raw) => self.classify_message(raw, bot),
            InboundEvent::StatusUpdate {
                user_id,
                before,
                after,
            } => self.classify_status(user_id, before, after),
            InboundEvent::MessageEdit {
                channel_id,
                message_id,
            } => {
                warn!(channel_id = %channel_id, message_id, "Message editing not supported");
                Classified::Ignored
            }
        }
    }

    fn classify_message(&self, raw: RawMessage, bot: &Person) -> Classified {
        let (from, to): (Identifier, Identifier) = if raw.private {
            (
                Person::from_id(self.handle.clone(), raw.author_id).into(),
                bot.clone().into(),
            )
        } else {
            (
                RoomOccupant::from_ids(self.handle.clone(), raw.author_id, raw.channel_id).into(),
                Room::from_id(self.handle.clone(), raw.channel_id).into(),
            )
        };

        let mentions = raw
            .mentions
            .iter()
            .map(|user| RoomOccupant::from_ids(self.handle.clone(), *user, raw.channel_id))
            .collect();

        let message = Message::new(raw.content, from, to).with_extras(raw.embeds);
        Classified::Message { message, mentions }
    }

    fn classify_status(&self, user_id: UserId, before: RawStatus, after: RawStatus) -> Classified {
        if before == after {
            debug!(user_id = %user_id, "Unrecognised member update, ignoring");
            return Classified::Ignored;
        }

        let person = Person::from_id(self.handle.clone(), user_id);
        debug!(
            person = %person,
            ?before,
            ?after,
            "Person changed status"
        );

        match after.to_status() {
            Some(status) => Classified::Presence(Presence { person, status }),
            None => Classified::Ignored,
        }
    }
}
