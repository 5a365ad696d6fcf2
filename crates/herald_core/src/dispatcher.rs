//! Outbound dispatch: chunked sends, card embeds and reply routing.

use crate::{
    Card, Embed, EmbedField, Identifier, Message, Outbound, OutboundJob, Outbox, Person,
    Room, RoomOccupant, SendTarget,
};
use herald_error::{DispatchError, DispatchErrorKind, DispatchResult};
use tracing::{debug, instrument};

/// Discord supports up to 2000 characters per message.
pub const PLATFORM_MESSAGE_LIMIT: usize = 2000;

/// Named card colors.
const PALETTE: &[(&str, u32)] = &[
    ("red", 0xFF0000),
    ("green", 0x008000),
    ("yellow", 0xFFA500),
    ("blue", 0x0000FF),
    ("white", 0xFFFFFF),
    ("cyan", 0x00FFFF),
];

/// Routes framework-originated messages and cards to the send queue.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    outbox: Outbox,
    message_size_limit: usize,
}

impl Dispatcher {
    /// Create a dispatcher. The size limit defaults to, and is clamped to,
    /// [`PLATFORM_MESSAGE_LIMIT`].
    pub fn new(outbox: Outbox, message_size_limit: Option<usize>) -> Self {
        let message_size_limit = message_size_limit
            .unwrap_or(PLATFORM_MESSAGE_LIMIT)
            .clamp(1, PLATFORM_MESSAGE_LIMIT);
        Self {
            outbox,
            message_size_limit,
        }
    }

    /// Effective per-message character limit.
    pub fn message_size_limit(&self) -> usize {
        self.message_size_limit
    }

    /// Split the body into chunks and submit one send per chunk, in order,
    /// without waiting for any of them.
    ///
    /// # Errors
    ///
    /// - `UnsendableDestination` if `message.to` cannot receive messages
    /// - `QueueClosed` if the backend has disconnected
    #[instrument(skip(self, message), fields(to = %message.to))]
    pub fn send(&self, message: &Message) -> DispatchResult<()> {
        let target = send_target(&message.to)?;
        let chunks = split_chunks(&message.body, self.message_size_limit);

        debug!(
            from = %message.from,
            is_direct = message.is_direct(),
            extras = message.extras.len(),
            size = message.body.chars().count(),
            chunks = chunks.len(),
            "Sending message"
        );

        for chunk in chunks {
            self.outbox.submit(OutboundJob::Send {
                target,
                content: Outbound::Text(chunk.to_string()),
                done: None,
            })?;
        }
        Ok(())
    }

    /// Render a card to one embed and send it, waiting for completion.
    ///
    /// A card addressed to a room occupant goes to the occupant's room, as do
    /// plain sends.
    ///
    /// # Errors
    ///
    /// - `UnsendableDestination` / `InvalidColor` before anything is sent
    /// - `Timeout`/`Transport` if the platform does not confirm the send
    #[instrument(skip(self, card), fields(to = %card.to()))]
    pub async fn send_card(&self, card: &Card) -> DispatchResult<()> {
        let target = send_target(card.to())?;
        let embed = render_embed(card)?;

        let pending = self.outbox.request("send card", |done| OutboundJob::Send {
            target,
            content: Outbound::Embed(embed),
            done: Some(done),
        })?;
        pending.wait().await?;
        Ok(())
    }

    /// Build a reply to `original`.
    ///
    /// Direct messages are answered directly by `bot`. Group messages are
    /// answered by `bot` as an occupant of the original room, addressed to the
    /// room, or to the sender in person when `private`. `threaded` has no
    /// routing effect.
    ///
    /// # Errors
    ///
    /// `InvalidReplyOrigin` if a group message did not come from a room occupant.
    pub fn build_reply(
        &self,
        bot: &Person,
        original: &Message,
        text: impl Into<String>,
        private: bool,
        threaded: bool,
    ) -> DispatchResult<Message> {
        if threaded {
            debug!("Threaded replies are not supported, replying in place");
        }

        if original.is_direct() {
            return Ok(Message::new(text, bot.clone().into(), original.from.clone()));
        }

        let Identifier::Occupant(sender) = &original.from else {
            return Err(DispatchError::new(DispatchErrorKind::InvalidReplyOrigin(
                original.from.kind_name().to_string(),
            )));
        };

        let from = RoomOccupant::new(bot.clone(), sender.room().clone());
        let to = if private {
            Identifier::Person(sender.person().clone())
        } else {
            original.to.clone()
        };
        Ok(Message::new(text, from.into(), to))
    }

    /// Send a file to where `message` came from: the sender for direct
    /// messages, the room otherwise. Fire-and-forget.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send).
    #[instrument(skip(self, message, data), fields(from = %message.from, size = data.len()))]
    pub fn upload_file(&self, message: &Message, name: &str, data: Vec<u8>) -> DispatchResult<()> {
        let origin = if message.is_direct() {
            &message.from
        } else {
            &message.to
        };
        let target = send_target(origin)?;

        debug!(file = name, "Sending file");
        self.outbox.submit(OutboundJob::Send {
            target,
            content: Outbound::File {
                name: name.to_string(),
                data,
            },
            done: None,
        })?;
        Ok(())
    }
}

fn send_target(to: &Identifier) -> DispatchResult<SendTarget> {
    match to {
        Identifier::Person(person) => Ok(SendTarget::User(person.id())),
        Identifier::Room(room) => room_target(room).ok_or_else(|| unsendable(to)),
        // Occupants are only addressable through their room.
        Identifier::Occupant(occupant) => room_target(occupant.room()).ok_or_else(|| unsendable(to)),
        Identifier::Category(_) => Err(unsendable(to)),
    }
}

fn room_target(room: &Room) -> Option<SendTarget> {
    room.info()
        .filter(|info| info.kind.is_messageable())
        .map(|info| SendTarget::Channel(info.id))
}

#[track_caller]
fn unsendable(to: &Identifier) -> DispatchError {
    DispatchError::new(DispatchErrorKind::UnsendableDestination(format!(
        "{} ({})",
        to,
        to.kind_name()
    )))
}

/// Split `body` into chunks of at most `limit` characters, in order.
///
/// Splits on character boundaries, never inside a UTF-8 sequence. An empty
/// body yields no chunks.
///
/// # Examples
///
/// ```
/// use herald_core::split_chunks;
///
/// assert_eq!(split_chunks("abcdefg", 3), vec!["abc", "def", "g"]);
/// ```
pub fn split_chunks(body: &str, limit: usize) -> Vec<&str> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (index, _) in body.char_indices() {
        if count == limit {
            chunks.push(&body[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    if start < body.len() {
        chunks.push(&body[start..]);
    }
    chunks
}

/// Resolve a card color: palette name first, then hex literal
/// (`#123456`, `0x123456` or `123456`).
///
/// # Errors
///
/// `InvalidColor` if the color is neither.
///
/// # Examples
///
/// ```
/// use herald_core::resolve_color;
///
/// assert_eq!(resolve_color("red").unwrap(), 0xFF0000);
/// assert_eq!(resolve_color("#123456").unwrap(), 0x123456);
/// assert!(resolve_color("mauve").is_err());
/// ```
pub fn resolve_color(color: &str) -> DispatchResult<u32> {
    let color = color.trim();
    if let Some((_, value)) = PALETTE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(color))
    {
        return Ok(*value);
    }

    let digits = color
        .strip_prefix('#')
        .or_else(|| color.strip_prefix("0x"))
        .or_else(|| color.strip_prefix("0X"))
        .unwrap_or(color);

    let valid = (1..=6).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(DispatchError::new(DispatchErrorKind::InvalidColor(
            color.to_string(),
        )));
    }

    u32::from_str_radix(digits, 16)
        .map_err(|_| DispatchError::new(DispatchErrorKind::InvalidColor(color.to_string())))
}

/// Render a card to an embed. Fields are rendered inline, in order.
///
/// # Errors
///
/// `InvalidColor` if the card color does not resolve.
pub fn render_embed(card: &Card) -> DispatchResult<Embed> {
    let color = card.color().as_deref().map(resolve_color).transpose()?;

    Ok(Embed {
        title: card.title().clone(),
        description: card.body().clone(),
        color,
        image: card.image().clone(),
        thumbnail: card.thumbnail().clone(),
        fields: card
            .fields()
            .iter()
            .map(|(name, value)| EmbedField {
                name: name.clone(),
                value: value.clone(),
                inline: true,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_char_boundaries() {
        let body = "héllo wörld";
        let chunks = split_chunks(body, 4);
        assert_eq!(chunks, vec!["héll", "o wö", "rld"]);
        assert_eq!(chunks.concat(), body);
    }

    #[test]
    fn empty_body_has_no_chunks() {
        assert!(split_chunks("", 10).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_trailing_chunk() {
        let body = "a".repeat(20);
        assert_eq!(split_chunks(&body, 10).len(), 2);
    }

    #[test]
    fn palette_is_case_insensitive() {
        assert_eq!(resolve_color("Cyan").ok(), Some(0x00FFFF));
        assert_eq!(resolve_color("yellow").ok(), Some(0xFFA500));
    }

    #[test]
    fn hex_forms() {
        assert_eq!(resolve_color("0xABCDEF").ok(), Some(0xABCDEF));
        assert_eq!(resolve_color("fff").ok(), Some(0xFFF));
        assert!(resolve_color("#1234567").is_err());
        assert!(resolve_color("#").is_err());
    }
}
