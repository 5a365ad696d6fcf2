//! Typed identifiers: people, rooms, categories and room occupants.
//!
//! Every identifier wraps a snowflake and carries the shared [`ClientHandle`],
//! through which display attributes are resolved on demand. A name that can no
//! longer be resolved (deleted or uncached object) is reported as `None`.
//!
//! Rooms come in two states:
//! 1. they exist and we know their channel id
//! 2. they don't exist yet and we know a name and guild to create them in

use crate::{
    ChannelId, ChannelInfo, ChannelKind, ClientHandle, GuildId, NewChannel, OutboundJob, UserId,
    UserInfo, snowflake_time,
};
use chrono::{DateTime, Utc};
use herald_error::{
    IdentifierError, IdentifierErrorKind, IdentifierResult, RoomError, RoomErrorKind, RoomResult,
};
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{info, instrument, warn};

/// Any entity that can send or receive a message.
///
/// Routing code matches on this exhaustively.
#[derive(Debug, Clone, PartialEq, derive_more::From)]
pub enum Identifier {
    /// An individual account
    Person(Person),
    /// A group text channel
    Room(Room),
    /// A channel-grouping container
    Category(Category),
    /// A person as seen from within a room
    Occupant(RoomOccupant),
}

impl Identifier {
    /// The person behind this identifier, if any.
    pub fn person(&self) -> Option<&Person> {
        match self {
            Self::Person(person) => Some(person),
            Self::Occupant(occupant) => Some(occupant.person()),
            Self::Room(_) | Self::Category(_) => None,
        }
    }

    /// The room behind this identifier, if any.
    pub fn room(&self) -> Option<&Room> {
        match self {
            Self::Room(room) => Some(room),
            Self::Category(category) => Some(category.as_room()),
            Self::Occupant(occupant) => Some(occupant.room()),
            Self::Person(_) => None,
        }
    }

    /// Kind name for logs and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Person(_) => "person",
            Self::Room(_) => "room",
            Self::Category(_) => "category",
            Self::Occupant(_) => "room occupant",
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Person(person) => person.fmt(f),
            Self::Room(room) => room.fmt(f),
            Self::Category(category) => category.fmt(f),
            Self::Occupant(occupant) => occupant.fmt(f),
        }
    }
}

/// An individual Discord account.
#[derive(Clone)]
pub struct Person {
    id: UserId,
    handle: ClientHandle,
}

impl Person {
    /// Person for a known user id. The user does not have to be cached.
    pub fn from_id(handle: ClientHandle, id: UserId) -> Self {
        Self { id, handle }
    }

    /// Resolve `username#discriminator` against the member directory.
    ///
    /// Discord dropped discriminators for user accounts but kept them for
    /// bots, so a member without one (or with `0`) matches any discriminator
    /// when no member carries the requested one exactly.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if the discriminator is not numeric
    /// - `NotFound` if no member matches both fields
    pub fn from_username(
        handle: ClientHandle,
        username: &str,
        discriminator: &str,
    ) -> IdentifierResult<Self> {
        let wanted: u16 = discriminator.parse().map_err(|_| {
            IdentifierError::new(IdentifierErrorKind::InvalidFormat(format!(
                "{}#{}",
                username, discriminator
            )))
        })?;

        let named: Vec<UserInfo> = handle
            .directory()
            .members()
            .into_iter()
            .filter(|m| m.name == username)
            .collect();

        let exact = named.iter().find(|m| m.discriminator == Some(wanted));
        let member = match exact {
            Some(member) => Some(member),
            // Members without a discriminator only match when nobody has it exactly.
            None => {
                let wildcards: Vec<&UserInfo> = named
                    .iter()
                    .filter(|m| m.discriminator.is_none_or(|d| d == 0))
                    .collect();
                if wildcards.len() > 1 {
                    warn!(
                        username,
                        discriminator,
                        candidates = wildcards.len(),
                        "Several members without a discriminator match, using the first"
                    );
                }
                wildcards.first().copied()
            }
        };
        let member = member.ok_or_else(|| {
            IdentifierError::new(IdentifierErrorKind::NotFound(format!(
                "user {}#{}; if the username exists, check the spelling and that the bot \
                 has the intents and permissions to look up guild members",
                username, discriminator
            )))
        })?;

        Ok(Self::from_id(handle, member.id))
    }

    /// User snowflake.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Current directory view of the user.
    pub fn info(&self) -> Option<UserInfo> {
        self.handle.directory().user(self.id)
    }

    /// Account username.
    pub fn username(&self) -> Option<String> {
        self.info().map(|user| user.name)
    }

    /// `username#discriminator`.
    pub fn fullname(&self) -> Option<String> {
        self.info().map(|user| user.fullname())
    }

    /// Account creation time from the snowflake.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        snowflake_time(self.id.0)
    }

    pub(crate) fn handle(&self) -> &ClientHandle {
        &self.handle
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Person").field("id", &self.id).finish()
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fullname() {
            Some(fullname) => f.write_str(&fullname),
            None => write!(f, "<@{}>", self.id),
        }
    }
}

/// Channel kind a room resolves names against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RoomKind {
    Text,
    Category,
}

impl RoomKind {
    fn matches(self, kind: ChannelKind) -> bool {
        match self {
            Self::Text => kind.is_text(),
            Self::Category => kind == ChannelKind::Category,
        }
    }

    fn channel_kind(self) -> ChannelKind {
        match self {
            Self::Text => ChannelKind::Text,
            Self::Category => ChannelKind::Category,
        }
    }
}

/// A persistent group text channel.
#[derive(Clone)]
pub struct Room {
    id: Option<ChannelId>,
    name: Option<String>,
    guild_id: Option<GuildId>,
    kind: RoomKind,
    handle: ClientHandle,
}

impl Room {
    /// Room for a known channel id. The channel does not have to exist.
    pub fn from_id(handle: ClientHandle, id: ChannelId) -> Self {
        Self::with_id(handle, id, RoomKind::Text)
    }

    /// Room named `name` in `guild_id`, resolved against the guild's text
    /// channels. If no channel matches, the room describes one that can be
    /// [`create`](Self::create)d.
    ///
    /// # Errors
    ///
    /// `NotFound` if the guild is unknown.
    pub fn named(
        handle: ClientHandle,
        name: impl Into<String>,
        guild_id: GuildId,
    ) -> IdentifierResult<Self> {
        Self::resolve(handle, name.into(), guild_id, RoomKind::Text)
    }

    fn with_id(handle: ClientHandle, id: ChannelId, kind: RoomKind) -> Self {
        Self {
            id: Some(id),
            name: None,
            guild_id: None,
            kind,
            handle,
        }
    }

    fn resolve(
        handle: ClientHandle,
        name: String,
        guild_id: GuildId,
        kind: RoomKind,
    ) -> IdentifierResult<Self> {
        if handle.directory().guild(guild_id).is_none() {
            return Err(IdentifierError::new(IdentifierErrorKind::NotFound(format!(
                "guild {}",
                guild_id
            ))));
        }

        let id = channel_name_to_id(&handle, &name, guild_id, kind);
        Ok(Self {
            id,
            name: Some(name),
            guild_id: Some(guild_id),
            kind,
            handle,
        })
    }

    /// Channel snowflake; `None` until the room is created.
    pub fn id(&self) -> Option<ChannelId> {
        self.id
    }

    /// Current directory view of the channel.
    pub fn info(&self) -> Option<ChannelInfo> {
        self.id.and_then(|id| self.handle.directory().channel(id))
    }

    /// Channel name.
    pub fn name(&self) -> Option<String> {
        match self.id {
            Some(_) => self.info().map(|c| c.name).or_else(|| self.name.clone()),
            None => self.name.clone(),
        }
    }

    /// Guild the channel belongs to.
    pub fn guild_id(&self) -> Option<GuildId> {
        self.guild_id.or_else(|| self.info().and_then(|c| c.guild_id))
    }

    /// Whether the channel id resolves in the client's current view.
    pub fn exists(&self) -> bool {
        self.info().is_some()
    }

    /// Channel topic; empty when unset or when the room does not exist.
    pub fn topic(&self) -> String {
        self.info().and_then(|c| c.topic).unwrap_or_default()
    }

    /// Members who can see the channel; empty when the room does not exist.
    pub fn occupants(&self) -> Vec<RoomOccupant> {
        let Some(info) = self.info() else {
            return Vec::new();
        };

        info.member_ids
            .into_iter()
            .map(|user| RoomOccupant::new(Person::from_id(self.handle.clone(), user), self.clone()))
            .collect()
    }

    /// Public channels are joined automatically; private ones need an invite.
    pub fn join(&self) {
        warn!(
            room = %self,
            "Can't join channels. Public channels are automatically joined and private channels are invite only."
        );
    }

    /// Bots cannot leave individual channels.
    pub fn leave(&self) {
        warn!(room = %self, "Can't leave channels");
    }

    /// Channel creation time from the snowflake.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.id.and_then(|id| snowflake_time(id.0))
    }

    /// Create the channel described by this room.
    ///
    /// Awaits completion for at most [`AWAIT_TIMEOUT`](crate::AWAIT_TIMEOUT).
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the room exists
    /// - `Unsupported` if the room has no name and guild to create
    /// - `Timeout`/`Transport` if the platform does not confirm creation
    #[instrument(skip(self), fields(room = %self))]
    pub async fn create(&mut self) -> RoomResult<()> {
        self.create_with_parent(None).await
    }

    async fn create_with_parent(&mut self, parent_id: Option<ChannelId>) -> RoomResult<()> {
        if self.exists() {
            warn!("Tried to create a room which already exists");
            return Err(RoomError::new(RoomErrorKind::AlreadyExists(self.to_string())));
        }

        let (Some(name), Some(guild_id)) = (self.name.clone(), self.guild_id) else {
            return Err(RoomError::new(RoomErrorKind::Unsupported(format!(
                "{} has no name and guild to create it from",
                self
            ))));
        };

        let request = NewChannel {
            guild_id,
            name,
            kind: self.kind.channel_kind(),
            parent_id,
        };
        let pending = self
            .handle
            .outbox()
            .request("create channel", |done| OutboundJob::CreateChannel { request, done })?;
        let channel = pending.wait().await?;

        info!(channel_id = %channel.id, guild_id = %guild_id, "Created channel");
        self.id = Some(channel.id);
        self.name = Some(channel.name);
        Ok(())
    }

    /// Delete the channel.
    ///
    /// Awaits completion for at most [`AWAIT_TIMEOUT`](crate::AWAIT_TIMEOUT).
    ///
    /// # Errors
    ///
    /// - `DoesNotExist` if the room does not exist
    /// - `Timeout`/`Transport` if the platform does not confirm deletion
    #[instrument(skip(self), fields(room = %self))]
    pub async fn destroy(&self) -> RoomResult<()> {
        let Some(channel) = self.id.filter(|_| self.exists()) else {
            warn!("Tried to destroy a room which doesn't exist");
            return Err(RoomError::new(RoomErrorKind::DoesNotExist(self.to_string())));
        };

        let pending = self
            .handle
            .outbox()
            .request("delete channel", |done| OutboundJob::DeleteChannel { channel, done })?;
        pending.wait().await?;

        info!(channel_id = %channel, "Deleted channel");
        Ok(())
    }

    /// Grant each person read access to the channel. Fire-and-forget.
    ///
    /// # Errors
    ///
    /// `DoesNotExist` if the room does not exist.
    pub fn invite(&self, people: &[Person]) -> RoomResult<()> {
        let Some(channel) = self.id.filter(|_| self.exists()) else {
            return Err(RoomError::new(RoomErrorKind::DoesNotExist(self.to_string())));
        };

        for person in people {
            self.handle.outbox().submit(OutboundJob::GrantRead {
                channel,
                user: person.id(),
            })?;
        }
        Ok(())
    }
}

/// First channel of `kind` named `name` in the guild.
///
/// Channel names are not unique; duplicates are logged and the first match wins.
fn channel_name_to_id(
    handle: &ClientHandle,
    name: &str,
    guild_id: GuildId,
    kind: RoomKind,
) -> Option<ChannelId> {
    let matching: Vec<ChannelId> = handle
        .directory()
        .channels()
        .into_iter()
        .filter(|c| c.name == name && c.guild_id == Some(guild_id) && kind.matches(c.kind))
        .map(|c| c.id)
        .collect();

    if matching.len() > 1 {
        warn!(
            name,
            guild_id = %guild_id,
            count = matching.len(),
            "Multiple matching channels for channel name, using the first"
        );
    }

    matching.first().copied()
}

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name && self.guild_id == other.guild_id,
            _ => false,
        }
    }
}

impl fmt::Debug for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("guild_id", &self.guild_id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            RoomKind::Text => "#",
            RoomKind::Category => "##",
        };
        match (self.name(), self.id) {
            (Some(name), _) => write!(f, "{}{}", prefix, name),
            (None, Some(id)) => write!(f, "<#{}>", id),
            (None, None) => f.write_str(prefix),
        }
    }
}

/// A channel-grouping container.
#[derive(Clone, PartialEq)]
pub struct Category {
    room: Room,
}

impl Category {
    /// Category for a known channel id.
    pub fn from_id(handle: ClientHandle, id: ChannelId) -> Self {
        Self {
            room: Room::with_id(handle, id, RoomKind::Category),
        }
    }

    /// Category named `name` in `guild_id`, resolved against category channels.
    ///
    /// # Errors
    ///
    /// `NotFound` if the guild is unknown.
    pub fn named(
        handle: ClientHandle,
        name: impl Into<String>,
        guild_id: GuildId,
    ) -> IdentifierResult<Self> {
        Ok(Self {
            room: Room::resolve(handle, name.into(), guild_id, RoomKind::Category)?,
        })
    }

    /// The underlying room state.
    pub fn as_room(&self) -> &Room {
        &self.room
    }

    /// Channel snowflake; `None` until the category is created.
    pub fn id(&self) -> Option<ChannelId> {
        self.room.id()
    }

    /// Category name.
    pub fn name(&self) -> Option<String> {
        self.room.name()
    }

    /// Guild the category belongs to.
    pub fn guild_id(&self) -> Option<GuildId> {
        self.room.guild_id()
    }

    /// Whether the category id resolves in the client's current view.
    pub fn exists(&self) -> bool {
        self.room.exists()
    }

    /// Create the category.
    ///
    /// # Errors
    ///
    /// Same as [`Room::create`].
    pub async fn create(&mut self) -> RoomResult<()> {
        self.room.create().await
    }

    /// Delete the category.
    ///
    /// # Errors
    ///
    /// Same as [`Room::destroy`].
    pub async fn destroy(&self) -> RoomResult<()> {
        self.room.destroy().await
    }

    /// Create a text channel inside this category.
    ///
    /// # Errors
    ///
    /// - `DoesNotExist` if the category does not exist
    /// - `NotACategory` if the id resolves to some other kind of channel
    /// - `Timeout`/`Transport` if the platform does not confirm creation
    #[instrument(skip(self), fields(category = %self))]
    pub async fn create_subchannel(&self, name: &str) -> RoomResult<Room> {
        let info = self
            .room
            .info()
            .ok_or_else(|| RoomError::new(RoomErrorKind::DoesNotExist(self.to_string())))?;
        if info.kind != ChannelKind::Category {
            return Err(RoomError::new(RoomErrorKind::NotACategory(self.to_string())));
        }
        let guild_id = info.guild_id.ok_or_else(|| {
            RoomError::new(RoomErrorKind::NotACategory(format!("{} has no guild", self)))
        })?;

        let mut room = Room {
            id: None,
            name: Some(name.to_string()),
            guild_id: Some(guild_id),
            kind: RoomKind::Text,
            handle: self.room.handle.clone(),
        };
        room.create_with_parent(Some(info.id)).await?;
        Ok(room)
    }

    /// Categories cannot be joined.
    ///
    /// # Errors
    ///
    /// Always `Unsupported`.
    pub fn join(&self) -> RoomResult<()> {
        Err(RoomError::new(RoomErrorKind::Unsupported("Can't join categories".to_string())))
    }

    /// Categories cannot be left.
    ///
    /// # Errors
    ///
    /// Always `Unsupported`.
    pub fn leave(&self) -> RoomResult<()> {
        Err(RoomError::new(RoomErrorKind::Unsupported("Can't leave categories".to_string())))
    }

    /// Categories have no topic.
    ///
    /// # Errors
    ///
    /// Always `Unsupported`.
    pub fn topic(&self) -> RoomResult<String> {
        Err(RoomError::new(RoomErrorKind::Unsupported(
            "Categories have no topic".to_string(),
        )))
    }

    /// Categories have no occupants of their own.
    ///
    /// # Errors
    ///
    /// Always `Unsupported`.
    pub fn occupants(&self) -> RoomResult<Vec<RoomOccupant>> {
        Err(RoomError::new(RoomErrorKind::Unsupported(
            "Categories have no occupants".to_string(),
        )))
    }

    /// Invitations go to channels, not categories.
    ///
    /// # Errors
    ///
    /// Always `Unsupported`.
    pub fn invite(&self, _people: &[Person]) -> RoomResult<()> {
        Err(RoomError::new(RoomErrorKind::Unsupported(
            "Can't invite to categories".to_string(),
        )))
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Category").field(&self.room).finish()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.room.fmt(f)
    }
}

/// A person as seen from within a specific room.
///
/// The room is held for routing only: replies and cards addressed to an
/// occupant go to the room.
#[derive(Clone)]
pub struct RoomOccupant {
    person: Person,
    room: Room,
}

impl RoomOccupant {
    /// Combine a person and the room they are seen in.
    pub fn new(person: Person, room: Room) -> Self {
        Self { person, room }
    }

    /// Occupant for a user id in a channel id.
    pub fn from_ids(handle: ClientHandle, user: UserId, channel: ChannelId) -> Self {
        Self::new(
            Person::from_id(handle.clone(), user),
            Room::from_id(handle, channel),
        )
    }

    /// The person.
    pub fn person(&self) -> &Person {
        &self.person
    }

    /// The room.
    pub fn room(&self) -> &Room {
        &self.room
    }

    /// User snowflake.
    pub fn id(&self) -> UserId {
        self.person.id()
    }
}

impl PartialEq for RoomOccupant {
    fn eq(&self, other: &Self) -> bool {
        self.person.id() == other.person.id() && self.room == other.room
    }
}

impl fmt::Debug for RoomOccupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomOccupant")
            .field("person", &self.person.id())
            .field("room", &self.room.id())
            .finish()
    }
}

impl fmt::Display for RoomOccupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.room.name() {
            Some(name) => write!(f, "{}@{}", self.person, name),
            None => write!(f, "{}@{}", self.person, self.room),
        }
    }
}
