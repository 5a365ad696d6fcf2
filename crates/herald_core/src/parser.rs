//! Identifier parsing and rendering.
//!
//! Guilds in Discord are isolated collections of users and channels, referred
//! to as "servers" in the UI. Accepted token forms:
//!
//! | Token                      | Identifier                                   |
//! |----------------------------|----------------------------------------------|
//! | `<@id>`, `<@!id>`          | Person by user id                            |
//! | `<#id>`                    | Room by channel id                           |
//! | `##name`, `##name@guild`   | Category by name                             |
//! | `#name`, `#name@guild`     | Room by name                                 |
//! | `username#discriminator`   | Person resolved against the member directory |
//!
//! When the guild is omitted the first known guild is used. That is only
//! unambiguous for a bot in a single guild.

use crate::{Category, ChannelId, ClientHandle, GuildId, Identifier, Person, Room, UserId};
use herald_error::{IdentifierError, IdentifierErrorKind, IdentifierResult};
use tracing::{debug, error, instrument};

/// Builds identifiers from string tokens.
#[derive(Debug, Clone)]
pub struct IdentifierParser {
    handle: ClientHandle,
}

impl IdentifierParser {
    /// Create a parser resolving against `handle`.
    pub fn new(handle: ClientHandle) -> Self {
        Self { handle }
    }

    /// Parse a token into an identifier.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` for empty or malformed tokens
    /// - `AmbiguousOrMissingDiscriminator` for a bare username
    /// - `InvalidSnowflake` for a mention whose id is not a snowflake
    /// - `NotFound` for an unknown guild or unmatched `username#discriminator`
    #[instrument(skip(self))]
    pub fn parse(&self, token: &str) -> IdentifierResult<Identifier> {
        let token = token.trim();
        if token.is_empty() {
            return Err(invalid(token));
        }

        debug!("Building identifier");

        // Mentions are wrapped in <>
        if let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            if let Some(id) = inner.strip_prefix('@') {
                let id = id.strip_prefix('!').unwrap_or(id);
                let user = UserId(parse_snowflake(id)?);
                return Ok(Person::from_id(self.handle.clone(), user).into());
            }
            if let Some(id) = inner.strip_prefix('#') {
                let channel = ChannelId(parse_snowflake(id)?);
                return Ok(Room::from_id(self.handle.clone(), channel).into());
            }
            return Err(invalid(token));
        }

        if let Some(rest) = token.strip_prefix("##") {
            let (name, guild_id) = self.split_guild(token, rest)?;
            return Ok(Category::named(self.handle.clone(), name, guild_id)?.into());
        }

        if let Some(rest) = token.strip_prefix('#') {
            let (name, guild_id) = self.split_guild(token, rest)?;
            return Ok(Room::named(self.handle.clone(), name, guild_id)?.into());
        }

        if let Some((username, discriminator)) = token.split_once('#') {
            if username.is_empty() || discriminator.is_empty() {
                return Err(invalid(token));
            }
            return Ok(Person::from_username(self.handle.clone(), username, discriminator)?.into());
        }

        if is_bare_username(token) {
            return Err(IdentifierError::new(
                IdentifierErrorKind::AmbiguousOrMissingDiscriminator(token.to_string()),
            ));
        }

        Err(invalid(token))
    }

    /// Render an identifier back to its canonical token.
    ///
    /// Person and Room renders parse back to an equal identifier; occupant
    /// renders are for display only.
    pub fn render(identifier: &Identifier) -> String {
        identifier.to_string()
    }

    /// Resolve a room query: `##name` is a category, `#name` or a bare `name`
    /// is a text room, always in the first known guild.
    ///
    /// # Errors
    ///
    /// `NotFound` when no guild is known.
    #[instrument(skip(self))]
    pub fn query_room(&self, query: &str) -> IdentifierResult<Identifier> {
        let guild_id = self.default_guild().inspect_err(|_| {
            error!(query, "Unable to query room because no guilds were found");
        })?;

        if let Some(name) = query.strip_prefix("##") {
            return Ok(Category::named(self.handle.clone(), name, guild_id)?.into());
        }
        let name = query.strip_prefix('#').unwrap_or(query);
        Ok(Room::named(self.handle.clone(), name, guild_id)?.into())
    }

    fn split_guild<'a>(&self, token: &str, rest: &'a str) -> IdentifierResult<(&'a str, GuildId)> {
        let (name, guild_id) = match rest.rsplit_once('@') {
            Some((name, guild)) => (name, GuildId(parse_snowflake(guild)?)),
            None => (rest, self.default_guild()?),
        };
        if name.is_empty() {
            return Err(invalid(token));
        }
        Ok((name, guild_id))
    }

    fn default_guild(&self) -> IdentifierResult<GuildId> {
        self.handle
            .directory()
            .guilds()
            .first()
            .map(|guild| guild.id)
            .ok_or_else(|| {
                IdentifierError::new(IdentifierErrorKind::NotFound("any guild".to_string()))
            })
    }
}

#[track_caller]
fn invalid(token: &str) -> IdentifierError {
    IdentifierError::new(IdentifierErrorKind::InvalidFormat(token.to_string()))
}

#[track_caller]
fn parse_snowflake(text: &str) -> IdentifierResult<u64> {
    match text.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(IdentifierError::new(IdentifierErrorKind::InvalidSnowflake(
            text.to_string(),
        ))),
    }
}

fn is_bare_username(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '@' | '#' | ':' | '`'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_rejects_zero_and_text() {
        assert!(parse_snowflake("0").is_err());
        assert!(parse_snowflake("abc").is_err());
        assert!(parse_snowflake("-12").is_err());
        assert_eq!(parse_snowflake("175928847299117063").ok(), Some(175928847299117063));
    }

    #[test]
    fn bare_usernames() {
        assert!(is_bare_username("alice"));
        assert!(is_bare_username("bob.smith_2"));
        assert!(!is_bare_username("two words"));
        assert!(!is_bare_username("<@123"));
        assert!(!is_bare_username("user@guild"));
    }
}
