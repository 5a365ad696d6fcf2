//! Prefix-command framework served by `herald run`.
//!
//! # Supported Commands
//!
//! - `ping` - replies `pong`
//! - `whoami` - the sender's `username#discriminator`
//! - `whois <token>` - resolves a mention, `username#discriminator` or `#channel`
//! - `rooms` - text rooms the bot can see
//! - `help` - command list as a card

use async_trait::async_trait;
use herald_core::{
    Backend, Card, CardBuilder, CardBuilderError, Framework, Identifier, Message, Presence,
    RoomOccupant, Status,
};
use herald_error::HeraldResult;
use tracing::{debug, info, instrument, warn};

/// One parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Liveness check
    Ping,
    /// Describe the sender
    Whoami,
    /// Resolve an identifier token; `None` when no token was given
    Whois(Option<String>),
    /// List rooms
    Rooms,
    /// List commands
    Help,
    /// Anything else after the prefix
    Unknown(String),
}

const COMMANDS: &[(&str, &str)] = &[
    ("ping", "Check that the bot is alive"),
    ("whoami", "Show your username"),
    ("whois <token>", "Resolve <@id>, username#discriminator or #channel"),
    ("rooms", "List the rooms the bot can see"),
    ("help", "Show this list"),
];

/// Parse `body` as a command if it starts with `prefix`.
///
/// Command names are case-insensitive. A bare prefix is not a command.
pub fn parse_command(prefix: &str, body: &str) -> Option<Command> {
    let rest = body.trim_start().strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let name = words.next()?.to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let command = match name.as_str() {
        "ping" => Command::Ping,
        "whoami" => Command::Whoami,
        "whois" => Command::Whois((!args.is_empty()).then(|| args.join(" "))),
        "rooms" => Command::Rooms,
        "help" => Command::Help,
        _ => Command::Unknown(name),
    };
    Some(command)
}

/// One-line description of a resolved identifier.
pub fn describe(identifier: &Identifier) -> String {
    let created = match identifier {
        Identifier::Person(person) => person.created_at(),
        Identifier::Occupant(occupant) => occupant.person().created_at(),
        Identifier::Room(room) => room.created_at(),
        Identifier::Category(category) => category.as_room().created_at(),
    };
    match created {
        Some(created) => format!(
            "{} is a {} (created {})",
            identifier,
            identifier.kind_name(),
            created.format("%Y-%m-%d")
        ),
        None => format!("{} is a {}", identifier, identifier.kind_name()),
    }
}

fn help_card(prefix: &str, to: Identifier) -> Result<Card, CardBuilderError> {
    let fields = COMMANDS
        .iter()
        .map(|(name, about)| (format!("{}{}", prefix, name), about.to_string()))
        .collect::<Vec<_>>();

    CardBuilder::default()
        .to(to)
        .title("Herald commands")
        .color("blue")
        .fields(fields)
        .build()
}

/// Framework answering prefix commands.
#[derive(Debug, Clone)]
pub struct CommandFramework {
    prefix: String,
}

impl CommandFramework {
    /// Framework answering commands that start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn reply(&self, backend: &Backend, message: &Message, text: String) -> HeraldResult<()> {
        let mut reply = backend.build_reply(message, text, false, false)?;
        if !reply.is_direct() {
            if let Some(sender) = message.from.person() {
                backend.prefix_groupchat_reply(&mut reply, sender);
            }
        }
        backend.send_message(&reply)?;
        Ok(())
    }

    #[instrument(skip(self, backend, message))]
    async fn run(&self, backend: &Backend, message: &Message, command: Command) -> HeraldResult<()> {
        match command {
            Command::Ping => self.reply(backend, message, "pong".to_string()),
            Command::Whoami => {
                let text = match message.from.person() {
                    Some(person) => format!("You are {}", person),
                    None => "I can't tell who you are".to_string(),
                };
                self.reply(backend, message, text)
            }
            Command::Whois(None) => self.reply(
                backend,
                message,
                format!("Usage: {}whois <token>", self.prefix),
            ),
            Command::Whois(Some(token)) => {
                let text = match backend.build_identifier(&token) {
                    Ok(identifier) => describe(&identifier),
                    Err(e) => format!("Could not resolve {:?}: {}", token, e.kind()),
                };
                self.reply(backend, message, text)
            }
            Command::Rooms => {
                let mut names: Vec<String> = backend
                    .rooms()
                    .iter()
                    .filter_map(|room| room.name())
                    .map(|name| format!("#{}", name))
                    .collect();
                names.sort();
                let text = if names.is_empty() {
                    "I can't see any rooms".to_string()
                } else {
                    names.join(", ")
                };
                self.reply(backend, message, text)
            }
            Command::Help => {
                let origin = backend.build_reply(message, String::new(), false, false)?;
                match help_card(&self.prefix, origin.to) {
                    Ok(card) => backend.send_card(&card).await?,
                    Err(e) => warn!(error = %e, "Failed to build help card"),
                }
                Ok(())
            }
            Command::Unknown(name) => self.reply(
                backend,
                message,
                format!(
                    "Unknown command {}{}, try {}help",
                    self.prefix, name, self.prefix
                ),
            ),
        }
    }
}

#[async_trait]
impl Framework for CommandFramework {
    async fn connect_callback(&self, backend: &Backend) {
        info!(bot = ?backend.bot_identifier().map(|bot| bot.to_string()), "Herald is ready");
        if let Err(e) = backend.change_presence(Status::Online, Some(format!("{}help", self.prefix))) {
            warn!(error = %e, "Failed to set presence");
        }
    }

    async fn disconnect_callback(&self) {
        info!("Herald disconnected");
    }

    async fn process_message(&self, backend: &Backend, message: &Message) -> bool {
        !backend.is_from_self(message) && parse_command(&self.prefix, &message.body).is_some()
    }

    async fn callback_message(&self, backend: &Backend, message: &Message) {
        let Some(command) = parse_command(&self.prefix, &message.body) else {
            return;
        };
        if let Err(e) = self.run(backend, message, command).await {
            warn!(error = %e, "Command failed");
        }
    }

    async fn callback_mention(&self, _backend: &Backend, message: &Message, mentions: &[RoomOccupant]) {
        debug!(from = %message.from, count = mentions.len(), "Message mentions members");
    }

    async fn callback_presence(&self, _backend: &Backend, presence: &Presence) {
        debug!(person = %presence.person, status = %presence.status, "Presence changed");
    }
}
