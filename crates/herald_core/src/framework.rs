//! Hooks the chat-bot framework implements to receive events.

use crate::{Backend, Message, Presence, RoomOccupant};
use async_trait::async_trait;

/// Chat-bot framework driven by a [`Backend`].
///
/// Every hook receives the backend so the framework can reply, build
/// identifiers or query rooms. Hooks run on the event loop and must not
/// block it.
#[async_trait]
pub trait Framework: Send + Sync {
    /// Called once when the backend first becomes ready.
    async fn connect_callback(&self, _backend: &Backend) {}

    /// Called exactly once when the backend disconnects.
    async fn disconnect_callback(&self) {}

    /// Inspect a message.
    ///
    /// # Returns
    ///
    /// `true` when the message is a command the framework recognizes; the
    /// backend then calls [`callback_message`](Self::callback_message) with a
    /// typing indicator shown.
    async fn process_message(&self, backend: &Backend, message: &Message) -> bool;

    /// Handle a recognized command.
    async fn callback_message(&self, _backend: &Backend, _message: &Message) {}

    /// A message mentioned one or more users.
    async fn callback_mention(
        &self,
        _backend: &Backend,
        _message: &Message,
        _mentions: &[RoomOccupant],
    ) {
    }

    /// A person's status changed.
    async fn callback_presence(&self, _backend: &Backend, _presence: &Presence) {}
}
