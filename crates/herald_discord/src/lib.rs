//! Serenity bindings for the Herald Discord adapter.
//!
//! [`SerenityHandle`] implements the core's `Directory` and `Transport` on
//! serenity's cache and HTTP client, [`HeraldHandler`] turns gateway events
//! into backend events, and [`HeraldBot`] ties both to one serenity client.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod convert;
mod handle;
mod handler;
mod intents;

pub use client::HeraldBot;
pub use handle::SerenityHandle;
pub use handler::{BackendSlot, HeraldHandler};
pub use intents::{intent_by_bit, intent_by_name, preset_intents, resolve_intents};
