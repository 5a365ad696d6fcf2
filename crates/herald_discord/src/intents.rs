//! Gateway intent resolution from configuration.
//!
//! Names are matched case-insensitively with the `GUILD_` prefix optional,
//! so `GUILD_MEMBERS`, `members` and `Members` are the same intent. The
//! lowercase discord.py names (`dm_messages`, `guild_reactions`, ...) are
//! accepted as well. Integers are bit positions.

use herald_core::{IntentPreset, IntentToggle};
use serenity::all::GatewayIntents;
use tracing::{info, warn};

/// Known intent names. Aliases map to the same flags.
const INTENT_NAMES: &[(&str, GatewayIntents)] = &[
    ("GUILDS", GatewayIntents::GUILDS),
    ("MEMBERS", GatewayIntents::GUILD_MEMBERS),
    ("MODERATION", GatewayIntents::GUILD_MODERATION),
    ("BANS", GatewayIntents::GUILD_MODERATION),
    ("EMOJIS_AND_STICKERS", GatewayIntents::GUILD_EMOJIS_AND_STICKERS),
    ("EMOJIS", GatewayIntents::GUILD_EMOJIS_AND_STICKERS),
    ("INTEGRATIONS", GatewayIntents::GUILD_INTEGRATIONS),
    ("WEBHOOKS", GatewayIntents::GUILD_WEBHOOKS),
    ("INVITES", GatewayIntents::GUILD_INVITES),
    ("VOICE_STATES", GatewayIntents::GUILD_VOICE_STATES),
    ("PRESENCES", GatewayIntents::GUILD_PRESENCES),
    ("MESSAGES", GatewayIntents::GUILD_MESSAGES),
    ("MESSAGE_REACTIONS", GatewayIntents::GUILD_MESSAGE_REACTIONS),
    ("REACTIONS", GatewayIntents::GUILD_MESSAGE_REACTIONS),
    ("MESSAGE_TYPING", GatewayIntents::GUILD_MESSAGE_TYPING),
    ("TYPING", GatewayIntents::GUILD_MESSAGE_TYPING),
    ("DIRECT_MESSAGES", GatewayIntents::DIRECT_MESSAGES),
    ("DM_MESSAGES", GatewayIntents::DIRECT_MESSAGES),
    ("DIRECT_MESSAGE_REACTIONS", GatewayIntents::DIRECT_MESSAGE_REACTIONS),
    ("DM_REACTIONS", GatewayIntents::DIRECT_MESSAGE_REACTIONS),
    ("DIRECT_MESSAGE_TYPING", GatewayIntents::DIRECT_MESSAGE_TYPING),
    ("DM_TYPING", GatewayIntents::DIRECT_MESSAGE_TYPING),
    ("MESSAGE_CONTENT", GatewayIntents::MESSAGE_CONTENT),
    ("SCHEDULED_EVENTS", GatewayIntents::GUILD_SCHEDULED_EVENTS),
    (
        "AUTO_MODERATION_CONFIGURATION",
        GatewayIntents::AUTO_MODERATION_CONFIGURATION,
    ),
    ("AUTO_MODERATION_EXECUTION", GatewayIntents::AUTO_MODERATION_EXECUTION),
];

/// Base intents for a preset.
pub fn preset_intents(preset: IntentPreset) -> GatewayIntents {
    match preset {
        IntentPreset::None => GatewayIntents::empty(),
        IntentPreset::Default => GatewayIntents::non_privileged(),
        IntentPreset::All => GatewayIntents::all(),
    }
}

/// Look up an intent by name, ignoring case and the `GUILD_` prefix.
pub fn intent_by_name(name: &str) -> Option<GatewayIntents> {
    let upper = name.trim().to_ascii_uppercase();
    let key = upper.strip_prefix("GUILD_").unwrap_or(&upper);
    INTENT_NAMES
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, intent)| *intent)
}

/// Intent for a bit position, if the platform defines one there.
pub fn intent_by_bit(bit: u32) -> Option<GatewayIntents> {
    let flags = 1u64.checked_shl(bit)?;
    let intent = GatewayIntents::from_bits_truncate(flags);
    (!intent.is_empty()).then_some(intent)
}

/// Apply toggles to a preset.
///
/// Unknown names and bits are logged and skipped.
pub fn resolve_intents(preset: IntentPreset, toggles: &[IntentToggle]) -> GatewayIntents {
    let mut intents = preset_intents(preset);

    for toggle in toggles {
        let (intent, enable) = match toggle {
            IntentToggle::Bit(bit) => {
                let intent = u32::try_from(bit.unsigned_abs())
                    .ok()
                    .and_then(intent_by_bit);
                (intent, *bit >= 0)
            }
            IntentToggle::Name(name) => match name.strip_prefix('-') {
                Some(name) => (intent_by_name(name), false),
                None => (intent_by_name(name.strip_prefix('+').unwrap_or(name)), true),
            },
        };

        let Some(intent) = intent else {
            warn!(?toggle, "Unknown intent, skipping");
            continue;
        };

        if enable {
            info!(intent = ?intent, "Enabling intent");
            intents.insert(intent);
        } else {
            info!(intent = ?intent, "Disabling intent");
            intents.remove(intent);
        }
    }

    intents
}
