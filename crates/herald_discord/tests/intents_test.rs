use herald_core::{HeraldConfig, IntentPreset, IntentToggle};
use herald_discord::{intent_by_name, preset_intents, resolve_intents};
use serenity::all::GatewayIntents;

#[test]
fn test_config_toggles_resolve() {
    let config = HeraldConfig::from_toml_str(
        r#"
        [discord]
        token = "t"
        initial_intents = "none"
        intents = ["guilds", "GUILD_MESSAGES", "message_content", "+dm_messages", 1, "-guilds"]
        "#,
    )
    .expect("config parses");
    let discord = config.discord();

    let intents = resolve_intents(discord.initial_intents, &discord.intents);
    assert_eq!(
        intents,
        GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::GUILD_MEMBERS
    );
}

#[test]
fn test_unknown_toggles_leave_preset_alone() {
    let toggles = vec![
        IntentToggle::Name("-nonsense".to_string()),
        IntentToggle::Bit(40),
        IntentToggle::Bit(-40),
    ];
    assert_eq!(
        resolve_intents(IntentPreset::Default, &toggles),
        preset_intents(IntentPreset::Default)
    );
}

#[test]
fn test_all_preset_can_drop_privileged_intents() {
    let toggles = vec![
        IntentToggle::Name("-presences".to_string()),
        IntentToggle::Name("-members".to_string()),
    ];
    let intents = resolve_intents(IntentPreset::All, &toggles);
    assert!(!intents.contains(GatewayIntents::GUILD_PRESENCES));
    assert!(!intents.contains(GatewayIntents::GUILD_MEMBERS));
    assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
    assert_eq!(intent_by_name("Guild_Presences"), Some(GatewayIntents::GUILD_PRESENCES));
}
