use herald_core::{HeraldConfig, IntentPreset, IntentToggle, PLATFORM_MESSAGE_LIMIT, TOKEN_ENV};
use herald_error::ConfigErrorKind;
use std::io::Write;

#[test]
fn test_full_config_parses() {
    let config = HeraldConfig::from_toml_str(
        r#"
        [discord]
        token = "abc.def.ghi"
        initial_intents = "all"
        intents = ["GUILD_MEMBERS", "-presences", 9, -1]
        message_size_limit = 1500
        command_prefix = "?"
        "#,
    )
    .expect("config parses");

    let discord = config.discord();
    assert_eq!(discord.token().ok(), Some("abc.def.ghi"));
    assert_eq!(discord.initial_intents, IntentPreset::All);
    assert_eq!(
        discord.intents,
        vec![
            IntentToggle::Name("GUILD_MEMBERS".to_string()),
            IntentToggle::Name("-presences".to_string()),
            IntentToggle::Bit(9),
            IntentToggle::Bit(-1),
        ]
    );
    assert_eq!(discord.effective_message_size_limit(), 1500);
    assert_eq!(discord.command_prefix, "?");
    assert!(config.validate().is_ok());
}

#[test]
fn test_defaults() {
    let config = HeraldConfig::from_toml_str("[discord]\ntoken = \"t\"\n").expect("config parses");
    let discord = config.discord();

    assert_eq!(discord.initial_intents, IntentPreset::Default);
    assert!(discord.intents.is_empty());
    assert_eq!(discord.effective_message_size_limit(), PLATFORM_MESSAGE_LIMIT);
    assert_eq!(discord.command_prefix, "!");
}

#[test]
fn test_missing_token_is_fatal() {
    let config = HeraldConfig::from_toml_str("").expect("empty config parses");
    let err = config.validate().expect_err("token is required");
    assert_eq!(err.kind(), &ConfigErrorKind::MissingToken(TOKEN_ENV));
    assert!(err.to_string().contains(TOKEN_ENV));
}

#[test]
fn test_zero_message_size_limit_is_rejected() {
    let config = HeraldConfig::from_toml_str("[discord]\ntoken = \"t\"\nmessage_size_limit = 0\n")
        .expect("config parses");
    let err = config.validate().expect_err("zero limit is rejected");
    assert!(matches!(
        err.kind(),
        ConfigErrorKind::InvalidSetting { setting: "discord.message_size_limit", .. }
    ));
}

#[test]
fn test_unknown_preset_is_rejected() {
    let err = HeraldConfig::from_toml_str("[discord]\ninitial_intents = \"most\"\n")
        .expect_err("unknown preset");
    assert!(matches!(err.kind(), ConfigErrorKind::Parse(_)));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[discord]\ntoken = \"from-file\"").expect("write temp file");

    let config = HeraldConfig::from_file(file.path()).expect("config loads");
    assert_eq!(config.discord().token().ok(), Some("from-file"));

    let err = HeraldConfig::from_file("/definitely/not/herald.toml").expect_err("missing file");
    assert!(matches!(
        err.kind(),
        ConfigErrorKind::Read { path, .. } if path == "/definitely/not/herald.toml"
    ));
}
