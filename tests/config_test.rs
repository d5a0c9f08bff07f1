//! Tests for engine configuration loading.

use shiritori::{EngineConfig, GameMode, LinkingMode, LlmProvider, Script, TurnOrder};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_defaults() {
    let config = EngineConfig::default();
    assert_eq!(*config.min_players(), 2);
    assert_eq!(config.idle_timeout(), Duration::from_secs(300));
    assert_eq!(config.gateway_timeout(), Duration::from_secs(10));
    assert_eq!(*config.gateway_attempts(), 2);
    assert_eq!(*config.linking(), LinkingMode::Character);
    assert_eq!(*config.mode(), GameMode::Chain);
    assert!(config.terminal_units().contains(&"ん".to_string()));
    assert!(!*config.degrade_on_unavailable());
    assert_eq!(*config.llm().provider(), LlmProvider::Gemini);
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
min_players = 3
idle_timeout_secs = 45
scripts = ["latin"]
linking = "phonetic"
terminal_units = ["n"]
mode = "association"
turn_order = "shuffled"
degrade_on_unavailable = true

[llm]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"
"#
    )
    .unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    assert_eq!(*config.min_players(), 3);
    assert_eq!(config.idle_timeout(), Duration::from_secs(45));
    assert_eq!(config.scripts(), &vec![Script::Latin]);
    assert_eq!(*config.linking(), LinkingMode::Phonetic);
    assert_eq!(config.terminal_units(), &vec!["n".to_string()]);
    assert_eq!(*config.mode(), GameMode::Association);
    assert_eq!(*config.turn_order(), TurnOrder::Shuffled);
    assert!(*config.degrade_on_unavailable());
    assert_eq!(*config.llm().provider(), LlmProvider::Anthropic);
    assert_eq!(*config.llm().max_tokens(), 150);
    // Unset fields keep their defaults.
    assert_eq!(*config.gateway_attempts(), 2);
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(EngineConfig::from_toml("min_players = 1").is_err());
    assert!(EngineConfig::from_toml("gateway_attempts = 0").is_err());
    assert!(EngineConfig::from_toml("scripts = []").is_err());
    assert!(EngineConfig::from_toml("min_word_len = 5\nmax_word_len = 3").is_err());
    assert!(EngineConfig::from_toml("linking = \"sideways\"").is_err());
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_unreadable_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.message.contains("Failed to read config file"));
}
