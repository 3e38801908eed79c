use super::*;
use std::collections::HashMap;

const EXPORT: &str = r#"
channels = ["metro_riders", "route12_chat"]

[store]
url = "https://project.supabase.co"

[chat]
kind = "export"
export_dir = "exports"
"#;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn parse(content: &str) -> Config {
    Config::from_toml_str(content).unwrap()
}

#[test]
fn defaults_fill_optional_fields() {
    let cfg = parse(EXPORT);
    assert_eq!(cfg.snapshot_path, PathBuf::from("dashboard/data.json"));
    assert_eq!(
        cfg.issue_keywords,
        vec!["late", "delay", "breakdown", "issue", "problem"]
    );
    assert_eq!(cfg.store.key_env, "SUPABASE_KEY");
    assert_eq!(cfg.classifier.kind, ClassifierKind::Stub);
}

#[test]
fn env_supplies_store_key_and_overrides_url() {
    let cfg = parse(EXPORT).with_env(env_of(&[
        ("SUPABASE_URL", "https://other.supabase.co"),
        ("SUPABASE_KEY", "service-key"),
    ]));
    assert_eq!(cfg.store.url.as_deref(), Some("https://other.supabase.co"));
    assert_eq!(cfg.store.key.as_deref(), Some("service-key"));
}

#[test]
fn custom_key_env_is_honoured() {
    let content = EXPORT.replace(
        "url = \"https://project.supabase.co\"",
        "url = \"https://project.supabase.co\"\nkey_env = \"TRANSIT_DB_KEY\"",
    );
    let cfg = parse(&content).with_env(env_of(&[
        ("SUPABASE_KEY", "wrong"),
        ("TRANSIT_DB_KEY", "right"),
    ]));
    assert_eq!(cfg.store.key.as_deref(), Some("right"));
}

#[test]
fn validate_dedupes_channels_keeping_first() {
    let content = EXPORT.replace(
        r#"["metro_riders", "route12_chat"]"#,
        r#"["metro_riders", " route12_chat ", "metro_riders"]"#,
    );
    let mut cfg = parse(&content).with_env(env_of(&[("SUPABASE_KEY", "k")]));
    cfg.validate(true).unwrap();
    assert_eq!(cfg.channels, vec!["metro_riders", "route12_chat"]);
}

#[test]
fn validate_rejects_empty_channel_list() {
    let content = EXPORT.replace(r#"["metro_riders", "route12_chat"]"#, "[]");
    let mut cfg = parse(&content).with_env(env_of(&[("SUPABASE_KEY", "k")]));
    let err = cfg.validate(true).unwrap_err();
    assert!(err.to_string().contains("no channels"), "got: {err}");
}

#[test]
fn validate_requires_store_key_only_when_needed() {
    let mut cfg = parse(EXPORT).with_env(env_of(&[]));
    let err = cfg.validate(true).unwrap_err();
    assert!(err.to_string().contains("SUPABASE_KEY"), "got: {err}");

    let mut cfg = parse(EXPORT).with_env(env_of(&[]));
    cfg.validate(false).unwrap();
}

#[test]
fn relay_needs_base_url_and_token() {
    let content = r#"
channels = ["metro_riders"]

[chat]
kind = "relay"
base_url = "https://relay.example.org/api/"
"#;
    let mut cfg = parse(content).with_env(env_of(&[]));
    let err = cfg.validate(false).unwrap_err();
    assert!(err.to_string().contains("TPULSE_CHAT_TOKEN"), "got: {err}");

    let mut cfg = parse(content).with_env(env_of(&[("TPULSE_CHAT_TOKEN", "t")]));
    cfg.validate(false).unwrap();
    match &cfg.chat {
        ChatConfig::Relay { page_size, .. } => assert_eq!(*page_size, 100),
        other => panic!("unexpected chat config: {other:?}"),
    }
    assert!(cfg.chat_platform().is_ok());
}

#[test]
fn relay_without_base_url_is_rejected() {
    let content = r#"
channels = ["metro_riders"]

[chat]
kind = "relay"
"#;
    let mut cfg = parse(content).with_env(env_of(&[("TPULSE_CHAT_TOKEN", "t")]));
    let err = cfg.validate(false).unwrap_err();
    assert!(err.to_string().contains("base_url"), "got: {err}");
}

#[test]
fn unknown_chat_kind_fails_to_parse() {
    let content = r#"
channels = ["metro_riders"]

[chat]
kind = "carrier_pigeon"
"#;
    assert!(Config::from_toml_str(content).is_err());
}

#[test]
fn unknown_top_level_key_fails_to_parse() {
    let content = format!("chanels = [\"typo\"]\n{EXPORT}");
    assert!(Config::from_toml_str(&content).is_err());
}

#[test]
fn alias_classifier_is_built_from_routes() {
    let content = format!(
        r#"{EXPORT}
[classifier]
kind = "alias"

[[classifier.routes]]
name = "12"
aliases = ["route 12", "line twelve"]
"#
    );
    let mut cfg = parse(&content).with_env(env_of(&[("SUPABASE_KEY", "k")]));
    cfg.validate(true).unwrap();
    let classifier = cfg.route_classifier().unwrap();
    let m = classifier.classify("Line twelve is late again, bus 4411 broke down");
    assert_eq!(m.route.as_deref(), Some("12"));
    assert_eq!(m.bus.as_deref(), Some("4411"));
}

#[test]
fn bad_bus_pattern_fails_validation() {
    let content = format!(
        r#"{EXPORT}
[classifier]
kind = "alias"
bus_pattern = "bus ("
"#
    );
    let mut cfg = parse(&content).with_env(env_of(&[("SUPABASE_KEY", "k")]));
    assert!(matches!(cfg.validate(true), Err(SyncError::Config(_))));
}

#[test]
fn data_store_needs_credentials() {
    let cfg = parse(EXPORT).with_env(env_of(&[]));
    assert!(cfg.data_store().is_err());

    let cfg = parse(EXPORT).with_env(env_of(&[("SUPABASE_KEY", "k")]));
    assert!(cfg.data_store().is_ok());
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("tpulse.toml")).unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
}

#[test]
fn load_reads_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tpulse.toml");
    std::fs::write(&path, EXPORT).unwrap();
    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.channels.len(), 2);
}
