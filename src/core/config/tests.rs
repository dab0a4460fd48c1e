use super::data::{Config, DEFAULT_BASE_URL, DEFAULT_DEMO_DELAY_MS};
use super::io::ConfigError;
use crate::core::prompt::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
    assert_eq!(config.effective_model(), DEFAULT_MODEL);
    assert_eq!(config.effective_temperature(), DEFAULT_TEMPERATURE);
    assert_eq!(config.effective_base_url(), DEFAULT_BASE_URL);
    assert_eq!(
        config.demo_delay(),
        Duration::from_millis(DEFAULT_DEMO_DELAY_MS)
    );
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.set_value("model", "gemini-2.5-pro").expect("set model");
    config
        .set_value("default-tags", "values_clarification, empathy")
        .expect("set tags");
    config
        .set_value("safety-scan-in-demo", "off")
        .expect("set safety");
    config.save_to_path(&config_path).expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.effective_model(), "gemini-2.5-pro");
    assert_eq!(
        loaded.default_tags,
        Some(vec![
            "empathy".to_string(),
            "values_clarification".to_string()
        ])
    );
    assert!(!loaded.safety_policy().scan_in_demo);

    let mut config = loaded;
    config.unset_value("model").expect("unset model");
    config.save_to_path(&config_path).expect("Failed to save config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded.effective_model(), DEFAULT_MODEL);
    assert!(loaded.default_tags.is_some());
}

#[test]
fn test_parse_error_names_the_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "model = [unterminated").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("invalid TOML should fail");
    let config_err = err
        .downcast_ref::<ConfigError>()
        .expect("error should be a ConfigError");
    assert!(matches!(config_err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_transcript_section_round_trips() {
    let contents = r#"
model = "gemini-2.5-flash"
temperature = 0.4
demo_delay_ms = 10

[transcript]
document_id = "doc-123"
client_id = "client.apps.example"
"#;
    let config: Config = toml::from_str(contents).expect("parse");
    assert_eq!(config.transcript.document_id.as_deref(), Some("doc-123"));
    assert_eq!(config.effective_temperature(), 0.4);
    assert_eq!(config.demo_delay(), Duration::from_millis(10));
    assert_eq!(config.docs_base_url(), "https://docs.googleapis.com/v1");
}

#[test]
fn test_set_value_validates_input() {
    let mut config = Config::default();
    assert!(config.set_value("temperature", "hot").is_err());
    assert!(config.set_value("temperature", "3.5").is_err());
    assert!(config.set_value("default-tags", "empathy bogus").is_err());
    assert!(config.set_value("safety-scan-in-demo", "maybe").is_err());
    assert!(config.set_value("model", "   ").is_err());
    assert!(config.set_value("colour", "blue").is_err());
    assert!(config.unset_value("colour").is_err());

    config.set_value("temperature", "1.2").expect("valid temperature");
    assert_eq!(config.effective_temperature(), 1.2);
}

#[test]
fn test_tag_overrides_take_precedence() {
    let config = Config {
        default_tags: Some(vec!["values_clarification".to_string()]),
        ..Default::default()
    };

    let configured = config.tag_selection(&[]).expect("configured tags");
    assert!(configured.contains("values_clarification"));
    assert!(!configured.contains("empathy"));

    let overridden = config
        .tag_selection(&["mindfulness".to_string()])
        .expect("override tags");
    assert!(overridden.contains("mindfulness"));
    assert!(!overridden.contains("values_clarification"));

    let builtin = Config::default().tag_selection(&[]).expect("defaults");
    assert!(builtin.contains("empathy"));
    assert!(builtin.contains("mindfulness"));
}
