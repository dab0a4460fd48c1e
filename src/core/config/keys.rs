use crate::core::config::data::Config;
use crate::core::tags::TagSelection;

/// Keys accepted by `set` / `unset`.
pub const CONFIG_KEYS: &[&str] = &[
    "model",
    "temperature",
    "base-url",
    "default-tags",
    "demo-delay-ms",
    "safety-scan-in-demo",
    "transcript-document-id",
    "transcript-client-id",
    "transcript-client-secret",
    "docs-base-url",
];

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("Expected on/off, got '{other}'")),
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {key}. Available keys: {}",
        CONFIG_KEYS.join(", ")
    )
}

impl Config {
    /// Apply `key = value`, validating the value for typed keys.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for {key}"));
        }
        match key {
            "model" => self.model = Some(value.to_string()),
            "temperature" => {
                let temperature: f32 = value
                    .parse()
                    .map_err(|_| format!("Invalid temperature: {value}"))?;
                if !(0.0..=2.0).contains(&temperature) {
                    return Err(format!("Temperature must be between 0 and 2, got {value}"));
                }
                self.temperature = Some(temperature);
            }
            "base-url" => self.base_url = Some(value.to_string()),
            "default-tags" => {
                let ids: Vec<&str> = value
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|id| !id.is_empty())
                    .collect();
                let selection = TagSelection::from_ids(&ids)?;
                self.default_tags = Some(selection.ids());
            }
            "demo-delay-ms" => {
                let delay: u64 = value
                    .parse()
                    .map_err(|_| format!("Invalid delay: {value}"))?;
                self.demo_delay_ms = Some(delay);
            }
            "safety-scan-in-demo" => self.safety.scan_in_demo = Some(parse_bool(value)?),
            "transcript-document-id" => self.transcript.document_id = Some(value.to_string()),
            "transcript-client-id" => self.transcript.client_id = Some(value.to_string()),
            "transcript-client-secret" => {
                self.transcript.client_secret = Some(value.to_string())
            }
            "docs-base-url" => self.transcript.docs_base_url = Some(value.to_string()),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        match key {
            "model" => self.model = None,
            "temperature" => self.temperature = None,
            "base-url" => self.base_url = None,
            "default-tags" => self.default_tags = None,
            "demo-delay-ms" => self.demo_delay_ms = None,
            "safety-scan-in-demo" => self.safety.scan_in_demo = None,
            "transcript-document-id" => self.transcript.document_id = None,
            "transcript-client-id" => self.transcript.client_id = None,
            "transcript-client-secret" => self.transcript.client_secret = None,
            "docs-base-url" => self.transcript.docs_base_url = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}
