use crate::core::config::data::Config;

fn or_unset(value: Option<&str>) -> &str {
    value.unwrap_or("(unset)")
}

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  model: {}", self.effective_model());
        println!("  temperature: {}", self.effective_temperature());
        println!("  base-url: {}", self.effective_base_url());
        match &self.default_tags {
            Some(tags) if !tags.is_empty() => println!("  default-tags: {}", tags.join(", ")),
            Some(_) => println!("  default-tags: (none)"),
            None => println!("  default-tags: (built-in)"),
        }
        println!("  demo-delay-ms: {}", self.demo_delay().as_millis());
        match self.safety_policy().scan_in_demo {
            true => println!("  safety-scan-in-demo: on"),
            false => println!("  safety-scan-in-demo: off"),
        }
        println!(
            "  transcript-document-id: {}",
            or_unset(self.transcript.document_id.as_deref())
        );
        println!(
            "  transcript-client-id: {}",
            or_unset(self.transcript.client_id.as_deref())
        );
        let secret = self.transcript.client_secret.as_ref().map(|_| "(set)");
        println!("  transcript-client-secret: {}", or_unset(secret));
        println!("  docs-base-url: {}", self.docs_base_url());
    }
}
