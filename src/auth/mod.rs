use crate::core::keyring::CredentialSlot;
use crate::core::mode::API_KEY_ENV_VARS;
use crate::core::session::validate_credential;

mod ui;

use self::ui::{prompt_confirmation, prompt_masked_input, UiError};

/// Where the API key the app would use right now comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    Environment(&'static str),
    Keyring,
    Missing,
}

impl CredentialStatus {
    pub fn describe(&self) -> String {
        match self {
            CredentialStatus::Environment(var) => format!("from the {var} environment variable"),
            CredentialStatus::Keyring => "stored in the system keyring".to_string(),
            CredentialStatus::Missing => "not configured (demo mode)".to_string(),
        }
    }
}

fn map_ui_result<T>(result: Result<T, UiError>) -> Result<T, Box<dyn std::error::Error>> {
    result.map_err(|err| Box::new(err) as Box<dyn std::error::Error>)
}

pub struct AuthManager {
    slot: CredentialSlot,
    use_keyring: bool,
}

impl AuthManager {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct an AuthManager, optionally disabling keyring access (useful for tests)
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self {
            slot: CredentialSlot::default(),
            use_keyring,
        }
    }

    pub fn store_key(&self, api_key: &str) -> Result<(), Box<dyn std::error::Error>> {
        validate_credential(api_key)?;
        if !self.use_keyring {
            return Ok(());
        }
        self.slot.set(api_key)?;
        Ok(())
    }

    pub fn stored_key(&self) -> Result<Option<String>, Box<dyn std::error::Error>> {
        if !self.use_keyring {
            return Ok(None);
        }
        Ok(self.slot.get()?)
    }

    pub fn status(&self) -> Result<CredentialStatus, Box<dyn std::error::Error>> {
        if let Some(var) = env_credential() {
            return Ok(CredentialStatus::Environment(var));
        }
        if self.stored_key()?.is_some() {
            return Ok(CredentialStatus::Keyring);
        }
        Ok(CredentialStatus::Missing)
    }

    pub fn interactive_auth(&self) -> Result<(), Box<dyn std::error::Error>> {
        println!("🔐 ACT Companion Authentication Setup");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!();
        println!("Current API key: {}", self.status()?.describe());
        println!("Create a key at https://aistudio.google.com/apikey");
        println!();

        let api_key = map_ui_result(prompt_masked_input())?;
        if api_key.is_empty() {
            return Err("API key cannot be empty".into());
        }
        self.store_key(&api_key)?;

        println!("✓ API key stored securely");
        if let Some(var) = env_credential() {
            println!("Note: {var} is set and takes precedence over the stored key.");
        }
        Ok(())
    }

    pub fn interactive_deauth(&self, assume_yes: bool) -> Result<(), Box<dyn std::error::Error>> {
        if self.stored_key()?.is_none() {
            println!("No API key is stored in the system keyring.");
            return Ok(());
        }
        if !assume_yes
            && !map_ui_result(prompt_confirmation(
                "Are you sure you want to remove the stored API key?",
            ))?
        {
            println!("Cancelled.");
            return Ok(());
        }
        self.remove_key()?;
        println!("✅ API key removed");
        Ok(())
    }

    /// Returns false when nothing was stored.
    pub fn remove_key(&self) -> Result<bool, Box<dyn std::error::Error>> {
        if !self.use_keyring {
            return Ok(false);
        }
        Ok(self.slot.delete()?)
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

fn env_credential() -> Option<&'static str> {
    API_KEY_ENV_VARS.iter().copied().find(|var| {
        std::env::var(var)
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false)
    })
}
