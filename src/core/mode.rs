//! Chooses between talking to the live model and the offline demo.

use std::fmt;
use std::sync::OnceLock;

use tracing::{error, info, warn};

use crate::core::keyring::{CredentialSlot, KeyringAccessError};
use crate::core::prompt::SessionConfig;
use crate::core::session::SessionAdapter;

pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Live,
    Demo,
}

impl OperatingMode {
    pub fn is_demo(self) -> bool {
        self == OperatingMode::Demo
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Live => write!(f, "live"),
            OperatingMode::Demo => write!(f, "demo"),
        }
    }
}

/// Where the model API key comes from.
pub trait CredentialSource {
    fn lookup(&self) -> Result<Option<String>, KeyringAccessError>;
}

/// Environment variables first, then the system keyring.
#[derive(Debug, Clone, Default)]
pub struct EnvKeyringSource {
    pub slot: CredentialSlot,
    pub use_keyring: bool,
}

impl EnvKeyringSource {
    pub fn new(use_keyring: bool) -> Self {
        Self {
            slot: CredentialSlot::default(),
            use_keyring,
        }
    }
}

impl CredentialSource for EnvKeyringSource {
    fn lookup(&self) -> Result<Option<String>, KeyringAccessError> {
        for var in API_KEY_ENV_VARS {
            if let Some(value) = std::env::var(var).ok().filter(|v| !v.trim().is_empty()) {
                return Ok(Some(value));
            }
        }
        if !self.use_keyring {
            return Ok(None);
        }
        self.slot.get()
    }
}

/// A fixed credential, used for `--demo` and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(pub Option<String>);

impl CredentialSource for StaticCredential {
    fn lookup(&self) -> Result<Option<String>, KeyringAccessError> {
        Ok(self.0.clone())
    }
}

/// Resolves the operating mode. The credential is read from its source once
/// and reused until [`ModeResolver::refresh`], since keyring reads can block.
pub struct ModeResolver {
    source: Box<dyn CredentialSource + Send>,
    force_demo: bool,
    cached: OnceLock<Option<String>>,
}

impl ModeResolver {
    pub fn new(source: Box<dyn CredentialSource + Send>) -> Self {
        Self {
            source,
            force_demo: false,
            cached: OnceLock::new(),
        }
    }

    pub fn forced_demo() -> Self {
        Self {
            source: Box::new(StaticCredential(None)),
            force_demo: true,
            cached: OnceLock::new(),
        }
    }

    /// Forget the cached credential; the next resolve reads the source again.
    pub fn refresh(&mut self) {
        self.cached.take();
    }

    /// Read errors are not cached.
    fn credential(&self) -> Option<String> {
        if let Some(cached) = self.cached.get() {
            return cached.clone();
        }
        match self.source.lookup() {
            Ok(value) => {
                let value = value.filter(|key| !key.trim().is_empty());
                let _ = self.cached.set(value.clone());
                value
            }
            Err(err) => {
                warn!("Unable to read stored API key: {err}");
                None
            }
        }
    }

    /// Decide the operating mode and bring the adapter's session in line
    /// with `config`. Any failure leaves the adapter without a session.
    pub fn resolve(&self, adapter: &mut SessionAdapter, config: &SessionConfig) -> OperatingMode {
        if self.force_demo {
            adapter.set_credential(None);
            return OperatingMode::Demo;
        }

        let Some(api_key) = self.credential() else {
            info!("No API key configured; running in demo mode");
            adapter.set_credential(None);
            return OperatingMode::Demo;
        };

        adapter.set_credential(Some(api_key));
        match adapter.reconfigure(config) {
            Ok(_) => OperatingMode::Live,
            Err(err) => {
                error!("Failed to initialize chat session: {err}");
                adapter.clear();
                OperatingMode::Demo
            }
        }
    }
}
