use std::error::Error;
use std::fmt;

use keyring::Entry;
use tracing::debug;

pub const KEYRING_SERVICE: &str = "act-companion";
pub const GEMINI_KEYRING_USER: &str = "gemini";

/// Describes failures when attempting to access the system keyring.
///
/// Recoverable errors indicate that the credential backend was
/// temporarily unavailable (a locked keychain, a missing secret service).
/// Permanent errors carry the underlying cause for reporting.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_recoverable() {
            write!(f, "keyring unavailable: {}", self.inner())
        } else {
            write!(f, "{}", self.inner())
        }
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// The keyring slot holding the model API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialSlot {
    pub service: &'static str,
    pub user: &'static str,
}

impl Default for CredentialSlot {
    fn default() -> Self {
        Self {
            service: KEYRING_SERVICE,
            user: GEMINI_KEYRING_USER,
        }
    }
}

impl CredentialSlot {
    fn entry(&self) -> Result<Entry, KeyringAccessError> {
        Ok(Entry::new(self.service, self.user)?)
    }

    pub fn get(&self) -> Result<Option<String>, KeyringAccessError> {
        match self.entry()?.get_password() {
            Ok(secret) => {
                debug!(service = self.service, user = self.user, "keyring lookup hit");
                Ok(Some(secret))
            }
            Err(keyring::Error::NoEntry) => {
                debug!(service = self.service, user = self.user, "keyring lookup missing");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn set(&self, secret: &str) -> Result<(), KeyringAccessError> {
        self.entry()?.set_password(secret)?;
        Ok(())
    }

    /// Removes the stored secret. Returns false when nothing was stored.
    pub fn delete(&self) -> Result<bool, KeyringAccessError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
