//! Bearer-token storage for database mode.
//!
//! Tokens live in the platform keyring. A token passed on the command line or
//! through the environment always wins over the stored one.

use crate::core::keyring::KeyringAccessError;
use crate::core::session::Credential;
use keyring::Entry;
use tracing::{debug, warn};

mod ui;

use self::ui::{prompt_confirmation, prompt_token, ConfirmationChoice};

const KEYRING_SERVICE: &str = "datachat";
const KEYRING_ACCOUNT: &str = "bearer-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Flag,
    Environment,
    Keyring,
}

impl CredentialSource {
    pub fn describe(self) -> &'static str {
        match self {
            CredentialSource::Flag => "--token",
            CredentialSource::Environment => crate::core::config::data::ENV_TOKEN,
            CredentialSource::Keyring => "system keyring",
        }
    }
}

pub struct AuthManager {
    use_keyring: bool,
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthManager {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct an AuthManager, optionally disabling keyring access (useful for tests)
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self { use_keyring }
    }

    fn entry() -> Result<Entry, KeyringAccessError> {
        Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT).map_err(KeyringAccessError::from)
    }

    pub fn store_token(&self, token: &str) -> Result<(), KeyringAccessError> {
        if !self.use_keyring {
            return Ok(());
        }
        Self::entry()?.set_password(token)?;
        Ok(())
    }

    pub fn get_token(&self) -> Result<Option<String>, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(None);
        }
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns whether a stored token was actually removed.
    pub fn remove_token(&self) -> Result<bool, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(false);
        }
        match Self::entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Pick the credential for this session: flag, then environment, then keyring.
    ///
    /// Blank values fall through to the next source. Keyring failures are
    /// logged and treated as "signed out".
    pub fn resolve_credential(
        &self,
        cli_token: Option<&str>,
        env_token: Option<&str>,
    ) -> Option<(Credential, CredentialSource)> {
        if let Some(credential) = cli_token.and_then(Credential::new) {
            return Some((credential, CredentialSource::Flag));
        }
        if let Some(credential) = env_token.and_then(Credential::new) {
            return Some((credential, CredentialSource::Environment));
        }

        match self.get_token() {
            Ok(token) => {
                let credential = token.and_then(Credential::new)?;
                debug!("Using bearer token from keyring");
                Some((credential, CredentialSource::Keyring))
            }
            Err(err) => {
                warn!(error = %err, "Could not read stored token");
                None
            }
        }
    }

    pub fn interactive_auth(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.use_keyring {
            return Err("Keyring access is disabled; pass --token instead.".into());
        }
        if self.get_token()?.is_some() {
            let choice = prompt_confirmation("A token is already stored. Replace it?")?;
            if choice != ConfirmationChoice::Yes {
                println!("Keeping the existing token.");
                return Ok(());
            }
        }

        let token = prompt_token()?;
        self.store_token(&token)?;
        println!("✅ Token stored. Database mode is now available.");
        Ok(())
    }

    pub fn interactive_deauth(&self, assume_yes: bool) -> Result<(), Box<dyn std::error::Error>> {
        if self.get_token()?.is_none() {
            println!("No stored token found.");
            return Ok(());
        }
        if !assume_yes
            && prompt_confirmation("Remove the stored token?")? != ConfirmationChoice::Yes
        {
            println!("Nothing removed.");
            return Ok(());
        }

        if self.remove_token()? {
            println!("✅ Stored token removed.");
        }
        Ok(())
    }
}
