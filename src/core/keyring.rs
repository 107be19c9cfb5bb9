use std::error::Error;
use std::fmt;

/// Failure talking to the platform credential store.
///
/// `Unavailable` covers a locked or absent backend; callers fall back to the
/// other credential sources. `Rejected` carries anything else verbatim.
#[derive(Debug)]
pub enum KeyringAccessError {
    Unavailable(keyring::Error),
    Rejected(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Unavailable(err) | KeyringAccessError::Rejected(err) => err,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, KeyringAccessError::Unavailable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Unavailable(err)
            }
            other => KeyringAccessError::Rejected(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unavailable() {
            write!(f, "credential store unavailable: {}", self.inner())
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
