use crate::core::mode::Mode;
use crate::core::session::Credential;
use crate::core::stream_errors::ChatError;

/// Pre-flight check run before anything touches the network.
///
/// Returns the credential to attach (if any) when the request may proceed.
/// A database query without a credential is rejected with
/// [`ChatError::AuthRequired`].
pub fn authorize(
    mode: Mode,
    credential: Option<&Credential>,
) -> Result<Option<Credential>, ChatError> {
    match (mode.requires_credential(), credential) {
        (true, None) => Err(ChatError::AuthRequired),
        (_, credential) => Ok(credential.cloned()),
    }
}
