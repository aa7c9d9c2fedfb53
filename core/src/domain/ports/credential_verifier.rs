//! Port for the biometric or PIN fallback check.

use async_trait::async_trait;

/// Prompt the user for a fallback credential.
///
/// Returns `true` only on a positive match; cancellation reports `false`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn authenticate(&self, reason: &str) -> bool;
}
