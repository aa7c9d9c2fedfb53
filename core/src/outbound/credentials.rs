//! PIN-based fallback credential verification.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use zeroize::Zeroizing;

use crate::domain::ports::CredentialVerifier;

/// Source of a PIN typed by the user.
///
/// `None` means the user cancelled the prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PinPrompt: Send + Sync {
    async fn read_pin(&self, reason: &str) -> Option<Zeroizing<String>>;
}

/// Compares an entered PIN with the configured one.
///
/// Both values are wiped from memory when dropped. There is no lockout after
/// repeated failures.
pub struct PinCredentialVerifier {
    expected: Option<Zeroizing<String>>,
    prompt: Arc<dyn PinPrompt>,
}

impl PinCredentialVerifier {
    /// Build a verifier. Without a configured PIN every check fails.
    pub fn new(expected: Option<String>, prompt: Arc<dyn PinPrompt>) -> Self {
        Self {
            expected: expected.map(Zeroizing::new),
            prompt,
        }
    }
}

#[async_trait]
impl CredentialVerifier for PinCredentialVerifier {
    async fn authenticate(&self, reason: &str) -> bool {
        let Some(expected) = self.expected.as_ref() else {
            info!("no fallback PIN configured");
            return false;
        };
        let Some(entered) = self.prompt.read_pin(reason).await else {
            info!("PIN prompt cancelled");
            return false;
        };
        entered.trim() == expected.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for PIN verification.

    use mockall::predicate::eq;
    use rstest::rstest;

    use super::*;

    fn prompt_returning(entry: Option<&'static str>) -> Arc<dyn PinPrompt> {
        let mut prompt = MockPinPrompt::new();
        prompt
            .expect_read_pin()
            .with(eq("Dismiss alarm"))
            .return_once(move |_| entry.map(|pin| Zeroizing::new(pin.to_owned())));
        Arc::new(prompt)
    }

    #[rstest]
    #[case(Some("2468"), true)]
    #[case(Some("2468\n"), true)]
    #[case(Some("1357"), false)]
    #[case(None, false)]
    #[tokio::test]
    async fn compares_entered_pin(#[case] entry: Option<&'static str>, #[case] expected: bool) {
        let verifier = PinCredentialVerifier::new(Some("2468".to_owned()), prompt_returning(entry));
        assert_eq!(verifier.authenticate("Dismiss alarm").await, expected);
    }

    #[tokio::test]
    async fn missing_pin_never_prompts() {
        let mut prompt = MockPinPrompt::new();
        prompt.expect_read_pin().never();
        let verifier = PinCredentialVerifier::new(None, Arc::new(prompt));

        assert!(!verifier.authenticate("Dismiss alarm").await);
    }
}
