use secrecy::{ExposeSecret, SecretString};

/// The query parameters Meta sends when (re)subscribing the webhook.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyRequest {
    pub mode: Option<String>,
    pub token: Option<String>,
    pub challenge: Option<String>,
}

/// Returns the challenge to echo back when the handshake is valid, `None`
/// when the caller should answer 403.
pub fn verify_subscription(
    request: &VerifyRequest,
    expected_token: &SecretString,
) -> Option<String> {
    if request.mode.as_deref() != Some("subscribe") {
        return None;
    }

    let presented = request.token.as_deref()?;
    if presented != expected_token.expose_secret() {
        return None;
    }

    request.challenge.clone()
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{verify_subscription, VerifyRequest};

    fn token() -> SecretString {
        String::from("hub-verify-secret").into()
    }

    fn request(mode: &str, token: &str, challenge: &str) -> VerifyRequest {
        VerifyRequest {
            mode: Some(mode.to_string()),
            token: Some(token.to_string()),
            challenge: Some(challenge.to_string()),
        }
    }

    #[test]
    fn accepts_matching_subscription() {
        let challenge =
            verify_subscription(&request("subscribe", "hub-verify-secret", "12345"), &token());
        assert_eq!(challenge.as_deref(), Some("12345"));
    }

    #[test]
    fn rejects_wrong_token() {
        assert_eq!(
            verify_subscription(&request("subscribe", "guessed", "12345"), &token()),
            None
        );
    }

    #[test]
    fn rejects_wrong_mode() {
        assert_eq!(
            verify_subscription(&request("unsubscribe", "hub-verify-secret", "12345"), &token()),
            None
        );
    }

    #[test]
    fn rejects_missing_parameters() {
        assert_eq!(verify_subscription(&VerifyRequest::default(), &token()), None);
    }
}
