use serde::Deserialize;

/// One message in a disposable mailbox, as returned by the mailbox API.
///
/// Payloads vary between providers; every field defaults so a sparse
/// message still deserializes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailMessage {
    #[serde(default)]
    pub mail_from: String,
    #[serde(default)]
    pub mail_subject: String,
    /// Plain-text body, the field the verification-code scan runs over.
    #[serde(default)]
    pub mail_text_only: String,
    /// Unix timestamp (fractional seconds) of receipt, when the provider
    /// reports one.
    #[serde(default)]
    pub mail_timestamp: Option<f64>,
}

impl MailMessage {
    pub(crate) fn timestamp(&self) -> f64 {
        self.mail_timestamp.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_message_deserializes() {
        let message: MailMessage =
            serde_json::from_str(r#"{"mail_subject": "Welcome"}"#).unwrap();
        assert_eq!(message.mail_subject, "Welcome");
        assert_eq!(message.mail_text_only, "");
        assert!(message.mail_timestamp.is_none());
    }

    #[test]
    fn test_full_message_deserializes() {
        let message: MailMessage = serde_json::from_str(
            r#"{
                "mail_from": "no-reply@demo.test",
                "mail_subject": "Your code",
                "mail_text_only": "Your verification code is 482913.",
                "mail_timestamp": 1755600000.25
            }"#,
        )
        .unwrap();
        assert_eq!(message.mail_from, "no-reply@demo.test");
        assert!(message.mail_text_only.contains("482913"));
        assert_eq!(message.timestamp(), 1755600000.25);
    }
}
