//! Prompt text.
//!
//! Each builder returns a request value; the handler decides when to show it.

use eaptrust_core::{
    DialogRequest, NotificationRequest, PromptLink, PromptToken, TapAction,
};

use crate::chain::ChainEntry;

/// Hex characters of the server signature shown to the user.
pub const SIGNATURE_EXCERPT_LEN: usize = 16;

const TOFU_TITLE: &str = "Trust this network's server?";
const TOFU_CONTINUE: &str = "Trust and connect";
const TOFU_ABORT: &str = "Don't connect";
const TOFU_HINT: &str =
    "This network has no CA certificate to verify its server. Only connect if the details below match what your network administrator gave you.\n\n";

const LEGACY_TITLE: &str = "Can't verify this network";
const LEGACY_CONTINUE: &str = "Connect anyway";
const LEGACY_ABORT: &str = "Don't connect";
const LEGACY_LINK_TEXT: &str = "Learn about certificates";

const NOTIFICATION_TITLE: &str = "Network needs your approval";

const INVALID_TITLE: &str = "Can't connect to this network";
const INVALID_OK: &str = "OK";

/// First [`SIGNATURE_EXCERPT_LEN`] hex characters of a signature.
#[must_use]
pub fn signature_excerpt(signature: &[u8]) -> String {
    let mut hex = hex::encode(signature);
    hex.truncate(SIGNATURE_EXCERPT_LEN);
    hex
}

/// Body of the TOFU dialog, describing the server certificate.
#[must_use]
pub fn tofu_message(leaf: &ChainEntry) -> String {
    let mut message = String::from(TOFU_HINT);
    message.push_str(&format!("Server name: {}\n", leaf.subject.common_name));
    message.push_str(&format!("Issuer name: {}\n", leaf.issuer.common_name));
    if !leaf.subject.organization.is_empty() {
        message.push_str(&format!("Organization: {}\n", leaf.subject.organization));
    }
    if !leaf.subject.email.is_empty() {
        message.push_str(&format!("Contact: {}\n", leaf.subject.email));
    }
    message.push_str(&format!(
        "Signature: {}\n",
        signature_excerpt(leaf.cert.signature())
    ));
    message
}

pub(crate) fn tofu_dialog(token: PromptToken, leaf: &ChainEntry) -> DialogRequest {
    DialogRequest {
        token,
        title: TOFU_TITLE.to_string(),
        message: tofu_message(leaf),
        positive_text: Some(TOFU_CONTINUE.to_string()),
        negative_text: Some(TOFU_ABORT.to_string()),
        neutral_text: None,
        link: None,
    }
}

pub(crate) fn legacy_dialog(token: PromptToken, help_link: Option<&str>) -> DialogRequest {
    let message = format!(
        "{} has no CA certificate, so its server can't be verified. Your credentials could be exposed to an impostor.",
        token.ssid
    );
    DialogRequest {
        token,
        title: LEGACY_TITLE.to_string(),
        message,
        positive_text: Some(LEGACY_CONTINUE.to_string()),
        negative_text: Some(LEGACY_ABORT.to_string()),
        neutral_text: None,
        link: help_link.map(|url| PromptLink {
            text: LEGACY_LINK_TEXT.to_string(),
            url: url.to_string(),
        }),
    }
}

pub(crate) fn tofu_notification(token: PromptToken) -> NotificationRequest {
    let message = format!("Tap to review the server of {} before connecting.", token.ssid);
    NotificationRequest {
        token,
        title: NOTIFICATION_TITLE.to_string(),
        message,
        tap: TapAction::Reply,
        accept_text: None,
        reject_text: None,
    }
}

pub(crate) fn legacy_notification(token: PromptToken, help_link: Option<&str>) -> NotificationRequest {
    let message = format!(
        "{} can't be verified because it has no CA certificate.",
        token.ssid
    );
    NotificationRequest {
        token,
        title: LEGACY_TITLE.to_string(),
        message,
        tap: help_link.map_or(TapAction::None, |url| TapAction::OpenUrl(url.to_string())),
        accept_text: Some(LEGACY_CONTINUE.to_string()),
        reject_text: Some(LEGACY_ABORT.to_string()),
    }
}

fn invalid_chain_message(ssid: &str) -> String {
    format!(
        "The server of {ssid} presented an incomplete or inconsistent certificate chain. Ask your network administrator for a CA certificate."
    )
}

pub(crate) fn invalid_chain_dialog(token: PromptToken) -> DialogRequest {
    let message = invalid_chain_message(&token.ssid);
    DialogRequest {
        token,
        title: INVALID_TITLE.to_string(),
        message,
        positive_text: Some(INVALID_OK.to_string()),
        negative_text: None,
        neutral_text: None,
        link: None,
    }
}

pub(crate) fn invalid_chain_notification(token: PromptToken) -> NotificationRequest {
    let message = invalid_chain_message(&token.ssid);
    NotificationRequest {
        token,
        title: INVALID_TITLE.to_string(),
        message,
        tap: TapAction::None,
        accept_text: None,
        reject_text: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::CertChain;
    use eaptrust_core::{PromptKind, ServerCertificate};

    fn token(kind: PromptKind) -> PromptToken {
        PromptToken {
            id: 1,
            ssid: "\"corp\"".into(),
            kind,
        }
    }

    #[test]
    fn excerpt_is_truncated_hex() {
        let sig = [0xde, 0xad, 0xbe, 0xef, 0x12, 0x34, 0x56, 0x78, 0x90, 0xab];
        assert_eq!(signature_excerpt(&sig), "deadbeef12345678");
        assert_eq!(signature_excerpt(&[0x01, 0x02]), "0102");
    }

    #[test]
    fn tofu_message_lists_server_details() {
        let mut chain = CertChain::new();
        chain
            .insert(
                0,
                ServerCertificate::from_parts(
                    "O=Corp IT,CN=radius.corp,E=it@corp.example",
                    "CN=Corp Root",
                    vec![0xde, 0xad, 0xbe, 0xef, 0x12, 0x34, 0x56, 0x78, 0x90],
                    false,
                ),
            )
            .unwrap();
        let message = tofu_message(chain.leaf().unwrap());

        assert!(message.contains("radius.corp"));
        assert!(message.contains("Corp Root"));
        assert!(message.contains("Corp IT"));
        assert!(message.contains("it@corp.example"));
        assert!(message.contains("deadbeef12345678"));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let mut chain = CertChain::new();
        chain
            .insert(0, ServerCertificate::from_parts("CN=self", "CN=self", vec![1], false))
            .unwrap();
        let message = tofu_message(chain.leaf().unwrap());
        assert!(!message.contains("Organization:"));
        assert!(!message.contains("Contact:"));
    }

    #[test]
    fn legacy_prompts_offer_help_link() {
        let dialog = legacy_dialog(token(PromptKind::LegacyDialog), Some("https://help.example"));
        assert_eq!(dialog.link.unwrap().url, "https://help.example");
        assert!(dialog.message.contains("\"corp\""));

        let notification = legacy_notification(token(PromptKind::LegacyNotification), None);
        assert_eq!(notification.tap, TapAction::None);
        assert!(notification.accept_text.is_some());
        assert!(notification.reject_text.is_some());
    }

    #[test]
    fn tofu_notification_only_taps() {
        let notification = tofu_notification(token(PromptKind::TofuNotification));
        assert_eq!(notification.tap, TapAction::Reply);
        assert!(notification.accept_text.is_none());
        assert!(notification.reject_text.is_none());
    }

    #[test]
    fn invalid_chain_dialog_has_no_accept_path() {
        let dialog = invalid_chain_dialog(token(PromptKind::InvalidChainDialog));
        assert!(dialog.negative_text.is_none());
        assert!(dialog.token.kind.is_informational());
    }
}
