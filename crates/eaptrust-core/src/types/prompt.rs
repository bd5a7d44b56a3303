//! Prompt requests emitted by the trust handler and the replies it accepts.
//!
//! The handler never talks to a UI toolkit. It hands a request value to a
//! [`UserPrompt`](crate::UserPrompt) together with a [`PromptToken`]; the host
//! shows it however it likes and later feeds `(token, reply)` back.

use serde::{Deserialize, Serialize};

/// What a prompt is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptKind {
    /// Modal approval of a server chain
    TofuDialog,
    /// Modal approval of a network without a CA certificate
    LegacyDialog,
    /// Background notice; tapping it opens [`Self::TofuDialog`]
    TofuNotification,
    /// Background notice with accept/reject actions
    LegacyNotification,
    /// Informational dialog about a broken chain
    InvalidChainDialog,
    /// Informational notification about a broken chain
    InvalidChainNotification,
}

impl PromptKind {
    /// Returns true for prompts that only inform and cannot approve anything.
    #[must_use]
    pub const fn is_informational(self) -> bool {
        matches!(
            self,
            Self::InvalidChainDialog | Self::InvalidChainNotification
        )
    }
}

/// Correlates a reply with the prompt that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptToken {
    /// Monotonic id assigned by the handler
    pub id: u64,
    /// SSID of the connection the prompt was raised for
    pub ssid: String,
    /// Kind of prompt
    pub kind: PromptKind,
}

/// Host-side handle of a shown prompt, used to dismiss it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptHandle(pub u64);

/// A clickable help link embedded in a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptLink {
    /// Link label
    pub text: String,
    /// Target URL
    pub url: String,
}

/// A modal dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogRequest {
    /// Correlation token to pass back with the reply
    pub token: PromptToken,
    /// Title line
    pub title: String,
    /// Body text
    pub message: String,
    /// Positive button label
    pub positive_text: Option<String>,
    /// Negative button label
    pub negative_text: Option<String>,
    /// Neutral button label
    pub neutral_text: Option<String>,
    /// Optional help link
    pub link: Option<PromptLink>,
}

/// What happens when the notification body is tapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapAction {
    /// Deliver [`PromptReply::Tap`]
    Reply,
    /// Open a URL, no reply
    OpenUrl(String),
    /// Nothing
    None,
}

/// A passive background notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Correlation token to pass back with the reply
    pub token: PromptToken,
    /// Title line
    pub title: String,
    /// Body text
    pub message: String,
    /// Tap behavior
    pub tap: TapAction,
    /// Label of an inline accept action
    pub accept_text: Option<String>,
    /// Label of an inline reject action
    pub reject_text: Option<String>,
}

/// The user's answer to a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptReply {
    /// Positive button or accept action
    Accept,
    /// Negative button or reject action
    Reject,
    /// Neutral button
    Neutral,
    /// Dismissed without a choice
    Cancel,
    /// Notification body tapped
    Tap,
    /// Help link followed from a dialog
    Link,
}
