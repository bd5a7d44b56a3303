//! Collaborators driven by the trust handler.
//!
//! All calls happen on the handler's single control thread; none of these
//! may call back into the handler synchronously.

use crate::types::{
    DialogRequest, NetworkId, NetworkSelectionStatus, NotificationRequest, PromptHandle,
    ServerCertificate, TrustDecision,
};

/// Persistent network configuration.
pub trait NetworkStore {
    /// Enable or disable network selection for a network.
    fn update_network_selection_status(
        &mut self,
        network_id: NetworkId,
        status: NetworkSelectionStatus,
    ) -> bool;

    /// Install the approved root and server certificates as the network's
    /// CA material. Returns false if the network could not be updated.
    fn update_ca_certificate(
        &mut self,
        network_id: NetworkId,
        root: &ServerCertificate,
        leaf: &ServerCertificate,
    ) -> bool;

    /// Record that the user approved the network without a CA certificate.
    fn set_approved_without_ca_cert(&mut self, network_id: NetworkId, approved: bool);

    /// Turn trust-on-first-use on or off for a network.
    fn enable_trust_on_first_use(&mut self, network_id: NetworkId, enabled: bool);

    /// Allow or forbid automatic connection to a network.
    fn allow_autojoin(&mut self, network_id: NetworkId, allowed: bool);
}

/// The native supplicant control surface.
pub trait NativeSession {
    /// Drop the cached PMK of a network.
    fn remove_cached_key_material(&mut self, network_id: NetworkId);

    /// Remove every network from the supplicant, clearing its PMKSA cache.
    fn remove_all_networks(&mut self, iface: &str);

    /// Tear down the current association.
    fn disconnect(&mut self, iface: &str);
}

/// Dialog and notification presentation.
pub trait UserPrompt {
    /// Show a modal dialog.
    fn show_dialog(&mut self, request: DialogRequest) -> PromptHandle;

    /// Post a background notification.
    fn show_notification(&mut self, request: NotificationRequest) -> PromptHandle;

    /// Remove a dialog or notification. Unknown handles are ignored.
    fn dismiss(&mut self, handle: PromptHandle);
}

/// Receives the terminal decision of each connection attempt.
pub trait TrustListener {
    /// The server identity was approved.
    fn on_accept(&mut self, ssid: &str);

    /// The user rejected the server identity.
    fn on_reject(&mut self, ssid: &str);

    /// The attempt was abandoned. `None` signals a stale reply.
    fn on_error(&mut self, ssid: Option<&str>);
}

impl TrustListener for Vec<TrustDecision> {
    fn on_accept(&mut self, ssid: &str) {
        self.push(TrustDecision::Accept(ssid.to_string()));
    }

    fn on_reject(&mut self, ssid: &str) {
        self.push(TrustDecision::Reject(ssid.to_string()));
    }

    fn on_error(&mut self, ssid: Option<&str>) {
        self.push(TrustDecision::Error(ssid.map(str::to_string)));
    }
}
