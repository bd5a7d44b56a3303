//! In-memory collaborators.
//!
//! Enough to run the handler outside a Wi-Fi stack: the CLI persists
//! [`MemoryNetworkStore`] as JSON between runs, and tests inspect what each
//! collaborator was asked to do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use eaptrust_core::{
    DialogRequest, NativeSession, NetworkConfig, NetworkId, NetworkSelectionStatus,
    NetworkStore, NotificationRequest, PromptHandle, PromptToken, Result, ServerCertificate,
    TrustError, UserPrompt,
};

/// Server chain installed after a TOFU approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedCa {
    /// Approved root
    pub root: ServerCertificate,
    /// Approved server certificate
    pub server: ServerCertificate,
    /// When the user approved it
    pub installed_at: DateTime<Utc>,
}

/// What the store knows about one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNetwork {
    /// Selection status
    #[serde(default)]
    pub selection: NetworkSelectionStatus,
    /// Autojoin permission
    #[serde(default = "default_true")]
    pub autojoin: bool,
    /// Approved without a CA certificate
    #[serde(default)]
    pub approved_without_ca: bool,
    /// TOFU still enabled
    #[serde(default)]
    pub trust_on_first_use: Option<bool>,
    /// Installed chain
    #[serde(default)]
    pub trusted_ca: Option<TrustedCa>,
}

impl Default for StoredNetwork {
    fn default() -> Self {
        Self {
            selection: NetworkSelectionStatus::Enabled,
            autojoin: true,
            approved_without_ca: false,
            trust_on_first_use: None,
            trusted_ca: None,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// A [`NetworkStore`] kept in a map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryNetworkStore {
    networks: BTreeMap<NetworkId, StoredNetwork>,
    #[serde(skip)]
    fail_ca_updates: bool,
    #[serde(skip)]
    fail_selection_updates: bool,
    #[serde(skip)]
    selection_history: Vec<(NetworkId, NetworkSelectionStatus)>,
}

impl MemoryNetworkStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON file, or start empty if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrustError::io(path.display().to_string(), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the store as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TrustError::io(parent.display().to_string(), e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| TrustError::io(path.display().to_string(), e))
    }

    /// Make `update_ca_certificate` fail, as a full keystore would.
    pub fn set_fail_ca_updates(&mut self, fail: bool) {
        self.fail_ca_updates = fail;
    }

    /// Make `update_network_selection_status` fail without recording anything.
    pub fn set_fail_selection_updates(&mut self, fail: bool) {
        self.fail_selection_updates = fail;
    }

    /// Stored state of a network
    #[must_use]
    pub fn network(&self, network_id: NetworkId) -> Option<&StoredNetwork> {
        self.networks.get(&network_id)
    }

    /// Every selection status update, oldest first
    #[must_use]
    pub fn selection_history(&self) -> &[(NetworkId, NetworkSelectionStatus)] {
        &self.selection_history
    }

    /// Copy stored trust flags into a network config before connecting.
    ///
    /// An installed chain shows up as a CA alias named after its root
    /// fingerprint, so the handler no longer gates the network.
    pub fn apply_to(&self, config: &mut NetworkConfig) {
        let (Some(stored), Some(ent)) = (
            self.networks.get(&config.network_id),
            config.enterprise.as_mut(),
        ) else {
            return;
        };
        ent.user_approve_no_ca_cert = stored.approved_without_ca;
        if let Some(enabled) = stored.trust_on_first_use {
            ent.trust_on_first_use = enabled;
        }
        if let Some(ca) = &stored.trusted_ca {
            let alias = format!("tofu:{}", ca.root.fingerprint());
            if !ent.ca_certificate_aliases.contains(&alias) {
                ent.ca_certificate_aliases.push(alias);
            }
        }
    }

    fn entry(&mut self, network_id: NetworkId) -> &mut StoredNetwork {
        self.networks.entry(network_id).or_default()
    }
}

impl NetworkStore for MemoryNetworkStore {
    fn update_network_selection_status(
        &mut self,
        network_id: NetworkId,
        status: NetworkSelectionStatus,
    ) -> bool {
        if self.fail_selection_updates {
            return false;
        }
        self.entry(network_id).selection = status;
        self.selection_history.push((network_id, status));
        true
    }

    fn update_ca_certificate(
        &mut self,
        network_id: NetworkId,
        root: &ServerCertificate,
        leaf: &ServerCertificate,
    ) -> bool {
        if self.fail_ca_updates {
            return false;
        }
        self.entry(network_id).trusted_ca = Some(TrustedCa {
            root: root.clone(),
            server: leaf.clone(),
            installed_at: Utc::now(),
        });
        true
    }

    fn set_approved_without_ca_cert(&mut self, network_id: NetworkId, approved: bool) {
        self.entry(network_id).approved_without_ca = approved;
    }

    fn enable_trust_on_first_use(&mut self, network_id: NetworkId, enabled: bool) {
        self.entry(network_id).trust_on_first_use = Some(enabled);
    }

    fn allow_autojoin(&mut self, network_id: NetworkId, allowed: bool) {
        self.entry(network_id).autojoin = allowed;
    }
}

/// A call made on the native session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    /// PMK dropped
    RemoveCachedKeyMaterial(NetworkId),
    /// All supplicant networks removed
    RemoveAllNetworks(String),
    /// Association torn down
    Disconnect(String),
}

/// A [`NativeSession`] that records calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    calls: Vec<NativeCall>,
}

impl RecordingSession {
    /// Calls made so far
    #[must_use]
    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    /// Number of disconnects requested
    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, NativeCall::Disconnect(_)))
            .count()
    }
}

impl NativeSession for RecordingSession {
    fn remove_cached_key_material(&mut self, network_id: NetworkId) {
        self.calls.push(NativeCall::RemoveCachedKeyMaterial(network_id));
    }

    fn remove_all_networks(&mut self, iface: &str) {
        self.calls.push(NativeCall::RemoveAllNetworks(iface.to_string()));
    }

    fn disconnect(&mut self, iface: &str) {
        self.calls.push(NativeCall::Disconnect(iface.to_string()));
    }
}

/// A prompt handed to [`QueuedPrompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShownRequest {
    /// Modal dialog
    Dialog(DialogRequest),
    /// Background notification
    Notification(NotificationRequest),
}

impl ShownRequest {
    /// Correlation token
    #[must_use]
    pub const fn token(&self) -> &PromptToken {
        match self {
            Self::Dialog(d) => &d.token,
            Self::Notification(n) => &n.token,
        }
    }
}

/// A shown prompt and whether it was dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShownPrompt {
    /// Handle given to the handler
    pub handle: PromptHandle,
    /// What was shown
    pub request: ShownRequest,
    /// Dismissed by the handler
    pub dismissed: bool,
}

/// A [`UserPrompt`] that queues requests for someone else to answer.
#[derive(Debug, Clone, Default)]
pub struct QueuedPrompt {
    shown: Vec<ShownPrompt>,
}

impl QueuedPrompt {
    /// Everything shown so far
    #[must_use]
    pub fn shown(&self) -> &[ShownPrompt] {
        &self.shown
    }

    /// Most recent prompt that is still on screen
    #[must_use]
    pub fn outstanding(&self) -> Option<&ShownPrompt> {
        self.shown.iter().rev().find(|p| !p.dismissed)
    }

    /// Most recent dialog, dismissed or not
    #[must_use]
    pub fn last_dialog(&self) -> Option<&DialogRequest> {
        self.shown.iter().rev().find_map(|p| match &p.request {
            ShownRequest::Dialog(d) => Some(d),
            ShownRequest::Notification(_) => None,
        })
    }

    /// Most recent notification, dismissed or not
    #[must_use]
    pub fn last_notification(&self) -> Option<&NotificationRequest> {
        self.shown.iter().rev().find_map(|p| match &p.request {
            ShownRequest::Notification(n) => Some(n),
            ShownRequest::Dialog(_) => None,
        })
    }

    fn push(&mut self, request: ShownRequest) -> PromptHandle {
        let handle = PromptHandle(self.shown.len() as u64 + 1);
        self.shown.push(ShownPrompt {
            handle,
            request,
            dismissed: false,
        });
        handle
    }
}

impl UserPrompt for QueuedPrompt {
    fn show_dialog(&mut self, request: DialogRequest) -> PromptHandle {
        self.push(ShownRequest::Dialog(request))
    }

    fn show_notification(&mut self, request: NotificationRequest) -> PromptHandle {
        self.push(ShownRequest::Notification(request))
    }

    fn dismiss(&mut self, handle: PromptHandle) {
        if let Some(p) = self.shown.iter_mut().find(|p| p.handle == handle) {
            p.dismissed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eaptrust_core::{EapMethod, EnterpriseConfig, Phase2Method};

    fn ttls_network() -> NetworkConfig {
        let mut ent = EnterpriseConfig::new(EapMethod::Ttls, Phase2Method::Mschapv2);
        ent.trust_on_first_use = true;
        NetworkConfig::enterprise(7, "\"corp\"", ent)
    }

    #[test]
    fn store_roundtrips_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("networks.json");

        let mut store = MemoryNetworkStore::new();
        let root = ServerCertificate::from_parts("CN=ca", "CN=ca", vec![1, 2], true);
        let leaf = ServerCertificate::from_parts("CN=srv", "CN=ca", vec![3, 4], false);
        assert!(store.update_ca_certificate(7, &root, &leaf));
        store.allow_autojoin(7, false);
        store.save(&path).unwrap();

        let loaded = MemoryNetworkStore::load(&path).unwrap();
        let net = loaded.network(7).unwrap();
        assert!(!net.autojoin);
        assert_eq!(net.trusted_ca.as_ref().unwrap().root, root);
        assert!(loaded.selection_history().is_empty());
    }

    #[test]
    fn missing_state_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryNetworkStore::load(&dir.path().join("nope.json")).unwrap();
        assert!(store.network(1).is_none());
    }

    #[test]
    fn apply_to_copies_flags_and_ca_alias() {
        let mut store = MemoryNetworkStore::new();
        store.set_approved_without_ca_cert(7, true);
        let mut config = ttls_network();
        store.apply_to(&mut config);
        assert!(config.enterprise.as_ref().unwrap().user_approve_no_ca_cert);
        assert!(config.insecure_enterprise().is_some());

        let root = ServerCertificate::from_parts("CN=ca", "CN=ca", vec![1], true);
        store.update_ca_certificate(7, &root, &root);
        store.apply_to(&mut config);
        store.apply_to(&mut config);
        let ent = config.enterprise.as_ref().unwrap();
        assert_eq!(ent.ca_certificate_aliases.len(), 1);
        assert!(config.insecure_enterprise().is_none());
    }

    #[test]
    fn failing_ca_updates_leave_store_untouched() {
        let mut store = MemoryNetworkStore::new();
        store.set_fail_ca_updates(true);
        let cert = ServerCertificate::from_parts("CN=ca", "CN=ca", vec![1], true);
        assert!(!store.update_ca_certificate(7, &cert, &cert));
        assert!(store.network(7).is_none());
    }

    #[test]
    fn queued_prompt_tracks_dismissal() {
        let mut prompt = QueuedPrompt::default();
        let token = PromptToken {
            id: 1,
            ssid: "s".into(),
            kind: eaptrust_core::PromptKind::TofuNotification,
        };
        let handle = prompt.show_notification(NotificationRequest {
            token,
            title: "t".into(),
            message: "m".into(),
            tap: eaptrust_core::TapAction::Reply,
            accept_text: None,
            reject_text: None,
        });
        assert!(prompt.outstanding().is_some());
        prompt.dismiss(handle);
        assert!(prompt.outstanding().is_none());
        assert!(prompt.last_notification().is_some());
        assert!(prompt.last_dialog().is_none());
    }
}
