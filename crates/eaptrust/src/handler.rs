//! The trust-on-first-use decision handler.
//!
//! One handler serves one station interface and evaluates at most one
//! connection at a time:
//!
//! ```text
//! Idle --prepare_connection--> AwaitingCertificates
//!      --start_user_approval_if_necessary--> AwaitingUserApproval
//!      --accept | reject | error--> Idle
//! ```
//!
//! Every resolution fires exactly one [`TrustListener`] callback and returns
//! the handler to `Idle`.

use tracing::{debug, error, info, warn};

use eaptrust_core::{
    DialogRequest, NativeSession, NetworkConfig, NetworkId, NetworkSelectionStatus,
    NetworkStore, NotificationRequest, PromptHandle, PromptKind, PromptReply, PromptToken,
    ServerCertificate, TrustListener, UserPrompt,
};

use crate::chain::CertChain;
use crate::config::HandlerConfig;
use crate::prompt;

/// Result of [`TofuTrustHandler::prepare_connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    /// The network needs no trust decision.
    NotRequired,
    /// The network is gated; handshake certificates are collected until
    /// approval starts.
    Gated,
    /// The device cannot collect a chain: the network is held until the user
    /// approves connecting without a CA.
    OnHold,
}

impl Preparation {
    /// Returns true if a prompt may follow.
    #[must_use]
    pub const fn needs_prompt(self) -> bool {
        !matches!(self, Self::NotRequired)
    }
}

/// Externally visible state of the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// Nothing to decide
    Idle,
    /// Connection prepared, chain still being collected
    AwaitingCertificates,
    /// Prompt issued, waiting for the user
    AwaitingUserApproval,
}

#[derive(Debug)]
struct PendingConnection {
    config: NetworkConfig,
    gated: bool,
    use_tofu: bool,
    chain: CertChain,
    approval_started: bool,
}

impl PendingConnection {
    fn new(config: NetworkConfig, gated: bool, use_tofu: bool) -> Self {
        Self {
            config,
            gated,
            use_tofu,
            chain: CertChain::new(),
            approval_started: false,
        }
    }

    const fn network_id(&self) -> NetworkId {
        self.config.network_id
    }

    fn tofu_enabled(&self) -> bool {
        self.config
            .enterprise
            .as_ref()
            .is_some_and(|e| e.trust_on_first_use)
    }
}

#[derive(Debug)]
struct ActivePrompt {
    token: PromptToken,
    handle: PromptHandle,
}

/// Decides whether to trust an enterprise network that has no CA certificate.
///
/// Driven from a single control thread: handshake certificate callbacks,
/// approval requests and prompt replies are all plain method calls.
#[derive(Debug)]
pub struct TofuTrustHandler<S, N, P, L> {
    config: HandlerConfig,
    store: S,
    native: N,
    prompt: P,
    listener: L,
    pending: Option<PendingConnection>,
    active_prompt: Option<ActivePrompt>,
    last_prompt_id: u64,
}

impl<S, N, P, L> TofuTrustHandler<S, N, P, L>
where
    S: NetworkStore,
    N: NativeSession,
    P: UserPrompt,
    L: TrustListener,
{
    /// Create a handler with its collaborators.
    pub fn new(config: HandlerConfig, store: S, native: N, prompt: P, listener: L) -> Self {
        Self {
            config,
            store,
            native,
            prompt,
            listener,
            pending: None,
            active_prompt: None,
            last_prompt_id: 0,
        }
    }

    /// Start evaluating a new connection attempt.
    ///
    /// The config always becomes the pending connection, replacing any
    /// previous one, its certificates and its prompt. For TOFU networks the
    /// inner credentials are stripped from `config` so the handshake stalls
    /// until the chain is approved.
    pub fn prepare_connection(&mut self, config: &mut NetworkConfig) -> Preparation {
        let supported = self.config.trust_on_first_use_supported;
        // Replies to the previous prompt no longer match the active token.
        self.dismiss_prompt();

        let Some(ent) = config.insecure_enterprise() else {
            debug!(ssid = %config.ssid, "network does not need a trust decision");
            self.pending = Some(PendingConnection::new(config.clone(), false, false));
            return Preparation::NotRequired;
        };

        let tofu_enabled = ent.trust_on_first_use;
        if ent.user_approve_no_ca_cert
            && (!supported || (!tofu_enabled && self.config.insecure_enterprise_allowed))
        {
            info!(ssid = %config.ssid, "network was approved without a CA certificate before");
            self.pending = Some(PendingConnection::new(config.clone(), false, false));
            return Preparation::NotRequired;
        }

        let use_tofu = supported && tofu_enabled;
        if use_tofu {
            if let Some(ent) = config.enterprise.as_mut() {
                if ent.strip_inner_credentials() {
                    debug!(ssid = %config.ssid, "cleared inner credentials until the server is trusted");
                }
            }
        }

        self.pending = Some(PendingConnection::new(config.clone(), true, use_tofu));
        if supported {
            self.clear_native_data();
            debug!(ssid = %config.ssid, use_tofu, "removed native cached data for a fresh handshake");
            Preparation::Gated
        } else {
            self.put_network_on_hold(false);
            Preparation::OnHold
        }
    }

    /// Record a certificate delivered by the handshake.
    ///
    /// Returns false if there is no matching TOFU connection, the depth is
    /// negative, or the certificate names cannot be parsed. A repeated depth
    /// keeps the first certificate and still returns true.
    pub fn add_pending_certificate(
        &mut self,
        ssid: &str,
        depth: i32,
        cert: ServerCertificate,
    ) -> bool {
        if ssid.is_empty() {
            return false;
        }
        let Ok(depth) = u32::try_from(depth) else {
            warn!(ssid, depth, "negative certificate depth");
            return false;
        };
        let Some(pending) = self.pending.as_mut() else {
            debug!(ssid, depth, "certificate without a pending connection");
            return false;
        };
        if pending.config.ssid != ssid {
            debug!(ssid, target_ssid = %pending.config.ssid, "certificate for a different network");
            return false;
        }
        if !pending.use_tofu {
            return false;
        }

        let fingerprint = cert.fingerprint().to_string();
        match pending.chain.insert(depth, cert) {
            Ok(true) => debug!(ssid, depth, %fingerprint, "pending server certificate"),
            Ok(false) => debug!(ssid, depth, "certificate already present at this depth"),
            Err(e) => {
                warn!(ssid, depth, error = %e, "unusable server certificate");
                return false;
            }
        }

        if depth == 0 {
            self.put_network_on_hold(true);
        }
        true
    }

    /// Record the server certificate when the handshake reports only one.
    pub fn set_pending_certificate(&mut self, ssid: &str, cert: ServerCertificate) -> bool {
        self.add_pending_certificate(ssid, 0, cert)
    }

    /// Validate what was collected and ask the user if needed.
    ///
    /// Returns true if the attempt is now waiting for the user or was
    /// resolved with an error.
    pub fn start_user_approval_if_necessary(&mut self, is_user_selected: bool) -> bool {
        let Some(pending) = self.pending.as_ref() else {
            return false;
        };
        if !pending.gated {
            return false;
        }
        let ssid = pending.config.ssid.clone();

        if self.config.trust_on_first_use_supported
            && !self.config.insecure_enterprise_allowed
            && !pending.tofu_enabled()
        {
            warn!(%ssid, "TOFU is disabled and insecure enterprise networks are not allowed");
            self.handle_error(Some(&ssid));
            return true;
        }

        if pending.use_tofu {
            if let Err(e) = pending.chain.validate() {
                warn!(%ssid, error = %e, "server certificate chain rejected");
                self.handle_error(Some(&ssid));
                if e.is_broken_link() {
                    self.show_invalid_chain(ssid, is_user_selected);
                }
                return true;
            }
        } else if self.config.trust_on_first_use_supported && self.config.insecure_enterprise_allowed
        {
            return false;
        }

        debug!(%ssid, is_user_selected, "starting user approval");
        if let Some(pending) = self.pending.as_mut() {
            pending.approval_started = true;
        }
        if is_user_selected {
            self.ask_for_user_approval();
        } else {
            self.notify_user();
        }
        true
    }

    /// Route a reply from a prompt this handler raised.
    pub fn handle_prompt_reply(&mut self, token: &PromptToken, reply: PromptReply) {
        let is_active = self
            .active_prompt
            .as_ref()
            .is_some_and(|a| a.token == *token);
        debug!(ssid = %token.ssid, kind = ?token.kind, ?reply, is_active, "prompt reply");

        if token.kind.is_informational() {
            if is_active {
                self.dismiss_prompt();
            }
            return;
        }

        if !is_active {
            // The SSID alone cannot tell a superseded attempt from a new one
            // on a network with the same name.
            if self.pending.is_some() {
                warn!(ssid = %token.ssid, prompt_id = token.id, "reply for a prompt that is no longer shown");
            } else {
                self.handle_error(None);
            }
            return;
        }

        match reply {
            PromptReply::Accept => self.handle_accept(&token.ssid),
            PromptReply::Reject | PromptReply::Neutral | PromptReply::Cancel => {
                self.handle_reject(&token.ssid);
            }
            PromptReply::Tap if token.kind == PromptKind::TofuNotification => {
                self.ask_for_user_approval();
            }
            PromptReply::Link if token.kind == PromptKind::LegacyDialog => {
                // The help page would sit under the dialog; move to the notification.
                self.notify_user();
            }
            PromptReply::Tap | PromptReply::Link => {}
        }
    }

    /// The user approved the server identity of `ssid`.
    pub fn handle_accept(&mut self, ssid: &str) {
        if !self.is_connection_valid(ssid) {
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };
        let network_id = pending.network_id();

        if pending.use_tofu {
            let anchors = pending
                .chain
                .anchors()
                .map(|(root, leaf)| (root.cert.clone(), leaf.cert.clone()));
            match anchors {
                Ok((root, leaf)) => {
                    if self.store.update_ca_certificate(network_id, &root, &leaf) {
                        self.store.set_approved_without_ca_cert(network_id, false);
                        self.store.enable_trust_on_first_use(network_id, false);
                        info!(ssid, network_id, root = %root.fingerprint(), "installed approved server chain");
                    } else {
                        // The user approved; keep the connection anyway.
                        error!(ssid, network_id, "cannot update CA certificate");
                    }
                }
                Err(e) => {
                    warn!(ssid, error = %e, "accepted without a usable chain");
                    self.pending = Some(pending);
                    self.handle_error(Some(ssid));
                    return;
                }
            }
        } else {
            self.store.set_approved_without_ca_cert(network_id, true);
        }

        self.update_selection(network_id, NetworkSelectionStatus::Enabled);
        self.store.allow_autojoin(network_id, true);
        self.dismiss_prompt();
        info!(ssid, network_id, "server identity accepted");
        self.listener.on_accept(ssid);
    }

    /// The user rejected the server identity of `ssid`.
    pub fn handle_reject(&mut self, ssid: &str) {
        if !self.is_connection_valid(ssid) {
            return;
        }
        if let Some(pending) = &self.pending {
            let network_id = pending.network_id();
            self.update_selection(network_id, NetworkSelectionStatus::DisabledByPolicy);
            self.store.allow_autojoin(network_id, false);
        }
        self.dismiss_prompt();
        self.clear_native_data();
        self.pending = None;
        info!(ssid, "server identity rejected");
        self.listener.on_reject(ssid);
    }

    /// Abandon the pending attempt. `None` reports a stale reply.
    pub fn handle_error(&mut self, ssid: Option<&str>) {
        if let Some(network_id) = self.pending.as_ref().map(PendingConnection::network_id) {
            self.update_selection(network_id, NetworkSelectionStatus::DisabledByPolicy);
        }
        self.dismiss_prompt();
        self.clear_native_data();
        self.pending = None;
        warn!(ssid = ssid.unwrap_or("<none>"), "insecure EAP network handling failed");
        self.listener.on_error(ssid);
    }

    /// Drop everything without deciding. Used when the session goes away.
    pub fn cleanup(&mut self) {
        self.dismiss_prompt();
        self.pending = None;
        debug!("trust handler cleaned up");
    }

    /// Disable selection of the pending network and flush native key material.
    pub fn put_network_on_hold(&mut self, need_to_disconnect: bool) {
        if let Some(network_id) = self.pending.as_ref().map(PendingConnection::network_id) {
            self.update_selection(network_id, NetworkSelectionStatus::DisabledByPolicy);
        }
        if need_to_disconnect {
            self.native.disconnect(&self.config.interface_name);
        }
        self.clear_native_data();
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> HandlerState {
        match &self.pending {
            Some(p) if p.gated && p.approval_started => HandlerState::AwaitingUserApproval,
            Some(p) if p.gated => HandlerState::AwaitingCertificates,
            _ => HandlerState::Idle,
        }
    }

    /// SSID of the pending connection
    #[must_use]
    pub fn pending_ssid(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.config.ssid.as_str())
    }

    /// Certificates collected for the pending connection
    #[must_use]
    pub fn chain(&self) -> Option<&CertChain> {
        self.pending.as_ref().map(|p| &p.chain)
    }

    /// Token of the prompt currently shown, if any
    #[must_use]
    pub fn active_prompt(&self) -> Option<&PromptToken> {
        self.active_prompt.as_ref().map(|a| &a.token)
    }

    /// Handler configuration
    #[must_use]
    pub const fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// The network store
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The native session
    #[must_use]
    pub const fn native(&self) -> &N {
        &self.native
    }

    /// The prompt collaborator
    #[must_use]
    pub const fn prompt(&self) -> &P {
        &self.prompt
    }

    /// The decision listener
    #[must_use]
    pub const fn listener(&self) -> &L {
        &self.listener
    }

    /// Take the collaborators back.
    pub fn into_parts(self) -> (S, N, P, L) {
        (self.store, self.native, self.prompt, self.listener)
    }

    // A reply can be invalid because a newer connection replaced the one it
    // was raised for (ignore it), or because state was lost (reset and report
    // with no SSID).
    fn is_connection_valid(&mut self, ssid: &str) -> bool {
        let current = self.pending.as_ref().map(|p| p.config.ssid.clone());
        match current {
            Some(current) if !ssid.is_empty() => {
                if current == ssid {
                    true
                } else {
                    warn!(target_ssid = %current, reply_ssid = ssid, "reply for a different network");
                    false
                }
            }
            _ => {
                self.handle_error(None);
                false
            }
        }
    }

    fn update_selection(&mut self, network_id: NetworkId, status: NetworkSelectionStatus) {
        if !self.store.update_network_selection_status(network_id, status) {
            error!(network_id, ?status, "cannot update network selection status");
        }
    }

    fn ask_for_user_approval(&mut self) {
        let Some((ssid, use_tofu)) = self
            .pending
            .as_ref()
            .filter(|p| !p.config.ssid.is_empty())
            .map(|p| (p.config.ssid.clone(), p.use_tofu))
        else {
            return;
        };

        let request = if use_tofu {
            let token = self.issue_token(ssid, PromptKind::TofuDialog);
            let Some(leaf) = self.pending.as_ref().and_then(|p| p.chain.leaf()) else {
                error!("cannot ask for TOFU approval without a server certificate");
                return;
            };
            prompt::tofu_dialog(token, leaf)
        } else {
            let token = self.issue_token(ssid, PromptKind::LegacyDialog);
            prompt::legacy_dialog(token, self.config.help_link())
        };
        self.show_dialog(request);
    }

    fn notify_user(&mut self) {
        let Some((ssid, use_tofu, has_leaf)) = self
            .pending
            .as_ref()
            .map(|p| (p.config.ssid.clone(), p.use_tofu, p.chain.leaf().is_some()))
        else {
            return;
        };
        if use_tofu && !has_leaf {
            return;
        }

        let request = if use_tofu {
            prompt::tofu_notification(self.issue_token(ssid, PromptKind::TofuNotification))
        } else {
            let token = self.issue_token(ssid, PromptKind::LegacyNotification);
            prompt::legacy_notification(token, self.config.help_link())
        };
        self.show_notification(request);
    }

    fn show_invalid_chain(&mut self, ssid: String, is_user_selected: bool) {
        if is_user_selected {
            let token = self.issue_token(ssid, PromptKind::InvalidChainDialog);
            self.show_dialog(prompt::invalid_chain_dialog(token));
        } else {
            let token = self.issue_token(ssid, PromptKind::InvalidChainNotification);
            self.show_notification(prompt::invalid_chain_notification(token));
        }
    }

    fn show_dialog(&mut self, request: DialogRequest) {
        self.dismiss_prompt();
        let token = request.token.clone();
        let handle = self.prompt.show_dialog(request);
        self.active_prompt = Some(ActivePrompt { token, handle });
    }

    fn show_notification(&mut self, request: NotificationRequest) {
        self.dismiss_prompt();
        let token = request.token.clone();
        let handle = self.prompt.show_notification(request);
        self.active_prompt = Some(ActivePrompt { token, handle });
    }

    fn dismiss_prompt(&mut self) {
        if let Some(active) = self.active_prompt.take() {
            self.prompt.dismiss(active.handle);
        }
    }

    fn issue_token(&mut self, ssid: String, kind: PromptKind) -> PromptToken {
        self.last_prompt_id += 1;
        PromptToken {
            id: self.last_prompt_id,
            ssid,
            kind,
        }
    }

    // The PMK must go or the next attempt would skip the EAP exchange, and
    // removing the networks flushes the supplicant's PMKSA cache.
    fn clear_native_data(&mut self) {
        if let Some(pending) = &self.pending {
            self.native.remove_cached_key_material(pending.network_id());
        }
        self.native.remove_all_networks(&self.config.interface_name);
    }
}
