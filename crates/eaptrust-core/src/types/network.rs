//! Network and enterprise (802.1X) configuration types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TrustError;

/// Stable identifier of a saved network.
pub type NetworkId = i32;

/// Outer EAP method of an enterprise network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EapMethod {
    /// No EAP method configured
    #[default]
    None,
    /// Protected EAP
    Peap,
    /// EAP-TLS
    Tls,
    /// Tunneled TLS
    Ttls,
    /// EAP-PWD
    Pwd,
    /// EAP-SIM
    Sim,
    /// EAP-AKA
    Aka,
    /// EAP-AKA'
    AkaPrime,
    /// Unauthenticated TLS (Hotspot 2.0 OSU)
    UnauthTls,
    /// WAPI certificate
    WapiCert,
}

impl EapMethod {
    /// Returns true if the method authenticates the server with a certificate.
    #[must_use]
    pub const fn uses_server_cert(self) -> bool {
        matches!(self, Self::Peap | Self::Tls | Self::Ttls)
    }

    /// Returns true if the method tunnels an inner (phase 2) method.
    #[must_use]
    pub const fn is_tunneled(self) -> bool {
        matches!(self, Self::Peap | Self::Ttls)
    }
}

impl FromStr for EapMethod {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "peap" => Ok(Self::Peap),
            "tls" => Ok(Self::Tls),
            "ttls" => Ok(Self::Ttls),
            "pwd" => Ok(Self::Pwd),
            "sim" => Ok(Self::Sim),
            "aka" => Ok(Self::Aka),
            "aka-prime" | "aka'" => Ok(Self::AkaPrime),
            "unauth-tls" => Ok(Self::UnauthTls),
            "wapi-cert" => Ok(Self::WapiCert),
            _ => Err(TrustError::Config(format!("unknown EAP method: {s}"))),
        }
    }
}

impl std::fmt::Display for EapMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Peap => "peap",
            Self::Tls => "tls",
            Self::Ttls => "ttls",
            Self::Pwd => "pwd",
            Self::Sim => "sim",
            Self::Aka => "aka",
            Self::AkaPrime => "aka-prime",
            Self::UnauthTls => "unauth-tls",
            Self::WapiCert => "wapi-cert",
        };
        f.write_str(name)
    }
}

/// Inner (phase 2) authentication method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase2Method {
    /// No inner method
    #[default]
    None,
    /// PAP
    Pap,
    /// MS-CHAP
    Mschap,
    /// MS-CHAPv2
    Mschapv2,
    /// Generic token card
    Gtc,
    /// EAP-SIM inside the tunnel
    Sim,
    /// EAP-AKA inside the tunnel
    Aka,
    /// EAP-AKA' inside the tunnel
    AkaPrime,
}

impl FromStr for Phase2Method {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "pap" => Ok(Self::Pap),
            "mschap" => Ok(Self::Mschap),
            "mschapv2" => Ok(Self::Mschapv2),
            "gtc" => Ok(Self::Gtc),
            "sim" => Ok(Self::Sim),
            "aka" => Ok(Self::Aka),
            "aka-prime" | "aka'" => Ok(Self::AkaPrime),
            _ => Err(TrustError::Config(format!("unknown phase 2 method: {s}"))),
        }
    }
}

/// Enterprise (802.1X) part of a network configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseConfig {
    /// Outer EAP method
    pub eap_method: EapMethod,
    /// Inner method for tunneled EAP
    #[serde(default)]
    pub phase2_method: Phase2Method,
    /// Client identity sent inside the tunnel
    #[serde(default)]
    pub identity: String,
    /// Client password sent inside the tunnel
    #[serde(default)]
    pub password: String,
    /// Configured CA certificate aliases
    #[serde(default)]
    pub ca_certificate_aliases: Vec<String>,
    /// Configured CA directory
    #[serde(default)]
    pub ca_path: Option<String>,
    /// Whether trust-on-first-use is enabled for this network
    #[serde(default)]
    pub trust_on_first_use: bool,
    /// Whether the user previously approved this network without a CA
    #[serde(default)]
    pub user_approve_no_ca_cert: bool,
}

impl EnterpriseConfig {
    /// Create an enterprise config for the given methods.
    #[must_use]
    pub fn new(eap_method: EapMethod, phase2_method: Phase2Method) -> Self {
        Self {
            eap_method,
            phase2_method,
            ..Self::default()
        }
    }

    /// Returns true if the EAP method authenticates the server by certificate.
    #[must_use]
    pub const fn is_eap_method_server_cert_used(&self) -> bool {
        self.eap_method.uses_server_cert()
    }

    /// Returns true if any CA material is configured.
    #[must_use]
    pub fn has_ca_certificate(&self) -> bool {
        !self.ca_certificate_aliases.is_empty()
            || self.ca_path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Remove the inner credentials so a handshake cannot finish before the
    /// server chain is approved.
    ///
    /// Only tunneled methods with an inner method carry such credentials.
    /// Returns true if anything was cleared.
    pub fn strip_inner_credentials(&mut self) -> bool {
        if !self.eap_method.is_tunneled() || self.phase2_method == Phase2Method::None {
            return false;
        }
        let had_any = !self.identity.is_empty() || !self.password.is_empty();
        self.identity.clear();
        self.password.clear();
        had_any
    }
}

/// A saved network as the trust handler sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Stable network identifier
    pub network_id: NetworkId,
    /// Network SSID
    pub ssid: String,
    /// Enterprise settings, `None` for personal/open networks
    #[serde(default)]
    pub enterprise: Option<EnterpriseConfig>,
}

impl NetworkConfig {
    /// An open or PSK network.
    #[must_use]
    pub fn personal(network_id: NetworkId, ssid: impl Into<String>) -> Self {
        Self {
            network_id,
            ssid: ssid.into(),
            enterprise: None,
        }
    }

    /// An enterprise network.
    #[must_use]
    pub fn enterprise(
        network_id: NetworkId,
        ssid: impl Into<String>,
        enterprise: EnterpriseConfig,
    ) -> Self {
        Self {
            network_id,
            ssid: ssid.into(),
            enterprise: Some(enterprise),
        }
    }

    /// Returns true for 802.1X networks.
    #[must_use]
    pub const fn is_enterprise(&self) -> bool {
        self.enterprise.is_some()
    }

    /// Enterprise settings of a network that authenticates its server by
    /// certificate but has no CA configured.
    ///
    /// These are the only networks the trust handler ever gates.
    #[must_use]
    pub fn insecure_enterprise(&self) -> Option<&EnterpriseConfig> {
        self.enterprise
            .as_ref()
            .filter(|e| e.is_eap_method_server_cert_used() && !e.has_ca_certificate())
    }
}

/// Network selection status written back to the network store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkSelectionStatus {
    /// Selection enabled
    #[default]
    Enabled,
    /// Selection disabled by the framework's trust policy
    DisabledByPolicy,
}
