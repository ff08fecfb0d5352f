use std::{
    fmt,
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Transport protocol of a container port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "sctp" => Ok(Protocol::Sctp),
            other => Err(ModelError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Container port, optionally published on the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port inside the container.
    pub target: u16,
    #[serde(default)]
    pub protocol: Protocol,
    /// Host port; `None` exposes the port without publishing it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<u16>,
    /// Host address to bind; defaults to all interfaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<IpAddr>,
}

impl PortMapping {
    /// Container port exposed over TCP and not published.
    pub fn exposed(target: u16) -> Self {
        Self {
            target,
            protocol: Protocol::Tcp,
            published: None,
            host_ip: None,
        }
    }

    /// Container port published on `host_port`.
    pub fn published(target: u16, host_port: u16) -> Self {
        Self {
            published: Some(host_port),
            ..Self::exposed(target)
        }
    }

    /// Runtime port key, e.g. `80/tcp`.
    pub fn port_key(&self) -> String {
        format!("{}/{}", self.target, self.protocol)
    }

    /// Host address the published port binds to.
    pub fn host_ip_or_default(&self) -> IpAddr {
        self.host_ip.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}
