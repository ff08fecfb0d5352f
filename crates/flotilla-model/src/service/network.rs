use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Engine-native network modes accepted by the runtime as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialMode {
    Host,
    Bridge,
    None,
}

impl SpecialMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialMode::Host => "host",
            SpecialMode::Bridge => "bridge",
            SpecialMode::None => "none",
        }
    }

    /// Match a raw token exactly against the special modes.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "host" => Some(SpecialMode::Host),
            "bridge" => Some(SpecialMode::Bridge),
            "none" => Some(SpecialMode::None),
            _ => None,
        }
    }
}

/// Symbolic network reference found in a service definition.
///
/// Tokens are classified by prefix:
/// - `host` / `bridge` / `none`: [`NetworkReference::Special`]
/// - `container:<id-or-name>`: [`NetworkReference::Container`]
/// - `service:<name>`: [`NetworkReference::Service`]
/// - anything else: [`NetworkReference::Named`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NetworkReference {
    Special(SpecialMode),
    Container(String),
    Service(String),
    Named(String),
}

impl NetworkReference {
    const CONTAINER_PREFIX: &'static str = "container:";
    const SERVICE_PREFIX: &'static str = "service:";

    /// Returns `true` if the runtime accepts this reference without resolution.
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            NetworkReference::Special(_) | NetworkReference::Container(_)
        )
    }
}

impl FromStr for NetworkReference {
    type Err = ModelError;
    fn from_str(token: &str) -> ModelResult<Self> {
        if token.is_empty() {
            return Err(ModelError::EmptyNetwork);
        }
        if let Some(mode) = SpecialMode::parse(token) {
            return Ok(NetworkReference::Special(mode));
        }
        if let Some(target) = token.strip_prefix(Self::CONTAINER_PREFIX) {
            return Ok(NetworkReference::Container(target.to_string()));
        }
        if let Some(service) = token.strip_prefix(Self::SERVICE_PREFIX) {
            return Ok(NetworkReference::Service(service.to_string()));
        }
        Ok(NetworkReference::Named(token.to_string()))
    }
}

impl fmt::Display for NetworkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkReference::Special(mode) => f.write_str(mode.as_str()),
            NetworkReference::Container(target) => write!(f, "container:{target}"),
            NetworkReference::Service(name) => write!(f, "service:{name}"),
            NetworkReference::Named(name) => f.write_str(name),
        }
    }
}

/// Where a service container is attached.
///
/// An explicit `network_mode` takes priority over a list of networks;
/// with neither, the runtime default bridge is used.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkPlacement {
    #[default]
    Default,
    /// Raw `network_mode` string.
    Mode(String),
    /// Named network keys in declared order.
    Networks(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_tokens() {
        assert_eq!(
            "host".parse::<NetworkReference>().unwrap(),
            NetworkReference::Special(SpecialMode::Host)
        );
        assert_eq!(
            "container:abc123".parse::<NetworkReference>().unwrap(),
            NetworkReference::Container("abc123".into())
        );
        assert_eq!(
            "service:vpn".parse::<NetworkReference>().unwrap(),
            NetworkReference::Service("vpn".into())
        );
        assert_eq!(
            "backend".parse::<NetworkReference>().unwrap(),
            NetworkReference::Named("backend".into())
        );
    }

    #[test]
    fn special_modes_are_case_sensitive() {
        assert_eq!(
            "Host".parse::<NetworkReference>().unwrap(),
            NetworkReference::Named("Host".into())
        );
    }

    #[test]
    fn display_reproduces_token() {
        for token in ["none", "bridge", "container:x", "service:db", "appnet"] {
            let parsed: NetworkReference = token.parse().unwrap();
            assert_eq!(parsed.to_string(), token);
        }
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(
            "".parse::<NetworkReference>(),
            Err(ModelError::EmptyNetwork)
        ));
    }

    #[test]
    fn passthrough_covers_special_and_container() {
        assert!(NetworkReference::Special(SpecialMode::None).is_passthrough());
        assert!(NetworkReference::Container("c".into()).is_passthrough());
        assert!(!NetworkReference::Service("s".into()).is_passthrough());
        assert!(!NetworkReference::Named("n".into()).is_passthrough());
    }
}
