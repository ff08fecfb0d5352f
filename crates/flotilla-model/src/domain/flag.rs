use serde::{Deserialize, Serialize};

/// Boolean switch with explicit enable/disable semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flag(bool);

impl Flag {
    pub const fn enabled() -> Self {
        Self(true)
    }

    pub const fn disabled() -> Self {
        Self(false)
    }

    pub const fn is_enabled(&self) -> bool {
        self.0
    }

    pub const fn is_disabled(&self) -> bool {
        !self.0
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::enabled()
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        Self(b)
    }
}

impl From<Flag> for bool {
    fn from(f: Flag) -> Self {
        f.0
    }
}

#[cfg(test)]
mod tests {
    use super::Flag;

    #[test]
    fn default_is_enabled() {
        assert!(Flag::default().is_enabled());
    }

    #[test]
    fn converts_from_and_into_bool() {
        let off: Flag = false.into();
        assert!(off.is_disabled());
        assert!(!bool::from(off));
        assert!(bool::from(Flag::enabled()));
    }

    #[test]
    fn serializes_as_plain_bool() {
        assert_eq!(serde_json::to_string(&Flag::disabled()).unwrap(), "false");
        let back: Flag = serde_json::from_str("true").unwrap();
        assert!(back.is_enabled());
    }
}
