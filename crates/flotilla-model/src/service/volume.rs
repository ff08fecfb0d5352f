use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Mount type of a volume entry.
///
/// Only [`VolumeKind::Bind`] is realized by the reconciler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeKind {
    #[default]
    Bind,
    Volume,
    Tmpfs,
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolumeKind::Bind => "bind",
            VolumeKind::Volume => "volume",
            VolumeKind::Tmpfs => "tmpfs",
        };
        f.write_str(s)
    }
}

impl FromStr for VolumeKind {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "bind" => Ok(VolumeKind::Bind),
            "volume" => Ok(VolumeKind::Volume),
            "tmpfs" => Ok(VolumeKind::Tmpfs),
            other => Err(ModelError::UnknownVolumeKind(other.to_string())),
        }
    }
}

/// Host path mounted into a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeBinding {
    #[serde(default, rename = "type")]
    pub kind: VolumeKind,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub read_only: bool,
}

impl VolumeBinding {
    /// Read-write bind mount of `source` at `target`.
    pub fn bind(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: VolumeKind::Bind,
            source: source.into(),
            target: target.into(),
            read_only: false,
        }
    }

    /// Runtime bind string `src:dst[:ro]`, or `None` for non-bind mounts.
    pub fn bind_spec(&self) -> Option<String> {
        if self.kind != VolumeKind::Bind {
            return None;
        }
        let mut bind = format!("{}:{}", self.source, self.target);
        if self.read_only {
            bind.push_str(":ro");
        }
        Some(bind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_spec_appends_ro() {
        let mut v = VolumeBinding::bind("/srv/data", "/data");
        assert_eq!(v.bind_spec().as_deref(), Some("/srv/data:/data"));

        v.read_only = true;
        assert_eq!(v.bind_spec().as_deref(), Some("/srv/data:/data:ro"));
    }

    #[test]
    fn named_volumes_are_not_realized() {
        let v = VolumeBinding {
            kind: VolumeKind::Volume,
            ..VolumeBinding::bind("pgdata", "/var/lib/postgresql/data")
        };
        assert!(v.bind_spec().is_none());
    }

    #[test]
    fn missing_type_means_bind() {
        let v: VolumeBinding = serde_json::from_str(r#"{"source":"/a","target":"/b"}"#).unwrap();
        assert_eq!(v.kind, VolumeKind::Bind);
        assert!(!v.read_only);
    }
}
