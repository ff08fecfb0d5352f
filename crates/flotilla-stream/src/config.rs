use serde::{Deserialize, Serialize};

/// Settings shared by log and shell sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Trailing log lines replayed before following (`all` for everything).
    pub log_tail: String,
    /// Command started for interactive shells.
    pub shell_command: Vec<String>,
    /// Largest chunk read from exec output per message.
    pub read_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_tail: "200".to_string(),
            shell_command: vec!["/bin/sh".to_string()],
            read_buffer: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.log_tail, "200");
        assert_eq!(cfg.shell_command, vec!["/bin/sh"]);
        assert_eq!(cfg.read_buffer, 4096);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{"shell_command": ["/bin/bash", "-l"]}"#).unwrap();

        assert_eq!(cfg.shell_command, vec!["/bin/bash", "-l"]);
        assert_eq!(cfg.log_tail, "200");
        assert_eq!(cfg.read_buffer, 4096);
    }
}
