use serde::{Deserialize, Serialize};

/// One call from the game: `{"command": ":NEW:SOLDIER:", "args": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Command tag, always non-empty, e.g. `":KILL:"`.
    pub command: String,
    /// Positional arguments exactly as the game sent them.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Event {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Convenience for tests and replay tools.
    pub fn from_strs(command: impl Into<String>, args: &[&str]) -> Self {
        Self::new(command, args.iter().map(|a| a.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_replay_line() {
        let ev: Event =
            serde_json::from_str(r#"{"command":":FPS:","args":["1","50","30"]}"#).unwrap();
        assert_eq!(ev, Event::from_strs(":FPS:", &["1", "50", "30"]));
    }

    #[test]
    fn args_default_to_empty() {
        let ev: Event = serde_json::from_str(r#"{"command":":VERSION:"}"#).unwrap();
        assert!(ev.args.is_empty());
    }
}
