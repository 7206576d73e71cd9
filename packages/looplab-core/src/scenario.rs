use crate::task::TaskKind;

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One task-creation request, as composed by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub kind: TaskKind,
    pub name: String,
    /// Free-form source text. Scanned for print literals, never executed.
    #[serde(default)]
    pub code: Option<String>,
    /// Timer delay in ms. Coerced, never rejected: any number is clamped to
    /// a non-negative integer, anything else falls back to the default.
    #[serde(default, deserialize_with = "coerce_delay")]
    pub delay: Option<u64>,
}

impl EventConfig {
    pub fn new(kind: TaskKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            code: None,
            delay: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }
}

/// An ordered list of load requests, the on-disk input of the simulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub events: Vec<EventConfig>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn coerce_delay<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let ms = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(ms.filter(|ms| ms.is_finite()).map(|ms| ms.max(0.0) as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_scenario() {
        let scenario = Scenario::from_json(
            r#"{"events": [
                {"kind": "sync", "name": "boot", "code": "console.log('up')"},
                {"kind": "timer", "name": "t1", "delay": 250},
                {"kind": "promise", "name": "p1"},
                {"kind": "networkRequest", "name": "api"}
            ]}"#,
        )
        .expect("scenario parses");
        assert_eq!(scenario.events.len(), 4);
        assert_eq!(scenario.events[1].kind, TaskKind::Timer);
        assert_eq!(scenario.events[1].delay, Some(250));
    }

    #[test]
    fn delay_coercion_is_total() {
        let parse = |delay: &str| {
            let json = format!(r#"{{"kind": "timer", "name": "t", "delay": {delay}}}"#);
            serde_json::from_str::<EventConfig>(&json)
                .expect("never rejected")
                .delay
        };
        assert_eq!(parse("120.9"), Some(120));
        assert_eq!(parse("-50"), Some(0));
        assert_eq!(parse(r#""300""#), Some(300));
        assert_eq!(parse(r#""soon""#), None);
        assert_eq!(parse("true"), None);
        assert_eq!(parse("null"), None);
    }
}
