use crate::task::{Task, TaskKind};

use regex::Regex;
use std::sync::OnceLock;

/// Emitted for a network response whose source text printed nothing.
pub const RESPONSE_PLACEHOLDER: &str = "Network response";

/// A print-style call with a single quoted string literal, in any of the
/// three quote styles. Rust's regex engine has no backreferences, so each
/// style is its own alternation arm.
fn print_call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)console\.log\(\s*(?:'([^']*)'|"([^"]*)"|`([^`]*)`)\s*\)"#)
            .expect("print-call pattern is valid")
    })
}

fn is_registration_phase(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    ["(register)", "(create)", "(init)"]
        .iter()
        .any(|marker| name.contains(marker))
}

fn is_response_phase(name: &str) -> bool {
    name.to_ascii_lowercase().contains("(response)")
}

/// Synthesizes the log output lines for a retiring task by scanning its
/// source text. A textual heuristic, not an interpreter: no arithmetic, no
/// variable resolution, no multi-statement reasoning. Kept behind this one
/// seam so a real mini-interpreter could replace it without touching the
/// scheduling logic.
pub fn synthesize_outputs(task: &Task) -> Vec<String> {
    // Registration phases model the synchronous cost of the call, they
    // never print.
    if is_registration_phase(&task.display_name) {
        return Vec::new();
    }

    let is_response =
        task.kind == TaskKind::NetworkRequest && is_response_phase(&task.display_name);

    let mut outputs = Vec::new();
    if let Some(code) = task.source_text.as_deref() {
        for caps in print_call_pattern().captures_iter(code) {
            let literal = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3));
            if let Some(text) = literal {
                if !text.as_str().is_empty() {
                    outputs.push(text.as_str().to_string());
                }
            }
        }
    }

    if outputs.is_empty() && is_response {
        outputs.push(RESPONSE_PLACEHOLDER.to_string());
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Queue, Readiness};

    fn task(kind: TaskKind, name: &str, code: Option<&str>) -> Task {
        Task {
            kind,
            display_name: name.to_string(),
            queue: Queue::CallStack,
            enqueued_at: 0,
            ready_delay_ms: None,
            source_text: code.map(str::to_string),
            registration_sequence: None,
            readiness: Readiness::NotYetDue,
        }
    }

    #[test]
    fn extracts_literals_in_all_three_quote_styles() {
        let code = r#"console.log('one'); console.log("two"); console.log(`three`);"#;
        let outputs = synthesize_outputs(&task(TaskKind::Sync, "demo", Some(code)));
        assert_eq!(outputs, vec!["one", "two", "three"]);
    }

    #[test]
    fn skips_registration_phases() {
        let code = "console.log('should not appear')";
        for name in ["t (register)", "p (create)", "f (init)"] {
            let outputs = synthesize_outputs(&task(TaskKind::Timer, name, Some(code)));
            assert!(outputs.is_empty(), "{name} must not produce output");
        }
    }

    #[test]
    fn ignores_non_literal_arguments() {
        let code = "console.log(value); console.log(1 + 2); console.log('ok')";
        let outputs = synthesize_outputs(&task(TaskKind::Sync, "demo", Some(code)));
        assert_eq!(outputs, vec!["ok"]);
    }

    #[test]
    fn network_response_without_prints_gets_the_placeholder_once() {
        let outputs = synthesize_outputs(&task(
            TaskKind::NetworkRequest,
            "api (response)",
            Some("fetch('/data').then(handle)"),
        ));
        assert_eq!(outputs, vec![RESPONSE_PLACEHOLDER]);

        let outputs = synthesize_outputs(&task(TaskKind::NetworkRequest, "api (response)", None));
        assert_eq!(outputs, vec![RESPONSE_PLACEHOLDER]);
    }

    #[test]
    fn network_response_with_prints_keeps_only_the_literals() {
        let outputs = synthesize_outputs(&task(
            TaskKind::NetworkRequest,
            "api (response)",
            Some("console.log('got it')"),
        ));
        assert_eq!(outputs, vec!["got it"]);
    }

    #[test]
    fn plain_sync_task_without_prints_stays_silent() {
        let outputs = synthesize_outputs(&task(TaskKind::Sync, "demo", Some("let x = 1;")));
        assert!(outputs.is_empty());
    }
}
