use crate::classifier::{self, SERVER_SUMMARY_CHARS};

/// Handle a `generate_commit_message` tool call.
///
/// Argument validation is informal: a missing or non-string `diff`
/// defaults to the empty string rather than failing the call.
pub fn handle(arguments: Option<&serde_json::Value>) -> Result<String, String> {
    let diff = arguments
        .and_then(|args| args.get("diff"))
        .and_then(|d| d.as_str())
        .unwrap_or("");

    Ok(classifier::commit_message(diff, SERVER_SUMMARY_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_from_diff_argument() {
        let args = serde_json::json!({"diff": "Implement new login flow"});
        assert_eq!(
            handle(Some(&args)).unwrap(),
            "feat: Implement new login flow"
        );
    }

    #[test]
    fn missing_diff_defaults_to_empty() {
        assert_eq!(handle(None).unwrap(), "chore: ");
        let args = serde_json::json!({});
        assert_eq!(handle(Some(&args)).unwrap(), "chore: ");
    }

    #[test]
    fn long_diff_truncated_to_100_chars() {
        let diff = "add ".to_string() + &"x".repeat(200);
        let msg = handle(Some(&serde_json::json!({"diff": diff}))).unwrap();
        let summary = msg.strip_prefix("feat: ").unwrap();
        assert_eq!(summary.chars().count(), 100);
    }
}
