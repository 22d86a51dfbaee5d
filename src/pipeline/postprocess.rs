//! Post-processing of the model's reply before JSON parsing.
//!
//! Even when told to return bare JSON, models regularly wrap the object in
//! a ```` ```json ```` fence. The fence lines are dropped; everything between
//! them is kept byte-for-byte.

/// Remove an outer markdown code fence, if present.
///
/// The text is trimmed first. When it starts with ```` ``` ````, the first
/// line is dropped, and the last line is dropped too if it is a fence.
pub fn strip_code_fences(input: &str) -> String {
    let text = input.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.lines().collect();
    if lines.first().is_some_and(|l| l.starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.starts_with("```")) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence_with_surrounding_whitespace() {
        let input = "\n  ```\n{\"a\": 1}\n```  \n";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        let input = "```json\n{\"a\": 1}";
        assert_eq!(strip_code_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn inner_fences_survive() {
        let input = "```\n{\"note\": \"```x```\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"note\": \"```x```\"}");
    }

    #[test]
    fn lone_fence_becomes_empty() {
        assert_eq!(strip_code_fences("```"), "");
    }
}
