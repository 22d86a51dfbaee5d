//! Prompts for VLM-based invoice extraction.
//!
//! Both instructions are fixed; the only variable part of the request text
//! is the schema, which is appended verbatim so the model sees exactly the
//! field names the downstream consumers expect.

/// System instruction sent ahead of the schema.
pub const SYSTEM_PROMPT: &str = "You are an AI specialized in understanding invoice documents. \
Return ONLY a valid JSON object that exactly matches the schema below. \
Do not include explanations, markdown, or extra text. \
If a value is missing, return null or empty string. \
STRICTLY FOLLOW THE SCHEMA.";

/// User instruction sent between the system instruction and the schema.
pub const USER_PROMPT: &str = "Analyze the invoice image(s) and return JSON using this schema.";

/// Build the single text part of the vision request.
pub fn extraction_prompt(schema: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\n{USER_PROMPT}\n\n{schema}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_schema_verbatim() {
        let schema = "{\n  \"vendor\": \"string\"\n}";
        let prompt = extraction_prompt(schema);
        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.ends_with(schema));
        assert!(prompt.contains(USER_PROMPT));
    }
}
