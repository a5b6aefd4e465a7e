//! Prompts sent to the remediation oracle

use crate::resolution::ADDRESS_PLACEHOLDER;

/// System role for every resolution request
pub const RESOLUTION_SYSTEM_PROMPT: &str = "You are a helpful DevOps assistant and an expert in operating HashiCorp Vault.";

/// Build the user prompt asking for a step-by-step fix of `error_key`
pub fn build_resolution_prompt(error_key: &str) -> String {
    format!(
        r#"You received the following Vault error:
"{error_key}"

Give me a step-by-step resolution in this format:

STEP 1: ...
STEP 2: ...

Do not add any introduction or summary, only the STEP lines.
Whenever a command needs the Vault server address, write the literal placeholder {ADDRESS_PLACEHOLDER} instead of a concrete address."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_embed_error_key_in_prompt() {
        let prompt = build_resolution_prompt("lease expired");

        assert!(prompt.contains("\"lease expired\""));
        assert!(prompt.contains("STEP 1:"));
    }

    #[test]
    fn should_ask_for_address_placeholder() {
        let prompt = build_resolution_prompt("vault is sealed");

        assert!(prompt.contains("<ADDR>"));
    }
}
