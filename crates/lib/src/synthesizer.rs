//! # SQL Synthesis
//!
//! Turns a natural language question into a [`SqlOutcome`]: a shortcut
//! lookup for well-known question shapes, prompt assembly for the model,
//! and cleanup rules for whatever the model returns.

use crate::{errors::AgentError, prompts, types::SqlOutcome};
use regex::Regex;

/// Returns the pre-verified statement when the question is a "highest CPC"
/// variant, bypassing the model entirely.
///
/// Matching is case-insensitive: the question must mention "cpc" together
/// with one of "highest", "max", or "top".
pub fn cpc_shortcut(question: &str) -> Option<&'static str> {
    let q = question.to_lowercase();
    let is_highest_cpc =
        q.contains("cpc") && (q.contains("highest") || q.contains("max") || q.contains("top"));
    is_highest_cpc.then_some(prompts::HIGHEST_CPC_SQL)
}

/// Assembles the system prompt for the SQL generation stage.
pub fn build_sql_system_prompt() -> String {
    prompts::SQL_SYSTEM_PROMPT.replace("{sentinel}", prompts::NO_QUERY_SENTINEL)
}

/// Assembles the user prompt for the SQL generation stage.
pub fn build_sql_user_prompt(question: &str, schema: &str) -> String {
    prompts::SQL_USER_PROMPT
        .replace("{schema}", schema)
        .replace("{question}", question)
        .replace("{sentinel}", prompts::NO_QUERY_SENTINEL)
}

/// Cleans a raw model response into a [`SqlOutcome`].
///
/// The response is unwrapped from markdown code fences, checked against the
/// no-query sentinel, truncated at the first `;` so trailing statements or
/// commentary are dropped, and finally gated to read-only `SELECT`/`WITH`
/// statements.
///
/// The truncation is textual: a `;` inside a string literal also cuts the
/// statement short. A statement truncated that way fails loudly at
/// execution instead of running whatever followed the terminator.
pub fn extract_sql(raw_response: &str) -> Result<SqlOutcome, AgentError> {
    // Regex to extract a query from markdown code blocks.
    let re = Regex::new(r"```(?:sql|query)?\n?([\s\S]*?)```")?;
    let cleaned = re
        .captures(raw_response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| raw_response.trim().to_string());

    if cleaned.eq_ignore_ascii_case(prompts::NO_QUERY_SENTINEL) {
        return Ok(SqlOutcome::NoQueryNeeded);
    }

    let statement = match cleaned.find(';') {
        Some(pos) => &cleaned[..=pos],
        None => cleaned.as_str(),
    };
    let statement = statement.trim();

    let upper = statement.to_uppercase();
    if upper.starts_with("SELECT") || upper.starts_with("WITH") {
        Ok(SqlOutcome::Statement(statement.to_string()))
    } else {
        Ok(SqlOutcome::Unparseable)
    }
}
