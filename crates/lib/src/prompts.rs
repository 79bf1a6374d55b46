//! # Prompt Templates
//!
//! This module contains the prompt templates and fixed statements used by
//! the `AgentClient`. Placeholders are substituted at call time.

// --- SQL Generation Prompts ---

/// The sentinel the model must return when a question needs no data access.
pub const NO_QUERY_SENTINEL: &str = "NO_QUERY_NEEDED";

/// The pre-verified statement for "highest CPC" questions.
///
/// CPC questions are common and easy to get wrong (division by zero on
/// zero-click rows), so they bypass the model entirely.
pub const HIGHEST_CPC_SQL: &str = "SELECT item_id, CAST(ad_spend AS REAL) / clicks AS cpc FROM ad_sales WHERE clicks > 0 ORDER BY cpc DESC LIMIT 1;";

/// The system prompt for the SQL generation stage.
///
/// Placeholders: `{sentinel}`
pub const SQL_SYSTEM_PROMPT: &str = "You are a SQLite expert for an e-commerce sales database. Write a single, executable, readonly SQL query that answers the user's question. If the question is conversational and cannot be answered from the data, respond with exactly {sentinel} and nothing else.";

/// The user prompt for the SQL generation stage.
///
/// Placeholders: `{schema}`, `{question}`, `{sentinel}`
pub const SQL_USER_PROMPT: &str = r#"Pay close attention to derived metrics.

# Query Construction Rules
1. CPC (Cost Per Click) is calculated as `ad_spend / clicks`.
2. RoAS (Return on Ad Spend) is calculated as `ad_sales / ad_spend`.
3. When a calculation divides by `clicks`, you MUST exclude rows where `clicks` is 0 (e.g., `WHERE clicks > 0`).
4. Return only the SQL query, with no explanations and no markdown formatting.
5. If the question cannot be answered with a query, return exactly {sentinel}.

# Schema
{schema}

# Question
{question}

SQL Query:"#;

// --- Narration Prompts ---

/// The system prompt for narrating a query result.
pub const NARRATION_SYSTEM_PROMPT: &str = "You are a helpful e-commerce data assistant. Answer using only the provided database result. Be concise and human-readable. If the result is empty, say that you couldn't find any data for the question. Never invent values that are not in the result.";

/// The user prompt for narrating a query result.
///
/// Placeholders: `{question}`, `{result}`
pub const NARRATION_USER_PROMPT: &str = r#"The user asked: '{question}'

The database result is:
{result}

Provide a concise, human-readable answer to the question."#;

// --- Conversational Fallback Prompts ---

/// The system prompt for questions that need no data access.
pub const GENERAL_SYSTEM_PROMPT: &str = "You are a friendly assistant for an e-commerce analytics service. Answer conversationally and concisely. When it fits, remind the user that they can ask questions about their ad sales, total sales, and product eligibility data.";

/// The user prompt for questions that need no data access.
///
/// Placeholders: `{question}`
pub const GENERAL_USER_PROMPT: &str = "{question}";
