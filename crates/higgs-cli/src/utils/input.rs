//! User input utilities for interactive command-line prompts.

use std::io::{self, BufRead, Read, Write};

use anyhow::{Context, Result};

/// Prompts the user for a string input, trimmed.
///
/// # Errors
///
/// Returns an error if reading from stdin fails.
pub fn prompt_string(prompt: &str) -> Result<String> {
    print!("{prompt}: ");
    io::stdout().flush().context("Failed to flush prompt")?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read user input")?;

    Ok(input.trim().to_string())
}

/// Prompts for a value that may be left empty. Empty input yields `None`.
pub fn prompt_optional(prompt: &str) -> Result<Option<String>> {
    let value = prompt_string(prompt)?;
    Ok(non_blank(value))
}

/// Use `given` if present, otherwise prompt for it.
pub fn value_or_prompt(given: Option<String>, prompt: &str) -> Result<Option<String>> {
    match given.and_then(non_blank) {
        Some(value) => Ok(Some(value)),
        None => prompt_optional(prompt),
    }
}

/// Read all of stdin as text.
pub fn read_stdin_text() -> Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read text from stdin")?;
    Ok(text)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
