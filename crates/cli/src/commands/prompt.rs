//! Interactive confirmation and input prompts.

use std::io::{BufRead, IsTerminal, Write};

use super::CommandError;

/// Ask a yes/no question; only `y` or `yes` confirms.
///
/// `skip` answers yes without asking. Without a terminal on stdin the
/// question cannot be asked, so the caller must pass `--yes`.
pub fn confirm(question: &str, skip: bool, action: &'static str) -> Result<bool, CommandError> {
    if skip {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CommandError::ConfirmationRequired(action));
    }

    let answer = ask(&format!("{question} [y/N] "))?;
    Ok(is_yes(&answer))
}

/// Use `value` if given, otherwise read it from the terminal.
///
/// Typed input is echoed, so a password or access token entered here is
/// visible on screen. Non-interactive runs must pass the value as a flag;
/// without a terminal on stdin this returns `CommandError::MissingInput`.
pub fn value_or_prompt(
    value: Option<String>,
    label: &'static str,
) -> Result<String, CommandError> {
    if let Some(value) = value {
        return Ok(value);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CommandError::MissingInput(label));
    }
    ask(&format!("{label}: "))
}

/// Print `prompt` to stderr and read one line from stdin, echoed.
fn ask(prompt: &str) -> Result<String, CommandError> {
    let mut stderr = std::io::stderr();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
