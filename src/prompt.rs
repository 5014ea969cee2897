//! Interactive questions asked during add/delete

use crate::error::{KcmError, Result};
use inquire::{Confirm, InquireError, Text};
use std::io::{self, BufRead, IsTerminal, Write};

/// Source of answers to interactive questions
pub trait Prompter {
    /// Ask a free-form question and return the raw answer
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Ask a yes/no question; an empty answer picks `default`
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let answer = self.ask(&format!("{} {}", prompt, hint))?;
        Ok(parse_yes_no(&answer, default))
    }
}

/// Anything that is not clearly a yes or a no counts as `default`
pub fn parse_yes_no(answer: &str, default: bool) -> bool {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    }
}

/// Prompts on the terminal with inquire, or reads plain lines from stdin
/// when it is not a TTY
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }

    fn read_line(&self, prompt: &str) -> Result<String> {
        print!("{} ", prompt);
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(KcmError::Cancelled);
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

fn handle_inquire_error(e: InquireError) -> KcmError {
    match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => KcmError::Cancelled,
        InquireError::IO(err) => KcmError::Io(err),
        other => KcmError::Other(other.to_string()),
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        if !self.interactive {
            return self.read_line(prompt);
        }
        Text::new(prompt).prompt().map_err(handle_inquire_error)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        if !self.interactive {
            let hint = if default { "[Y/n]" } else { "[y/N]" };
            let answer = self.read_line(&format!("{} {}", prompt, hint))?;
            return Ok(parse_yes_no(&answer, default));
        }
        Confirm::new(prompt)
            .with_default(default)
            .prompt()
            .map_err(handle_inquire_error)
    }
}

/// Canned answers for driving operations in tests
#[cfg(test)]
pub struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            asked: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers.pop_front().ok_or(KcmError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes_no() {
        assert!(parse_yes_no("y", false));
        assert!(parse_yes_no(" YES ", false));
        assert!(!parse_yes_no("n", true));
        assert!(!parse_yes_no("No", true));
        assert!(parse_yes_no("", true));
        assert!(!parse_yes_no("", false));
        assert!(!parse_yes_no("maybe", false));
    }

    #[test]
    fn test_scripted_confirm_uses_default_hint() {
        let mut p = ScriptedPrompter::new(&["", "n"]);
        assert!(p.confirm("Proceed?", true).unwrap());
        assert!(!p.confirm("Really?", true).unwrap());
        assert_eq!(p.asked, vec!["Proceed? [Y/n]", "Really? [Y/n]"]);
    }

    #[test]
    fn test_scripted_runs_out() {
        let mut p = ScriptedPrompter::new(&[]);
        assert!(matches!(p.ask("Name?"), Err(KcmError::Cancelled)));
    }
}
