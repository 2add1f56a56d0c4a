use std::io::{BufRead, Write};

use thiserror::Error;

/// Failure of the prompt channel itself, as opposed to a user cancelling.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One entry of a pick list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: String,
}

impl PickItem {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Source of interactive answers for the recording flow.
///
/// `Ok(None)` means the user cancelled the prompt.
pub trait PromptSource {
    /// Ask the user to choose one of `items`; returns its index.
    fn pick(&mut self, title: &str, items: &[PickItem]) -> Result<Option<usize>, PromptError>;
    /// Ask for free text, pre-filled with `initial`.
    fn input(&mut self, prompt: &str, initial: &str) -> Result<Option<String>, PromptError>;
}

/// Line-oriented prompts over a reader/writer pair, normally stdin/stdout.
///
/// End of input cancels any prompt; `q` also cancels a pick list. An empty
/// answer picks the first item or accepts the pre-filled text.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<Option<String>, PromptError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R: BufRead, W: Write> PromptSource for TerminalPrompter<R, W> {
    fn pick(&mut self, title: &str, items: &[PickItem]) -> Result<Option<usize>, PromptError> {
        writeln!(self.output, "{title}")?;
        for (index, item) in items.iter().enumerate() {
            if item.description.is_empty() {
                writeln!(self.output, "  {}) {}", index + 1, item.label)?;
            } else {
                writeln!(
                    self.output,
                    "  {}) {} - {}",
                    index + 1,
                    item.label,
                    item.description
                )?;
            }
        }
        loop {
            write!(self.output, "Select [1-{}, q to cancel] (1): ", items.len())?;
            self.output.flush()?;
            let Some(answer) = self.read_line()? else {
                return Ok(None);
            };
            let answer = answer.trim();
            if answer.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            if answer.is_empty() && !items.is_empty() {
                return Ok(Some(0));
            }
            match answer.parse::<usize>() {
                Ok(choice) if (1..=items.len()).contains(&choice) => return Ok(Some(choice - 1)),
                _ => writeln!(self.output, "Please enter a number between 1 and {}.", items.len())?,
            }
        }
    }

    fn input(&mut self, prompt: &str, initial: &str) -> Result<Option<String>, PromptError> {
        if initial.is_empty() {
            write!(self.output, "{prompt}: ")?;
        } else {
            write!(self.output, "{prompt} ({initial}): ")?;
        }
        self.output.flush()?;
        let Some(answer) = self.read_line()? else {
            return Ok(None);
        };
        if answer.trim().is_empty() {
            return Ok(Some(initial.to_string()));
        }
        Ok(Some(answer))
    }
}
