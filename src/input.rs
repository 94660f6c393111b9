use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Source of operator input for the interactive steps of the flow.
pub trait InputProvider {
    /// Shows `prompt` and returns the next line without its trailing newline.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

#[derive(Debug, Default)]
pub struct StdinInput;

impl InputProvider for StdinInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed before input was given",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Replays a fixed list of answers, one per prompt.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> ScriptedInput
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedInput {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Prompts that have been shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl InputProvider for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.lines.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "scripted input exhausted")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_input_replays_lines_in_order() {
        let mut input = ScriptedInput::new(["first", "second"]);

        assert_eq!(input.read_line("a: ").unwrap(), "first");
        assert_eq!(input.read_line("b: ").unwrap(), "second");
        assert_eq!(input.prompts(), ["a: ", "b: "]);
    }

    #[test]
    fn scripted_input_reports_eof_when_exhausted() {
        let mut input = ScriptedInput::new(Vec::<String>::new());

        let err = input.read_line("anything: ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
