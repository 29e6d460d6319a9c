use anyhow::{Context, Result};
use std::fmt::Display;
use std::io::{self, BufRead, Write};

/// Line-oriented console prompts over any reader/writer pair.
///
/// Prompts go to `output`; answers are read a line at a time from `input`.
/// Running out of input is an error so a closed stdin never loops forever.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line.
    pub fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()?;
        Ok(())
    }

    /// Print `prompt` (no newline) and return the trimmed answer.
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read from console")?;
        anyhow::ensure!(read > 0, "Console input closed");
        Ok(line.trim().to_string())
    }

    /// Yes/no question defaulting to "no". `?` prints `help` and asks again;
    /// anything else unrecognized is rejected and asked again.
    pub fn confirm(&mut self, prompt: &str, help: &str) -> Result<bool> {
        loop {
            let answer = self.ask(prompt)?.to_lowercase();
            match answer.as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                "?" => self.say(format!("\n{help}\n"))?,
                _ => self.say("Invalid input")?,
            }
        }
    }

    /// Strict yes/no: only `y`/`yes` count as yes.
    pub fn agree(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(prompt)?.to_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    /// Print an enumerated list as `  i: item`.
    pub fn list<T: Display>(&mut self, items: &[T]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            writeln!(self.output, "  {i}: {item}")?;
        }
        self.output.flush()?;
        Ok(())
    }

    /// Ask for an index into `items` until a valid one is entered.
    pub fn choose<T: Display>(&mut self, prompt: &str, items: &[T]) -> Result<usize> {
        anyhow::ensure!(!items.is_empty(), "Nothing to choose from");
        loop {
            self.list(items)?;
            match self.ask(prompt)?.parse::<usize>() {
                Ok(i) if i < items.len() => return Ok(i),
                _ => self.say("Invalid selection")?,
            }
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
pub(crate) fn scripted(answers: &str) -> Prompter<io::Cursor<Vec<u8>>, Vec<u8>> {
    Prompter::new(io::Cursor::new(answers.as_bytes().to_vec()), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_trims() {
        let mut p = scripted("  es \n");
        assert_eq!(p.ask("> ").unwrap(), "es");
        assert_eq!(String::from_utf8(p.into_output()).unwrap(), "> ");
    }

    #[test]
    fn test_closed_input_is_error() {
        let mut p = scripted("");
        assert!(p.ask("> ").is_err());
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let mut p = scripted("\n");
        assert!(!p.confirm("? ", "help").unwrap());
    }

    #[test]
    fn test_confirm_help_then_yes() {
        let mut p = scripted("maybe\n?\nY\n");
        assert!(p.confirm("q ", "some help").unwrap());
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches("q ").count(), 3);
        assert_eq!(out.matches("Invalid input").count(), 1);
        assert!(out.contains("some help"));
    }

    #[test]
    fn test_agree_is_strict() {
        assert!(scripted("yes\n").agree("").unwrap());
        assert!(!scripted("\n").agree("").unwrap());
        assert!(!scripted("sure\n").agree("").unwrap());
    }

    #[test]
    fn test_choose_reprompts() {
        let mut p = scripted("5\nabc\n1\n");
        let idx = p.choose("pick: ", &["Alice", "User 1"]).unwrap();
        assert_eq!(idx, 1);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches("Invalid selection").count(), 2);
        assert!(out.contains("  0: Alice\n  1: User 1\n"));
    }
}
