//! Standard streams as seen by scripts.
//!
//! `scribe`, `initus` and `purgo` talk to a [`Console`]. In [`Console::stdio`]
//! mode they reach the real terminal (clearing goes through crossterm); a
//! [`Console::captured`] console records output and serves queued input
//! lines instead, which is what embedders and tests use.

use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Stdio,
    Captured,
}

#[derive(Debug, Clone)]
pub struct Console {
    mode: Mode,
    /// Everything printed since the last clear (captured mode only).
    output: String,
    input: VecDeque<String>,
}

impl Console {
    pub fn stdio() -> Self {
        Console {
            mode: Mode::Stdio,
            output: String::new(),
            input: VecDeque::new(),
        }
    }

    pub fn captured() -> Self {
        Console {
            mode: Mode::Captured,
            ..Console::stdio()
        }
    }

    /// Queues lines for `initus` to return, in order.
    pub fn with_input<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Print a line
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        match self.mode {
            Mode::Stdio => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", text)?;
                stdout.flush()
            }
            Mode::Captured => {
                self.output.push_str(text);
                self.output.push('\n');
                Ok(())
            }
        }
    }

    /// Reads one line without its terminator. End of input reads as an
    /// empty line.
    pub fn read_line(&mut self) -> io::Result<String> {
        if let Some(line) = self.input.pop_front() {
            return Ok(line);
        }
        match self.mode {
            Mode::Stdio => {
                let mut line = String::new();
                io::stdin().lock().read_line(&mut line)?;
                Ok(line.trim_end_matches(['\n', '\r']).to_string())
            }
            Mode::Captured => Ok(String::new()),
        }
    }

    pub fn clear(&mut self) -> io::Result<()> {
        match self.mode {
            Mode::Stdio => execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)),
            Mode::Captured => {
                self.output.clear();
                Ok(())
            }
        }
    }

    /// Get all lines as a vector of strings
    pub fn get_output(&self) -> Vec<String> {
        self.output.lines().map(str::to_string).collect()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdio()
    }
}
