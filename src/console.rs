//! Console command parsing for the `topoview` binary.
//!
//! One command per line:
//!
//! | Input | Meaning |
//! |-------|---------|
//! | `R` / `W` / `E` | Press a bound key |
//! | `pan dx dy [mods]` | Drag the view |
//! | `zoom factor [x y] [mods]` | Zoom about `(x, y)` (default origin) |
//! | `wheel dy [x y] [mods]` | Wheel zoom about `(x, y)` |
//! | `status` | Log view and channel state |
//! | `help` | Log the key bindings |
//!
//! Modifiers are `alt`, `meta`, `ctrl`, `shift`, separately or joined with `+`.

#[cfg(test)]
#[path = "console_test.rs"]
mod console_test;

use canvas::input::{Gesture, Modifiers, WheelDelta};
use canvas::transform::Point;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("{command}: missing {argument}")]
    MissingArgument { command: &'static str, argument: &'static str },
    #[error("{argument}: '{value}' is not a number")]
    InvalidNumber { argument: &'static str, value: String },
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Key(String),
    Gesture(Gesture),
    Status,
    Help,
}

impl Command {
    /// Parse one console line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the line is not a valid command.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(None);
        }
        let name = tokens.remove(0);
        let command = match name.to_ascii_lowercase().as_str() {
            "status" if tokens.is_empty() => Self::Status,
            "help" if tokens.is_empty() => Self::Help,
            "pan" => {
                let mut args = Args::new("pan", &tokens);
                let dx = args.number("dx")?;
                let dy = args.number("dy")?;
                Self::Gesture(Gesture::pan(dx, dy, args.modifiers()?))
            }
            "zoom" => {
                let mut args = Args::new("zoom", &tokens);
                let factor = args.number("factor")?;
                let anchor = args.anchor()?;
                Self::Gesture(Gesture::zoom(factor, anchor, args.modifiers()?))
            }
            "wheel" => {
                let mut args = Args::new("wheel", &tokens);
                let dy = args.number("dy")?;
                let anchor = args.anchor()?;
                Self::Gesture(Gesture::wheel(WheelDelta { dx: 0.0, dy }, anchor, args.modifiers()?))
            }
            _ if tokens.is_empty() && name.chars().count() == 1 => Self::Key(name.to_ascii_uppercase()),
            _ => return Err(CommandError::UnknownCommand(line.trim().to_owned())),
        };
        Ok(Some(command))
    }
}

struct Args<'a> {
    command: &'static str,
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Args<'a> {
    fn new(command: &'static str, tokens: &'a [&'a str]) -> Self {
        Self { command, tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn number(&mut self, argument: &'static str) -> Result<f64, CommandError> {
        let raw = self.peek().ok_or(CommandError::MissingArgument { command: self.command, argument })?;
        let value =
            raw.parse::<f64>().map_err(|_| CommandError::InvalidNumber { argument, value: raw.to_owned() })?;
        self.pos += 1;
        Ok(value)
    }

    /// Optional `x y` pair; absent when the next token is not numeric.
    fn anchor(&mut self) -> Result<Point, CommandError> {
        match self.peek() {
            Some(raw) if raw.parse::<f64>().is_ok() => {
                let x = self.number("x")?;
                let y = self.number("y")?;
                Ok(Point::new(x, y))
            }
            _ => Ok(Point::new(0.0, 0.0)),
        }
    }

    /// Every remaining token is a modifier.
    fn modifiers(&mut self) -> Result<Modifiers, CommandError> {
        let mut mods = Modifiers::NONE;
        for token in &self.tokens[self.pos..] {
            for name in token.split('+').filter(|s| !s.is_empty()) {
                match name.to_ascii_lowercase().as_str() {
                    "alt" | "option" => mods.alt = true,
                    "meta" | "cmd" => mods.meta = true,
                    "ctrl" => mods.ctrl = true,
                    "shift" => mods.shift = true,
                    _ => return Err(CommandError::UnknownModifier(name.to_owned())),
                }
            }
        }
        self.pos = self.tokens.len();
        Ok(mods)
    }
}
