// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator command parsing for the agent console.

use std::fmt;

pub const HELP: &str = "\
Commands:
  register        register this console's responder
  deregister      deregister this console's responder
  register<N>     spawn and register N additional responders (e.g. register5)
  deregisterall   deregister and stop all spawned responders
  exit            deregister everything and quit";

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Register,
    Deregister,
    Spawn(usize),
    DeregisterAll,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// `register<N>` with a count that is not a positive integer.
    InvalidCount,
    Unknown(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCount => f.write_str("Invalid number of agents"),
            Self::Unknown(cmd) => write!(
                f,
                "Unknown command '{cmd}'. Use 'register', 'deregister', 'register<N>', \
                 'deregisterall' or 'exit'."
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one console line. Case and surrounding whitespace are ignored.
pub fn parse(line: &str) -> Result<ConsoleCommand, ParseError> {
    let cmd = line.trim().to_ascii_lowercase();
    match cmd.as_str() {
        "register" => Ok(ConsoleCommand::Register),
        "deregister" => Ok(ConsoleCommand::Deregister),
        "deregisterall" => Ok(ConsoleCommand::DeregisterAll),
        "exit" => Ok(ConsoleCommand::Exit),
        _ => match cmd.strip_prefix("register").map(|n| n.trim().parse::<i64>()) {
            Some(Ok(n)) if n > 0 => Ok(ConsoleCommand::Spawn(n as usize)),
            Some(Ok(_)) => Err(ParseError::InvalidCount),
            _ => Err(ParseError::Unknown(line.trim().to_owned())),
        },
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
