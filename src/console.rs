//! Interactive line console over the engine contract.
//!
//! Each input line is either a command word or a log submission in the form
//! `LEVEL|SOURCE|MESSAGE`. Query commands print the engine's JSON payload
//! verbatim.

use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::EngineApi;

const DEFAULT_LEVEL: &str = "INFO";
const DEFAULT_SOURCE: &str = "cli";

const HELP: &str = "\
Commands:
  LEVEL|SOURCE|MESSAGE  -> enqueue log (empty LEVEL is INFO, empty SOURCE is cli)
  process [N]           -> process up to N pending entries (all when omitted)
  pending               -> show pending queue
  metrics               -> show metrics
  health                -> show health
  error                 -> show last error
  help                  -> show this help
  quit                  -> shutdown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Enqueue {
        level: String,
        source: String,
        message: String,
    },
    Process(usize),
    Pending,
    Metrics,
    Health,
    LastError,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Invalid input. Expected LEVEL|SOURCE|MESSAGE")]
    MissingMessage,
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(String),
}

/// Parse one input line into a command.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let input = line.trim();

    let mut words = input.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (None, _, _) => return Ok(ConsoleCommand::Empty),
        (Some("quit" | "exit"), None, _) => return Ok(ConsoleCommand::Quit),
        (Some("pending"), None, _) => return Ok(ConsoleCommand::Pending),
        (Some("metrics"), None, _) => return Ok(ConsoleCommand::Metrics),
        (Some("health"), None, _) => return Ok(ConsoleCommand::Health),
        (Some("error"), None, _) => return Ok(ConsoleCommand::LastError),
        (Some("help"), None, _) => return Ok(ConsoleCommand::Help),
        (Some("process"), None, _) => return Ok(ConsoleCommand::Process(0)),
        (Some("process"), Some(count), None) => {
            return count
                .parse()
                .map(ConsoleCommand::Process)
                .map_err(|_| ConsoleError::InvalidBatchSize(count.to_string()));
        }
        _ => {}
    }

    // The message keeps any further separators
    let mut parts = input.splitn(3, '|');
    let (Some(level), Some(source), Some(message)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ConsoleError::MissingMessage);
    };

    let message = message.trim();
    if message.is_empty() {
        return Err(ConsoleError::MissingMessage);
    }

    Ok(ConsoleCommand::Enqueue {
        level: or_default(level, DEFAULT_LEVEL),
        source: or_default(source, DEFAULT_SOURCE),
        message: message.to_string(),
    })
}

fn or_default(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.to_string(),
        trimmed => trimmed.to_string(),
    }
}

pub struct Console {
    api: EngineApi,
}

impl Console {
    pub fn new(api: EngineApi) -> Self {
        Self { api }
    }

    /// Read commands until `quit` or end of input.
    ///
    /// Payloads go to `out`; rejected input and failed submissions go to
    /// `err`. Only I/O failures end the loop early.
    pub fn run<R, W, E>(&self, input: R, out: &mut W, err: &mut E) -> io::Result<()>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        writeln!(out, "Log Engine console started.")?;
        writeln!(out, "{HELP}\n")?;
        info!("Console session started");

        for line in input.lines() {
            let line = line?;
            let command = match parse_line(&line) {
                Ok(command) => command,
                Err(parse_err) => {
                    writeln!(err, "{parse_err}")?;
                    continue;
                }
            };

            if command == ConsoleCommand::Quit {
                break;
            }
            self.execute(command, out, err)?;
        }

        info!("Console session ended");
        Ok(())
    }

    fn execute<W: Write, E: Write>(
        &self,
        command: ConsoleCommand,
        out: &mut W,
        err: &mut E,
    ) -> io::Result<()> {
        debug!(?command, "Console command");

        match command {
            ConsoleCommand::Enqueue {
                level,
                source,
                message,
            } => {
                if !self.api.add_log(&level, &message, &source) {
                    writeln!(err, "enqueue failed: {}", self.api.last_error())?;
                }
            }
            ConsoleCommand::Process(max_items) => {
                writeln!(out, "{}", self.api.process_queue(max_items))?
            }
            ConsoleCommand::Pending => writeln!(out, "{}", self.api.get_pending_logs())?,
            ConsoleCommand::Metrics => writeln!(out, "{}", self.api.get_metrics())?,
            ConsoleCommand::Health => writeln!(out, "{}", self.api.health())?,
            ConsoleCommand::LastError => writeln!(out, "{}", self.api.last_error())?,
            ConsoleCommand::Help => writeln!(out, "{HELP}")?,
            ConsoleCommand::Quit | ConsoleCommand::Empty => {}
        }

        Ok(())
    }
}
