//! Command definitions
//!
//! Turns a decoded request array into a typed command. The first element
//! names the command (case-insensitive), the rest are its arguments.

use bytes::Bytes;
use thiserror::Error;

use super::{Value, ValueKind};

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PING [message]`
    Ping { message: Option<Bytes> },

    /// `ECHO message`
    Echo { message: Bytes },

    /// `CLIENT <subcommand> [args]`
    Client(ClientCommand),

    /// `INFO [section]`
    Info { section: Option<String> },
}

/// `CLIENT` subcommands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Id,
    GetName,
    /// An empty name clears the current one
    SetName(String),
    List,
}

/// Why a request could not be turned into a command.
///
/// The display text is the message sent back after an `ERR ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Protocol error: expected array, got {0}")]
    NotAnArray(ValueKind),

    #[error("Protocol error: empty request")]
    Empty,

    #[error("Protocol error: expected bulk string argument, got {0}")]
    InvalidArgument(ValueKind),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unknown subcommand '{sub}' for '{command}'")]
    UnknownSubcommand { command: String, sub: String },

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("Client names cannot contain spaces, newlines or special characters.")]
    InvalidClientName,
}

impl CommandError {
    /// Error reply for the client
    pub fn to_value(&self) -> Value {
        Value::error(format!("ERR {}", self))
    }
}

impl Command {
    /// Parse a request value
    pub fn from_value(request: Value) -> Result<Command, CommandError> {
        let items = match request {
            Value::Array(items) => items,
            other => return Err(CommandError::NotAnArray(other.kind())),
        };

        let mut args = items
            .into_iter()
            .map(into_argument)
            .collect::<Result<Vec<Bytes>, _>>()?
            .into_iter();

        let name = args.next().ok_or(CommandError::Empty)?;
        let raw_name = String::from_utf8_lossy(&name).into_owned();
        let name = raw_name.to_ascii_uppercase();
        let args: Vec<Bytes> = args.collect();

        match name.as_str() {
            "PING" => match args.as_slice() {
                [] => Ok(Command::Ping { message: None }),
                [message] => Ok(Command::Ping {
                    message: Some(message.clone()),
                }),
                _ => Err(CommandError::WrongArity(name.to_lowercase())),
            },
            "ECHO" => match args.as_slice() {
                [message] => Ok(Command::Echo {
                    message: message.clone(),
                }),
                _ => Err(CommandError::WrongArity(name.to_lowercase())),
            },
            "INFO" => match args.as_slice() {
                [] => Ok(Command::Info { section: None }),
                [section] => Ok(Command::Info {
                    section: Some(String::from_utf8_lossy(section).to_ascii_lowercase()),
                }),
                _ => Err(CommandError::WrongArity(name.to_lowercase())),
            },
            "CLIENT" => parse_client(&args).map(Command::Client),
            _ => Err(CommandError::UnknownCommand(raw_name)),
        }
    }

    /// Upper-case command name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping { .. } => "PING",
            Command::Echo { .. } => "ECHO",
            Command::Client(_) => "CLIENT",
            Command::Info { .. } => "INFO",
        }
    }
}

fn parse_client(args: &[Bytes]) -> Result<ClientCommand, CommandError> {
    let (sub, rest) = args
        .split_first()
        .ok_or_else(|| CommandError::WrongArity("client".to_string()))?;
    let sub = String::from_utf8_lossy(sub).to_ascii_uppercase();
    let arity = || CommandError::WrongArity(format!("client|{}", sub.to_lowercase()));

    match sub.as_str() {
        "ID" if rest.is_empty() => Ok(ClientCommand::Id),
        "GETNAME" if rest.is_empty() => Ok(ClientCommand::GetName),
        "LIST" if rest.is_empty() => Ok(ClientCommand::List),
        "SETNAME" => match rest {
            [name] => {
                // Same rule as Redis: printable ASCII without spaces.
                if name.iter().any(|b| !(b'!'..=b'~').contains(b)) {
                    return Err(CommandError::InvalidClientName);
                }
                Ok(ClientCommand::SetName(
                    String::from_utf8_lossy(name).into_owned(),
                ))
            }
            _ => Err(arity()),
        },
        "ID" | "GETNAME" | "LIST" => Err(arity()),
        _ => Err(CommandError::UnknownSubcommand {
            command: "CLIENT".to_string(),
            sub: sub.clone(),
        }),
    }
}

/// Arguments arrive as bulk strings; simple strings are accepted too
fn into_argument(value: Value) -> Result<Bytes, CommandError> {
    match value {
        Value::BulkString(Some(data)) => Ok(data),
        Value::SimpleString(text) => Ok(Bytes::from(text)),
        other => Err(CommandError::InvalidArgument(other.kind())),
    }
}
