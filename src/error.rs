//! # Redis Error
//!
//! All redis errors are abstracted in this mod.
use crate::value::Value;

/// Redis errors
#[derive(Debug)]
pub enum Error {
    /// A command is not found
    CommandNotFound(String),
    /// Invalid number of arguments
    InvalidArgsCount(String),
    /// The glob-pattern is not valid
    InvalidPattern(String),
    /// Protocol error
    Protocol(String, String),
    /// Unexpected argument
    WrongArgument(String, String),
    /// Index out of range
    OutOfRange,
    /// Attempting to move or copy to the same key
    SameEntry,
    /// Syntax error
    Syntax,
    /// Byte cannot be converted to an integer
    NotANumber,
    /// Byte cannot be converted to a float
    NotAFloat,
    /// The connection is not in a transaction
    NotInTx,
    /// The requested database does not exist
    NotSuchDatabase,
    /// RENAME/RENAMENX was given a source key that does not exist
    NoSuchKey,
    /// The connection is in a transaction and nested transactions are not supported
    NestedTx,
    /// Wrong data type
    WrongType,
    /// A command queued inside MULTI cannot be used inside a transaction
    NotQueueable(String),
    /// EXEC was called after a command failed validation while queuing
    ExecAbort,
    /// DISCARD was called outside of MULTI
    DiscardWithoutMulti,
    /// The connection asked to close (QUIT)
    Quit,
    /// Nothing to do, no reply should be written
    EmptyLine,
    /// Underlying I/O failure
    Io(String),
    /// Malformed configuration file
    Config(String),
}

impl From<Error> for Value {
    fn from(value: Error) -> Value {
        let err_type = match value {
            Error::WrongType => "WRONGTYPE",
            Error::NestedTx => "ERR MULTI",
            Error::NotInTx => "ERR EXEC",
            Error::DiscardWithoutMulti => "ERR DISCARD",
            Error::ExecAbort => "EXECABORT",
            _ => "ERR",
        };

        let err_msg = match value {
            Error::CommandNotFound(x) => format!("unknown command '{}'", x),
            Error::InvalidArgsCount(x) => {
                format!("wrong number of arguments for '{}' command", x)
            }
            Error::InvalidPattern(x) => format!("'{}' is not a valid pattern", x),
            Error::Protocol(x, y) => format!("Protocol error: expected '{}', got '{}'", x, y),
            Error::NotInTx => " without MULTI".to_owned(),
            Error::SameEntry => "source and destination objects are the same".to_owned(),
            Error::NotANumber => "value is not an integer or out of range".to_owned(),
            Error::NotAFloat => "value is not a valid float".to_owned(),
            Error::OutOfRange => "index out of range".to_owned(),
            Error::Syntax => "syntax error".to_owned(),
            Error::NotSuchDatabase => "DB index is out of range".to_owned(),
            Error::NoSuchKey => "no such key".to_owned(),
            Error::NestedTx => "calls can not be nested".to_owned(),
            Error::WrongArgument(x, y) => {
                format!(
                    "Unknown subcommand or wrong number of arguments for '{}'. Try {} HELP.",
                    y, x
                )
            }
            Error::NotQueueable(x) => format!("command '{}' cannot be used in MULTI", x),
            Error::ExecAbort => {
                "Transaction discarded because of previous errors.".to_owned()
            }
            Error::DiscardWithoutMulti => "DISCARD without MULTI".to_owned(),
            Error::WrongType => {
                "Operation against a key holding the wrong kind of value".to_owned()
            }
            Error::Quit | Error::EmptyLine => String::new(),
            Error::Io(x) => x,
            Error::Config(x) => x,
        };

        Value::Err(err_type.to_string(), err_msg)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e.to_string())
    }
}

impl From<redis_config_parser::Error> for Error {
    fn from(e: redis_config_parser::Error) -> Error {
        Error::Config(e.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        format!("{:?}", self) == format!("{:?}", other)
    }
}

impl Eq for Error {}
