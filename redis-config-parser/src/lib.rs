//! # Redis-style config file tokenizer and serde deserializer
//!
//! The on-disk format is line oriented: `#` starts a comment, blank lines are
//! skipped, and every other line is `key value...` with the value continuing
//! to the end of the line. Keys are matched case-insensitively.
pub mod de;

use thiserror::Error;

/// Errors produced while tokenizing or deserializing a config file.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid config line: {0}")]
    InvalidLine(String),
    #[error("{0}")]
    Message(String),
}

impl serde::de::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

/// A single `key value` directive, key lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub key: String,
    pub value: String,
}

/// Splits a config file into directives, skipping comments and blank lines.
pub fn parse(bytes: &[u8]) -> Result<Vec<Directive>, Error> {
    let content = String::from_utf8_lossy(bytes);
    let mut directives = vec![];

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.splitn(2, char::is_whitespace);
        let key = parts
            .next()
            .ok_or_else(|| Error::InvalidLine(line.to_owned()))?;
        let value = parts.next().unwrap_or("").trim();

        directives.push(Directive {
            key: key.to_lowercase(),
            value: value.to_owned(),
        });
    }

    Ok(directives)
}
