//! Small option types shared by a handful of key/value commands.
use crate::error::Error;
use bytes::Bytes;
use std::convert::TryFrom;

/// Whether a write is allowed to create a new key, overwrite an existing
/// one, or either.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Override {
    /// Allow both creating and overwriting
    Yes,
    /// Only create a new key (`NX`)
    No,
    /// Only overwrite an existing key (`XX`)
    Only,
}

impl Default for Override {
    fn default() -> Self {
        Self::Yes
    }
}

impl TryFrom<&[Bytes]> for Override {
    type Error = Error;

    fn try_from(args: &[Bytes]) -> Result<Self, Self::Error> {
        match args {
            [] => Ok(Override::Yes),
            [opt] => match String::from_utf8_lossy(opt).to_uppercase().as_str() {
                "NX" => Ok(Override::No),
                "XX" => Ok(Override::Only),
                _ => Err(Error::Syntax),
            },
            _ => Err(Error::Syntax),
        }
    }
}
