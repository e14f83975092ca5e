//! # Value Type mod
//!
use strum_macros::{Display, EnumString};

/// Value Type
#[derive(EnumString, Display, Debug, PartialEq, Copy, Clone)]
pub enum ValueTyp {
    /// Set
    #[strum(ascii_case_insensitive)]
    Set,
    /// Hash
    #[strum(ascii_case_insensitive)]
    Hash,
    /// List
    #[strum(ascii_case_insensitive)]
    List,
    /// Sorted set
    #[strum(ascii_case_insensitive, serialize = "zset")]
    SortedSet,
    /// Fallback
    #[strum(ascii_case_insensitive)]
    String,
}
