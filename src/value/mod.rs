//! # Redis Value
//!
//! All redis internal data structures and values are abstracted in this mod.
pub mod float;
pub mod quicklist;
pub mod sorted_set;
pub mod typ;

use crate::{error::Error, value_try_from, value_vec_try_from};
use bytes::Bytes;
use quicklist::QuickList;
use sorted_set::SortedSet;
use std::{
    collections::{HashMap, HashSet},
    convert::TryFrom,
    str::FromStr,
};
use typ::ValueTyp;

/// Redis Value.
///
/// This enum represents all data structures stored in the database as well
/// as the reply values sent back to clients.
#[derive(Debug, Clone)]
pub enum Value {
    /// Hash
    Hash(HashMap<Bytes, Bytes>),
    /// Paged list
    List(QuickList),
    /// Set
    Set(HashSet<Bytes>),
    /// Sorted set
    SortedSet(SortedSet),
    /// Vector/Array of values, also used for the reply to `EXEC`
    Array(Vec<Value>),
    /// Bytes/Strings/Binary data
    Blob(Bytes),
    /// Simple string reply, e.g. `+PONG`
    String(String),
    /// An error reply
    Err(String, String),
    /// Integer
    Integer(i64),
    /// Float number
    Float(f64),
    /// Null/nil reply
    Null,
    /// The command has been queued inside a transaction
    Queued,
    /// `+OK`
    Ok,
    /// Nothing should be written to the client
    Ignore,
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Hash(a), Self::Hash(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::SortedSet(a), Self::SortedSet(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Err(a1, a2), Self::Err(b1, b2)) => a1 == b1 && a2 == b2,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Queued, Self::Queued) => true,
            (Self::Ok, Self::Ok) => true,
            (Self::Ignore, Self::Ignore) => true,
            _ => false,
        }
    }
}

impl Value {
    /// Creates a new blob value from a stream of bytes
    pub fn new(value: &[u8]) -> Self {
        Self::Blob(Bytes::copy_from_slice(value))
    }

    /// Is the current value an error?
    pub fn is_err(&self) -> bool {
        matches!(self, Self::Err(..))
    }

    /// The `ValueTyp` used to answer `TYPE` and to filter `KEYS`/scans.
    pub fn typ(&self) -> ValueTyp {
        match self {
            Self::Hash(_) => ValueTyp::Hash,
            Self::List(_) => ValueTyp::List,
            Self::Set(_) => ValueTyp::Set,
            Self::SortedSet(_) => ValueTyp::SortedSet,
            _ => ValueTyp::String,
        }
    }
}

impl From<&Value> for Vec<u8> {
    fn from(value: &Value) -> Vec<u8> {
        match value {
            Value::Ignore => b"".to_vec(),
            Value::Null => b"$-1\r\n".to_vec(),
            Value::Array(x) => {
                let mut s: Vec<u8> = format!("*{}\r\n", x.len()).into_bytes();
                for i in x.iter() {
                    let b: Vec<u8> = i.into();
                    s.extend(b);
                }
                s
            }
            Value::Integer(x) => format!(":{}\r\n", x).into_bytes(),
            Value::Float(x) => format!("${}\r\n{}\r\n", x.to_string().len(), x).into_bytes(),
            Value::Blob(x) => {
                let mut s = format!("${}\r\n", x.len()).into_bytes();
                s.extend_from_slice(x);
                s.extend_from_slice(b"\r\n");
                s
            }
            Value::Err(x, y) => format!("-{} {}\r\n", x, y).into_bytes(),
            Value::String(x) => format!("+{}\r\n", x).into_bytes(),
            Value::Queued => b"+QUEUED\r\n".to_vec(),
            Value::Ok => b"+OK\r\n".to_vec(),
            Value::Hash(_) | Value::Set(_) | Value::List(_) | Value::SortedSet(_) => {
                b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n".to_vec()
            }
        }
    }
}

impl From<Value> for Vec<u8> {
    fn from(value: Value) -> Vec<u8> {
        (&value).into()
    }
}

impl TryFrom<&Value> for i64 {
    type Error = Error;

    fn try_from(val: &Value) -> Result<Self, Self::Error> {
        match val {
            Value::Integer(x) => Ok(*x),
            Value::Blob(x) => bytes_to_number::<i64>(x),
            Value::String(x) => x.parse::<i64>().map_err(|_| Error::NotANumber),
            _ => Err(Error::NotANumber),
        }
    }
}

impl TryFrom<&Value> for f64 {
    type Error = Error;

    fn try_from(val: &Value) -> Result<Self, Self::Error> {
        match val {
            Value::Float(x) => Ok(*x),
            Value::Blob(x) => bytes_to_number::<f64>(x),
            Value::String(x) => x.parse::<f64>().map_err(|_| Error::NotAFloat),
            _ => Err(Error::NotAFloat),
        }
    }
}

/// Tries to convert bytes data into a number.
#[inline]
pub fn bytes_to_number<T: FromStr>(bytes: &[u8]) -> Result<T, Error> {
    let x = String::from_utf8_lossy(bytes);
    x.parse::<T>().map_err(|_| Error::NotANumber)
}

value_try_from!(f64, Value::Float);
value_try_from!(i32, Value::Integer);
value_try_from!(u32, Value::Integer);
value_try_from!(i64, Value::Integer);

impl From<usize> for Value {
    fn from(value: usize) -> Value {
        Value::Integer(value as i64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Integer(if value { 1 } else { 0 })
    }
}

impl From<Option<&Bytes>> for Value {
    fn from(v: Option<&Bytes>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<&Bytes> for Value {
    fn from(v: &Bytes) -> Self {
        Value::Blob(v.clone())
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Blob(v)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::Blob(Bytes::copy_from_slice(value.as_bytes()))
    }
}

value_vec_try_from!(&str);

impl From<String> for Value {
    fn from(value: String) -> Value {
        value.as_str().into()
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Value {
        Value::Array(value)
    }
}

impl From<Vec<Bytes>> for Value {
    fn from(value: Vec<Bytes>) -> Value {
        Value::Array(value.into_iter().map(Value::Blob).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryInto;

    #[test]
    fn serializes_bulk_string() {
        let bytes: Vec<u8> = Value::new(b"foo").into();
        assert_eq!(bytes, b"$3\r\nfoo\r\n".to_vec());
    }

    #[test]
    fn serializes_null_as_nil_bulk() {
        let bytes: Vec<u8> = Value::Null.into();
        assert_eq!(bytes, b"$-1\r\n".to_vec());
    }

    #[test]
    fn serializes_nested_array() {
        let value = Value::Array(vec![Value::Integer(1), Value::new(b"a")]);
        let bytes: Vec<u8> = (&value).into();
        assert_eq!(bytes, b"*2\r\n:1\r\n$1\r\na\r\n".to_vec());
    }

    #[test]
    fn try_into_integer_from_blob() {
        let value = Value::new(b"42");
        let n: i64 = (&value).try_into().unwrap();
        assert_eq!(n, 42);
    }

    #[test]
    fn try_into_integer_fails_on_wrong_type() {
        let value = Value::Ok;
        let n: Result<i64, _> = (&value).try_into();
        assert_eq!(n, Err(Error::NotANumber));
    }

    #[test]
    fn wrong_type_reply_for_aggregate_types() {
        let value = Value::Hash(HashMap::new());
        let bytes: Vec<u8> = (&value).into();
        assert_eq!(
            bytes,
            b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n".to_vec()
        );
    }

    #[test]
    fn type_dispatch() {
        assert_eq!(Value::Hash(HashMap::new()).typ(), ValueTyp::Hash);
        assert_eq!(Value::List(QuickList::new()).typ(), ValueTyp::List);
        assert_eq!(Value::Set(HashSet::new()).typ(), ValueTyp::Set);
        assert_eq!(Value::new(b"x").typ(), ValueTyp::String);
    }
}
