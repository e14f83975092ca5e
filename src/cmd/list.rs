//! # List command handlers
use crate::{connection::Connection, error::Error, value::quicklist::QuickList, value::Value};
use bytes::Bytes;

fn push_front(conn: &Connection, args: &[Bytes], must_exist: bool) -> Result<Value, Error> {
    let key = &args[1];
    if must_exist && conn.db().get(key) == Value::Null {
        return Ok(Value::Integer(0));
    }
    conn.db().with_entry_or_insert(
        key,
        || Value::List(QuickList::new()),
        |v| match v {
            Value::List(list) => {
                for value in &args[2..] {
                    list.push_front(value.clone());
                }
                Ok(Value::Integer(list.len() as i64))
            }
            _ => Err(Error::WrongType),
        },
    )
}

fn push_back(conn: &Connection, args: &[Bytes], must_exist: bool) -> Result<Value, Error> {
    let key = &args[1];
    if must_exist && conn.db().get(key) == Value::Null {
        return Ok(Value::Integer(0));
    }
    conn.db().with_entry_or_insert(
        key,
        || Value::List(QuickList::new()),
        |v| match v {
            Value::List(list) => {
                for value in &args[2..] {
                    list.add(value.clone());
                }
                Ok(Value::Integer(list.len() as i64))
            }
            _ => Err(Error::WrongType),
        },
    )
}

/// LPUSH key value [value ...]
pub fn lpush(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    push_front(conn, args, false)
}

/// LPUSHX key value [value ...]
pub fn lpushx(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    push_front(conn, args, true)
}

/// RPUSH key value [value ...]
pub fn rpush(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    push_back(conn, args, false)
}

/// RPUSHX key value [value ...]
pub fn rpushx(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    push_back(conn, args, true)
}

fn pop(conn: &Connection, key: &Bytes, front: bool) -> Result<Value, Error> {
    let holds_list = conn.db().get_map_or(
        key,
        |v| match v {
            Value::List(_) => Ok(Value::Ok),
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Null),
    )?;
    if holds_list == Value::Null {
        return Ok(Value::Null);
    }

    let result = conn.db().with_entry_or_insert(
        key,
        || Value::List(QuickList::new()),
        |v| match v {
            Value::List(list) => {
                let popped = if front {
                    list.remove_first()
                } else {
                    list.remove_last()
                };
                Ok(popped.map(Value::Blob).unwrap_or(Value::Null))
            }
            _ => Err(Error::WrongType),
        },
    )?;
    drop_if_empty(conn, key);
    Ok(result)
}

/// LPOP key
pub fn lpop(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    pop(conn, &args[1], true)
}

/// RPOP key
pub fn rpop(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    pop(conn, &args[1], false)
}

fn drop_if_empty(conn: &Connection, key: &Bytes) {
    let is_empty = conn
        .db()
        .get_map_or(
            key,
            |v| match v {
                Value::List(list) => Ok(Value::Integer(list.is_empty() as i64)),
                _ => Ok(Value::Integer(0)),
            },
            || Ok(Value::Integer(0)),
        )
        .unwrap_or(Value::Integer(0));
    if is_empty == Value::Integer(1) {
        conn.db().remove(key);
    }
}

/// LREM key count value
pub fn lrem(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let count: i64 = crate::value::bytes_to_number(&args[2])?;
    let value = args[3].clone();
    let key = &args[1];

    let holds_list = conn.db().get_map_or(
        key,
        |v| match v {
            Value::List(_) => Ok(Value::Ok),
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Null),
    )?;
    if holds_list == Value::Null {
        return Ok(Value::Integer(0));
    }

    let removed = conn.db().with_entry_or_insert(
        key,
        || Value::List(QuickList::new()),
        |v| match v {
            Value::List(list) => {
                let removed = if count == 0 {
                    list.remove_all_by(|v| v == &value)
                } else if count > 0 {
                    list.remove_by(|v| v == &value, count as usize)
                } else {
                    list.reverse_remove_by(|v| v == &value, (-count) as usize)
                };
                Ok(Value::Integer(removed as i64))
            }
            _ => Err(Error::WrongType),
        },
    )?;
    drop_if_empty(conn, key);
    Ok(removed)
}

/// LLEN key
pub fn llen(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    conn.db().get_map_or(
        &args[1],
        |v| match v {
            Value::List(list) => Ok(Value::Integer(list.len() as i64)),
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Integer(0)),
    )
}

/// Normalizes a (possibly negative) index against `size`. Returns `None` if
/// out of bounds.
fn normalize_index(index: i64, size: i64) -> Option<usize> {
    let index = if index < 0 { size + index } else { index };
    if index < 0 || index >= size {
        None
    } else {
        Some(index as usize)
    }
}

/// LINDEX key index
pub fn lindex(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let index: i64 = crate::value::bytes_to_number(&args[2])?;
    conn.db().get_map_or(
        &args[1],
        |v| match v {
            Value::List(list) => {
                match normalize_index(index, list.len() as i64).and_then(|i| list.get(i)) {
                    Some(value) => Ok(Value::Blob(value.clone())),
                    None => Ok(Value::Null),
                }
            }
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Null),
    )
}

/// LSET key index value
pub fn lset(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let index: i64 = crate::value::bytes_to_number(&args[2])?;
    let value = args[3].clone();
    let key = &args[1];

    conn.db().get_map_or(
        key,
        |v| match v {
            Value::List(_) => Ok(Value::Ok),
            _ => Err(Error::WrongType),
        },
        || Err(Error::NoSuchKey),
    )?;

    conn.db().with_entry_or_insert(
        key,
        || Value::List(QuickList::new()),
        |v| match v {
            Value::List(list) => {
                let size = list.len() as i64;
                match normalize_index(index, size) {
                    Some(i) => {
                        list.set(i, value);
                        Ok(Value::Ok)
                    }
                    None => Err(Error::OutOfRange),
                }
            }
            _ => Err(Error::WrongType),
        },
    )
}

/// LRANGE key start stop
pub fn lrange(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let start: i64 = crate::value::bytes_to_number(&args[2])?;
    let stop: i64 = crate::value::bytes_to_number(&args[3])?;

    conn.db().get_map_or(
        &args[1],
        |v| match v {
            Value::List(list) => {
                let size = list.len() as i64;
                if size == 0 {
                    return Ok(Value::Array(vec![]));
                }

                let start = if start < -size {
                    0
                } else if start < 0 {
                    size + start
                } else if start >= size {
                    return Ok(Value::Array(vec![]));
                } else {
                    start
                };

                let stop = if stop < -size {
                    0
                } else if stop < 0 {
                    size + stop + 1
                } else if stop < size {
                    stop + 1
                } else {
                    size
                };
                let stop = stop.max(start);

                let values = list.range(start as usize, stop as usize);
                Ok(Value::Array(values.into_iter().map(Value::Blob).collect()))
            }
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Array(vec![])),
    )
}

#[cfg(test)]
mod test {
    use crate::cmd::test::{create_connection, run_command};
    use crate::value::Value;

    #[tokio::test]
    async fn lpush_and_rpush_order() {
        let conn = create_connection();
        run_command(&conn, &["rpush", "l", "a", "b"]).await.unwrap();
        run_command(&conn, &["lpush", "l", "c", "d"]).await.unwrap();
        assert_eq!(
            Ok(Value::Array(vec!["d".into(), "c".into(), "a".into(), "b".into()])),
            run_command(&conn, &["lrange", "l", "0", "-1"]).await
        );
    }

    #[tokio::test]
    async fn pushx_requires_existing_key() {
        let conn = create_connection();
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["lpushx", "missing", "a"]).await
        );
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["rpushx", "missing", "a"]).await
        );
    }

    #[tokio::test]
    async fn pop_removes_key_when_list_empty() {
        let conn = create_connection();
        run_command(&conn, &["rpush", "l", "a"]).await.unwrap();
        assert_eq!(Ok("a".into()), run_command(&conn, &["lpop", "l"]).await);
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["exists", "l"]).await
        );
    }

    #[tokio::test]
    async fn lrem_count_variants() {
        let conn = create_connection();
        run_command(&conn, &["rpush", "l", "x", "y", "x", "z", "x"])
            .await
            .unwrap();
        assert_eq!(
            Ok(Value::Integer(2)),
            run_command(&conn, &["lrem", "l", "-2", "x"]).await
        );
        assert_eq!(
            Ok(Value::Array(vec!["x".into(), "y".into(), "z".into()])),
            run_command(&conn, &["lrange", "l", "0", "-1"]).await
        );
    }

    #[tokio::test]
    async fn lindex_and_lset() {
        let conn = create_connection();
        run_command(&conn, &["rpush", "l", "a", "b", "c"])
            .await
            .unwrap();
        assert_eq!(Ok("c".into()), run_command(&conn, &["lindex", "l", "-1"]).await);
        assert_eq!(Ok(Value::Ok), run_command(&conn, &["lset", "l", "0", "z"]).await);
        assert_eq!(Ok("z".into()), run_command(&conn, &["lindex", "l", "0"]).await);
        assert!(run_command(&conn, &["lset", "l", "10", "z"]).await.is_err());
    }

    #[tokio::test]
    async fn llen_of_missing_key_is_zero() {
        let conn = create_connection();
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["llen", "missing"]).await
        );
    }
}
