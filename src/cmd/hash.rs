//! # Hash command handlers
use crate::{connection::Connection, error::Error, value::Value};
use bytes::Bytes;
use std::collections::HashMap;

fn with_hash<F>(conn: &Connection, key: &Bytes, f: F) -> Result<Value, Error>
where
    F: FnOnce(Option<&HashMap<Bytes, Bytes>>) -> Result<Value, Error>,
{
    match conn.db().get(key) {
        Value::Null => f(None),
        Value::Hash(map) => f(Some(&map)),
        _ => Err(Error::WrongType),
    }
}

/// HSET key field value [field value ...]
pub fn hset(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let key = &args[1];
    let pairs = &args[2..];
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return Err(Error::Syntax);
    }
    conn.db().with_entry_or_insert(
        key,
        || Value::Hash(HashMap::new()),
        |v| match v {
            Value::Hash(map) => {
                let mut added = 0i64;
                for pair in pairs.chunks(2) {
                    if map.insert(pair[0].clone(), pair[1].clone()).is_none() {
                        added += 1;
                    }
                }
                Ok(Value::Integer(added))
            }
            _ => Err(Error::WrongType),
        },
    )
}

/// HSETNX key field value
pub fn hsetnx(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let key = &args[1];
    let field = args[2].clone();
    let value = args[3].clone();
    conn.db().with_entry_or_insert(
        key,
        || Value::Hash(HashMap::new()),
        |v| match v {
            Value::Hash(map) => {
                if map.contains_key(&field) {
                    Ok(Value::Integer(0))
                } else {
                    map.insert(field, value);
                    Ok(Value::Integer(1))
                }
            }
            _ => Err(Error::WrongType),
        },
    )
}

/// HGET key field
pub fn hget(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_hash(conn, &args[1], |map| {
        Ok(map
            .and_then(|m| m.get(&args[2]))
            .map(|v| Value::Blob(v.clone()))
            .unwrap_or(Value::Null))
    })
}

/// HEXISTS key field
pub fn hexists(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_hash(conn, &args[1], |map| {
        Ok(Value::Integer(
            map.map(|m| m.contains_key(&args[2])).unwrap_or(false) as i64,
        ))
    })
}

/// HDEL key field [field ...]
pub fn hdel(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let key = &args[1];
    let mut is_empty = false;
    let result = conn.db().get_map_or(
        key,
        |v| match v {
            Value::Hash(_) => Ok(Value::Integer(0)),
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Null),
    )?;
    if result == Value::Null {
        return Ok(Value::Integer(0));
    }

    let result = conn.db().with_entry_or_insert(
        key,
        || Value::Hash(HashMap::new()),
        |v| match v {
            Value::Hash(map) => {
                let removed = args[2..]
                    .iter()
                    .filter(|field| map.remove(*field).is_some())
                    .count();
                is_empty = map.is_empty();
                Ok(Value::Integer(removed as i64))
            }
            _ => Err(Error::WrongType),
        },
    )?;

    if is_empty {
        conn.db().remove(key);
    }
    Ok(result)
}

/// HLEN key
pub fn hlen(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_hash(conn, &args[1], |map| {
        Ok(Value::Integer(map.map(|m| m.len()).unwrap_or(0) as i64))
    })
}

/// HMSET key field value [field value ...]
pub fn hmset(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    hset(conn, args)?;
    Ok(Value::Ok)
}

/// HMGET key field [field ...]
pub fn hmget(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_hash(conn, &args[1], |map| {
        Ok(Value::Array(
            args[2..]
                .iter()
                .map(|field| {
                    map.and_then(|m| m.get(field))
                        .map(|v| Value::Blob(v.clone()))
                        .unwrap_or(Value::Null)
                })
                .collect(),
        ))
    })
}

/// HKEYS key
pub fn hkeys(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_hash(conn, &args[1], |map| {
        Ok(Value::Array(
            map.map(|m| m.keys().cloned().map(Value::Blob).collect())
                .unwrap_or_default(),
        ))
    })
}

/// HVALS key
pub fn hvals(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_hash(conn, &args[1], |map| {
        Ok(Value::Array(
            map.map(|m| m.values().cloned().map(Value::Blob).collect())
                .unwrap_or_default(),
        ))
    })
}

/// HGETALL key
pub fn hgetall(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_hash(conn, &args[1], |map| {
        Ok(Value::Array(
            map.map(|m| {
                m.iter()
                    .flat_map(|(k, v)| [Value::Blob(k.clone()), Value::Blob(v.clone())])
                    .collect()
            })
            .unwrap_or_default(),
        ))
    })
}

#[cfg(test)]
mod test {
    use crate::cmd::test::{create_connection, run_command};
    use crate::value::Value;

    #[tokio::test]
    async fn hset_counts_new_fields_only() {
        let conn = create_connection();
        assert_eq!(
            Ok(Value::Integer(2)),
            run_command(&conn, &["hset", "h", "a", "1", "b", "2"]).await
        );
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["hset", "h", "a", "3"]).await
        );
        assert_eq!(Ok("3".into()), run_command(&conn, &["hget", "h", "a"]).await);
    }

    #[tokio::test]
    async fn hsetnx_refuses_existing_field() {
        let conn = create_connection();
        run_command(&conn, &["hset", "h", "a", "1"]).await.unwrap();
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["hsetnx", "h", "a", "2"]).await
        );
        assert_eq!(Ok("1".into()), run_command(&conn, &["hget", "h", "a"]).await);
    }

    #[tokio::test]
    async fn hdel_removes_key_when_empty() {
        let conn = create_connection();
        run_command(&conn, &["hset", "h", "a", "1"]).await.unwrap();
        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&conn, &["hdel", "h", "a"]).await
        );
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["exists", "h"]).await
        );
    }

    #[tokio::test]
    async fn hmget_preserves_order_and_nulls() {
        let conn = create_connection();
        run_command(&conn, &["hset", "h", "a", "1"]).await.unwrap();
        assert_eq!(
            Ok(Value::Array(vec!["1".into(), Value::Null])),
            run_command(&conn, &["hmget", "h", "a", "missing"]).await
        );
    }

    #[tokio::test]
    async fn hexists_and_hlen() {
        let conn = create_connection();
        run_command(&conn, &["hset", "h", "a", "1", "b", "2"])
            .await
            .unwrap();
        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&conn, &["hexists", "h", "a"]).await
        );
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["hexists", "h", "z"]).await
        );
        assert_eq!(Ok(Value::Integer(2)), run_command(&conn, &["hlen", "h"]).await);
    }
}
