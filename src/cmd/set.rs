//! # Set command handlers
use crate::{connection::Connection, error::Error, value::Value};
use bytes::Bytes;
use std::collections::HashSet;

fn with_set<F>(conn: &Connection, key: &Bytes, f: F) -> Result<Value, Error>
where
    F: FnOnce(Option<&HashSet<Bytes>>) -> Result<Value, Error>,
{
    match conn.db().get(key) {
        Value::Null => f(None),
        Value::Set(set) => f(Some(&set)),
        _ => Err(Error::WrongType),
    }
}

/// SADD key member [member ...]
pub fn sadd(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    conn.db().with_entry_or_insert(
        &args[1],
        || Value::Set(HashSet::new()),
        |v| match v {
            Value::Set(set) => {
                let added = args[2..]
                    .iter()
                    .filter(|member| set.insert((*member).clone()))
                    .count();
                Ok(Value::Integer(added as i64))
            }
            _ => Err(Error::WrongType),
        },
    )
}

/// SISMEMBER key member
pub fn sismember(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_set(conn, &args[1], |set| {
        Ok(Value::Integer(
            set.map(|s| s.contains(&args[2])).unwrap_or(false) as i64,
        ))
    })
}

/// SREM key member [member ...]
pub fn srem(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let key = &args[1];
    let holds_set = conn.db().get_map_or(
        key,
        |v| match v {
            Value::Set(_) => Ok(Value::Ok),
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Null),
    )?;
    if holds_set == Value::Null {
        return Ok(Value::Integer(0));
    }

    let mut is_empty = false;
    let removed = conn.db().with_entry_or_insert(
        key,
        || Value::Set(HashSet::new()),
        |v| match v {
            Value::Set(set) => {
                let removed = args[2..]
                    .iter()
                    .filter(|member| set.remove(*member))
                    .count();
                is_empty = set.is_empty();
                Ok(Value::Integer(removed as i64))
            }
            _ => Err(Error::WrongType),
        },
    )?;

    if is_empty {
        conn.db().remove(key);
    }
    Ok(removed)
}

/// SCARD key
pub fn scard(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_set(conn, &args[1], |set| {
        Ok(Value::Integer(set.map(|s| s.len()).unwrap_or(0) as i64))
    })
}

/// SMEMBERS key
pub fn smembers(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_set(conn, &args[1], |set| {
        Ok(Value::Array(
            set.map(|s| s.iter().cloned().map(Value::Blob).collect())
                .unwrap_or_default(),
        ))
    })
}

fn load_set(conn: &Connection, key: &Bytes) -> Result<HashSet<Bytes>, Error> {
    match conn.db().get(key) {
        Value::Null => Ok(HashSet::new()),
        Value::Set(set) => Ok(set),
        _ => Err(Error::WrongType),
    }
}

/// SINTER key [key ...]
pub fn sinter(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let mut sets = args[1..].iter().map(|key| load_set(conn, key));
    let mut result = sets.next().ok_or(Error::Syntax)??;
    for set in sets {
        let set = set?;
        result.retain(|m| set.contains(m));
    }
    Ok(Value::Array(result.into_iter().map(Value::Blob).collect()))
}

/// SUNION key [key ...]
pub fn sunion(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let mut result = HashSet::new();
    for key in &args[1..] {
        result.extend(load_set(conn, key)?);
    }
    Ok(Value::Array(result.into_iter().map(Value::Blob).collect()))
}

/// SDIFF key [key ...]
pub fn sdiff(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let mut sets = args[1..].iter().map(|key| load_set(conn, key));
    let mut result = sets.next().ok_or(Error::Syntax)??;
    for set in sets {
        let set = set?;
        result.retain(|m| !set.contains(m));
    }
    Ok(Value::Array(result.into_iter().map(Value::Blob).collect()))
}

#[cfg(test)]
mod test {
    use crate::cmd::test::{create_connection, run_command};
    use crate::value::Value;

    fn as_sorted_strings(v: Value) -> Vec<String> {
        match v {
            Value::Array(items) => {
                let mut out: Vec<String> = items
                    .into_iter()
                    .map(|i| match i {
                        Value::Blob(b) => String::from_utf8(b.to_vec()).unwrap(),
                        _ => panic!("expected blob"),
                    })
                    .collect();
                out.sort();
                out
            }
            _ => panic!("expected array"),
        }
    }

    #[tokio::test]
    async fn sadd_counts_new_members_only() {
        let conn = create_connection();
        assert_eq!(
            Ok(Value::Integer(2)),
            run_command(&conn, &["sadd", "s", "a", "b"]).await
        );
        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&conn, &["sadd", "s", "a", "c"]).await
        );
    }

    #[tokio::test]
    async fn srem_removes_key_when_empty() {
        let conn = create_connection();
        run_command(&conn, &["sadd", "s", "a"]).await.unwrap();
        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&conn, &["srem", "s", "a"]).await
        );
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["exists", "s"]).await
        );
    }

    #[tokio::test]
    async fn sismember_and_scard() {
        let conn = create_connection();
        run_command(&conn, &["sadd", "s", "a", "b"]).await.unwrap();
        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&conn, &["sismember", "s", "a"]).await
        );
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["sismember", "s", "z"]).await
        );
        assert_eq!(Ok(Value::Integer(2)), run_command(&conn, &["scard", "s"]).await);
    }

    #[tokio::test]
    async fn sinter_sunion_sdiff() {
        let conn = create_connection();
        run_command(&conn, &["sadd", "a", "1", "2", "3"]).await.unwrap();
        run_command(&conn, &["sadd", "b", "2", "3", "4"]).await.unwrap();

        let inter = as_sorted_strings(run_command(&conn, &["sinter", "a", "b"]).await.unwrap());
        assert_eq!(inter, vec!["2".to_owned(), "3".to_owned()]);

        let union = as_sorted_strings(run_command(&conn, &["sunion", "a", "b"]).await.unwrap());
        assert_eq!(
            union,
            vec!["1".to_owned(), "2".to_owned(), "3".to_owned(), "4".to_owned()]
        );

        let diff = as_sorted_strings(run_command(&conn, &["sdiff", "a", "b"]).await.unwrap());
        assert_eq!(diff, vec!["1".to_owned()]);
    }
}
