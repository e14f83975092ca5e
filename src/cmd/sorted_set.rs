//! # Sorted set command handlers
use crate::{
    connection::Connection,
    error::Error,
    value::{bytes_to_number, sorted_set::ScoreBorder, sorted_set::SortedSet, Value},
};
use bytes::Bytes;

fn with_sorted_set<F>(conn: &Connection, key: &Bytes, f: F) -> Result<Value, Error>
where
    F: FnOnce(Option<&SortedSet>) -> Result<Value, Error>,
{
    match conn.db().get(key) {
        Value::Null => f(None),
        Value::SortedSet(set) => f(Some(&set)),
        _ => Err(Error::WrongType),
    }
}

/// ZADD key score member [score member ...]
pub fn zadd(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let pairs = &args[2..];
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return Err(Error::Syntax);
    }

    conn.db().with_entry_or_insert(
        &args[1],
        || Value::SortedSet(SortedSet::new()),
        |v| match v {
            Value::SortedSet(set) => {
                let mut added = 0i64;
                for pair in pairs.chunks(2) {
                    let score: f64 = bytes_to_number(&pair[0])?;
                    if set.insert(pair[1].clone(), score) {
                        added += 1;
                    }
                }
                Ok(Value::Integer(added))
            }
            _ => Err(Error::WrongType),
        },
    )
}

/// ZSCORE key member
pub fn zscore(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_sorted_set(conn, &args[1], |set| {
        Ok(set
            .and_then(|s| s.score(&args[2]))
            .map(Value::Float)
            .unwrap_or(Value::Null))
    })
}

/// ZRANK key member
pub fn zrank(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_sorted_set(conn, &args[1], |set| {
        Ok(set
            .and_then(|s| s.rank(&args[2]))
            .map(|r| Value::Integer(r as i64))
            .unwrap_or(Value::Null))
    })
}

/// ZCARD key
pub fn zcard(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    with_sorted_set(conn, &args[1], |set| {
        Ok(Value::Integer(set.map(|s| s.len()).unwrap_or(0) as i64))
    })
}

/// ZCOUNT key min max
pub fn zcount(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let min = ScoreBorder::parse(&args[2])?;
    let max = ScoreBorder::parse(&args[3])?;
    with_sorted_set(conn, &args[1], |set| {
        Ok(Value::Integer(set.map(|s| s.count(&min, &max)).unwrap_or(0) as i64))
    })
}

fn normalize_range(mut start: i64, mut stop: i64, size: i64) -> Option<(usize, usize)> {
    if size == 0 {
        return None;
    }
    if start < 0 {
        start = (size + start).max(0);
    }
    if stop < 0 {
        stop = size + stop;
    }
    let stop = stop.min(size - 1);
    if start >= size || stop < start {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// ZRANGE key start stop [WITHSCORES]
pub fn zrange(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let start: i64 = bytes_to_number(&args[2])?;
    let stop: i64 = bytes_to_number(&args[3])?;
    let with_scores = args
        .get(4)
        .map(|arg| arg.eq_ignore_ascii_case(b"WITHSCORES"))
        .unwrap_or(false);

    with_sorted_set(conn, &args[1], |set| {
        let set = match set {
            Some(set) => set,
            None => return Ok(Value::Array(vec![])),
        };

        let range = match normalize_range(start, stop, set.len() as i64) {
            Some(range) => range,
            None => return Ok(Value::Array(vec![])),
        };

        let mut out = vec![];
        for element in set.range_by_rank(range.0, range.1) {
            out.push(Value::Blob(element.member));
            if with_scores {
                out.push(Value::Float(element.score));
            }
        }
        Ok(Value::Array(out))
    })
}

/// ZREM key member [member ...]
pub fn zrem(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let key = &args[1];
    let holds_set = conn.db().get_map_or(
        key,
        |v| match v {
            Value::SortedSet(_) => Ok(Value::Ok),
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
        || Value::SortedSet(SortedSet::new()),
        |v| match v {
            Value::SortedSet(set) => {
                let removed = args[2..].iter().filter(|member| set.remove(member)).count();
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

/// ZREMRANGEBYSCORE key min max
pub fn zremrangebyscore(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let min = ScoreBorder::parse(&args[2])?;
    let max = ScoreBorder::parse(&args[3])?;
    let key = &args[1];

    let holds_set = conn.db().get_map_or(
        key,
        |v| match v {
            Value::SortedSet(_) => Ok(Value::Ok),
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
        || Value::SortedSet(SortedSet::new()),
        |v| match v {
            Value::SortedSet(set) => {
                let members: Vec<Bytes> = set
                    .range_by_score(&min, &max)
                    .into_iter()
                    .map(|e| e.member)
                    .collect();
                let removed = members.len();
                for member in members {
                    set.remove(&member);
                }
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

/// ZREMRANGEBYRANK key start stop
pub fn zremrangebyrank(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let start: i64 = bytes_to_number(&args[2])?;
    let stop: i64 = bytes_to_number(&args[3])?;
    let key = &args[1];

    let holds_set = conn.db().get_map_or(
        key,
        |v| match v {
            Value::SortedSet(_) => Ok(Value::Ok),
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
        || Value::SortedSet(SortedSet::new()),
        |v| match v {
            Value::SortedSet(set) => {
                let range = normalize_range(start, stop, set.len() as i64);
                let removed = match range {
                    Some((start, stop)) => {
                        let members: Vec<Bytes> = set
                            .range_by_rank(start, stop)
                            .into_iter()
                            .map(|e| e.member)
                            .collect();
                        let removed = members.len();
                        for member in members {
                            set.remove(&member);
                        }
                        removed
                    }
                    None => 0,
                };
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

#[cfg(test)]
mod test {
    use crate::cmd::test::{create_connection, run_command};
    use crate::value::Value;

    #[tokio::test]
    async fn zadd_counts_new_members_and_updates_score() {
        let conn = create_connection();
        assert_eq!(
            Ok(Value::Integer(2)),
            run_command(&conn, &["zadd", "z", "1", "a", "2", "b"]).await
        );
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["zadd", "z", "3", "a"]).await
        );
        assert_eq!(
            Ok(Value::Float(3.0)),
            run_command(&conn, &["zscore", "z", "a"]).await
        );
    }

    #[tokio::test]
    async fn zrank_orders_by_score() {
        let conn = create_connection();
        run_command(&conn, &["zadd", "z", "2", "b", "1", "a", "3", "c"])
            .await
            .unwrap();
        assert_eq!(Ok(Value::Integer(0)), run_command(&conn, &["zrank", "z", "a"]).await);
        assert_eq!(Ok(Value::Integer(1)), run_command(&conn, &["zrank", "z", "b"]).await);
        assert_eq!(Ok(Value::Null), run_command(&conn, &["zrank", "z", "missing"]).await);
    }

    #[tokio::test]
    async fn zrange_with_and_without_scores() {
        let conn = create_connection();
        run_command(&conn, &["zadd", "z", "1", "a", "2", "b"])
            .await
            .unwrap();
        assert_eq!(
            Ok(Value::Array(vec!["a".into(), "b".into()])),
            run_command(&conn, &["zrange", "z", "0", "-1"]).await
        );
        assert_eq!(
            Ok(Value::Array(vec![
                "a".into(),
                Value::Float(1.0),
                "b".into(),
                Value::Float(2.0)
            ])),
            run_command(&conn, &["zrange", "z", "0", "-1", "WITHSCORES"]).await
        );
    }

    #[tokio::test]
    async fn zcount_filters_inclusive_range() {
        let conn = create_connection();
        run_command(&conn, &["zadd", "z", "1", "a", "2", "b", "3", "c"])
            .await
            .unwrap();
        assert_eq!(
            Ok(Value::Integer(2)),
            run_command(&conn, &["zcount", "z", "2", "3"]).await
        );
    }

    #[tokio::test]
    async fn zrem_and_zremrangebyscore_remove_key_when_empty() {
        let conn = create_connection();
        run_command(&conn, &["zadd", "z", "1", "a", "2", "b"])
            .await
            .unwrap();
        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&conn, &["zrem", "z", "a"]).await
        );
        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&conn, &["zremrangebyscore", "z", "2", "2"]).await
        );
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["exists", "z"]).await
        );
    }

    #[tokio::test]
    async fn zremrangebyrank_removes_selected_range() {
        let conn = create_connection();
        run_command(&conn, &["zadd", "z", "1", "a", "2", "b", "3", "c"])
            .await
            .unwrap();
        assert_eq!(
            Ok(Value::Integer(2)),
            run_command(&conn, &["zremrangebyrank", "z", "0", "1"]).await
        );
        assert_eq!(
            Ok(Value::Array(vec!["c".into()])),
            run_command(&conn, &["zrange", "z", "0", "-1"]).await
        );
    }
}
