//! # String commands
use crate::{connection::Connection, db::utils::Override, error::Error, value::Value};
use bytes::Bytes;
use std::convert::TryFrom;

/// GET key
pub fn get(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    conn.db().get_map_or(
        &args[1],
        |v| match v {
            Value::Blob(_) => Ok(v.clone()),
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Null),
    )
}

/// SET key value [NX|XX]
pub fn set(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let over = Override::try_from(&args[3..])?;
    let stored = conn
        .db()
        .set_with_override(&args[1], Value::Blob(args[2].clone()), over);

    if stored {
        Ok(Value::Ok)
    } else {
        Ok(Value::Null)
    }
}

/// SETNX key value
pub fn setnx(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let stored = conn
        .db()
        .set_with_override(&args[1], Value::Blob(args[2].clone()), Override::No);
    Ok(Value::Integer(stored as i64))
}

/// GETSET key value
pub fn getset(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    conn.db().get_map_or(
        &args[1],
        |v| match v {
            Value::Blob(_) => Ok(Value::Ok),
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Ok),
    )?;
    Ok(conn.db().getset(&args[1], Value::Blob(args[2].clone())))
}

/// STRLEN key
pub fn strlen(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    conn.db().get_map_or(
        &args[1],
        |v| match v {
            Value::Blob(x) => Ok(Value::Integer(x.len() as i64)),
            _ => Err(Error::WrongType),
        },
        || Ok(Value::Integer(0)),
    )
}

#[cfg(test)]
mod test {
    use crate::cmd::test::{create_connection, run_command};

    #[tokio::test]
    async fn set_and_get() {
        let conn = create_connection();
        assert_eq!(
            Ok(crate::value::Value::Ok),
            run_command(&conn, &["set", "a", "1"]).await
        );
        assert_eq!(Ok("1".into()), run_command(&conn, &["get", "a"]).await);
    }

    #[tokio::test]
    async fn set_nx_only_creates() {
        let conn = create_connection();
        assert_eq!(
            Ok(crate::value::Value::Ok),
            run_command(&conn, &["set", "a", "1", "NX"]).await
        );
        assert_eq!(
            Ok(crate::value::Value::Null),
            run_command(&conn, &["set", "a", "2", "NX"]).await
        );
        assert_eq!(Ok("1".into()), run_command(&conn, &["get", "a"]).await);
    }

    #[tokio::test]
    async fn set_xx_requires_existing() {
        let conn = create_connection();
        assert_eq!(
            Ok(crate::value::Value::Null),
            run_command(&conn, &["set", "a", "1", "XX"]).await
        );
        run_command(&conn, &["set", "a", "1"]).await.unwrap();
        assert_eq!(
            Ok(crate::value::Value::Ok),
            run_command(&conn, &["set", "a", "2", "XX"]).await
        );
    }

    #[tokio::test]
    async fn getset_replaces_value() {
        let conn = create_connection();
        run_command(&conn, &["set", "a", "1"]).await.unwrap();
        assert_eq!(Ok("1".into()), run_command(&conn, &["getset", "a", "2"]).await);
        assert_eq!(Ok("2".into()), run_command(&conn, &["get", "a"]).await);
    }

    #[tokio::test]
    async fn strlen_of_missing_key_is_zero() {
        let conn = create_connection();
        assert_eq!(
            Ok(crate::value::Value::Integer(0)),
            run_command(&conn, &["strlen", "missing"]).await
        );
    }
}
