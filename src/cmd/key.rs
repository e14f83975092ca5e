//! # Generic key commands
use crate::{connection::Connection, error::Error, value::Value};
use bytes::Bytes;

/// DEL key [key ...]
pub fn del(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    Ok(Value::Integer(conn.db().del(&args[1..]) as i64))
}

/// EXISTS key [key ...]
pub fn exists(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    Ok(Value::Integer(conn.db().exists(&args[1..]) as i64))
}

/// FLUSHDB
pub fn flushdb(conn: &Connection, _args: &[Bytes]) -> Result<Value, Error> {
    conn.db().flush();
    Ok(Value::Ok)
}

/// TYPE key
pub fn data_type(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    conn.db().get_map_or(
        &args[1],
        |v| Ok(Value::String(v.typ().to_string().to_lowercase())),
        || Ok(Value::String("none".to_owned())),
    )
}

/// RENAME key newkey
pub fn rename(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    conn.db().rename(&args[1], &args[2])?;
    Ok(Value::Ok)
}

/// RENAMENX key newkey
pub fn renamenx(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let renamed = conn.db().rename_nx(&args[1], &args[2])?;
    Ok(Value::Integer(renamed as i64))
}

/// KEYS pattern
pub fn keys(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let pattern = String::from_utf8_lossy(&args[1]);
    let matched = conn.db().keys(&pattern)?;
    Ok(Value::Array(matched.into_iter().map(Value::Blob).collect()))
}

/// PING [message]
pub fn ping(_conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    match args.get(1) {
        Some(msg) => Ok(Value::Blob(msg.clone())),
        None => Ok(Value::String("PONG".to_owned())),
    }
}

/// SELECT index
pub fn select(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let index: i64 = crate::value::bytes_to_number(&args[1])?;
    if index < 0 {
        return Err(Error::NotSuchDatabase);
    }
    conn.selectdb(index as usize)
}

#[cfg(test)]
mod test {
    use crate::cmd::test::{create_connection, run_command};
    use crate::value::Value;

    #[tokio::test]
    async fn del_counts_existing() {
        let conn = create_connection();
        run_command(&conn, &["set", "a", "1"]).await.unwrap();
        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&conn, &["del", "a", "missing"]).await
        );
    }

    #[tokio::test]
    async fn type_of_missing_key_is_none() {
        let conn = create_connection();
        assert_eq!(
            Ok(Value::String("none".to_owned())),
            run_command(&conn, &["type", "missing"]).await
        );
    }

    #[tokio::test]
    async fn rename_moves_value_and_fails_on_missing_source() {
        let conn = create_connection();
        run_command(&conn, &["set", "a", "1"]).await.unwrap();
        assert_eq!(Ok(Value::Ok), run_command(&conn, &["rename", "a", "b"]).await);
        assert_eq!(Ok("1".into()), run_command(&conn, &["get", "b"]).await);
        assert!(run_command(&conn, &["rename", "a", "c"]).await.is_err());
    }

    #[tokio::test]
    async fn renamenx_refuses_existing_destination() {
        let conn = create_connection();
        run_command(&conn, &["set", "a", "1"]).await.unwrap();
        run_command(&conn, &["set", "b", "2"]).await.unwrap();
        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&conn, &["renamenx", "a", "b"]).await
        );
    }

    #[tokio::test]
    async fn keys_matches_glob() {
        let conn = create_connection();
        run_command(&conn, &["set", "foo", "1"]).await.unwrap();
        run_command(&conn, &["set", "bar", "1"]).await.unwrap();
        let reply = run_command(&conn, &["keys", "fo*"]).await.unwrap();
        assert_eq!(reply, Value::Array(vec!["foo".into()]));
    }

    #[tokio::test]
    async fn ping_echoes_message() {
        let conn = create_connection();
        assert_eq!(
            Ok(Value::String("PONG".to_owned())),
            run_command(&conn, &["ping"]).await
        );
        assert_eq!(Ok("hi".into()), run_command(&conn, &["ping", "hi"]).await);
    }

    #[tokio::test]
    async fn select_switches_database_and_rejects_out_of_range() {
        let conn = create_connection();
        run_command(&conn, &["set", "a", "1"]).await.unwrap();
        assert_eq!(Ok(Value::Ok), run_command(&conn, &["select", "1"]).await);
        assert_eq!(Ok(Value::Null), run_command(&conn, &["get", "a"]).await);
        assert!(run_command(&conn, &["select", "99"]).await.is_err());
    }
}
