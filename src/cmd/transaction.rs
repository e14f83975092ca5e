//! # Transaction command handlers
//!
//! MULTI queues commands on the connection; EXEC replays them against a
//! snapshot of the keys they touch so a mid-batch failure can be undone.
use crate::{
    connection::{Connection, ConnectionStatus},
    error::Error,
    value::Value,
};
use bytes::Bytes;

/// MULTI
pub fn multi(conn: &Connection, _args: &[Bytes]) -> Result<Value, Error> {
    conn.start_transaction()
}

/// DISCARD
pub fn discard(conn: &Connection, _args: &[Bytes]) -> Result<Value, Error> {
    if conn.status() == ConnectionStatus::Normal {
        return Err(Error::DiscardWithoutMulti);
    }
    conn.stop_transaction()
}

/// WATCH key [key ...]
pub fn watch(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let db = conn.db();
    let keys: Vec<(&Bytes, u32)> = args[1..].iter().map(|key| (key, db.get_version(key))).collect();
    conn.watch_key(&keys);
    Ok(Value::Ok)
}

/// GETVER key
pub fn getver(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    Ok(Value::Integer(conn.db().get_version(&args[1]) as i64))
}

/// Outcome of running the queued commands, before the caller decides how
/// (or whether) to persist them to the append-only log.
enum Outcome {
    /// A watched key changed before EXEC ran; nothing executed.
    WatchConflict,
    /// Every queued command ran. Carries each reply plus the args of every
    /// write command that succeeded, for the caller to persist.
    Replies(Vec<Value>, Vec<Vec<Bytes>>),
}

/// Runs the commands queued since MULTI. The dispatcher tracked write keys
/// per command as they were queued; here they're recomputed up front so a
/// pre-image of every one can be captured before anything executes, letting
/// a failing command mid-batch be rolled back. Leaves persistence to the
/// caller, since that requires an `await` this sync core can't provide.
fn run_queue(conn: &Connection) -> Result<Outcome, Error> {
    if conn.status() != ConnectionStatus::Multi {
        return Err(Error::NotInTx);
    }

    if conn.is_tx_dirty() {
        let _ = conn.stop_transaction();
        return Err(Error::ExecAbort);
    }

    if conn.did_keys_change() {
        let _ = conn.stop_transaction();
        return Ok(Outcome::WatchConflict);
    }

    let commands = conn.get_queue_commands().unwrap_or_default();
    let dispatcher = conn.all_connections().get_dispatcher();
    let db = conn.db();
    let mut executed: Vec<(Bytes, Value)> = vec![];
    let mut replies = vec![];
    let mut persisted: Vec<Vec<Bytes>> = vec![];

    for args in &commands {
        let handler = match dispatcher.get_handler(args) {
            Ok(handler) => handler,
            Err(err) => {
                rollback(&db, &executed);
                let _ = conn.stop_transaction();
                return Err(err);
            }
        };

        let (write_keys, _read_keys) = handler.keys(args);
        let pre_images: Vec<(Bytes, Value)> =
            write_keys.iter().map(|key| (key.clone(), db.get(key))).collect();

        // `dispatcher.run` already bumps every write key's version once; no
        // second bump is needed here.
        match dispatcher.run(conn, args) {
            Ok(reply) => {
                executed.extend(pre_images);
                if handler.is_write {
                    persisted.push(args.clone());
                }
                replies.push(reply);
            }
            Err(err) => {
                rollback(&db, &executed);
                let _ = conn.stop_transaction();
                return Err(err);
            }
        }
    }

    let _ = conn.stop_transaction();
    Ok(Outcome::Replies(replies, persisted))
}

/// EXEC, registered in the command table for arity checking. Direct callers
/// of this handler (bypassing the dispatcher's own EXEC interception) get
/// correct transaction semantics but no AOF persistence, same as any other
/// handler called directly instead of through the dispatcher.
pub fn exec(conn: &Connection, _args: &[Bytes]) -> Result<Value, Error> {
    match run_queue(conn)? {
        Outcome::WatchConflict => Ok(Value::Array(vec![])),
        Outcome::Replies(replies, _persisted) => Ok(Value::Array(replies)),
    }
}

/// EXEC as actually reached through the live dispatcher: same semantics as
/// [`exec`], but appends every successful write sub-command to the
/// append-only log, mirroring what the plain (non-transaction) command path
/// does for a single write.
pub async fn exec_live(conn: &Connection) -> Result<Value, Error> {
    match run_queue(conn)? {
        Outcome::WatchConflict => Ok(Value::Array(vec![])),
        Outcome::Replies(replies, persisted) => {
            if let Some(aof) = conn.all_connections().aof() {
                let db_index = conn.current_db_index();
                for args in &persisted {
                    aof.append(db_index, args).await;
                }
            }
            Ok(Value::Array(replies))
        }
    }
}

/// Restores every captured pre-image, most recent command first.
fn rollback(db: &crate::db::Db, executed: &[(Bytes, Value)]) {
    for (key, value) in executed.iter().rev() {
        match value {
            Value::Null => {
                db.remove(key);
            }
            value => db.set(key, value.clone()),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        cmd::test::{create_connection, run_command},
        error::Error,
        value::Value,
    };

    #[tokio::test]
    async fn exec_runs_queued_commands_in_order() {
        let conn = create_connection();
        assert_eq!(Ok(Value::Ok), run_command(&conn, &["multi"]).await);
        assert_eq!(Ok(Value::Queued), run_command(&conn, &["set", "foo", "bar"]).await);
        assert_eq!(Ok(Value::Queued), run_command(&conn, &["get", "foo"]).await);
        assert_eq!(
            Ok(Value::Array(vec![Value::Ok, Value::Blob("bar".into())])),
            run_command(&conn, &["exec"]).await
        );
    }

    #[tokio::test]
    async fn nested_multi_is_rejected() {
        let conn = create_connection();
        assert_eq!(Ok(Value::Ok), run_command(&conn, &["multi"]).await);
        assert_eq!(Err(Error::NestedTx), run_command(&conn, &["multi"]).await);
    }

    #[tokio::test]
    async fn discard_drops_queued_commands() {
        let conn = create_connection();
        run_command(&conn, &["multi"]).await.unwrap();
        run_command(&conn, &["set", "foo", "bar"]).await.unwrap();
        assert_eq!(Ok(Value::Ok), run_command(&conn, &["discard"]).await);
        assert_eq!(Err(Error::NotInTx), run_command(&conn, &["exec"]).await);
        assert_eq!(Ok(Value::Null), run_command(&conn, &["get", "foo"]).await);
    }

    #[tokio::test]
    async fn exec_aborts_with_empty_array_on_watch_conflict() {
        let conn = create_connection();
        run_command(&conn, &["set", "foo", "1"]).await.unwrap();
        run_command(&conn, &["watch", "foo"]).await.unwrap();
        run_command(&conn, &["set", "foo", "2"]).await.unwrap();

        run_command(&conn, &["multi"]).await.unwrap();
        run_command(&conn, &["get", "foo"]).await.unwrap();
        assert_eq!(Ok(Value::Array(vec![])), run_command(&conn, &["exec"]).await);
    }

    #[tokio::test]
    async fn flushdb_is_rejected_inside_multi() {
        let conn = create_connection();
        run_command(&conn, &["multi"]).await.unwrap();
        assert!(run_command(&conn, &["flushdb"]).await.is_err());
        assert_eq!(Err(Error::ExecAbort), run_command(&conn, &["exec"]).await);
    }

    #[tokio::test]
    async fn exec_rolls_back_on_mid_batch_failure() {
        let conn = create_connection();
        run_command(&conn, &["set", "counter", "1"]).await.unwrap();

        run_command(&conn, &["multi"]).await.unwrap();
        run_command(&conn, &["set", "counter", "2"]).await.unwrap();
        run_command(&conn, &["lpush", "counter", "x"]).await.unwrap();
        assert!(run_command(&conn, &["exec"]).await.is_err());

        assert_eq!(Ok("1".into()), run_command(&conn, &["get", "counter"]).await);
    }

    #[tokio::test]
    async fn getver_reports_version_counter() {
        let conn = create_connection();
        assert_eq!(Ok(Value::Integer(0)), run_command(&conn, &["getver", "foo"]).await);
        run_command(&conn, &["set", "foo", "1"]).await.unwrap();
        assert_eq!(Ok(Value::Integer(1)), run_command(&conn, &["getver", "foo"]).await);
    }

    #[tokio::test]
    async fn exec_bumps_version_exactly_once_per_write() {
        let conn = create_connection();
        assert_eq!(Ok(Value::Integer(0)), run_command(&conn, &["getver", "foo"]).await);

        run_command(&conn, &["multi"]).await.unwrap();
        run_command(&conn, &["set", "foo", "bar"]).await.unwrap();
        run_command(&conn, &["exec"]).await.unwrap();

        assert_eq!(Ok(Value::Integer(1)), run_command(&conn, &["getver", "foo"]).await);
    }
}
