//! # Dispatcher
//!
//! Resolves a command name to its `Command` record and runs it against a
//! connection: arity checking, MULTI-queueing, version bumping for writes,
//! and (for plain commands) invoking the handler directly.
use crate::{
    connection::{Connection, ConnectionStatus},
    error::Error,
    value::Value,
};
use bytes::Bytes;

pub mod command;
use command::Command;

/// Stateless command dispatcher: one instance shared by every connection.
#[derive(Debug, Default)]
pub struct Dispatcher;

impl Dispatcher {
    /// Creates a new dispatcher.
    pub fn new() -> Self {
        Self
    }

    /// Resolves a command name and checks its arity.
    pub fn get_handler(&self, args: &[Bytes]) -> Result<Command, Error> {
        if args.is_empty() {
            return Err(Error::EmptyLine);
        }

        let name = String::from_utf8_lossy(&args[0]).to_lowercase();
        let command = Command::lookup(&name).ok_or_else(|| Error::CommandNotFound(name.clone()))?;

        if !command.check_arity(args) {
            return Err(Error::InvalidArgsCount(name));
        }

        Ok(command)
    }

    /// Runs `args` against `conn`, honoring MULTI queueing semantics.
    pub async fn execute(&self, conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
        let name = String::from_utf8_lossy(&args[0]).to_lowercase();
        let is_tx_control = matches!(name.as_str(), "multi" | "exec" | "discard");

        if conn.status() == ConnectionStatus::Multi && !is_tx_control {
            return match self.get_handler(args) {
                Ok(command) if command.queueable => {
                    conn.queue_command(args);
                    Ok(Value::Queued)
                }
                Ok(command) => {
                    conn.mark_tx_dirty();
                    Err(Error::NotQueueable(command.name.to_owned()))
                }
                Err(err) => {
                    conn.mark_tx_dirty();
                    Err(err)
                }
            };
        }

        if name == "exec" {
            self.get_handler(args)?;
            return crate::cmd::transaction::exec_live(conn).await;
        }

        self.run(conn, args)
    }

    /// Runs a command outside of any queueing concern: resolves it, bumps
    /// write-key versions, and calls the handler.
    pub fn run(&self, conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
        let command = self.get_handler(args)?;

        let (write_keys, _read_keys) = command.keys(args);
        for key in &write_keys {
            conn.db().bump_version(key);
        }

        (command.handler)(conn, args)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cmd::test::create_connection;

    #[test]
    fn unknown_command_errors() {
        let d = Dispatcher::new();
        let args = vec![Bytes::from("bogus")];
        assert!(matches!(d.get_handler(&args), Err(Error::CommandNotFound(_))));
    }

    #[test]
    fn wrong_arity_errors() {
        let d = Dispatcher::new();
        let args = vec![Bytes::from("get")];
        assert!(matches!(d.get_handler(&args), Err(Error::InvalidArgsCount(_))));
    }

    #[tokio::test]
    async fn multi_queues_queueable_commands() {
        let conn = create_connection();
        let d = Dispatcher::new();
        let multi = vec![Bytes::from("multi")];
        assert_eq!(Ok(Value::Ok), d.execute(&conn, &multi).await);

        let get = vec![Bytes::from("get"), Bytes::from("k")];
        assert_eq!(Ok(Value::Queued), d.execute(&conn, &get).await);
    }
}
