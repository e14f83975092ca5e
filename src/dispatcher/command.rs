//! # Command registry
//!
//! Every supported command, expressed as a data-only `Command` record: a
//! handler function, an arity check, and a key analyzer used by the
//! transaction engine to bump version counters and compute undo logs.
use crate::{cmd, connection::Connection, error::Error, value::Value};
use bytes::Bytes;

type Handler = fn(&Connection, &[Bytes]) -> Result<Value, Error>;
type KeyAnalyzer = fn(&[Bytes]) -> (Vec<Bytes>, Vec<Bytes>);

/// A registered command.
#[derive(Clone, Copy)]
pub struct Command {
    /// Lowercased command name.
    pub name: &'static str,
    /// `>= 0`: exact argument count (including the command name). `< 0`: at
    /// least `-arity`.
    pub arity: i32,
    /// The function that runs the command.
    pub handler: Handler,
    keys_fn: KeyAnalyzer,
    /// Whether the command may be queued inside MULTI.
    pub queueable: bool,
    /// Whether the command mutates the keyspace (drives version bumping and
    /// AOF logging).
    pub is_write: bool,
}

impl Command {
    /// `(write_keys, read_keys)` for this invocation.
    pub fn keys(&self, args: &[Bytes]) -> (Vec<Bytes>, Vec<Bytes>) {
        (self.keys_fn)(args)
    }

    /// Whether `args` satisfies this command's arity requirement.
    pub fn check_arity(&self, args: &[Bytes]) -> bool {
        if self.arity >= 0 {
            args.len() as i32 == self.arity
        } else {
            args.len() as i32 >= -self.arity
        }
    }

    /// Looks up a command by its lowercased name.
    pub fn lookup(name: &str) -> Option<Command> {
        use cmd::*;

        macro_rules! cmd {
            ($name:literal, $arity:expr, $handler:expr, $keys:expr, $queueable:expr, $is_write:expr) => {
                Some(Command {
                    name: $name,
                    arity: $arity,
                    handler: $handler,
                    keys_fn: $keys,
                    queueable: $queueable,
                    is_write: $is_write,
                })
            };
        }

        match name {
            // strings
            "get" => cmd!("get", 2, string::get, read_first_key, true, false),
            "set" => cmd!("set", -3, string::set, write_first_key, true, true),
            "setnx" => cmd!("setnx", 3, string::setnx, write_first_key, true, true),
            "getset" => cmd!("getset", 3, string::getset, write_first_key, true, true),
            "strlen" => cmd!("strlen", 2, string::strlen, read_first_key, true, false),

            // generic keys
            "del" => cmd!("del", -2, key::del, write_all_keys, true, true),
            "exists" => cmd!("exists", -2, key::exists, read_all_keys, true, false),
            "flushdb" => cmd!("flushdb", 1, key::flushdb, no_prepare, false, true),
            "type" => cmd!("type", 2, key::data_type, read_first_key, true, false),
            "rename" => cmd!("rename", 3, key::rename, rename_keys, true, true),
            "renamenx" => cmd!("renamenx", 3, key::renamenx, rename_keys, true, true),
            "keys" => cmd!("keys", 2, key::keys, no_prepare, true, false),
            "ping" => cmd!("ping", -1, key::ping, no_prepare, true, false),
            "select" => cmd!("select", 2, key::select, no_prepare, true, false),

            // lists
            "lpush" => cmd!("lpush", -3, list::lpush, write_first_key, true, true),
            "rpush" => cmd!("rpush", -3, list::rpush, write_first_key, true, true),
            "lpushx" => cmd!("lpushx", -3, list::lpushx, write_first_key, true, true),
            "rpushx" => cmd!("rpushx", -3, list::rpushx, write_first_key, true, true),
            "lpop" => cmd!("lpop", 2, list::lpop, write_first_key, true, true),
            "rpop" => cmd!("rpop", 2, list::rpop, write_first_key, true, true),
            "lrem" => cmd!("lrem", 4, list::lrem, write_first_key, true, true),
            "llen" => cmd!("llen", 2, list::llen, read_first_key, true, false),
            "lindex" => cmd!("lindex", 3, list::lindex, read_first_key, true, false),
            "lset" => cmd!("lset", 4, list::lset, write_first_key, true, true),
            "lrange" => cmd!("lrange", 4, list::lrange, read_first_key, true, false),

            // hashes
            "hset" => cmd!("hset", -4, hash::hset, write_first_key, true, true),
            "hsetnx" => cmd!("hsetnx", 4, hash::hsetnx, write_first_key, true, true),
            "hget" => cmd!("hget", 3, hash::hget, read_first_key, true, false),
            "hexists" => cmd!("hexists", 3, hash::hexists, read_first_key, true, false),
            "hdel" => cmd!("hdel", -3, hash::hdel, write_first_key, true, true),
            "hlen" => cmd!("hlen", 2, hash::hlen, read_first_key, true, false),
            "hmset" => cmd!("hmset", -4, hash::hmset, write_first_key, true, true),
            "hmget" => cmd!("hmget", -3, hash::hmget, read_first_key, true, false),
            "hkeys" => cmd!("hkeys", 2, hash::hkeys, read_first_key, true, false),
            "hvals" => cmd!("hvals", 2, hash::hvals, read_first_key, true, false),
            "hgetall" => cmd!("hgetall", 2, hash::hgetall, read_first_key, true, false),

            // sets
            "sadd" => cmd!("sadd", -3, set::sadd, write_first_key, true, true),
            "sismember" => cmd!("sismember", 3, set::sismember, read_first_key, true, false),
            "srem" => cmd!("srem", -3, set::srem, write_first_key, true, true),
            "scard" => cmd!("scard", 2, set::scard, read_first_key, true, false),
            "smembers" => cmd!("smembers", 2, set::smembers, read_first_key, true, false),
            "sinter" => cmd!("sinter", -2, set::sinter, read_all_keys, true, false),
            "sunion" => cmd!("sunion", -2, set::sunion, read_all_keys, true, false),
            "sdiff" => cmd!("sdiff", -2, set::sdiff, read_all_keys, true, false),

            // sorted sets
            "zadd" => cmd!("zadd", -4, sorted_set::zadd, write_first_key, true, true),
            "zscore" => cmd!("zscore", 3, sorted_set::zscore, read_first_key, true, false),
            "zrank" => cmd!("zrank", 3, sorted_set::zrank, read_first_key, true, false),
            "zcount" => cmd!("zcount", 4, sorted_set::zcount, read_first_key, true, false),
            "zcard" => cmd!("zcard", 2, sorted_set::zcard, read_first_key, true, false),
            "zrange" => cmd!("zrange", -4, sorted_set::zrange, read_first_key, true, false),
            "zrem" => cmd!("zrem", -3, sorted_set::zrem, write_first_key, true, true),
            "zremrangebyscore" => cmd!(
                "zremrangebyscore",
                4,
                sorted_set::zremrangebyscore,
                write_first_key,
                true,
                true
            ),
            "zremrangebyrank" => cmd!(
                "zremrangebyrank",
                4,
                sorted_set::zremrangebyrank,
                write_first_key,
                true,
                true
            ),

            // transactions
            "multi" => cmd!("multi", 1, transaction::multi, no_prepare, false, false),
            "exec" => cmd!("exec", 1, transaction::exec, no_prepare, false, false),
            "discard" => cmd!("discard", 1, transaction::discard, no_prepare, false, false),
            "watch" => cmd!("watch", -2, transaction::watch, no_prepare, false, false),
            "getver" => cmd!("getver", 2, transaction::getver, read_first_key, true, false),

            // pub/sub
            "subscribe" => cmd!("subscribe", -2, pubsub::subscribe, no_prepare, false, false),
            "unsubscribe" => cmd!("unsubscribe", -1, pubsub::unsubscribe, no_prepare, false, false),
            "publish" => cmd!("publish", 3, pubsub::publish, no_prepare, true, false),

            _ => None,
        }
    }
}

/// No keys are touched.
pub fn no_prepare(_args: &[Bytes]) -> (Vec<Bytes>, Vec<Bytes>) {
    (vec![], vec![])
}

/// `args[1]` is read.
pub fn read_first_key(args: &[Bytes]) -> (Vec<Bytes>, Vec<Bytes>) {
    (vec![], vec![args[1].clone()])
}

/// `args[1]` is written.
pub fn write_first_key(args: &[Bytes]) -> (Vec<Bytes>, Vec<Bytes>) {
    (vec![args[1].clone()], vec![])
}

/// Every key from `args[1..]` is read.
pub fn read_all_keys(args: &[Bytes]) -> (Vec<Bytes>, Vec<Bytes>) {
    (vec![], args[1..].to_vec())
}

/// Every key from `args[1..]` is written.
pub fn write_all_keys(args: &[Bytes]) -> (Vec<Bytes>, Vec<Bytes>) {
    (args[1..].to_vec(), vec![])
}

/// `args[1]` and `args[2]` are both written.
pub fn rename_keys(args: &[Bytes]) -> (Vec<Bytes>, Vec<Bytes>) {
    (vec![args[1].clone(), args[2].clone()], vec![])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_checks_arity() {
        let get = Command::lookup("get").unwrap();
        assert!(get.check_arity(&[Bytes::from("get"), Bytes::from("k")]));
        assert!(!get.check_arity(&[Bytes::from("get")]));
    }

    #[test]
    fn unknown_command_is_none() {
        assert!(Command::lookup("bogus").is_none());
    }

    #[test]
    fn write_first_key_reports_single_write_key() {
        let args = vec![Bytes::from("set"), Bytes::from("k"), Bytes::from("v")];
        assert_eq!(write_first_key(&args), (vec![Bytes::from("k")], vec![]));
    }
}
