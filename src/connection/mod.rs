//! # Connection module
use crate::{db::pool::Databases, db::Db, error::Error, value::Value};
use bytes::Bytes;
use parking_lot::RwLock;
use std::{collections::HashSet, net::SocketAddr, sync::Arc};
use tokio::sync::mpsc;

pub mod connections;

/// Possible status of a connection.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ConnectionStatus {
    /// The connection is in a MULTI stage and commands are being queued.
    Multi,
    /// The connection is executing a transaction.
    ExecutingTx,
    /// The connection is a normal connection.
    #[default]
    Normal,
}

/// Connection information guarded behind a single lock.
#[derive(Debug)]
pub struct ConnectionInfo {
    watch_keys: Vec<(Bytes, u32)>,
    tx_keys: HashSet<Bytes>,
    status: ConnectionStatus,
    commands: Option<Vec<Vec<Bytes>>>,
    /// Set when a command failed validation while being queued; forces EXEC
    /// to abort without running anything.
    tx_dirty: bool,
    subscriptions: HashSet<Bytes>,
}

impl ConnectionInfo {
    fn new() -> Self {
        Self {
            watch_keys: vec![],
            tx_keys: HashSet::new(),
            commands: None,
            tx_dirty: false,
            status: ConnectionStatus::Normal,
            subscriptions: HashSet::new(),
        }
    }
}

/// A single client connection.
#[derive(Debug)]
pub struct Connection {
    id: u128,
    databases: Arc<Databases>,
    current_db: RwLock<Arc<Db>>,
    current_db_index: RwLock<usize>,
    all_connections: Arc<connections::Connections>,
    addr: SocketAddr,
    info: RwLock<ConnectionInfo>,
    sender: mpsc::Sender<Value>,
}

impl Connection {
    pub(crate) fn new(
        id: u128,
        db: Arc<Db>,
        databases: Arc<Databases>,
        all_connections: Arc<connections::Connections>,
        addr: SocketAddr,
        sender: mpsc::Sender<Value>,
    ) -> Self {
        Self {
            id,
            databases,
            current_db: RwLock::new(db),
            current_db_index: RwLock::new(0),
            all_connections,
            addr,
            info: RwLock::new(ConnectionInfo::new()),
            sender,
        }
    }

    /// Returns the database currently selected by this connection.
    pub fn db(&self) -> Arc<Db> {
        self.current_db.read().clone()
    }

    /// Index of the database currently selected by this connection.
    pub fn current_db_index(&self) -> usize {
        *self.current_db_index.read()
    }

    /// SELECT index
    pub fn selectdb(&self, index: usize) -> Result<Value, Error> {
        let db = self.databases.get(index)?;
        *self.current_db.write() = db;
        *self.current_db_index.write() = index;
        Ok(Value::Ok)
    }

    /// Returns the global pubsub hub.
    pub fn pubsub(&self) -> Arc<crate::pubsub::Pubsub> {
        self.all_connections.pubsub()
    }

    /// The sender side of this connection's reply channel, used to push
    /// asynchronous frames (pub/sub messages) outside of the request/reply
    /// cycle.
    pub fn sender(&self) -> &mpsc::Sender<Value> {
        &self.sender
    }

    /// Connection ID.
    pub fn id(&self) -> u128 {
        self.id
    }

    /// Drops a MULTI/transaction and resets the connection state.
    pub fn stop_transaction(&self) -> Result<Value, Error> {
        let mut info = self.info.write();
        if info.status == ConnectionStatus::Multi || info.status == ConnectionStatus::ExecutingTx {
            info.commands = None;
            info.watch_keys.clear();
            info.tx_keys.clear();
            info.tx_dirty = false;
            info.status = ConnectionStatus::Normal;
            Ok(Value::Ok)
        } else {
            Err(Error::NotInTx)
        }
    }

    /// Starts a transaction/multi. Nested transactions are not possible.
    pub fn start_transaction(&self) -> Result<Value, Error> {
        let mut info = self.info.write();
        if info.status == ConnectionStatus::Normal {
            info.status = ConnectionStatus::Multi;
            Ok(Value::Ok)
        } else {
            Err(Error::NestedTx)
        }
    }

    /// Returns the status of the connection.
    pub fn status(&self) -> ConnectionStatus {
        self.info.read().status
    }

    /// Marks the currently-queuing transaction as unrunnable. EXEC will
    /// reply EXECABORT instead of running any queued command.
    pub fn mark_tx_dirty(&self) {
        self.info.write().tx_dirty = true;
    }

    /// Whether the current transaction was marked dirty while queuing.
    pub fn is_tx_dirty(&self) -> bool {
        self.info.read().tx_dirty
    }

    /// Watches keys: records their current version so EXEC can detect
    /// concurrent modification.
    pub fn watch_key(&self, keys: &[(&Bytes, u32)]) {
        if self.status() != ConnectionStatus::Normal {
            return;
        }
        let mut info = self.info.write();
        for (key, version) in keys {
            info.watch_keys.push(((*key).clone(), *version));
        }
    }

    /// True if any watched key's version no longer matches what was
    /// recorded by WATCH.
    pub fn did_keys_change(&self) -> bool {
        let info = self.info.read();
        let db = self.db();
        info.watch_keys
            .iter()
            .any(|(key, version)| db.get_version(key) != *version)
    }

    /// Clears the watched keys list.
    pub fn discard_watched_keys(&self) {
        self.info.write().watch_keys.clear()
    }

    /// Queues a command for later execution by EXEC.
    pub fn queue_command(&self, args: &[Bytes]) {
        let mut info = self.info.write();
        let commands = info.commands.get_or_insert_with(Vec::new);
        commands.push(args.to_vec());
    }

    /// Takes the queued commands and moves the connection into the
    /// executing-transaction state.
    pub fn get_queue_commands(&self) -> Option<Vec<Vec<Bytes>>> {
        let mut info = self.info.write();
        info.watch_keys.clear();
        info.status = ConnectionStatus::ExecutingTx;
        info.commands.take()
    }

    /// Starts tracking the pub/sub channels this connection subscribes to.
    pub fn add_subscriptions(&self, channels: &[Bytes]) {
        let mut info = self.info.write();
        for channel in channels {
            info.subscriptions.insert(channel.clone());
        }
    }

    /// Stops tracking the given channels (or all of them, if `channels` is
    /// empty).
    pub fn remove_subscriptions(&self, channels: &[Bytes]) {
        let mut info = self.info.write();
        if channels.is_empty() {
            info.subscriptions.clear();
        } else {
            for channel in channels {
                info.subscriptions.remove(channel);
            }
        }
    }

    /// Channels this connection is currently subscribed to.
    pub fn subscriptions(&self) -> Vec<Bytes> {
        self.info.read().subscriptions.iter().cloned().collect()
    }

    /// Disconnects: drops pub/sub subscriptions and removes itself from the
    /// connection table.
    pub fn destroy(self: Arc<Connection>) {
        let pubsub = self.pubsub();
        pubsub.drop_connection(self.id);
        self.all_connections.clone().remove(self);
    }

    /// Returns the shared connection table.
    pub fn all_connections(&self) -> Arc<connections::Connections> {
        self.all_connections.clone()
    }

    /// Returns the peer address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}
