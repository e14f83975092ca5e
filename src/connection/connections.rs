//! # Connections object
//!
//! Keeps track of all active connections. There is one instance of this per
//! running server.
use super::Connection;
use crate::{aof::Aof, db::pool::Databases, dispatcher::Dispatcher, pubsub::Pubsub, value::Value};
use parking_lot::RwLock;
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};
use tokio::sync::mpsc;

/// Default capacity of a connection's outgoing reply channel.
const CHANNEL_CAPACITY: usize = 1024;

/// Tracks every live connection plus the shared server-wide state (database
/// pool, pub/sub hub, dispatcher).
#[derive(Debug)]
pub struct Connections {
    connections: RwLock<BTreeMap<u128, Arc<Connection>>>,
    databases: Arc<Databases>,
    pubsub: Arc<Pubsub>,
    dispatcher: Arc<Dispatcher>,
    counter: RwLock<u128>,
    aof: RwLock<Option<Arc<Aof>>>,
}

impl Connections {
    /// Creates an empty connection table over the given database pool.
    pub fn new(databases: Arc<Databases>) -> Self {
        Self {
            counter: RwLock::new(0),
            databases,
            pubsub: Arc::new(Pubsub::new()),
            dispatcher: Arc::new(Dispatcher::new()),
            connections: RwLock::new(BTreeMap::new()),
            aof: RwLock::new(None),
        }
    }

    /// Returns the database pool.
    pub fn databases(&self) -> Arc<Databases> {
        self.databases.clone()
    }

    /// Installs the append-only writer, once it has finished its startup
    /// replay.
    pub fn set_aof(&self, aof: Arc<Aof>) {
        *self.aof.write() = Some(aof);
    }

    /// Returns the append-only writer, if persistence is enabled.
    pub fn aof(&self) -> Option<Arc<Aof>> {
        self.aof.read().clone()
    }

    /// Returns the dispatcher instance.
    pub fn get_dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Returns the pubsub hub.
    pub fn pubsub(&self) -> Arc<Pubsub> {
        self.pubsub.clone()
    }

    /// Removes a connection from the table.
    pub fn remove(self: Arc<Connections>, conn: Arc<Connection>) {
        self.connections.write().remove(&conn.id());
    }

    /// Creates a new connection attached to database 0.
    pub fn new_connection(
        self: &Arc<Connections>,
        addr: SocketAddr,
    ) -> (mpsc::Receiver<Value>, Arc<Connection>) {
        let mut id = self.counter.write();
        *id += 1;

        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let db = self.databases.get(0).expect("database 0 always exists");

        let conn = Arc::new(Connection::new(
            *id,
            db,
            self.databases.clone(),
            self.clone(),
            addr,
            sender,
        ));

        self.connections.write().insert(*id, conn.clone());
        (receiver, conn)
    }

    /// Iterates over all connections.
    pub fn iter(&self, f: &mut dyn FnMut(Arc<Connection>)) {
        for value in self.connections.read().values() {
            f(value.clone())
        }
    }
}
