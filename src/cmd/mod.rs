//! # All command handlers
pub mod hash;
pub mod key;
pub mod list;
pub mod pubsub;
pub mod set;
pub mod sorted_set;
pub mod string;
pub mod transaction;

#[cfg(test)]
#[allow(missing_docs)]
pub mod test {
    use crate::{
        connection::{connections::Connections, Connection},
        db::pool::Databases,
        error::Error,
        value::Value,
    };
    use bytes::Bytes;
    use std::{
        net::{IpAddr, Ipv4Addr, SocketAddr},
        sync::Arc,
    };
    use tokio::sync::mpsc::Receiver;

    const TEST_DATABASES: usize = 16;
    const TEST_SLOTS: usize = 256;

    fn client_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080)
    }

    pub fn create_connection() -> Arc<Connection> {
        let (_, databases) = Databases::new(TEST_DATABASES, TEST_SLOTS);
        let all_connections = Arc::new(Connections::new(databases));
        all_connections.new_connection(client_addr()).1
    }

    pub fn create_connection_and_pubsub() -> (Receiver<Value>, Arc<Connection>) {
        let (_, databases) = Databases::new(TEST_DATABASES, TEST_SLOTS);
        let all_connections = Arc::new(Connections::new(databases));
        all_connections.new_connection(client_addr())
    }

    pub fn create_new_connection_from_connection(
        conn: &Connection,
    ) -> (Receiver<Value>, Arc<Connection>) {
        conn.all_connections().new_connection(client_addr())
    }

    pub async fn run_command(conn: &Connection, cmd: &[&str]) -> Result<Value, Error> {
        let args: Vec<Bytes> = cmd.iter().map(|s| Bytes::from(s.to_string())).collect();
        let dispatcher = conn.all_connections().get_dispatcher();
        dispatcher.execute(conn, &args).await
    }
}
