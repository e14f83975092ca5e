//! # Append-only persistence
//!
//! A single background writer drains a bounded queue of `(db_index,
//! command)` pairs and serializes each as a RESP multi-bulk array to the
//! append-only file. When the database index changes between entries a
//! synthetic `SELECT` is written first, so replay routes commands to the
//! right database. On startup the file is replayed against a disconnected
//! connection before the writer and the TCP listeners start accepting
//! traffic.
use crate::{
    connection::{connections::Connections, Connection},
    dispatcher::Dispatcher,
    error::Error,
    value::Value,
};
use bytes::{Bytes, BytesMut};
use log::{error, info};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::{
    fs::OpenOptions,
    io::{AsyncReadExt, AsyncWriteExt},
    sync::mpsc,
};
use tokio_util::codec::Decoder;

/// Capacity of the in-memory AOF queue. The producer blocks once full,
/// which is the accepted form of backpressure.
const AOF_QUEUE_SIZE: usize = 1 << 16;

/// Handle to the append-only persistence channel.
#[derive(Debug)]
pub struct Aof {
    sender: mpsc::Sender<(usize, Vec<Bytes>)>,
}

impl Aof {
    /// Replays `path` (if it exists) against a throwaway connection, then
    /// spawns the background writer and returns a handle producers can
    /// enqueue mutations on.
    pub async fn start(
        path: String,
        all_connections: Arc<Connections>,
    ) -> Result<Arc<Self>, Error> {
        Self::replay(&path, &all_connections).await;

        let (sender, mut receiver) = mpsc::channel::<(usize, Vec<Bytes>)>(AOF_QUEUE_SIZE);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .read(true)
            .open(&path)
            .await?;

        tokio::spawn(async move {
            let mut file = file;
            let mut current_db = 0usize;

            while let Some((db_index, args)) = receiver.recv().await {
                if db_index != current_db {
                    let select = encode(&[
                        Bytes::from("select"),
                        Bytes::from(db_index.to_string()),
                    ]);
                    if let Err(e) = file.write_all(&select).await {
                        error!("AOF write error: {}", e);
                        continue;
                    }
                    current_db = db_index;
                }

                if let Err(e) = file.write_all(&encode(&args)).await {
                    error!("AOF write error: {}", e);
                    continue;
                }
            }
        });

        Ok(Arc::new(Self { sender }))
    }

    /// Enqueues a mutating command for persistence. Backpressure from a
    /// full queue is applied to the caller.
    pub async fn append(&self, db_index: usize, args: &[Bytes]) {
        let _ = self.sender.send((db_index, args.to_vec())).await;
    }

    async fn replay(path: &str, all_connections: &Arc<Connections>) {
        let mut file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                error!("could not open append-only file {}: {}", path, e);
                return;
            }
        };

        info!("Loading append-only file {}", path);

        let dispatcher = Dispatcher::new();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0);
        let (_rx, conn) = all_connections.new_connection(addr);

        let mut decoder = crate::resp::RespCodec::default();
        let mut buf = BytesMut::new();
        let mut chunk = [0u8; 8192];

        loop {
            match file.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    error!("error reading append-only file: {}", e);
                    break;
                }
            }

            while let Ok(Some(args)) = decoder.decode(&mut buf) {
                if args.is_empty() {
                    continue;
                }
                if let Err(e) = Self::replay_one(&dispatcher, &conn, &args) {
                    error!("error replaying append-only entry: {:?}", e);
                }
            }
        }

        conn.destroy();
    }

    fn replay_one(dispatcher: &Dispatcher, conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
        dispatcher.run(conn, args)
    }
}

fn encode(args: &[Bytes]) -> Vec<u8> {
    Value::Array(args.iter().cloned().map(Value::Blob).collect()).into()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db::pool::Databases;

    #[tokio::test]
    async fn replay_applies_persisted_commands() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("aof-test-{}.aof", std::process::id()));
        let path = path.to_str().unwrap().to_owned();
        let _ = std::fs::remove_file(&path);

        let set_cmd = encode(&[Bytes::from("set"), Bytes::from("k"), Bytes::from("v")]);
        tokio::fs::write(&path, &set_cmd).await.unwrap();

        let (_, databases) = Databases::new(4, 64);
        let all_connections = Arc::new(Connections::new(databases));

        let aof = Aof::start(path.clone(), all_connections.clone()).await.unwrap();

        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 1);
        let (_, conn) = all_connections.new_connection(addr);
        assert_eq!(Ok("v".into()), crate::cmd::string::get(&conn, &[Bytes::from("get"), Bytes::from("k")]));

        aof.append(0, &[Bytes::from("set"), Bytes::from("k2"), Bytes::from("v2")]).await;
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn writes_inside_a_transaction_are_persisted() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("aof-tx-test-{}.aof", std::process::id()));
        let path = path.to_str().unwrap().to_owned();
        let _ = std::fs::remove_file(&path);

        let (_, databases) = Databases::new(4, 64);
        let all_connections = Arc::new(Connections::new(databases));
        let aof = Aof::start(path.clone(), all_connections.clone()).await.unwrap();
        all_connections.set_aof(aof);

        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 2);
        let (_, conn) = all_connections.new_connection(addr);
        let dispatcher = all_connections.get_dispatcher();

        dispatcher.execute(&conn, &[Bytes::from("multi")]).await.unwrap();
        dispatcher
            .execute(&conn, &[Bytes::from("set"), Bytes::from("k"), Bytes::from("v")])
            .await
            .unwrap();
        dispatcher.execute(&conn, &[Bytes::from("exec")]).await.unwrap();

        let mut contents = Vec::new();
        for _ in 0..50 {
            contents = tokio::fs::read(&path).await.unwrap_or_default();
            if !contents.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(contents, encode(&[Bytes::from("set"), Bytes::from("k"), Bytes::from("v")]));
        let _ = std::fs::remove_file(&path);
    }
}
