//! # Server
//!
//! Redis-compatible TCP (and, on Unix, Unix-socket) server: one task per
//! accepted connection, each pairing a `RespCodec`-framed transport with the
//! shared dispatcher.
use crate::{
    aof::Aof,
    config::Config,
    connection::{connections::Connections, Connection},
    db::pool::Databases,
    dispatcher::Dispatcher,
    error::Error,
    resp::RespCodec,
    value::Value,
};
use bytes::Bytes;
use futures::{future, SinkExt};
use log::{info, trace, warn};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};
#[cfg(unix)]
use tokio::net::UnixListener;
use tokio::net::TcpListener;
use tokio_stream::StreamExt;
use tokio_util::codec::Framed;

/// Spawns the TCP listener, accepting connections forever.
async fn serve_tcp(addr: &str, all_connections: Arc<Connections>) -> Result<(), Error> {
    let listener = TcpListener::bind(addr).await?;
    info!("Starting server {}", addr);
    info!("Ready to accept connections on {}", addr);
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                let transport = Framed::new(socket, RespCodec::default());
                let all_connections = all_connections.clone();
                tokio::spawn(async move {
                    handle_new_connection(transport, all_connections, addr).await;
                });
            }
            Err(e) => warn!("error accepting socket; error = {:?}", e),
        }
    }
}

#[cfg(unix)]
async fn serve_unixsocket(file: &str, all_connections: Arc<Connections>) -> Result<(), Error> {
    use std::fs::remove_file;

    info!("Ready to accept connections on unix://{}", file);
    let _ = remove_file(file);
    let listener = UnixListener::bind(file)?;
    loop {
        match listener.accept().await {
            Ok((socket, _addr)) => {
                let transport = Framed::new(socket, RespCodec::default());
                let all_connections = all_connections.clone();
                let fake_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 0);
                tokio::spawn(async move {
                    handle_new_connection(transport, all_connections, fake_addr).await;
                });
            }
            Err(e) => warn!("error accepting socket; error = {:?}", e),
        }
    }
}

#[inline]
async fn execute_command(
    conn: &Connection,
    dispatcher: &Dispatcher,
    aof: Option<&Arc<Aof>>,
    current_db: usize,
    args: Vec<Bytes>,
) -> Option<Value> {
    let is_write = dispatcher
        .get_handler(&args)
        .map(|command| command.is_write)
        .unwrap_or(false);

    match dispatcher.execute(conn, &args).await {
        Ok(result) => {
            if is_write {
                if let Some(aof) = aof {
                    aof.append(current_db, &args).await;
                }
            }
            Some(result)
        }
        Err(Error::EmptyLine) => Some(Value::Ignore),
        Err(Error::Quit) => None,
        Err(err) => Some(err.into()),
    }
}

/// Drives a single accepted connection until it disconnects.
#[inline]
async fn handle_new_connection<T>(
    mut transport: Framed<T, RespCodec>,
    all_connections: Arc<Connections>,
    addr: SocketAddr,
) where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut pubsub, conn) = all_connections.new_connection(addr);
    let dispatcher = all_connections.get_dispatcher();
    let aof = all_connections.aof();
    trace!("New connection {}", conn.id());

    loop {
        tokio::select! {
            Some(msg) = pubsub.recv() => {
                if transport.send(msg).await.is_err() {
                    break;
                }
            }
            result = transport.next() => match result {
                Some(Ok(args)) => {
                    let current_db = conn.current_db_index();
                    match execute_command(&conn, &dispatcher, aof.as_ref(), current_db, args).await {
                        Some(result) => {
                            if result != Value::Ignore && transport.send(result).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            let _ = transport.send(Value::Ok).await;
                            break;
                        }
                    }
                },
                Some(Err(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                    warn!("protocol error from {}; error = {:?}", addr, e);
                    let reply: Value = Error::Protocol("a valid frame".to_owned(), e.to_string()).into();
                    if transport.send(reply).await.is_err() {
                        break;
                    }
                },
                Some(Err(e)) => {
                    warn!("error on decoding from socket; error = {:?}", e);
                    break;
                },
                None => break,
            }
        }
    }
    conn.destroy();
}

/// Starts the database pool, the append-only writer (if enabled), and every
/// configured listener. Blocks forever.
pub async fn serve(config: Config) -> Result<(), Error> {
    let (_default_db, databases) = Databases::new(config.databases as usize, 1024);
    let all_connections = Arc::new(Connections::new(databases));

    if config.append_only {
        let aof = Aof::start(config.append_filename.clone(), all_connections.clone()).await?;
        all_connections.set_aof(aof);
    }

    let mut services = vec![];

    for host in config.get_tcp_hostnames() {
        let all_connections = all_connections.clone();
        services.push(tokio::spawn(async move { serve_tcp(&host, all_connections).await }));
    }

    #[cfg(unix)]
    if let Some(file) = config.unixsocket {
        let all_connections = all_connections.clone();
        services.push(tokio::spawn(async move { serve_unixsocket(&file, all_connections).await }));
    }

    future::join_all(services).await;

    Ok(())
}
