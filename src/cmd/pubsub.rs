//! # Pub/sub command handlers
use crate::{connection::Connection, error::Error, value::Value};
use bytes::Bytes;

/// SUBSCRIBE channel [channel ...]
pub fn subscribe(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let channels = &args[1..];
    conn.add_subscriptions(channels);
    conn.pubsub().subscribe(conn.id(), conn.sender(), channels);
    Ok(Value::Ignore)
}

/// UNSUBSCRIBE [channel ...]
pub fn unsubscribe(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let channels = &args[1..];
    conn.remove_subscriptions(channels);
    conn.pubsub().unsubscribe(conn.id(), conn.sender(), channels);
    Ok(Value::Ignore)
}

/// PUBLISH channel message
pub fn publish(conn: &Connection, args: &[Bytes]) -> Result<Value, Error> {
    let count = conn.pubsub().publish(&args[1], &args[2]);
    Ok(Value::Integer(count as i64))
}

#[cfg(test)]
mod test {
    use crate::{
        cmd::test::{create_connection_and_pubsub, create_new_connection_from_connection, run_command},
        value::Value,
    };

    #[tokio::test]
    async fn subscribe_then_publish_delivers_message() {
        let (mut recv, c1) = create_connection_and_pubsub();
        let (_, c2) = create_new_connection_from_connection(&c1);

        run_command(&c1, &["subscribe", "foo"]).await.unwrap();
        assert_eq!(
            Some(Value::Array(vec!["subscribe".into(), "foo".into(), Value::Integer(1)])),
            recv.recv().await
        );

        assert_eq!(
            Ok(Value::Integer(1)),
            run_command(&c2, &["publish", "foo", "hi"]).await
        );
        assert_eq!(
            Some(Value::Array(vec!["message".into(), "foo".into(), "hi".into()])),
            recv.recv().await
        );
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let (mut recv, c1) = create_connection_and_pubsub();
        run_command(&c1, &["subscribe", "foo"]).await.unwrap();
        recv.recv().await;

        run_command(&c1, &["unsubscribe", "foo"]).await.unwrap();
        recv.recv().await;

        assert_eq!(
            Ok(Value::Integer(0)),
            run_command(&c1, &["publish", "foo", "hi"]).await
        );
    }
}
