//! # Pub/sub hub
//!
//! One instance lives for the whole server. Channel names map to the set of
//! subscribed connections; publishing walks that set and pushes a message
//! frame down each subscriber's reply channel. A write failure on one
//! subscriber (a closed socket racing with `publish`) never aborts the
//! fan-out to the rest.
use crate::value::Value;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;

type Sender = mpsc::Sender<Value>;

/// Server-wide channel-to-subscribers registry.
#[derive(Debug, Default)]
pub struct Pubsub {
    channels: RwLock<HashMap<Bytes, HashMap<u128, Sender>>>,
}

impl Pubsub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `(conn_id, sender)` to each channel, pushing a confirmation
    /// frame `[subscribe, channel, total subscriptions for this conn]` to the
    /// subscriber itself for every channel.
    pub fn subscribe(&self, conn_id: u128, sender: &Sender, channels: &[Bytes]) {
        let mut map = self.channels.write();
        for channel in channels {
            map.entry(channel.clone())
                .or_default()
                .insert(conn_id, sender.clone());

            let count = map.values().filter(|subs| subs.contains_key(&conn_id)).count();
            let _ = sender.try_send(Value::Array(vec![
                "subscribe".into(),
                Value::Blob(channel.clone()),
                Value::Integer(count as i64),
            ]));
        }
    }

    /// Unsubscribes `conn_id` from `channels`, or every channel it is on if
    /// `channels` is empty. Returns the number of channels left unsubscribed
    /// from.
    pub fn unsubscribe(&self, conn_id: u128, sender: &Sender, channels: &[Bytes]) -> usize {
        let mut map = self.channels.write();

        let targets: Vec<Bytes> = if channels.is_empty() {
            map.iter()
                .filter(|(_, subs)| subs.contains_key(&conn_id))
                .map(|(channel, _)| channel.clone())
                .collect()
        } else {
            channels.to_vec()
        };

        if targets.is_empty() {
            let _ = sender.try_send(Value::Array(vec!["unsubscribe".into(), Value::Null, Value::Integer(0)]));
            return 0;
        }

        let mut removed = 0;
        for channel in &targets {
            if let Some(subs) = map.get_mut(channel) {
                if subs.remove(&conn_id).is_some() {
                    removed += 1;
                }
                if subs.is_empty() {
                    map.remove(channel);
                }
            }
            let remaining = map.values().filter(|subs| subs.contains_key(&conn_id)).count();
            let _ = sender.try_send(Value::Array(vec![
                "unsubscribe".into(),
                Value::Blob(channel.clone()),
                Value::Integer(remaining as i64),
            ]));
        }
        removed
    }

    /// Fans `message` out to every subscriber of `channel`. Returns how many
    /// subscribers received it.
    pub fn publish(&self, channel: &Bytes, message: &Bytes) -> usize {
        let map = self.channels.read();
        let Some(subs) = map.get(channel) else {
            return 0;
        };

        subs.values()
            .filter(|sender| {
                sender
                    .try_send(Value::Array(vec![
                        "message".into(),
                        Value::Blob(channel.clone()),
                        Value::Blob(message.clone()),
                    ]))
                    .is_ok()
            })
            .count()
    }

    /// Drops every subscription held by `conn_id`, across all channels.
    pub fn drop_connection(&self, conn_id: u128) {
        let mut map = self.channels.write();
        map.retain(|_, subs| {
            subs.remove(&conn_id);
            !subs.is_empty()
        });
    }
}
