//! Connection hub: the outbound queue of every live connection.

use std::collections::HashMap;

use fairway_protocol::{Channel, PlayerId, ServerMessage};
use tokio::sync::mpsc;

use crate::relay::Delivery;

/// One message waiting to be written to a socket.
#[derive(Debug, Clone)]
pub(crate) struct Outbound {
    pub channel: Channel,
    pub message: ServerMessage,
}

pub(crate) type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// Maps each connected player to its connection task's queue.
///
/// Held behind a synchronous mutex: every operation is a map lookup plus
/// a non-blocking channel send.
#[derive(Debug, Default)]
pub(crate) struct ConnectionHub {
    senders: HashMap<PlayerId, OutboundSender>,
}

impl ConnectionHub {
    pub fn register(&mut self, player_id: PlayerId, sender: OutboundSender) {
        self.senders.insert(player_id, sender);
    }

    pub fn unregister(&mut self, player_id: PlayerId) {
        self.senders.remove(&player_id);
    }

    /// Queues `delivery` for each recipient that is still connected.
    /// Returns how many queues accepted it.
    pub fn deliver(&self, delivery: Delivery) -> usize {
        let Delivery { to, channel, message } = delivery;
        let mut delivered = 0;
        for player_id in to {
            let Some(sender) = self.senders.get(&player_id) else {
                continue;
            };
            let outbound = Outbound {
                channel,
                message: message.clone(),
            };
            if sender.send(outbound).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }
}
