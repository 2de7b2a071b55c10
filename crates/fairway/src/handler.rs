//! Per-connection handler: greeting, message loop and outbound queue.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound queue in the hub → send `connected`
//!   2. Loop: decode inbound envelopes → relay, and drain the queue
//!      onto the socket
//!   3. Close on client close, read error or idle timeout

use std::sync::Arc;

use fairway_protocol::{
    Channel, ClientEnvelope, ClientMessage, Codec, Envelope, PlayerId,
    ServerMessage,
};
use fairway_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::FairwayError;
use crate::relay;
use crate::server::ServerState;

/// Drop guard that removes a player's queue from the hub when the handler
/// exits, including on error.
struct HubGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
}

impl Drop for HubGuard {
    fn drop(&mut self) {
        self.state.hub().unregister(self.player_id);
        tracing::info!(player_id = %self.player_id, "player disconnected");
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), FairwayError> {
    let player_id = PlayerId::from(conn.id());
    let (tx, mut rx) = mpsc::unbounded_channel();

    let connections = {
        let mut hub = state.hub();
        hub.register(player_id, tx);
        hub.len()
    };
    let _guard = HubGuard {
        player_id,
        state: Arc::clone(&state),
    };
    tracing::info!(%player_id, connections, "player connected");

    let mut seq: u64 = 1;
    send_message(
        &conn,
        &state,
        &mut seq,
        Channel::ReliableOrdered,
        ServerMessage::Connected {
            player_id,
            server_time: state.now_ms(),
        },
    )
    .await?;

    let idle = tokio::time::sleep(state.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::debug!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(Instant::now() + state.idle_timeout);
                handle_frame(&conn, &state, player_id, &data, &mut seq).await?;
            }
            Some(outbound) = rx.recv() => {
                send_message(&conn, &state, &mut seq, outbound.channel, outbound.message)
                    .await?;
            }
            () = &mut idle => {
                tracing::info!(%player_id, "connection idle, closing");
                let _ = conn.close().await;
                break;
            }
        }
    }

    // _guard drops here → queue removed from the hub.
    Ok(())
}

/// Decodes one inbound frame and acts on it.
async fn handle_frame(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
    player_id: PlayerId,
    data: &[u8],
    seq: &mut u64,
) -> Result<(), FairwayError> {
    let envelope: ClientEnvelope = match state.codec.decode(data) {
        Ok(env) => env,
        Err(e) => {
            tracing::debug!(%player_id, error = %e, "failed to decode envelope");
            let error = ServerMessage::Error {
                code: 400,
                message: format!("invalid message: {e}"),
            };
            return send_message(conn, state, seq, Channel::ReliableOrdered, error).await;
        }
    };

    match envelope.payload {
        ClientMessage::Heartbeat { client_time } => {
            let ack = ServerMessage::HeartbeatAck {
                client_time,
                server_time: state.now_ms(),
            };
            send_message(conn, state, seq, Channel::ReliableOrdered, ack).await
        }
        msg => {
            let mut rooms = state.rooms.lock().await;
            let effects = relay::dispatch(&mut rooms, player_id, msg);
            state.apply_effects(effects);
            Ok(())
        }
    }
}

/// Wraps `message` in an envelope and writes it to the socket.
async fn send_message(
    conn: &WebSocketConnection,
    state: &ServerState,
    seq: &mut u64,
    channel: Channel,
    message: ServerMessage,
) -> Result<(), FairwayError> {
    let envelope = Envelope {
        seq: next_seq(seq),
        timestamp: state.now_ms(),
        channel,
        payload: message,
    };
    let bytes = state.codec.encode(&envelope)?;
    match channel {
        Channel::Unreliable => conn.send_unreliable(&bytes).await?,
        Channel::ReliableOrdered | Channel::ReliableUnordered => conn.send(&bytes).await?,
    }
    Ok(())
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_seq_counts_up() {
        let mut seq = 1;
        assert_eq!(next_seq(&mut seq), 1);
        assert_eq!(next_seq(&mut seq), 2);
        assert_eq!(seq, 3);
    }
}
