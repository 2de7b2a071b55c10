//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! A background task accepts TCP connections and runs each WebSocket
//! upgrade in its own task, so one slow client cannot hold up the others.
//! Finished upgrades are handed to [`Transport::accept`] through a
//! channel.
//!
//! Each connection's socket is split into its sink and stream halves,
//! each behind its own lock, so a connection task can wait in `recv`
//! while a broadcast goes out through `send`.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// A client must complete the WebSocket upgrade within this long.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upgraded connections waiting for `accept`.
const BACKLOG: usize = 64;

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] listening on a TCP port.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    incoming: mpsc::Receiver<WebSocketConnection>,
    listener_task: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds to `addr` and starts accepting in the background.
    ///
    /// Use port `0` to let the OS pick one, then read it back with
    /// [`local_addr`](Self::local_addr).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            TransportError::Bind {
                addr: addr.to_string(),
                source,
            }
        })?;
        let local_addr = listener.local_addr().map_err(|source| {
            TransportError::Bind {
                addr: addr.to_string(),
                source,
            }
        })?;
        tracing::info!(%local_addr, "WebSocket transport listening");

        let (tx, incoming) = mpsc::channel(BACKLOG);
        let listener_task = tokio::spawn(listen(listener, tx));
        Ok(Self {
            local_addr,
            incoming,
            listener_task,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Accepts TCP connections until the receiving side goes away.
async fn listen(listener: TcpListener, tx: mpsc::Sender<WebSocketConnection>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                // Usually fd exhaustion; back off instead of spinning.
                tracing::warn!(error = %e, "TCP accept failed");
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };
        if tx.is_closed() {
            break;
        }
        let tx = tx.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(HANDSHAKE_TIMEOUT, tokio_tungstenite::accept_async(stream)).await {
                Ok(Ok(ws)) => {
                    let conn = WebSocketConnection::new(ws);
                    tracing::debug!(id = %conn.id, %peer, "accepted WebSocket connection");
                    let _ = tx.send(conn).await;
                }
                Ok(Err(e)) => {
                    tracing::debug!(%peer, error = %e, "WebSocket handshake failed");
                }
                Err(_) => {
                    tracing::debug!(%peer, "WebSocket handshake timed out");
                }
            }
        });
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        self.incoming.recv().await.ok_or(TransportError::Shutdown)
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        self.listener_task.abort();
        tracing::info!(local_addr = %self.local_addr, "WebSocket transport shut down");
        Ok(())
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.listener_task.abort();
    }
}

/// A single WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    fn new(ws: WsStream) -> Self {
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        let (sink, stream) = ws.split();
        Self {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }

    fn send_error(&self, e: tungstenite::Error) -> TransportError {
        match e {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::ConnectionClosed(self.id.to_string())
            }
            other => TransportError::SendFailed(io::Error::new(io::ErrorKind::BrokenPipe, other)),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = Message::Binary(data.to_vec().into());
        let mut sink = self.sink.lock().await;
        sink.send(msg).await.map_err(|e| self.send_error(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Pings are answered by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(tungstenite::Error::ConnectionClosed)) => return Ok(None),
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        let mut sink = self.sink.lock().await;
        sink.close().await.map_err(|e| self.send_error(e))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
