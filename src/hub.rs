use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

/// The fixed signal sent to every live client after a successful mutation.
/// It carries no payload; clients re-fetch their entries on receipt.
pub const DATA_CHANGED: &str = "changed";

/// Registry of live client connections, notified after every successful
/// mutation of the entry collection.
///
/// Delivery is best-effort: each connection gets its own unbounded channel,
/// so a slow or half-closed socket can never stall the broadcast for the
/// others. A connection whose channel is gone is dropped from the registry
/// on the next broadcast.
#[derive(Debug, Default)]
pub struct NotificationHub {
    connections: Mutex<HashMap<Uuid, mpsc::UnboundedSender<Message>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection and returns its registry ID.
    pub fn register(&self, sender: mpsc::UnboundedSender<Message>) -> Uuid {
        let id = Uuid::new_v4();
        self.connections
            .lock()
            .expect("connection registry poisoned")
            .insert(id, sender);
        tracing::debug!(connection = %id, "client connected");
        id
    }

    /// Removes a connection. Safe to call for an ID that is already gone,
    /// e.g. when a disconnect races with a broadcast that dropped it.
    pub fn unregister(&self, id: Uuid) {
        let removed = self
            .connections
            .lock()
            .expect("connection registry poisoned")
            .remove(&id);
        if removed.is_some() {
            tracing::debug!(connection = %id, "client disconnected");
        }
    }

    /// Returns the number of currently registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections
            .lock()
            .expect("connection registry poisoned")
            .len()
    }

    /// Tells every registered connection that the entry collection changed.
    ///
    /// Never fails: a connection that cannot be reached is removed and the
    /// broadcast continues with the rest.
    pub fn broadcast_changed(&self) {
        let mut connections = self
            .connections
            .lock()
            .expect("connection registry poisoned");
        connections.retain(|id, sender| {
            let delivered = sender.send(Message::Text(DATA_CHANGED.into())).is_ok();
            if !delivered {
                tracing::debug!(connection = %id, "dropping unreachable client");
            }
            delivered
        });
        tracing::debug!(
            connections = connections.len(),
            "broadcast change notification"
        );
    }
}

/// Creates the router for the live-updates WebSocket endpoint.
pub fn create_updates_router(hub: Arc<NotificationHub>) -> Router {
    Router::new()
        .route("/updates", get(updates_handler))
        .with_state(hub)
}

/// Handler for GET /api/v1/updates - upgrades to a WebSocket that receives
/// a change signal whenever entry data changes.
#[tracing::instrument(skip(hub, ws))]
pub async fn updates_handler(
    State(hub): State<Arc<NotificationHub>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| serve_connection(socket, hub))
}

/// Pumps hub notifications to one client until it disconnects.
async fn serve_connection(socket: WebSocket, hub: Arc<NotificationHub>) {
    let (outgoing, incoming) = socket.split();
    serve_transport(outgoing, incoming, hub).await;
}

/// Registers a connection, forwards its notifications over the transport,
/// and unregisters it when the client closes or sending fails. Generic over
/// the transport so the lifecycle can be driven without a real socket.
async fn serve_transport<S, R, E>(mut outgoing: S, mut incoming: R, hub: Arc<NotificationHub>)
where
    S: futures::Sink<Message> + Unpin,
    R: futures::Stream<Item = Result<Message, E>> + Unpin,
{
    let (sender, mut notifications) = mpsc::unbounded_channel();
    let id = hub.register(sender);

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(message) = notification else { break };
                if outgoing.send(message).await.is_err() {
                    break;
                }
            }
            frame = incoming.next() => {
                // Clients send nothing meaningful; we only watch for close.
                match frame {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    hub.unregister(id);
}
