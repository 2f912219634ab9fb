use axum::extract::ws::{Message, WebSocket};
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::SharedState;

/// Handle the full lifecycle of an aggregate scoreboard connection.
///
/// The current aggregate is queued on connect; later broadcasts arrive through the scoreboard
/// hub. Inbound frames are only read to notice the client going away.
pub async fn handle_scoreboard_socket(state: SharedState, socket: WebSocket) {
    let connection = Uuid::new_v4();
    let (sender, mut receiver) = socket.split();
    let (outbound_tx, writer_task) = spawn_writer(sender);

    if !state
        .scoreboard()
        .subscribe(connection, outbound_tx.clone())
        .await
    {
        info!(%connection, "scoreboard connection closed before registration");
        finalize(writer_task, outbound_tx).await;
        return;
    }
    info!(%connection, "scoreboard subscriber connected");

    drain_inbound(&mut receiver, &outbound_tx, connection).await;

    state.scoreboard().unsubscribe(&connection).await;
    info!(%connection, "scoreboard subscriber disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Handle the full lifecycle of a play-by-play connection for `game_id`.
pub async fn handle_play_by_play_socket(state: SharedState, game_id: String, socket: WebSocket) {
    let connection = Uuid::new_v4();
    let (sender, mut receiver) = socket.split();
    let (outbound_tx, writer_task) = spawn_writer(sender);

    let hub = state.play_by_play();
    if !hub.subscribe(&game_id, connection, outbound_tx.clone()) {
        info!(%game_id, %connection, "play-by-play connection closed before registration");
        finalize(writer_task, outbound_tx).await;
        return;
    }
    info!(%game_id, %connection, "play-by-play subscriber connected");

    drain_inbound(&mut receiver, &outbound_tx, connection).await;

    hub.unsubscribe(&game_id, &connection);
    info!(%game_id, %connection, "play-by-play subscriber disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Dedicated writer task so hubs only ever queue messages and never await a slow client.
fn spawn_writer(
    mut sender: SplitSink<WebSocket, Message>,
) -> (mpsc::UnboundedSender<Message>, JoinHandle<()>) {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });
    (outbound_tx, writer_task)
}

/// Read until the client closes the socket. Payloads are ignored.
async fn drain_inbound(
    receiver: &mut SplitStream<WebSocket>,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    connection: Uuid,
) {
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(%connection, payload = %text, "ignoring client message");
            }
            Ok(Message::Ping(payload)) => {
                if outbound_tx.send(Message::Pong(payload)).is_err() {
                    break;
                }
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%connection, error = %err, "websocket error");
                break;
            }
        }
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
