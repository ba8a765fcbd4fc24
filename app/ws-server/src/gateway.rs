use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use wsfu::sfu::engine::EngineFactory;
use wsfu::sfu::sfu::SFU;
use wsfu::sfu::signal::{self, Intent, ServerMessage};

/// Terminates one client's signaling connection: creates the peer session
/// with a fresh engine, pumps outbound server messages to the socket and
/// decodes inbound frames into relay operations. Everything state-mutating
/// goes through the relay's global queue; this function only submits.
pub async fn handle_connection(
    stream: TcpStream,
    sfu: SFU,
    factory: Arc<dyn EngineFactory + Send + Sync>,
) -> Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    let engine = factory.create_engine();
    let peer = sfu.connect(engine).await;

    let (outbound_sender, mut outbound_receiver) = mpsc::unbounded_channel::<ServerMessage>();
    tokio::spawn(async move {
        while let Some(message) = outbound_receiver.recv().await {
            match serde_json::to_string(&message) {
                Ok(text) => {
                    if write.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    log::error!("outbound encode error: {}", err);
                }
            }
        }
    });

    let outbound_out = outbound_sender.clone();
    peer.lock()
        .await
        .on_outbound(Box::new(move |message: ServerMessage| {
            let outbound_in = outbound_out.clone();
            Box::pin(async move {
                if outbound_in.send(message).is_err() {
                    log::warn!("outbound channel closed, message dropped");
                }
            })
        }))
        .await;

    while let Some(frame) = read.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("websocket error: {}", err);
                break;
            }
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match signal::decode(&text) {
            Ok(Intent::Signal(descriptor)) => {
                if let Err(err) = sfu.signal(peer.clone(), descriptor) {
                    log::error!("signal submit error: {}", err);
                    break;
                }
            }
            Ok(Intent::JoinRoom(room_id)) => {
                if let Err(err) = sfu.join_room(peer.clone(), room_id) {
                    log::error!("join submit error: {}", err);
                    break;
                }
            }
            Err(err) => {
                log::warn!("ignoring inbound message: {}", err);
            }
        }
    }

    sfu.disconnect(peer)?;
    Ok(())
}
