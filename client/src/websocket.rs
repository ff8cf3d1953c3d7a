use dtekv_common::protocol::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt, stream::SplitStream};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsReader = SplitStream<WsStream>;

/// Socket to one board session. Outgoing messages go through a channel to a
/// writer task so several handles can send concurrently.
pub struct BoardWebSocket {
    sender: mpsc::UnboundedSender<ClientMessage>,
    reader: WsReader,
    writer_task: JoinHandle<()>,
}

impl BoardWebSocket {
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to WebSocket: {}", url);

        let (ws_stream, _) = connect_async(url).await?;
        info!("WebSocket connected successfully");

        let (mut writer, reader) = ws_stream.split();
        let (sender, mut receiver) = mpsc::unbounded_channel::<ClientMessage>();

        let writer_task = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                debug!("Sending message: {}", json);
                if let Err(e) = writer.send(Message::Text(json.into())).await {
                    warn!("Failed to send WebSocket message: {}", e);
                    break;
                }
            }

            let _ = writer.close().await;
        });

        Ok(Self {
            sender,
            reader,
            writer_task,
        })
    }

    pub fn get_sender(&self) -> mpsc::UnboundedSender<ClientMessage> {
        self.sender.clone()
    }

    pub fn send_message(&self, message: ClientMessage) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| "WebSocket sender channel closed")?;
        Ok(())
    }

    /// Next server message, or `None` once the connection is closed.
    pub async fn receive_message(&mut self) -> Result<Option<ServerMessage>> {
        while let Some(msg) = self.reader.next().await {
            match msg? {
                Message::Text(text) => {
                    debug!("Received message: {}", text);
                    let server_message: ServerMessage = serde_json::from_str(&text)?;
                    return Ok(Some(server_message));
                }
                Message::Close(_) => {
                    info!("WebSocket connection closed");
                    return Ok(None);
                }
                // ping, pong and binary frames
                _ => {}
            }
        }
        Ok(None)
    }

    pub async fn close(self) -> Result<()> {
        drop(self.sender);
        let _ = self.writer_task.await;
        Ok(())
    }
}
