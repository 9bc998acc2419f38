//! [`ChangeFeed`] over the realtime websocket.
//!
//! The service speaks the Phoenix channel protocol: JSON frames with a
//! topic, an event name, a payload and a reference. One channel is joined
//! per subscription, filtered server-side to the owner's rows.

use super::SupabaseClient;
use crate::api::{ChangeEvent, ChangeFeed, ChangeOperation, RemoteError, Subscription};
use crate::libs::task::{Task, UserId};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const JOIN_REF: &str = "1";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<Socket, WsMessage>;
type SocketStream = SplitStream<Socket>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

pub(crate) fn topic_for(owner: &UserId) -> String {
    format!("realtime:tasks:{}", owner)
}

pub(crate) fn join_frame(owner: &UserId, access_token: &str) -> Frame {
    Frame {
        topic: topic_for(owner),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "postgres_changes": [{
                    "event": "*",
                    "schema": "public",
                    "table": "tasks",
                    "filter": format!("user_id=eq.{}", owner),
                }]
            },
            "access_token": access_token,
        }),
        reference: Some(JOIN_REF.to_string()),
    }
}

pub(crate) fn heartbeat_frame(reference: u64) -> Frame {
    Frame {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Whether `frame` acknowledges the join; `Err` carries the refusal reason.
pub(crate) fn join_reply(frame: &Frame) -> Option<Result<(), String>> {
    if frame.event != "phx_reply" || frame.reference.as_deref() != Some(JOIN_REF) {
        return None;
    }
    match frame.payload.get("status").and_then(Value::as_str) {
        Some("ok") => Some(Ok(())),
        _ => Some(Err(frame.payload.get("response").map(Value::to_string).unwrap_or_default())),
    }
}

/// Decodes a row-change notification; other frames yield `None`.
pub(crate) fn decode_change(frame: &Frame) -> Option<ChangeEvent> {
    if frame.event != "postgres_changes" {
        return None;
    }
    let data = frame.payload.get("data")?;
    let operation: ChangeOperation = serde_json::from_value(data.get("type")?.clone()).ok()?;
    let record = match operation {
        ChangeOperation::Delete => data.get("old_record"),
        _ => data.get("record"),
    };
    let row = record.and_then(|r| serde_json::from_value::<Task>(r.clone()).ok());
    Some(ChangeEvent { operation, row })
}

fn socket_url(base: &Url, anon_key: &str) -> Result<Url, RemoteError> {
    let mut url = base
        .join("realtime/v1/websocket")
        .map_err(|e| RemoteError::Transport(e.to_string()))?;
    let scheme = if base.scheme() == "http" { "ws" } else { "wss" };
    url.set_scheme(scheme)
        .map_err(|_| RemoteError::Transport(format!("cannot use {} for the realtime socket", base)))?;
    url.query_pairs_mut().append_pair("apikey", anon_key).append_pair("vsn", "1.0.0");
    Ok(url)
}

fn ws_error(error: impl std::fmt::Display) -> RemoteError {
    RemoteError::Transport(error.to_string())
}

fn encode(frame: &Frame) -> Result<WsMessage, RemoteError> {
    let text = serde_json::to_string(frame).map_err(|e| RemoteError::Decode(e.to_string()))?;
    Ok(WsMessage::Text(text.into()))
}

fn parse(message: &WsMessage) -> Option<Frame> {
    match message {
        WsMessage::Text(text) => serde_json::from_str(text.as_str()).ok(),
        _ => None,
    }
}

async fn await_join(stream: &mut SocketStream) -> Result<(), RemoteError> {
    while let Some(message) = stream.next().await {
        let message = message.map_err(ws_error)?;
        if let WsMessage::Close(_) = message {
            break;
        }
        if let Some(reply) = parse(&message).as_ref().and_then(join_reply) {
            return reply.map_err(|reason| RemoteError::Rejected {
                status: 400,
                message: format!("channel join refused: {}", reason),
            });
        }
    }
    Err(RemoteError::Transport("realtime socket closed during join".to_string()))
}

async fn read_changes(mut stream: SocketStream, events: mpsc::Sender<ChangeEvent>) {
    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "realtime socket error");
                break;
            }
        };
        if let WsMessage::Close(_) = message {
            tracing::info!("realtime socket closed by server");
            break;
        }
        let Some(frame) = parse(&message) else {
            continue;
        };
        match frame.event.as_str() {
            "phx_error" | "phx_close" => {
                tracing::warn!(topic = %frame.topic, event = %frame.event, "realtime channel ended");
                break;
            }
            _ => {}
        }
        if let Some(event) = decode_change(&frame) {
            tracing::debug!(operation = ?event.operation, "realtime change");
            if events.send(event).await.is_err() {
                break;
            }
        }
    }
}

async fn keep_alive(sink: Arc<Mutex<SocketSink>>) {
    let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
    interval.tick().await;
    let mut reference = 1;
    loop {
        interval.tick().await;
        reference += 1;
        let Ok(message) = encode(&heartbeat_frame(reference)) else {
            break;
        };
        if let Err(e) = sink.lock().await.send(message).await {
            tracing::warn!(error = %e, "realtime heartbeat failed");
            break;
        }
    }
}

impl ChangeFeed for SupabaseClient {
    async fn subscribe(&self, owner: &UserId) -> Result<Subscription, RemoteError> {
        let token = self.access_token().await?;
        let url = socket_url(self.base(), self.anon_key())?;

        tracing::debug!(%owner, "opening realtime socket");
        let (socket, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(url.as_str()))
            .await
            .map_err(|_| RemoteError::Transport("realtime connect timed out".to_string()))?
            .map_err(ws_error)?;
        let (mut sink, mut stream) = socket.split();

        sink.send(encode(&join_frame(owner, &token))?).await.map_err(ws_error)?;
        tokio::time::timeout(CONNECT_TIMEOUT, await_join(&mut stream))
            .await
            .map_err(|_| RemoteError::Transport("realtime join timed out".to_string()))??;
        tracing::info!(topic = %topic_for(owner), "joined realtime channel");

        let (tx, rx) = mpsc::channel(64);
        let sink = Arc::new(Mutex::new(sink));
        let reader = tokio::spawn(read_changes(stream, tx));
        let heartbeat = tokio::spawn(keep_alive(sink));
        Ok(Subscription::new(rx, vec![reader, heartbeat]))
    }
}
