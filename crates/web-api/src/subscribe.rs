//! 订阅连接生命周期
//!
//! 升级前先校验房间存在，升级后把连接的发送端注册到广播器。
//! 三个退出触发源共用同一个取消令牌：对端断开（读端收到 Close 或错误）、
//! 分发器投递失败剔除、进程停机。任一触发都会走同一条清理路径。

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio_util::sync::CancellationToken;

use application::{DeliveryError, EventSink};
use domain::RoomId;

use crate::error::ApiError;
use crate::routes::parse_room_id;
use crate::state::AppState;

pub async fn subscribe_room(
    State(state): State<AppState>,
    Path(raw_room_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let room_id = resolve_room(&state, &raw_room_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room_id)))
}

/// 握手前的准入检查：标识符格式错误或房间不存在都在升级前拒绝，
/// 注册表不发生任何变化。
async fn resolve_room(state: &AppState, raw_room_id: &str) -> Result<RoomId, ApiError> {
    let room_id = parse_room_id(raw_room_id)?;
    state.room_service.get_room(room_id).await?;
    Ok(room_id)
}

struct WebSocketSink {
    sink: SplitSink<WebSocket, WsMessage>,
}

#[async_trait]
impl EventSink for WebSocketSink {
    async fn push(&mut self, payload: &str) -> Result<(), DeliveryError> {
        self.sink
            .send(WsMessage::Text(payload.to_owned().into()))
            .await
            .map_err(|err| DeliveryError::transport(err.to_string()))
    }
}

async fn handle_socket(socket: WebSocket, state: AppState, room_id: RoomId) {
    let cancel = state.shutdown.child_token();
    let (sink, stream) = socket.split();

    let subscriber_id = state
        .broadcaster
        .register(room_id, Box::new(WebSocketSink { sink }), cancel.clone())
        .await;
    tracing::info!(room_id = %room_id, subscriber_id = %subscriber_id, "subscriber attached");

    let reader = tokio::spawn(watch_peer(stream, cancel.clone()));

    cancel.cancelled().await;

    state.broadcaster.unregister(room_id, subscriber_id).await;
    reader.abort();
    tracing::info!(room_id = %room_id, subscriber_id = %subscriber_id, "subscriber detached");
}

/// 消费读端直到对端断开，然后触发本连接的取消令牌。
/// 推送是单向的，客户端发来的数据帧直接丢弃。
async fn watch_peer(mut stream: SplitStream<WebSocket>, cancel: CancellationToken) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    cancel.cancel();
}
