//! 实时推送核心
//!
//! 按房间维护订阅者集合，并把领域事件扇出到该房间的每个订阅者。
//! 注册表的所有读写和广播本身共用同一把互斥锁，因此任意两次广播、
//! 注册、注销之间存在全序：同一房间先后发布的两个事件，对所有
//! 订阅者而言到达顺序一致。代价是一个慢订阅者的写入会阻塞
//! 无关房间的注册表操作，低到中等扇出下可以接受。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{RoomEvent, RoomId};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

/// 向单个订阅者写入失败。不致命：只会导致该订阅者被剔除。
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport write failed: {0}")]
    Transport(String),
}

impl DeliveryError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// 订阅者的传输写入端。
///
/// 生产实现包装 WebSocket 的发送半部；测试用内存实现替代。
#[async_trait]
pub trait EventSink: Send {
    async fn push(&mut self, payload: &str) -> Result<(), DeliveryError>;
}

/// 订阅者在其房间集合内的唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Subscriber {
    sink: Box<dyn EventSink>,
    cancel: CancellationToken,
}

/// 房间事件广播器：订阅注册表 + 分发器。
///
/// 由服务进程在启动时创建一份，经 `AppState` 注入各处理器，
/// 不使用任何隐式单例。
pub struct RoomBroadcaster {
    subscribers: Mutex<HashMap<RoomId, HashMap<SubscriberId, Subscriber>>>,
    tasks: TaskTracker,
}

impl RoomBroadcaster {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            tasks: TaskTracker::new(),
        }
    }

    /// 把订阅者加入房间集合，不存在的集合按需创建。从不失败。
    pub async fn register(
        &self,
        room_id: RoomId,
        sink: Box<dyn EventSink>,
        cancel: CancellationToken,
    ) -> SubscriberId {
        let id = SubscriberId::generate();
        let mut subscribers = self.subscribers.lock().await;
        subscribers
            .entry(room_id)
            .or_default()
            .insert(id, Subscriber { sink, cancel });
        tracing::info!(room_id = %room_id, subscriber_id = %id, "subscriber registered");
        id
    }

    /// 把订阅者移出房间集合。订阅者不存在时为空操作：
    /// 正常断开与投递失败剔除两条路径可能并发到达这里。
    pub async fn unregister(&self, room_id: RoomId, id: SubscriberId) {
        let mut subscribers = self.subscribers.lock().await;
        if let Some(room) = subscribers.get_mut(&room_id) {
            if room.remove(&id).is_some() {
                tracing::info!(room_id = %room_id, subscriber_id = %id, "subscriber unregistered");
            }
            if room.is_empty() {
                subscribers.remove(&room_id);
            }
        }
    }

    /// 把事件投递给目标房间当前注册的每个订阅者。
    ///
    /// 负载只序列化一次。对某个订阅者写入失败时触发其取消令牌并
    /// 在返回前将其从注册表移除，其余订阅者照常接收。广播是尽力
    /// 而为的，失败只记日志，从不向调用方返回错误。
    pub async fn publish(&self, event: RoomEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize room event");
                return;
            }
        };

        let mut subscribers = self.subscribers.lock().await;
        let Some(room) = subscribers.get_mut(&event.room_id) else {
            return;
        };

        let mut failed = Vec::new();
        for (id, subscriber) in room.iter_mut() {
            if let Err(err) = subscriber.sink.push(&payload).await {
                tracing::error!(
                    room_id = %event.room_id,
                    subscriber_id = %id,
                    error = %err,
                    "failed to send event to subscriber"
                );
                failed.push(*id);
            }
        }

        // 取消与移除都在持锁期间完成：仍在集合中的订阅者
        // 一定没有被分发器触发过取消。
        for id in failed {
            if let Some(subscriber) = room.remove(&id) {
                subscriber.cancel.cancel();
            }
        }
        if room.is_empty() {
            subscribers.remove(&event.room_id);
        }
    }

    /// 与产生事件的请求解耦的发布：变更操作不等待投递完成。
    /// 任务挂在内部的 `TaskTracker` 上，停机时统一排空。
    pub fn publish_detached(self: &Arc<Self>, event: RoomEvent) {
        let broadcaster = Arc::clone(self);
        self.tasks.spawn(async move {
            broadcaster.publish(event).await;
        });
    }

    /// 等待所有已派发的广播任务结束。
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    /// 当前注册表中目标房间的订阅者数量。
    pub async fn subscriber_count(&self, room_id: RoomId) -> usize {
        let subscribers = self.subscribers.lock().await;
        subscribers.get(&room_id).map_or(0, HashMap::len)
    }
}

impl Default for RoomBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
