use std::sync::Arc;

use application::{RoomBroadcaster, RoomService};
use tokio_util::sync::CancellationToken;

/// 共享应用状态
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub broadcaster: Arc<RoomBroadcaster>,
    /// 进程级停机令牌，所有订阅连接持有它的子令牌
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        room_service: Arc<RoomService>,
        broadcaster: Arc<RoomBroadcaster>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            room_service,
            broadcaster,
            shutdown,
        }
    }
}
