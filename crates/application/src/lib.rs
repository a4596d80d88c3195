//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，以及实时推送核心：
//! 按房间维护的订阅者注册表和广播分发器。

pub mod broadcast;
pub mod dto;
pub mod error;
pub mod services;

pub use broadcast::{DeliveryError, EventSink, RoomBroadcaster, SubscriberId};
pub use dto::{MessageDto, RoomDto};
pub use error::ApplicationError;
pub use services::{CreateMessageRequest, CreateRoomRequest, RoomService, RoomServiceDependencies};
