//! AMA 房间系统核心领域模型
//!
//! 包含房间、提问消息等核心实体，领域事件，以及持久化协作者的抽象。

pub mod errors;
pub mod events;
pub mod message;
pub mod repository;
pub mod room;
pub mod value_objects;

pub use errors::{DomainError, RepositoryError};
pub use events::{RoomEvent, RoomEventPayload};
pub use message::Message;
pub use repository::{RepositoryResult, RoomRepository};
pub use room::Room;
pub use value_objects::{MessageContent, MessageId, RoomId, Subject};

#[cfg(feature = "testing")]
pub use repository::MockRoomRepository;
