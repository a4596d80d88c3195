use async_trait::async_trait;

use crate::errors::RepositoryError;
use crate::message::Message;
use crate::room::Room;
use crate::value_objects::{MessageContent, MessageId, RoomId, Subject};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// 房间与消息的持久化协作者。
///
/// 核心只在订阅建立时用 `find_room` 校验房间存在性，其余操作由
/// 服务层调用，其结果被映射为广播事件。
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn save_room(&self, subject: Subject) -> RepositoryResult<Room>;
    async fn find_room(&self, id: RoomId) -> RepositoryResult<Option<Room>>;
    async fn list_rooms(&self) -> RepositoryResult<Vec<Room>>;

    async fn save_message(
        &self,
        room_id: RoomId,
        content: MessageContent,
    ) -> RepositoryResult<Message>;
    async fn find_message(&self, id: MessageId) -> RepositoryResult<Option<Message>>;
    async fn list_room_messages(&self, room_id: RoomId) -> RepositoryResult<Vec<Message>>;

    /// 点赞，返回新的计数。
    async fn like_message(&self, id: MessageId) -> RepositoryResult<i64>;
    /// 取消点赞，计数在 0 处截断，返回新的计数。
    async fn remove_like_message(&self, id: MessageId) -> RepositoryResult<i64>;
    async fn mark_message_answered(&self, id: MessageId) -> RepositoryResult<()>;
}
