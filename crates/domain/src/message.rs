use crate::value_objects::{MessageContent, MessageId, RoomId};

/// 房间内的一条提问消息。
///
/// `likes_count` 始终非负；`answered` 只允许 false → true 的单向转换。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub content: MessageContent,
    pub likes_count: i64,
    pub answered: bool,
}

impl Message {
    pub fn new(id: MessageId, room_id: RoomId, content: MessageContent) -> Self {
        Self {
            id,
            room_id,
            content,
            likes_count: 0,
            answered: false,
        }
    }

    pub fn like(&mut self) -> i64 {
        self.likes_count += 1;
        self.likes_count
    }

    /// 取消点赞，计数在 0 处饱和。
    pub fn unlike(&mut self) -> i64 {
        self.likes_count = (self.likes_count - 1).max(0);
        self.likes_count
    }

    pub fn mark_answered(&mut self) {
        self.answered = true;
    }
}
