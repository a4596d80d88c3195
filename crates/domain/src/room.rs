use crate::value_objects::{RoomId, Subject};

/// 讨论房间。主题在创建后不可修改，不存在重命名操作。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub subject: Subject,
}

impl Room {
    pub fn new(id: RoomId, subject: Subject) -> Self {
        Self { id, subject }
    }
}
