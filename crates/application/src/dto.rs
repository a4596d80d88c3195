use domain::{Message, Room};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDto {
    pub id: Uuid,
    pub subject: String,
}

impl From<&Room> for RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: Uuid::from(room.id),
            subject: room.subject.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub room_id: Uuid,
    pub message: String,
    pub likes_count: i64,
    #[serde(rename = "is_answered")]
    pub answered: bool,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            room_id: Uuid::from(message.room_id),
            message: message.content.as_str().to_owned(),
            likes_count: message.likes_count,
            answered: message.answered,
        }
    }
}
