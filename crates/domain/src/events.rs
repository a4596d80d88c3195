//! 房间领域事件
//!
//! 广播到房间订阅者的事件信封，线上格式为
//! `{"kind": "...", "room_id": "...", "value": {...}}`。

use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageId, RoomId};

/// 按事件类型区分的负载。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RoomEventPayload {
    MessageCreated { id: MessageId, message: String },
    MessageReactionIncreased { id: MessageId, count: i64 },
    MessageReactionDecreased { id: MessageId, count: i64 },
    MessageAnswered { id: MessageId },
}

/// 一次领域变更对应的广播事件。构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub room_id: RoomId,
    #[serde(flatten)]
    pub payload: RoomEventPayload,
}

impl RoomEvent {
    pub fn message_created(room_id: RoomId, id: MessageId, message: impl Into<String>) -> Self {
        Self {
            room_id,
            payload: RoomEventPayload::MessageCreated {
                id,
                message: message.into(),
            },
        }
    }

    pub fn reaction_increased(room_id: RoomId, id: MessageId, count: i64) -> Self {
        Self {
            room_id,
            payload: RoomEventPayload::MessageReactionIncreased { id, count },
        }
    }

    pub fn reaction_decreased(room_id: RoomId, id: MessageId, count: i64) -> Self {
        Self {
            room_id,
            payload: RoomEventPayload::MessageReactionDecreased { id, count },
        }
    }

    pub fn message_answered(room_id: RoomId, id: MessageId) -> Self {
        Self {
            room_id,
            payload: RoomEventPayload::MessageAnswered { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn message_created_envelope_shape() {
        let room_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let event = RoomEvent::message_created(
            RoomId::new(room_id),
            MessageId::new(message_id),
            "hello",
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "message_created",
                "room_id": room_id,
                "value": { "id": message_id, "message": "hello" },
            })
        );
    }

    #[test]
    fn reaction_envelope_carries_count() {
        let room_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let event =
            RoomEvent::reaction_increased(RoomId::new(room_id), MessageId::new(message_id), 3);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "message_reaction_increased",
                "room_id": room_id,
                "value": { "id": message_id, "count": 3 },
            })
        );
    }

    #[test]
    fn answered_envelope_has_id_only() {
        let room_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let event = RoomEvent::message_answered(RoomId::new(room_id), MessageId::new(message_id));

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "message_answered",
                "room_id": room_id,
                "value": { "id": message_id },
            })
        );
    }
}
