use async_trait::async_trait;
use domain::{
    Message, MessageContent, MessageId, RepositoryError, Room, RoomId, RoomRepository, Subject,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(err.to_string())
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct RoomRecord {
    id: Uuid,
    subject: String,
}

impl TryFrom<RoomRecord> for Room {
    type Error = RepositoryError;

    fn try_from(value: RoomRecord) -> Result<Self, Self::Error> {
        let subject =
            Subject::parse(value.subject).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Room::new(RoomId::from(value.id), subject))
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    room_id: Uuid,
    message: String,
    likes_count: i64,
    answered: bool,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let content =
            MessageContent::parse(value.message).map_err(|err| invalid_data(err.to_string()))?;
        let mut message = Message::new(
            MessageId::from(value.id),
            RoomId::from(value.room_id),
            content,
        );
        message.likes_count = value.likes_count;
        message.answered = value.answered;
        Ok(message)
    }
}

#[derive(Clone)]
pub struct PgRoomRepository {
    pool: PgPool,
}

impl PgRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn save_room(&self, subject: Subject) -> Result<Room, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"
            INSERT INTO rooms (subject)
            VALUES ($1)
            RETURNING id, subject
            "#,
        )
        .bind(subject.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Room::try_from(record)
    }

    async fn find_room(&self, id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let record = sqlx::query_as::<_, RoomRecord>(
            r#"SELECT id, subject FROM rooms WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Room::try_from).transpose()
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        let records = sqlx::query_as::<_, RoomRecord>(
            r#"SELECT id, subject FROM rooms ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Room::try_from).collect()
    }

    async fn save_message(
        &self,
        room_id: RoomId,
        content: MessageContent,
    ) -> Result<Message, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (room_id, message)
            VALUES ($1, $2)
            RETURNING id, room_id, message, likes_count, answered
            "#,
        )
        .bind(Uuid::from(room_id))
        .bind(content.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Message::try_from(record)
    }

    async fn find_message(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"SELECT id, room_id, message, likes_count, answered FROM messages WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn list_room_messages(&self, room_id: RoomId) -> Result<Vec<Message>, RepositoryError> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, room_id, message, likes_count, answered
            FROM messages
            WHERE room_id = $1
            ORDER BY id
            "#,
        )
        .bind(Uuid::from(room_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn like_message(&self, id: MessageId) -> Result<i64, RepositoryError> {
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE messages
            SET likes_count = likes_count + 1
            WHERE id = $1
            RETURNING likes_count
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        count.ok_or(RepositoryError::NotFound)
    }

    async fn remove_like_message(&self, id: MessageId) -> Result<i64, RepositoryError> {
        // 计数在 0 处截断
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE messages
            SET likes_count = GREATEST(likes_count - 1, 0)
            WHERE id = $1
            RETURNING likes_count
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        count.ok_or(RepositoryError::NotFound)
    }

    async fn mark_message_answered(&self, id: MessageId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE messages SET answered = TRUE WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
