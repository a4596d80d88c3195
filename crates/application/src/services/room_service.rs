//! 房间用例服务
//!
//! 对房间和提问消息的读写操作。每个产生事件的变更在持久化成功后，
//! 以独立任务的方式把事件交给广播器，不让投递延迟进入写路径。

use std::sync::Arc;

use domain::{
    DomainError, MessageContent, MessageId, RepositoryError, RoomEvent, RoomId, RoomRepository,
    Subject,
};

use crate::broadcast::RoomBroadcaster;
use crate::dto::{MessageDto, RoomDto};
use crate::error::ApplicationError;

#[derive(Debug, Clone)]
pub struct CreateRoomRequest {
    pub subject: String,
}

#[derive(Debug, Clone)]
pub struct CreateMessageRequest {
    pub room_id: RoomId,
    pub message: String,
}

pub struct RoomServiceDependencies {
    pub repository: Arc<dyn RoomRepository>,
    pub broadcaster: Arc<RoomBroadcaster>,
}

pub struct RoomService {
    repository: Arc<dyn RoomRepository>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl RoomService {
    pub fn new(deps: RoomServiceDependencies) -> Self {
        Self {
            repository: deps.repository,
            broadcaster: deps.broadcaster,
        }
    }

    pub async fn create_room(
        &self,
        request: CreateRoomRequest,
    ) -> Result<RoomDto, ApplicationError> {
        let subject = Subject::parse(request.subject)?;
        let room = self.repository.save_room(subject).await?;
        tracing::info!(room_id = %room.id, "room created");
        Ok(RoomDto::from(&room))
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomDto>, ApplicationError> {
        let rooms = self.repository.list_rooms().await?;
        Ok(rooms.iter().map(RoomDto::from).collect())
    }

    pub async fn get_room(&self, room_id: RoomId) -> Result<RoomDto, ApplicationError> {
        let room = self.require_room(room_id).await?;
        Ok(RoomDto::from(&room))
    }

    pub async fn create_message(
        &self,
        request: CreateMessageRequest,
    ) -> Result<MessageDto, ApplicationError> {
        self.require_room(request.room_id).await?;
        let content = MessageContent::parse(request.message)?;
        let message = self.repository.save_message(request.room_id, content).await?;

        self.broadcaster.publish_detached(RoomEvent::message_created(
            message.room_id,
            message.id,
            message.content.as_str(),
        ));

        Ok(MessageDto::from(&message))
    }

    pub async fn list_room_messages(
        &self,
        room_id: RoomId,
    ) -> Result<Vec<MessageDto>, ApplicationError> {
        self.require_room(room_id).await?;
        let messages = self.repository.list_room_messages(room_id).await?;
        Ok(messages.iter().map(MessageDto::from).collect())
    }

    pub async fn get_room_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> Result<MessageDto, ApplicationError> {
        self.require_room(room_id).await?;
        let message = self
            .repository
            .find_message(message_id)
            .await?
            .filter(|message| message.room_id == room_id)
            .ok_or(DomainError::MessageNotFound)?;
        Ok(MessageDto::from(&message))
    }

    pub async fn like_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> Result<i64, ApplicationError> {
        self.require_room(room_id).await?;
        let count = self
            .repository
            .like_message(message_id)
            .await
            .map_err(message_not_found)?;

        self.broadcaster
            .publish_detached(RoomEvent::reaction_increased(room_id, message_id, count));

        Ok(count)
    }

    pub async fn remove_like_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> Result<i64, ApplicationError> {
        self.require_room(room_id).await?;
        let count = self
            .repository
            .remove_like_message(message_id)
            .await
            .map_err(message_not_found)?;

        self.broadcaster
            .publish_detached(RoomEvent::reaction_decreased(room_id, message_id, count));

        Ok(count)
    }

    pub async fn answer_message(
        &self,
        room_id: RoomId,
        message_id: MessageId,
    ) -> Result<(), ApplicationError> {
        self.require_room(room_id).await?;
        // 只有持久化成功才通知订阅者
        self.repository
            .mark_message_answered(message_id)
            .await
            .map_err(message_not_found)?;

        self.broadcaster
            .publish_detached(RoomEvent::message_answered(room_id, message_id));

        Ok(())
    }

    async fn require_room(&self, room_id: RoomId) -> Result<domain::Room, ApplicationError> {
        self.repository
            .find_room(room_id)
            .await?
            .ok_or_else(|| DomainError::RoomNotFound.into())
    }
}

fn message_not_found(err: RepositoryError) -> ApplicationError {
    match err {
        RepositoryError::NotFound => DomainError::MessageNotFound.into(),
        other => other.into(),
    }
}
