//! 房间服务单元测试
//!
//! 用 mock 仓储驱动服务用例，验证持久化结果与广播事件的配合。

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use domain::{
    DomainError, Message, MessageContent, MessageId, MockRoomRepository, RepositoryError, Room,
    RoomId, Subject,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::broadcast::{DeliveryError, EventSink, RoomBroadcaster};
use crate::error::ApplicationError;
use crate::services::{CreateMessageRequest, CreateRoomRequest, RoomService, RoomServiceDependencies};

#[derive(Clone, Default)]
struct RecordingSink {
    sent: Arc<StdMutex<Vec<String>>>,
}

impl RecordingSink {
    fn received(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn push(&mut self, payload: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(payload.to_owned());
        Ok(())
    }
}

fn test_room() -> Room {
    Room::new(
        RoomId::new(Uuid::new_v4()),
        Subject::parse("ask me anything").unwrap(),
    )
}

fn test_message(room_id: RoomId) -> Message {
    Message::new(
        MessageId::new(Uuid::new_v4()),
        room_id,
        MessageContent::parse("how do lifetimes work?").unwrap(),
    )
}

fn build_service(repository: MockRoomRepository) -> (RoomService, Arc<RoomBroadcaster>) {
    let broadcaster = Arc::new(RoomBroadcaster::new());
    let service = RoomService::new(RoomServiceDependencies {
        repository: Arc::new(repository),
        broadcaster: Arc::clone(&broadcaster),
    });
    (service, broadcaster)
}

async fn subscribe(broadcaster: &RoomBroadcaster, room_id: RoomId) -> RecordingSink {
    let sink = RecordingSink::default();
    broadcaster
        .register(room_id, Box::new(sink.clone()), CancellationToken::new())
        .await;
    sink
}

/// 等待 detached 广播任务完成投递。
async fn wait_for_events(sink: &RecordingSink, count: usize) -> Vec<Value> {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if sink.received().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for broadcast");

    sink.received()
        .iter()
        .map(|payload| serde_json::from_str(payload).unwrap())
        .collect()
}

#[tokio::test]
async fn create_room_persists_and_returns_dto() {
    let room = test_room();
    let mut repository = MockRoomRepository::new();
    let stored = room.clone();
    repository
        .expect_save_room()
        .returning(move |_| Ok(stored.clone()));

    let (service, _broadcaster) = build_service(repository);
    let dto = service
        .create_room(CreateRoomRequest {
            subject: "ask me anything".to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(dto.id, Uuid::from(room.id));
    assert_eq!(dto.subject, "ask me anything");
}

#[tokio::test]
async fn create_room_rejects_blank_subject() {
    let (service, _broadcaster) = build_service(MockRoomRepository::new());
    let result = service
        .create_room(CreateRoomRequest {
            subject: "   ".to_owned(),
        })
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::InvalidArgument { .. }))
    ));
}

#[tokio::test]
async fn create_message_broadcasts_created_event() {
    let room = test_room();
    let message = test_message(room.id);
    let room_id = room.id;

    let mut repository = MockRoomRepository::new();
    let found = room.clone();
    repository
        .expect_find_room()
        .returning(move |_| Ok(Some(found.clone())));
    let stored = message.clone();
    repository
        .expect_save_message()
        .returning(move |_, _| Ok(stored.clone()));

    let (service, broadcaster) = build_service(repository);
    let sink = subscribe(&broadcaster, room_id).await;

    let dto = service
        .create_message(CreateMessageRequest {
            room_id,
            message: "how do lifetimes work?".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(dto.id, Uuid::from(message.id));

    let events = wait_for_events(&sink, 1).await;
    assert_eq!(events[0]["kind"], "message_created");
    assert_eq!(events[0]["room_id"], Uuid::from(room_id).to_string());
    assert_eq!(events[0]["value"]["message"], "how do lifetimes work?");
}

#[tokio::test]
async fn create_message_requires_existing_room() {
    let mut repository = MockRoomRepository::new();
    repository.expect_find_room().returning(|_| Ok(None));

    let (service, broadcaster) = build_service(repository);
    let room_id = RoomId::new(Uuid::new_v4());
    let sink = subscribe(&broadcaster, room_id).await;

    let result = service
        .create_message(CreateMessageRequest {
            room_id,
            message: "hello?".to_owned(),
        })
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::RoomNotFound))
    ));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(sink.received().is_empty());
}

#[tokio::test]
async fn like_message_returns_count_and_broadcasts() {
    let room = test_room();
    let room_id = room.id;
    let message_id = MessageId::new(Uuid::new_v4());

    let mut repository = MockRoomRepository::new();
    let found = room.clone();
    repository
        .expect_find_room()
        .returning(move |_| Ok(Some(found.clone())));
    repository.expect_like_message().returning(|_| Ok(5));

    let (service, broadcaster) = build_service(repository);
    let sink = subscribe(&broadcaster, room_id).await;

    let count = service.like_message(room_id, message_id).await.unwrap();
    assert_eq!(count, 5);

    let events = wait_for_events(&sink, 1).await;
    assert_eq!(events[0]["kind"], "message_reaction_increased");
    assert_eq!(events[0]["value"]["count"], 5);
}

#[tokio::test]
async fn unlike_missing_message_maps_to_message_not_found() {
    let room = test_room();
    let mut repository = MockRoomRepository::new();
    let found = room.clone();
    repository
        .expect_find_room()
        .returning(move |_| Ok(Some(found.clone())));
    repository
        .expect_remove_like_message()
        .returning(|_| Err(RepositoryError::NotFound));

    let (service, _broadcaster) = build_service(repository);
    let result = service
        .remove_like_message(room.id, MessageId::new(Uuid::new_v4()))
        .await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MessageNotFound))
    ));
}

#[tokio::test]
async fn answer_message_broadcasts_only_after_persist_success() {
    let room = test_room();
    let room_id = room.id;
    let message_id = MessageId::new(Uuid::new_v4());

    let mut repository = MockRoomRepository::new();
    let found = room.clone();
    repository
        .expect_find_room()
        .returning(move |_| Ok(Some(found.clone())));
    repository
        .expect_mark_message_answered()
        .times(1)
        .returning(|_| Err(RepositoryError::NotFound));

    let (service, broadcaster) = build_service(repository);
    let sink = subscribe(&broadcaster, room_id).await;

    let result = service.answer_message(room_id, message_id).await;
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MessageNotFound))
    ));

    // 持久化失败时不得有任何通知发出
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(sink.received().is_empty());
}

#[tokio::test]
async fn answer_message_broadcasts_on_success() {
    let room = test_room();
    let room_id = room.id;
    let message_id = MessageId::new(Uuid::new_v4());

    let mut repository = MockRoomRepository::new();
    let found = room.clone();
    repository
        .expect_find_room()
        .returning(move |_| Ok(Some(found.clone())));
    repository
        .expect_mark_message_answered()
        .returning(|_| Ok(()));

    let (service, broadcaster) = build_service(repository);
    let sink = subscribe(&broadcaster, room_id).await;

    service.answer_message(room_id, message_id).await.unwrap();

    let events = wait_for_events(&sink, 1).await;
    assert_eq!(events[0]["kind"], "message_answered");
    assert_eq!(events[0]["value"]["id"], Uuid::from(message_id).to_string());
}

#[tokio::test]
async fn get_room_message_rejects_message_from_other_room() {
    let room = test_room();
    let foreign = test_message(RoomId::new(Uuid::new_v4()));

    let mut repository = MockRoomRepository::new();
    let found = room.clone();
    repository
        .expect_find_room()
        .returning(move |_| Ok(Some(found.clone())));
    let stored = foreign.clone();
    repository
        .expect_find_message()
        .returning(move |_| Ok(Some(stored.clone())));

    let (service, _broadcaster) = build_service(repository);
    let result = service.get_room_message(room.id, foreign.id).await;

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MessageNotFound))
    ));
}
