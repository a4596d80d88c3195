mod room_service;
#[cfg(test)]
mod room_service_tests;

pub use room_service::{
    CreateMessageRequest, CreateRoomRequest, RoomService, RoomServiceDependencies,
};
