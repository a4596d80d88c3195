//! 基础设施层：PostgreSQL 持久化实现。

pub mod db;
pub mod repository;

pub use db::create_pg_pool;
pub use repository::PgRoomRepository;
