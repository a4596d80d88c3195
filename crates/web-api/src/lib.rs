//! Web API 层
//!
//! Axum 路由、REST 处理器与订阅连接的生命周期管理。

pub mod error;
pub mod routes;
pub mod state;
pub mod subscribe;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
