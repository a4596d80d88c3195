//! 主应用程序入口
//!
//! 启动房间实时通知服务。

use std::sync::Arc;

use application::{RoomBroadcaster, RoomService, RoomServiceDependencies};
use config::AppConfig;
use infrastructure::{create_pg_pool, PgRoomRepository};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app_config = AppConfig::from_env_with_defaults();
    app_config.validate()?;

    tracing::info!(
        "连接数据库: {}",
        app_config.database.url.split('@').last().unwrap_or("unknown")
    );
    let pg_pool = create_pg_pool(
        &app_config.database.url,
        app_config.database.max_connections,
    )
    .await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    let repository = Arc::new(PgRoomRepository::new(pg_pool));
    let broadcaster = Arc::new(RoomBroadcaster::new());
    let room_service = Arc::new(RoomService::new(RoomServiceDependencies {
        repository,
        broadcaster: Arc::clone(&broadcaster),
    }));

    // 进程级停机令牌：触发后所有订阅连接走统一清理路径
    let shutdown = CancellationToken::new();
    let state = AppState::new(room_service, Arc::clone(&broadcaster), shutdown.clone());

    let app = router(state);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("问答房间服务器启动在 http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown.clone()))
        .await?;

    // 排空还在途的广播任务
    broadcaster.shutdown().await;
    tracing::info!("服务器已停止");

    Ok(())
}

/// 等待 SIGINT / SIGTERM，然后触发停机令牌让订阅连接先行退出。
async fn wait_for_shutdown(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for sigterm"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
