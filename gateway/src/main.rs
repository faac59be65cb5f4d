//! API 网关服务入口

use anyhow::Context;
use common::config::{load_dotenv, AppConfig, ServiceUrls};
use gateway::{create_router, AppState, DEFAULT_PORT, SERVICE_NAME};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置并初始化日志追踪
    load_dotenv();
    common::telemetry::init_tracing();

    let config = AppConfig::load_with_service(SERVICE_NAME, DEFAULT_PORT);
    let service_urls = ServiceUrls::load();
    info!(
        ai_service = %service_urls.ai_service,
        query_service = %service_urls.query_service,
        "加载下游服务地址"
    );

    let state = AppState::new(config.clone(), service_urls).context("创建应用状态失败")?;
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_addr();
    info!(service = SERVICE_NAME, address = %addr, "启动 API 网关");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务运行失败")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "监听退出信号失败");
    }
}
