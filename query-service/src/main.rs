//! SQL 查询执行服务入口

use anyhow::Context;
use common::config::{load_dotenv, AppConfig, DatabaseSettings};
use query_service::{create_router, AppState, DatabasePool, DEFAULT_PORT, SERVICE_NAME};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置并初始化日志追踪
    load_dotenv();
    common::telemetry::init_tracing();

    let config = AppConfig::load_with_service(SERVICE_NAME, DEFAULT_PORT);
    let settings = DatabaseSettings::load().context("读取数据库配置失败")?;
    info!(
        policy = %config.query_policy,
        database = ?settings,
        "加载配置完成"
    );

    // 连接池在进程启动时建立一次，之后注入到执行器
    let pool = DatabasePool::connect_lazy(&config, &settings).context("创建连接池失败")?;
    let state = AppState::new(config.clone(), pool.clone());
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_addr();
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务运行失败")?;

    pool.close().await;
    info!(service = SERVICE_NAME, "服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "监听退出信号失败");
    }
}
