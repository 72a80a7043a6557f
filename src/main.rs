//! Narravox Worker - 队列任务处理进程
//!
//! 加载配置、组装 AppState，消费旁白与克隆任务直到收到 Ctrl-C。

use narravox::config::{load_config, print_config};
use narravox::infrastructure::AppState;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},narravox={}", config.log.level, config.log.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Narravox - voice identity store and narration worker");
    print_config(&config);

    let state = AppState::build(&config).await?;

    let Some(worker) = state.worker() else {
        state.shutdown().await;
        anyhow::bail!("No queue backend configured; set NARRAVOX_QUEUE__BACKEND to memory or sqlite");
    };

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(worker.run(cancel.clone()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    cancel.cancel();
    if let Err(e) = handle.await {
        tracing::error!(error = %e, "Worker task panicked");
    }
    state.shutdown().await;

    Ok(())
}
