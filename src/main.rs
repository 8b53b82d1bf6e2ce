use std::path::PathBuf;

use anyhow::Context;
use ringwin::config::Config;
use ringwin::console::ConsoleSession;
use tokio::io::{self, BufReader};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // .env は任意
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    // ファイル出力を使う場合、guard が drop されるまでに書き切る
    let _guard = init_tracing(&config)?;

    tracing::info!(
        "ringwin starting: capacity {}, policy {} ({})",
        config.capacity,
        config.policy,
        config.env
    );

    let mut session = ConsoleSession::from_config(&config);
    let mut stdout = io::stdout();

    let handled = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(script) => {
            tracing::info!("Reading commands from {}", script.display());
            let file = tokio::fs::File::open(&script)
                .await
                .with_context(|| format!("Failed to open script {}", script.display()))?;
            session.run(BufReader::new(file), &mut stdout).await?
        }
        None => session.run(BufReader::new(io::stdin()), &mut stdout).await?,
    };

    let stats = session.stats();
    tracing::info!(
        "ringwin finished: {} response(s), {} pushed, {} evicted, {} rejected, {} error(s)",
        handled,
        stats.pushed,
        stats.evicted,
        stats.rejected,
        stats.errors
    );
    Ok(())
}

/// stdout はプロトコル出力専用なので、ログは stderr（と任意でファイル）に出す
fn init_tracing(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(stderr_layer);

    let Some(dir) = &config.log_dir else {
        registry.init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "ringwin.log"));
    registry
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
    Ok(Some(guard))
}
