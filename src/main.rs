//! Tool Analytics MCP Server - Binary Entry Point
//!
//! Serves the analytics tools over stdio. Logs go to stderr; stdout carries
//! JSON-RPC only.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

use tool_analytics::collector::EventCollector;
use tool_analytics::config::ServerConfig;
use tool_analytics::protocol::ServerInfo;
use tool_analytics::server::McpServer;
use tool_analytics::sink::FileSink;
use tool_analytics::store::{FileQuerySource, QuerySource};
use tool_analytics::tools::register_all_tools;
use tool_analytics::types::McpResult;

#[tokio::main]
async fn main() -> McpResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        log_path = %config.log_path.display(),
        source = %config.collector.source_id,
        instrument = config.instrument,
        "starting analytics server"
    );

    let collector = if config.instrument {
        let sink = Arc::new(FileSink::new(&config.log_path));
        Some(EventCollector::new(config.collector.clone(), sink)?)
    } else {
        None
    };

    let source: Arc<dyn QuerySource> =
        Arc::new(FileQuerySource::with_config(config.source_config()));

    let mut server = McpServer::with_info(ServerInfo::default());
    if let Some(collector) = &collector {
        server = server.with_collector(collector.clone());
        install_interrupt_handler(collector.clone(), Handle::current())?;
    }
    register_all_tools(&mut server, source.clone());

    // Stdin reads block, so the loop gets its own thread
    let served = tokio::task::spawn_blocking(move || server.run()).await?;

    if let Some(collector) = &collector {
        if let Err(e) = collector.shutdown().await {
            tracing::error!(error = %e, "final delivery failed");
        }
    }
    source.shutdown()?;

    served
}

/// Flush buffered telemetry, then exit, on Ctrl+C
fn install_interrupt_handler(collector: EventCollector, runtime: Handle) -> McpResult<()> {
    ctrlc::set_handler(move || {
        tracing::info!("interrupted, flushing telemetry");
        if let Err(e) = runtime.block_on(collector.shutdown()) {
            tracing::error!(error = %e, "flush on interrupt failed");
        }
        std::process::exit(130);
    })?;
    Ok(())
}
