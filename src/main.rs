//! `parley` binary: serves MCP over stdin and stdout.
//!
//! Configuration comes from `PARLEY_*` environment variables (see
//! [`parley::config`]). Logs are written to stderr.

use mockable::DefaultClock;
use parley::config::ServerConfig;
use parley::event::TracingEventPublisher;
use parley::logging;
use parley::protocol::Dispatcher;
use parley::tool::adapters::echo_tool;
use std::sync::Arc;
use tracing::info;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = ServerConfig::from_env()?;
    logging::init_logging(&config.log_filter)?;

    let clock = Arc::new(DefaultClock);
    let echo = echo_tool(&*clock)?.with_timeout(config.tool_timeout)?;
    let dispatcher = Dispatcher::new(
        config.server_info.clone(),
        config.capabilities(),
        tokio::io::stdout(),
        Arc::new(TracingEventPublisher),
        clock,
    )
    .with_tool(echo)
    .with_max_line_bytes(config.max_line_bytes);

    info!(
        server = %config.server_info.name,
        version = %config.server_info.version,
        "serving MCP over stdio"
    );
    dispatcher.serve(tokio::io::stdin()).await?;
    Ok(())
}
