//! Rolodex contact service.
//!
//! ```text
//! rolodex --port 8888 --endpoints-prefix /api --log-format text
//! ```

mod cli;

use anyhow::Context;
use rolodex_server::app;
use rolodex_telemetry::{init_logging, BuildInfo};

use crate::cli::Cli;

/// Build metadata reported by `build_info`.
fn build_info() -> BuildInfo {
    let mut info = BuildInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if let Some(revision) = option_env!("ROLODEX_REVISION") {
        info = info.with_revision(revision);
    }
    if let Some(created) = option_env!("ROLODEX_CREATED") {
        info = info.with_created(created);
    }
    info
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_logging(&cli.to_log_config()).context("failed to initialize logging")?;

    let config = cli.to_server_config();
    let build_info = build_info();
    tracing::info!(
        version = %build_info.version,
        revision = %build_info.revision,
        addr = %config.bind_addr(),
        prefix = %config.endpoints_prefix(),
        "starting rolodex"
    );

    app::build_server(config, build_info)
        .run()
        .await
        .context("server failed")?;

    tracing::info!("rolodex stopped");
    Ok(())
}
