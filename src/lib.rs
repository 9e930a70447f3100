//! Shelf application library
//!
//! The catalog module plus the bootstrap shared by the server binary and the CLI.

pub mod modules;
pub mod utils;

use anyhow::Context;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Re-export commonly used types
pub use modules::*;

/// Build the registry, run module init/start, serve HTTP until a shutdown signal, then stop.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &settings)?;
    tracing::info!(modules = registry.len(), "modules registered");

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = shelf_http::start_server(&registry, &settings, shelf_http::shutdown_signal())
        .await
        .context("server exited with an error");

    registry.stop_all().await?;
    served
}
