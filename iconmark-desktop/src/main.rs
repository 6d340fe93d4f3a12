//! # iconmark Desktop
//!
//! Native desktop application for placing icons on an image.

use clap::Parser;
use iconmark_desktop::{AppEvent, CliArgs, DesktopConfig, IconmarkApp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use winit::event_loop::EventLoop;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "iconmark_desktop=debug,iconmark_core=info,iconmark_renderer=debug,wgpu=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting iconmark desktop");

    let config = DesktopConfig::from(CliArgs::parse());
    tracing::info!(
        "Window config: {}x{}, {} palette icon(s), server {}",
        config.width,
        config.height,
        config.palette.len(),
        config.server_url
    );
    if config.background.is_none() {
        tracing::warn!("No --background given; the canvas will be blank");
    }

    // Network and image work runs here; results return as user events.
    let runtime = tokio::runtime::Runtime::new()?;

    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    let mut app = IconmarkApp::new(config, runtime.handle().clone(), event_loop.create_proxy());

    event_loop.run_app(&mut app)?;

    tracing::info!("iconmark desktop exited");
    Ok(())
}
