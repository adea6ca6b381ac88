mod config;
mod http;
mod proxy;
mod router;
mod server;
mod static_files;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    tracing::info!(
        origin = %cfg.upstream.origin,
        routes = ?cfg.upstream.routes,
        static_root = %cfg.static_files.root.display(),
        "Configuration loaded"
    );
    for alias in &cfg.resolve.alias {
        // Build-time module resolution metadata; the router never uses it.
        tracing::info!(
            symbol = %alias.symbol,
            path = %alias.path.display(),
            "Module alias registered"
        );
    }

    tokio::select! {
        res = server::listener::run(&cfg) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
