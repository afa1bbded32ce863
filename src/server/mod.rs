use tracing::info;

use crate::config::Config;

pub mod api;
pub mod routes;
pub mod static_files;

pub use routes::router;

pub fn run_server(config: &Config) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))
}

async fn serve(config: &Config) -> std::io::Result<()> {
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("prodeff server listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await
}
