use std::sync::Arc;

mod api;
mod config;
mod courses;
mod error;
mod http;
mod logger;
mod server;

use error::ServerError;

fn main() -> Result<(), ServerError> {
    let cfg = config::Config::load()?;

    // Size the Tokio runtime from the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), ServerError> {
    logger::init(&cfg).map_err(ServerError::LogFile)?;

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let local_addr = listener.local_addr()?;

    let state = Arc::new(config::AppState::new(&cfg));
    logger::log_server_start(&local_addr, &cfg);
    logger::log_info(&format!("Serving {} courses", state.store.list_all().len()));

    server::serve(listener, state, server::shutdown_signal()).await;
    logger::log_info("Server stopped");
    Ok(())
}
