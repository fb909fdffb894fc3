// Connection handling module
// Accepts a single TCP connection and serves it on its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::api;
use crate::config::AppState;
use crate::logger;

/// Accept a connection, dropping it when the connection limit is reached
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<AppState>,
) {
    // Increment first, then check the limit, so concurrent accepts cannot overshoot
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// How long one connection may stay open before it is asked to close
fn connection_timeout(state: &AppState) -> Duration {
    let perf = &state.config.performance;
    Duration::from_secs(perf.read_timeout.max(perf.write_timeout))
}

/// Serve one connection on a spawned task.
///
/// The connection is wrapped in `TokioIo` and served as HTTP/1.1 with
/// keep-alive. Once the connection timeout passes, hyper is told to shut
/// the connection down gracefully: a request in flight still gets its
/// response, then the socket closes. A client that stalls after that is
/// dropped after a further `write_timeout`. The active connection counter
/// is decremented when the task ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<AppState>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_duration = connection_timeout(&state);

        let mut builder = http1::Builder::new();
        builder.keep_alive(state.config.performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| api::handle_request(req, Arc::clone(&service_state), peer_addr)),
        );

        tokio::pin!(conn);
        let deadline = tokio::time::sleep(timeout_duration);
        tokio::pin!(deadline);

        let result = tokio::select! {
            result = conn.as_mut() => Some(result),
            () = &mut deadline => {
                logger::log_debug(&format!(
                    "Connection from {peer_addr} open for {} seconds, closing",
                    timeout_duration.as_secs()
                ));
                conn.as_mut().graceful_shutdown();
                let grace = Duration::from_secs(state.config.performance.write_timeout);
                tokio::time::timeout(grace, conn.as_mut()).await.ok()
            }
        };

        match result {
            Some(Ok(())) => {}
            Some(Err(err)) => logger::log_connection_error(&err),
            None => logger::log_warning(&format!(
                "Connection from {peer_addr} did not close in time, dropping"
            )),
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_connection_timeout_is_read_write_max() {
        let mut cfg = Config::load_from("does-not-exist/courses").unwrap();
        cfg.performance.read_timeout = 10;
        cfg.performance.write_timeout = 20;
        cfg.performance.keep_alive_timeout = 75;
        assert_eq!(
            connection_timeout(&AppState::new(&cfg)),
            Duration::from_secs(20)
        );

        cfg.performance.read_timeout = 40;
        assert_eq!(
            connection_timeout(&AppState::new(&cfg)),
            Duration::from_secs(40)
        );
    }
}
