// Server loop module
// Accepts connections until the shutdown future resolves, then drains

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Interval between checks of the active connection count while draining
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Run the accept loop until `shutdown` completes.
///
/// After shutdown the listener is closed and in-flight connections get up
/// to `performance.write_timeout` seconds to finish.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                break;
            }
        }
    }

    drop(listener);
    logger::log_server_stop(state.connection_count());

    let grace = Duration::from_secs(state.config.performance.write_timeout);
    if tokio::time::timeout(grace, wait_for_idle(&state)).await.is_err() {
        logger::log_warning(&format!(
            "{} connection(s) still open after {}s, closing",
            state.connection_count(),
            grace.as_secs()
        ));
    }
}

async fn wait_for_idle(state: &AppState) {
    while state.connection_count() > 0 {
        tokio::time::sleep(DRAIN_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::client::conn::http1;
    use hyper::{Request, StatusCode};
    use hyper_util::rt::TokioIo;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    fn test_config() -> Config {
        let mut cfg = Config::load_from("does-not-exist/courses").unwrap();
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 0;
        cfg.logging.access_log = false;
        cfg.performance.write_timeout = 1;
        cfg
    }

    async fn client(addr: std::net::SocketAddr) -> http1::SendRequest<Full<Bytes>> {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (sender, conn) = http1::handshake(TokioIo::new(stream)).await.unwrap();
        tokio::spawn(async move {
            let _ = conn.await;
        });
        sender
    }

    #[tokio::test]
    async fn test_end_to_end_over_tcp() {
        let cfg = test_config();
        let listener = create_listener(cfg.get_socket_addr().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(&cfg));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve(listener, Arc::clone(&state), async {
            let _ = stop_rx.await;
        }));

        let mut sender = client(addr).await;

        let req = Request::get("/")
            .header("Host", addr.to_string())
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = sender.send_request(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 4);

        // Same keep-alive connection
        let req = Request::post("/")
            .header("Host", addr.to_string())
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from_static(
                br#"{"id":"9999999","name":"Test","credits":2}"#,
            )))
            .unwrap();
        let resp = sender.send_request(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"id":"9999999","name":"Test","credits":2}"#);

        let req = Request::get("/does-not-exist")
            .header("Host", addr.to_string())
            .body(Full::new(Bytes::new()))
            .unwrap();
        let resp = sender.send_request(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        drop(sender);
        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_json_over_tcp() {
        let cfg = test_config();
        let listener = create_listener(cfg.get_socket_addr().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(&cfg));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state, async {
            let _ = stop_rx.await;
        }));

        let mut sender = client(addr).await;
        let req = Request::post("/")
            .header("Host", addr.to_string())
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from_static(b"{not json")))
            .unwrap();
        let resp = sender.send_request(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        drop(sender);
        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_limit_drops_excess() {
        let mut cfg = test_config();
        cfg.performance.max_connections = Some(1);
        let listener = create_listener(cfg.get_socket_addr().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::new(&cfg));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, Arc::clone(&state), async {
            let _ = stop_rx.await;
        }));

        let get = || {
            Request::get("/8108255")
                .header("Host", addr.to_string())
                .body(Full::new(Bytes::new()))
                .unwrap()
        };

        // First connection is accepted and kept alive
        let mut sender = client(addr).await;
        let resp = sender.send_request(get()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(state.connection_count(), 1);

        // Second connection is closed by the server without a response
        let mut extra = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 16];
        let read = tokio::time::timeout(Duration::from_secs(5), extra.read(&mut buf))
            .await
            .expect("excess connection was left open");
        assert!(matches!(read, Ok(0) | Err(_)), "got {read:?}");
        assert_eq!(state.connection_count(), 1);

        // The held connection still works
        let resp = sender.send_request(get()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(state.connection_count(), 1);

        drop(sender);
        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_without_connections() {
        let cfg = test_config();
        let listener = create_listener(cfg.get_socket_addr().unwrap()).unwrap();
        let state = Arc::new(AppState::new(&cfg));
        serve(listener, Arc::clone(&state), async {}).await;
        assert_eq!(state.connection_count(), 0);
    }
}
