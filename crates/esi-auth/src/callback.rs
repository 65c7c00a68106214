//! Local callback listener for the authorization redirect
//!
//! Bound before the browser is launched so the redirect can never arrive
//! ahead of the listener. Any method and path is accepted; only the
//! `state` and `code` query parameters matter. The first request carrying
//! the expected state and a non-empty code resolves the attempt; every other
//! request is answered 400 with an empty body and the listener keeps waiting.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Page shown in the browser once the code has been captured.
const SUCCESS_PAGE: &str = "<!DOCTYPE html>\
<html><head><title>ESI login</title></head>\
<body style=\"font-family: sans-serif; text-align: center; padding-top: 80px;\">\
<h2>Authorization complete</h2>\
<p>You can close this window and return to the terminal.</p>\
</body></html>";

/// How long `close` waits for in-flight connections before aborting the server.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Shared between the request handler and the listener owner.
#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    code_tx: Arc<Mutex<Option<oneshot::Sender<String>>>>,
}

/// The only query parameters the callback looks at.
#[derive(Debug, Deserialize)]
struct CallbackParams {
    state: Option<String>,
    code: Option<String>,
}

fn callback_router(state: CallbackState) -> Router {
    Router::new().fallback(handle_callback).with_state(state)
}

async fn handle_callback(
    State(state): State<CallbackState>,
    params: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let Ok(Query(params)) = params else {
        debug!("ignoring callback with an unparseable query");
        return StatusCode::BAD_REQUEST.into_response();
    };

    if params.state.as_deref() != Some(&*state.expected_state) {
        debug!("ignoring callback with missing or mismatched state");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let Some(code) = params.code.filter(|code| !code.is_empty()) else {
        debug!("ignoring callback without an authorization code");
        return StatusCode::BAD_REQUEST.into_response();
    };

    let Some(sender) = state.code_tx.lock().await.take() else {
        debug!("ignoring callback for an attempt that already resolved");
        return StatusCode::BAD_REQUEST.into_response();
    };

    if sender.send(code).is_err() {
        warn!("authorization attempt was abandoned before the callback arrived");
        return StatusCode::GONE.into_response();
    }

    info!("authorization code received");
    (StatusCode::OK, Html(SUCCESS_PAGE)).into_response()
}

/// A bound, running callback listener for one authorization attempt.
pub struct CallbackListener {
    addr: SocketAddr,
    code_rx: oneshot::Receiver<String>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: JoinHandle<std::io::Result<()>>,
}

impl CallbackListener {
    /// Bind `addr` and start serving. Fails with `ListenerInUse` when another
    /// attempt (or process) already holds the port.
    pub async fn bind(addr: SocketAddr, expected_state: impl Into<String>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                Error::ListenerInUse(addr)
            } else {
                Error::Listener(format!("binding {addr}: {e}"))
            }
        })?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::Listener(format!("reading bound address: {e}")))?;

        let (code_tx, code_rx) = oneshot::channel();
        let state = CallbackState {
            expected_state: Arc::from(expected_state.into()),
            code_tx: Arc::new(Mutex::new(Some(code_tx))),
        };
        let app = callback_router(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        debug!(addr = %addr, "callback listener bound");
        Ok(Self {
            addr,
            code_rx,
            shutdown_tx: Some(shutdown_tx),
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the first valid callback, then close the listener.
    ///
    /// On timeout the listener is closed as well and the port released.
    pub async fn wait_for_code(mut self, timeout: Duration) -> Result<String> {
        let outcome = tokio::time::timeout(timeout, &mut self.code_rx).await;
        self.close().await;

        match outcome {
            Ok(Ok(code)) => Ok(code),
            Ok(Err(_)) => Err(Error::Listener(
                "callback listener stopped before a code arrived".into(),
            )),
            Err(_) => {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "no authorization callback received, giving up"
                );
                Err(Error::CallbackTimeout(timeout))
            }
        }
    }

    /// Stop accepting connections and wait briefly for the server to drain.
    async fn close(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut self.server).await {
            Ok(Ok(Ok(()))) => debug!(addr = %self.addr, "callback listener closed"),
            Ok(Ok(Err(e))) => warn!(error = %e, "callback listener error during shutdown"),
            Ok(Err(e)) if e.is_cancelled() => {}
            Ok(Err(e)) => warn!(error = %e, "callback listener task failed"),
            Err(_) => {
                warn!("callback listener did not drain in time, aborting");
                self.server.abort();
                let _ = (&mut self.server).await;
            }
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        self.server.abort();
    }
}
