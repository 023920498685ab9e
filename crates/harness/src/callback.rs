//! Local capture of the CLI-login redirect callback
//!
//! Stands in for the redirect endpoint of the external authorization flow so
//! a test can observe the `code`/`state`/`error` parameters the flow would
//! deliver, without a publicly reachable endpoint.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify, RwLock};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Query parameters captured from one redirect callback, verbatim.
///
/// All fields are optional: an authorization flow delivers `code` and
/// `state` on success, `error` on denial, and the capture endpoint never
/// rejects a request for missing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRecord {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Configuration for the callback listener.
#[derive(Debug, Clone)]
pub struct CallbackServerConfig {
    /// Interface to bind on.
    pub host: String,

    /// First candidate port. Concurrent test workers each probe upward from
    /// here until a bind succeeds, so a hard-coded port is never shared.
    pub base_port: u16,

    /// How many candidate ports to try before giving up.
    pub max_probes: u16,
}

impl Default for CallbackServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            base_port: 3100,
            max_probes: 50,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    /// Latest captured record; a later callback overwrites an earlier one.
    record: RwLock<Option<CallbackRecord>>,
    /// Wakes waiters suspended in [`CallbackCaptureServer::wait_for_callback`].
    notify: Notify,
}

struct Listening {
    port: u16,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Transient HTTP listener that captures a single redirect-style callback.
///
/// Lifecycle: `Stopped -> start() -> Listening -> stop() -> Stopped`. One
/// instance per test; the bound port is owned for the instance's lifetime
/// and released by `stop`.
pub struct CallbackCaptureServer {
    config: CallbackServerConfig,
    shared: Arc<Shared>,
    listening: Option<Listening>,
}

impl CallbackCaptureServer {
    pub fn new() -> Self {
        Self::with_config(CallbackServerConfig::default())
    }

    pub fn with_config(config: CallbackServerConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::default()),
            listening: None,
        }
    }

    /// Bind the first free port at or above `base_port` and begin serving
    /// the callback endpoint on a background task.
    ///
    /// Probing is acquire-and-verify: each candidate is actually bound, and
    /// `AddrInUse` moves on to the next, so a port grabbed by a concurrent
    /// worker between discovery and bind cannot be trusted by mistake.
    pub async fn start(&mut self) -> HarnessResult<()> {
        if self.listening.is_some() {
            return Ok(()); // Already listening
        }

        let listener = self.bind_first_free().await?;
        let port = listener.local_addr()?.port();

        let app = Router::new()
            .route("/callback", get(capture))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.shared));

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                warn!("Callback server exited with error: {}", e);
            }
        });

        info!("Callback server listening on port {}", port);

        self.listening = Some(Listening {
            port,
            shutdown,
            task,
        });
        Ok(())
    }

    async fn bind_first_free(&self) -> HarnessResult<TcpListener> {
        for attempt in 0..self.config.max_probes {
            let Some(port) = self.config.base_port.checked_add(attempt) else {
                break;
            };

            match TcpListener::bind((self.config.host.as_str(), port)).await {
                Ok(listener) => return Ok(listener),
                Err(e) if e.kind() == ErrorKind::AddrInUse => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(HarnessError::PortBind {
            base: self.config.base_port,
            attempts: self.config.max_probes,
        })
    }

    /// Port currently bound, if listening.
    pub fn port(&self) -> Option<u16> {
        self.listening.as_ref().map(|l| l.port)
    }

    /// The URL to hand to the external flow as its redirect target.
    ///
    /// Only meaningful while listening, since the bound port is not known
    /// before `start`.
    pub fn callback_url(&self) -> HarnessResult<String> {
        self.listening
            .as_ref()
            .map(|l| format!("http://localhost:{}/callback", l.port))
            .ok_or(HarnessError::NotStarted)
    }

    /// Wait until a callback has been captured or `timeout` elapses.
    ///
    /// Returns immediately when a record already exists. Otherwise this is a
    /// race between the capture endpoint and the timer; the losing branch is
    /// discarded without side effects, and a request landing after the
    /// timeout is still stored for later accessors.
    pub async fn wait_for_callback(&self, timeout: Duration) -> HarnessResult<CallbackRecord> {
        let waited_ms = timeout.as_millis() as u64;
        let shared = Arc::clone(&self.shared);

        tokio::time::timeout(timeout, async move {
            loop {
                let notified = shared.notify.notified();
                tokio::pin!(notified);
                // Register for wakeups before checking the slot, so an
                // arrival between the check and the await is not lost.
                notified.as_mut().enable();

                if let Some(record) = shared.record.read().await.clone() {
                    return record;
                }

                notified.await;
            }
        })
        .await
        .map_err(|_| HarnessError::CallbackTimeout { waited_ms })
    }

    /// Latest captured record, or `None` if no callback has arrived yet.
    /// Never suspends on a pending callback.
    pub async fn received_callback(&self) -> Option<CallbackRecord> {
        self.shared.record.read().await.clone()
    }

    /// Close the listener and release the port. No-op when already stopped.
    ///
    /// The serve task is awaited, so the port is free for a new bind once
    /// this returns.
    pub async fn stop(&mut self) {
        if let Some(listening) = self.listening.take() {
            let _ = listening.shutdown.send(());
            if let Err(e) = listening.task.await {
                if !e.is_cancelled() {
                    warn!("Callback server task ended abnormally: {}", e);
                }
            }
            info!("Callback server on port {} stopped", listening.port);
        }
    }

    /// Stop the listener and clear the stored record; the finally-style
    /// release a test calls at the end of the server's life regardless of
    /// outcome.
    pub async fn cleanup(&mut self) {
        self.stop().await;
        *self.shared.record.write().await = None;
    }
}

impl Default for CallbackCaptureServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CallbackCaptureServer {
    fn drop(&mut self) {
        // Last-resort release when a test forgot to stop; dropping the
        // shutdown sender unblocks graceful shutdown, aborting covers a
        // task that never observed it.
        if let Some(listening) = self.listening.take() {
            drop(listening.shutdown);
            listening.task.abort();
        }
    }
}

/// Query parameters recognized on the callback path. Unknown parameters are
/// ignored rather than rejected.
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn capture(
    State(shared): State<Arc<Shared>>,
    Query(query): Query<CallbackQuery>,
) -> Html<String> {
    let record = CallbackRecord {
        code: query.code,
        state: query.state,
        error: query.error,
    };

    info!(
        "Captured login callback (code: {}, state: {}, error: {})",
        record.code.is_some(),
        record.state.is_some(),
        record.error.is_some()
    );

    {
        let mut slot = shared.record.write().await;
        *slot = Some(record.clone());
    }
    shared.notify.notify_waiters();

    Html(confirmation_page(&record))
}

fn confirmation_page(record: &CallbackRecord) -> String {
    let mut rows = String::new();
    for (label, value) in [
        ("code", &record.code),
        ("state", &record.state),
        ("error", &record.error),
    ] {
        if let Some(v) = value {
            rows.push_str(&format!(
                "    <p>{}: <code>{}</code></p>\n",
                label,
                escape_html(v)
            ));
        }
    }

    format!(
        "<!DOCTYPE html>\n<html>\n  <head><title>Login callback received</title></head>\n  <body>\n    <h1>Login callback received</h1>\n{}    <p>You can close this window and return to the test.</p>\n  </body>\n</html>\n",
        rows
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_page_echoes_present_fields() {
        let page = confirmation_page(&CallbackRecord {
            code: Some("abc123".to_string()),
            state: Some("xyz".to_string()),
            error: None,
        });

        assert!(page.contains("abc123"));
        assert!(page.contains("xyz"));
        assert!(!page.contains("error:"));
    }

    #[test]
    fn confirmation_page_escapes_markup() {
        let page = confirmation_page(&CallbackRecord {
            code: Some("<script>".to_string()),
            state: None,
            error: None,
        });

        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
