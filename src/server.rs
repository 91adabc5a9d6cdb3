//! HTTP provisioning server.
//!
//! Runs in a background thread and serves the setup surface:
//!
//! - `POST /set_wifi` - encrypted credential payload, see [`crate::provision`]
//! - `GET /` - liveness check
//! - `GET /display?msg=<text>` - show a message on the status display
//!
//! Uses `tiny_http` which works on both host and ESP32 (via std::net).
//! Routing is a pure function over (method, url, body) so the whole surface
//! is testable without sockets; the server loop only does I/O and channel
//! dispatch. Credentials recovered from a setup request are sent to the
//! connection worker *after* the HTTP reply, so the client never waits on
//! network association.

use crate::pipeline::Credentials;
use crate::provision::{handle_set_wifi, DeviceKey, Reply};
use log::{error, info, warn};
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Method, Response, Server};

/// Default port for the provisioning server.
pub const DEFAULT_PORT: u16 = 80;

/// Upper bound on a request body read. Setup payloads are ~150 bytes of
/// JSON; anything larger is truncated and will fail JSON validation.
const MAX_BODY_LEN: u64 = 1024;

/// What the server loop must do for one request.
#[derive(Debug)]
pub struct Routed {
    /// Reply to send to the caller.
    pub reply: Reply,
    /// Credentials to hand to the connection worker, after replying.
    pub dispatch: Option<Credentials>,
    /// Message to forward to the display.
    pub display: Option<String>,
}

impl Routed {
    fn reply_only(reply: Reply) -> Self {
        Self {
            reply,
            dispatch: None,
            display: None,
        }
    }
}

/// Route one request. Pure apart from logging.
pub fn route(method: &Method, url: &str, body: &str, key: &DeviceKey) -> Routed {
    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p, q),
        None => (url, ""),
    };

    match (method, path) {
        (Method::Post, "/set_wifi") => {
            let outcome = handle_set_wifi(body, key);
            Routed {
                reply: outcome.reply,
                dispatch: outcome.credentials,
                display: None,
            }
        }
        (Method::Get, "/") => Routed::reply_only(Reply::ok("Hello, world!")),
        (Method::Get, "/display") => {
            let msg = query_param(query, "msg").unwrap_or_default();
            Routed {
                reply: Reply::ok(format!("Displayed: {}", msg)),
                dispatch: None,
                display: Some(msg),
            }
        }
        (_, "/set_wifi") | (_, "/") | (_, "/display") => Routed::reply_only(Reply {
            status: 405,
            text: "Method Not Allowed".into(),
        }),
        _ => Routed::reply_only(Reply {
            status: 404,
            text: "Not Found".into(),
        }),
    }
}

/// Extract and percent-decode a query-string parameter.
fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then(|| url_decode(v))
    })
}

/// Decode `%XX` escapes and `+` as space.
fn url_decode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '+' => out.push(' '),
            '%' => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                    out.push(byte as char);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// The provisioning HTTP server.
///
/// Runs in a background thread; drop it (or call [`stop`](Self::stop)) to
/// shut it down.
pub struct ProvisionServer {
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl ProvisionServer {
    /// Start the server on `0.0.0.0:port`.
    ///
    /// `creds_tx` feeds the connection worker; `display_tx` feeds the
    /// display task.
    pub fn start(
        port: u16,
        key: DeviceKey,
        creds_tx: Sender<Credentials>,
        display_tx: Sender<String>,
    ) -> Result<Self, std::io::Error> {
        let addr = format!("0.0.0.0:{}", port);
        let server = Server::http(&addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, format!("{}", e)))?;

        info!("Provisioning server listening on http://{}/", addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::spawn(move || {
            Self::run_server(server, key, creds_tx, display_tx, shutdown_clone);
        });

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    fn run_server(
        server: Server,
        key: DeviceKey,
        creds_tx: Sender<Credentials>,
        display_tx: Sender<String>,
        shutdown: Arc<AtomicBool>,
    ) {
        loop {
            if shutdown.load(Ordering::Acquire) {
                info!("Provisioning server shutting down");
                break;
            }

            match server.recv_timeout(Duration::from_millis(100)) {
                Ok(Some(mut request)) => {
                    let mut body = String::new();
                    if let Err(e) = request
                        .as_reader()
                        .take(MAX_BODY_LEN)
                        .read_to_string(&mut body)
                    {
                        warn!("Failed to read request body: {}", e);
                        let _ = request.respond(Response::from_string("Bad Request").with_status_code(400));
                        continue;
                    }

                    let routed = route(request.method(), request.url(), &body, &key);

                    if let Some(msg) = routed.display {
                        // Display task may have exited; the reply is still valid.
                        if display_tx.send(msg).is_err() {
                            warn!("Display channel closed, message dropped");
                        }
                    }

                    let response = Response::from_string(routed.reply.text)
                        .with_status_code(routed.reply.status);
                    if let Err(e) = request.respond(response) {
                        warn!("Failed to send response: {}", e);
                    }

                    // Reply first, dispatch second: the setup client must not
                    // block on association.
                    if let Some(creds) = routed.dispatch {
                        if creds_tx.send(creds).is_err() {
                            error!("Connection worker channel closed, credentials dropped");
                        }
                    }
                }
                Ok(None) => {
                    // Timeout, check shutdown flag and continue
                }
                Err(e) => {
                    error!("Server error: {}", e);
                    break;
                }
            }
        }
    }

    /// Stop the server.
    ///
    /// Note: may take up to 100 ms due to the polling interval.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProvisionServer {
    fn drop(&mut self) {
        self.stop();
    }
}
