//! Blocking HTTP front end over [`tiny_http`].
//!
//! A fixed pool of worker threads shares one listening [`Server`] and one
//! read-only [`AppState`]; each request is handled start to finish on the
//! thread that received it.

use crate::apispec::build_api_spec;
use crate::config::Config;
use crate::error::JcvError;
use crate::registry::ComponentRegistry;
use crate::shutdown::is_shutdown_requested;
use serde_json::Value;
use std::io::{Cursor, Read};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

pub mod router;

pub use router::{Reply, route};

pub const CORS_ALLOW_ORIGIN: &str = "*";

/// Everything a request handler needs, built once at startup.
pub struct AppState {
    registry: ComponentRegistry,
    api_spec: Value,
    max_body_bytes: usize,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        registry: ComponentRegistry,
        max_body_bytes: usize,
        contact_email: Option<&str>,
    ) -> AppState {
        let api_spec = build_api_spec(&registry, contact_email);
        AppState {
            registry,
            api_spec,
            max_body_bytes,
            started_at: Instant::now(),
        }
    }

    pub fn from_config(registry: ComponentRegistry, config: &Config) -> AppState {
        AppState::new(
            registry,
            config.max_body_bytes(),
            config.contact_email().as_deref(),
        )
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn api_spec(&self) -> &Value {
        &self.api_spec
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Stops a running [`ValidatorServer`]. Cheap to clone and safe to call more
/// than once.
#[derive(Clone)]
pub struct ShutdownHandle {
    server: Arc<Server>,
    workers: usize,
    stop: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if self.stop.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("stopping {} worker(s)", self.workers);
        // each unblock releases one thread parked in recv()
        for _ in 0..self.workers {
            self.server.unblock();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

pub struct ValidatorServer {
    server: Arc<Server>,
    state: Arc<AppState>,
    workers: usize,
    stop: Arc<AtomicBool>,
}

impl ValidatorServer {
    pub fn bind(address: &str, state: AppState, workers: usize) -> Result<ValidatorServer, JcvError> {
        let server = Server::http(address)
            .map_err(|e| JcvError::ServerError(format!("failed to bind {}: {}", address, e)))?;
        Ok(ValidatorServer {
            server: Arc::new(server),
            state: Arc::new(state),
            workers: workers.max(1),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The bound address; useful when binding port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server: Arc::clone(&self.server),
            workers: self.workers,
            stop: Arc::clone(&self.stop),
        }
    }

    /// Serves until [`ShutdownHandle::shutdown`] is called.
    pub fn run(self) -> Result<(), JcvError> {
        match self.local_addr() {
            Some(addr) => info!("listening on http://{}", addr),
            None => info!("listening"),
        }

        let mut handles = Vec::with_capacity(self.workers);
        for index in 0..self.workers {
            let server = Arc::clone(&self.server);
            let state = Arc::clone(&self.state);
            let stop = Arc::clone(&self.stop);
            let handle = thread::Builder::new()
                .name(format!("jcv-worker-{}", index))
                .spawn(move || worker_loop(&server, &state, &stop))?;
            handles.push(handle);
        }

        let mut panicked = 0;
        for handle in handles {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            error!("{} worker(s) panicked", panicked);
            return Err(JcvError::ServerError(format!(
                "{} worker thread(s) panicked",
                panicked
            )));
        }
        info!("server stopped");
        Ok(())
    }
}

fn worker_loop(server: &Server, state: &AppState, stop: &AtomicBool) {
    debug!("worker started");
    let stopping = || stop.load(Ordering::SeqCst) || is_shutdown_requested();
    while !stopping() {
        match server.recv() {
            Ok(request) => handle_request(state, request),
            Err(e) => {
                if stopping() {
                    break;
                }
                warn!("failed to receive request: {}", e);
            }
        }
    }
    debug!("worker exiting");
}

enum BodyError {
    TooLarge,
    Io(std::io::Error),
}

fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>, BodyError> {
    if let Some(length) = request.body_length()
        && length > limit
    {
        return Err(BodyError::TooLarge);
    }
    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(BodyError::Io)?;
    if body.len() > limit {
        return Err(BodyError::TooLarge);
    }
    Ok(body)
}

fn handle_request(state: &AppState, mut request: Request) {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();
    let span = info_span!("request", id = %Uuid::new_v4(), method = %method, url = %url);
    let _entered = span.enter();

    let reply = match read_body(&mut request, state.max_body_bytes()) {
        Ok(body) => route(state, &method, &url, &body),
        Err(BodyError::TooLarge) => Reply::text(
            413,
            format!(
                "Request body exceeds the limit of {} bytes",
                state.max_body_bytes()
            ),
        ),
        Err(BodyError::Io(e)) => Reply::text(400, format!("Failed to read request body: {}", e)),
    };

    let status = reply.status;
    if let Err(e) = request.respond(into_response(reply)) {
        warn!("failed to send response: {}", e);
    }
    info!(
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "handled request"
    );
}

/// Adds the content type and the CORS origin header every response carries.
pub fn into_response(reply: Reply) -> Response<Cursor<Vec<u8>>> {
    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    let headers = [
        ("Content-Type", reply.content_type.to_string()),
        ("Access-Control-Allow-Origin", CORS_ALLOW_ORIGIN.to_string()),
    ]
    .into_iter()
    .chain(reply.headers);

    for (name, value) in headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => response.add_header(header),
            Err(()) => warn!("dropping invalid header {}", name),
        }
    }
    response
}
