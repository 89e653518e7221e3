//! Hyper-based HTTP Server
//!
//! Direct Hyper implementation: routing is a plain match on (method, path),
//! and the response headers every reply carries are applied in
//! [`handle_request`] after routing.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::body::to_bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde::Serialize;
use tokio::net::TcpSocket;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::models::{EmbeddingManager, SentenceEncoder};
use crate::protocol::http::{EmbedInputs, HealthResponse, HttpErrorResponse};
use crate::server::config::ServerConfig;

/// Feature-extraction endpoint, returns `[[f32]]`
pub const FEATURE_EXTRACTION_PATH: &str =
    "/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2";

/// Semantic Kernel endpoint, returns `{"data": [{"embedding": [f32]}]}`
pub const SEMANTIC_KERNEL_PATH: &str = "/semantic-kernel/sentence-transformers/all-MiniLM-L6-v2";

pub const HEALTH_PATH: &str = "/health";

/// Elapsed handling time in seconds, set on every response
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

const APPLICATION_JSON: &str = "application/json";

/// Shared state for Hyper server
#[derive(Clone)]
pub struct ServerState {
    manager: EmbeddingManager,
}

impl ServerState {
    pub fn new(encoder: Arc<dyn SentenceEncoder>) -> Self {
        Self {
            manager: EmbeddingManager::new(encoder),
        }
    }
}

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn start_hyper_http_server<F>(
    config: Arc<ServerConfig>,
    encoder: Arc<dyn SentenceEncoder>,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()>,
{
    let bind_address = config.network.bind_address.clone();

    info!("🚀 Starting Hyper HTTP Server");
    info!("📡 Binding to {}", bind_address);

    let state = ServerState::new(encoder);

    let make_svc = make_service_fn(move |_| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                handle_request(req, state)
            }))
        }
    });

    let addr: SocketAddr = bind_address.parse()?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    // Small JSON replies must not wait on Nagle's algorithm
    socket.set_nodelay(true)?;
    socket.set_reuseaddr(true)?;

    socket.bind(addr)?;
    let listener = socket.listen(1024)?;

    let server = Server::from_tcp(listener.into_std()?)?
        .http1_keepalive(true)
        .tcp_nodelay(true)
        .tcp_sleep_on_accept_errors(true)
        .serve(make_svc)
        .with_graceful_shutdown(shutdown);

    info!("✅ HTTP server listening on {}", bind_address);
    info!("📍 Endpoints:");
    info!("   POST {}", FEATURE_EXTRACTION_PATH);
    info!("   POST {}", SEMANTIC_KERNEL_PATH);
    info!("   GET  {}", HEALTH_PATH);

    server.await?;

    info!("🛑 HTTP server stopped");
    Ok(())
}

/// Route a request and stamp the common response headers
pub async fn handle_request(
    req: Request<Body>,
    state: ServerState,
) -> Result<Response<Body>, Infallible> {
    let start_time = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let span = info_span!("request", id = %Uuid::new_v4(), %method, %path);

    let mut response = route(req, state, &method, &path).instrument(span.clone()).await;

    let elapsed = start_time.elapsed();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&elapsed.as_secs_f64().to_string()) {
        headers.insert(PROCESS_TIME_HEADER, value);
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

    span.in_scope(|| debug!("{} {} -> {} in {:?}", method, path, response.status(), elapsed));

    Ok(response)
}

async fn route(req: Request<Body>, state: ServerState, method: &Method, path: &str) -> Response<Body> {
    match (method, path) {
        (&Method::POST, FEATURE_EXTRACTION_PATH) => handle_feature_extraction(req, state).await,
        (&Method::POST, SEMANTIC_KERNEL_PATH) => handle_semantic_kernel(req, state).await,
        (&Method::GET, HEALTH_PATH) => handle_health(state).await,
        (_, FEATURE_EXTRACTION_PATH) | (_, SEMANTIC_KERNEL_PATH) => method_not_allowed("POST"),
        (_, HEALTH_PATH) => method_not_allowed("GET"),
        _ => json_response(StatusCode::NOT_FOUND, &HttpErrorResponse::not_found()),
    }
}

/// POST feature-extraction: flat list of vectors
async fn handle_feature_extraction(req: Request<Body>, state: ServerState) -> Response<Body> {
    let inputs = match read_inputs(req).await {
        Ok(inputs) => inputs,
        Err(response) => return response,
    };

    match state.manager.generate_embeddings(&inputs).await {
        Ok(vectors) => json_response(StatusCode::OK, &vectors),
        Err(e) => {
            error!("❌ Embedding generation failed: {}", e);
            internal_error()
        }
    }
}

/// POST semantic-kernel: vectors wrapped in `data` records
async fn handle_semantic_kernel(req: Request<Body>, state: ServerState) -> Response<Body> {
    let inputs = match read_inputs(req).await {
        Ok(inputs) => inputs,
        Err(response) => return response,
    };

    match state.manager.generate_embeddings_wrapped(&inputs).await {
        Ok(wrapped) => json_response(StatusCode::OK, &wrapped),
        Err(e) => {
            error!("❌ Embedding generation failed: {}", e);
            internal_error()
        }
    }
}

/// Health check: a probe encode through the shared encoder
async fn handle_health(state: ServerState) -> Response<Body> {
    debug!("🏥 Health check requested");

    let probe = EmbedInputs::new(vec!["test".to_string()]);
    match state.manager.generate_embeddings(&probe).await {
        Ok(vectors) => {
            let dimension = vectors.first().map(Vec::len).unwrap_or(0);
            let response = HealthResponse::healthy(&state.manager.model_info().name, dimension);
            json_response(StatusCode::OK, &response)
        }
        Err(e) => {
            error!("❌ Health check failed: {}", e);
            json_response(StatusCode::SERVICE_UNAVAILABLE, &HttpErrorResponse::model_not_ready())
        }
    }
}

/// Read and validate the body; the `Err` side is the finished error response
async fn read_inputs(req: Request<Body>) -> Result<EmbedInputs, Response<Body>> {
    let body_bytes = to_bytes(req.into_body()).await.map_err(|e| {
        error!("❌ Failed to read request body: {}", e);
        json_response(
            StatusCode::BAD_REQUEST,
            &HttpErrorResponse::new("Failed to read request body"),
        )
    })?;

    EmbedInputs::from_json(&body_bytes).map_err(|validation| {
        debug!("Rejected request body: {} validation issue(s)", validation.detail.len());
        json_response(StatusCode::UNPROCESSABLE_ENTITY, &validation)
    })
}

fn method_not_allowed(allow: &'static str) -> Response<Body> {
    let mut response = json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &HttpErrorResponse::method_not_allowed(),
    );
    response.headers_mut().insert(ALLOW, HeaderValue::from_static(allow));
    response
}

fn internal_error() -> Response<Body> {
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &HttpErrorResponse::internal_error())
}

/// Serialize `body` into a JSON response
fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            error!("❌ Failed to serialize response: {}", e);
            let fallback = format!(r#"{{"detail":"{}"}}"#, crate::protocol::INTERNAL_ERROR_DETAIL);
            (StatusCode::INTERNAL_SERVER_ERROR, fallback.into_bytes())
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}
