//! REST API server for forgechain
//!
//! Exposes the ledger's operations over typed HTTP endpoints: transaction
//! submission, mining, chain queries, peer registration and consensus
//! resolution. Request bodies are validated by their schemas before anything
//! touches the core, so a malformed request never mutates node state.

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::block::{Block, BlockHash, Transaction};
use crate::error::ChainError;
use crate::node::NodeContext;

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Malformed(String),
    Chain(ChainError),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Malformed(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Chain(e) => match e {
                ChainError::MalformedRequest(_) | ChainError::InvalidPeerAddress(_) => {
                    (StatusCode::BAD_REQUEST, e.to_string())
                }
                other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
            },
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::Chain(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct NewTransactionResponse {
    pub message: String,
    pub index: u64,
}

#[derive(Debug, Serialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: BlockHash,
}

#[derive(Debug, Serialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: u64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterNodesResponse {
    pub message: String,
    pub total_nodes: usize,
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PeersResponse {
    pub count: usize,
    pub peers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<Block>,
    pub length: u64,
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware. Logs method, path, status and duration.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints (also used by tests).
pub fn build_router(node: Arc<NodeContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        // Ledger endpoints
        .route("/transactions/new", post(new_transaction))
        .route("/mine", get(mine))
        .route("/chain", get(full_chain))
        // Consensus endpoints
        .route("/nodes/register", post(register_nodes))
        .route("/nodes/resolve", get(resolve_conflicts))
        .route("/nodes/peers", get(get_peers))
        // System endpoints
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

/// Run the API server until the process is stopped.
pub async fn run_api_server(
    node: Arc<NodeContext>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(node): State<Arc<NodeContext>>) -> impl IntoResponse {
    let length = node.ledger.read().await.len();
    Json(serde_json::json!({
        "status": "healthy",
        "node_id": node.node_id,
        "chain_length": length,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn new_transaction(
    State(node): State<Arc<NodeContext>>,
    payload: Result<Json<NewTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NewTransactionResponse>), ApiError> {
    // A missing field is rejected here, before any ledger mutation.
    let Json(req) = payload.map_err(|e| ApiError::Malformed(format!("missing values: {e}")))?;

    let tx = Transaction::new(req.sender, req.recipient, req.amount);
    let index = node.ledger.write().await.submit_transaction(tx);

    Ok((
        StatusCode::CREATED,
        Json(NewTransactionResponse {
            message: format!("Transaction will be added to Block {index}"),
            index,
        }),
    ))
}

async fn mine(State(node): State<Arc<NodeContext>>) -> Result<Json<MineResponse>, ApiError> {
    let block = node.mine().await?;

    Ok(Json(MineResponse {
        message: "New Block Forged".to_string(),
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
    }))
}

async fn full_chain(State(node): State<Arc<NodeContext>>) -> Json<ChainResponse> {
    let ledger = node.ledger.read().await;
    Json(ChainResponse {
        chain: ledger.chain().to_vec(),
        length: ledger.len(),
    })
}

async fn register_nodes(
    State(node): State<Arc<NodeContext>>,
    payload: Result<Json<RegisterNodesRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterNodesResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Malformed(format!("missing node list: {e}")))?;
    if req.nodes.is_empty() {
        return Err(ApiError::Malformed(
            "please supply a non-empty list of nodes".to_string(),
        ));
    }

    let mut peers = node.peers.write().await;
    peers.register_many(&req.nodes)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterNodesResponse {
            message: "New nodes have been added".to_string(),
            total_nodes: peers.len(),
            nodes: peers.members(),
        }),
    ))
}

async fn resolve_conflicts(State(node): State<Arc<NodeContext>>) -> Json<ResolveResponse> {
    let outcome = node.resolve_conflicts().await;

    let message = if outcome.replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    let length = outcome.chain.len() as u64;

    Json(ResolveResponse {
        message: message.to_string(),
        replaced: outcome.replaced,
        chain: outcome.chain,
        length,
    })
}

async fn get_peers(State(node): State<Arc<NodeContext>>) -> Json<PeersResponse> {
    let peers = node.peers.read().await.members();
    Json(PeersResponse {
        count: peers.len(),
        peers,
    })
}
