//! HTTP API server for integration with other systems.
//!
//! Thin JSON endpoints over search and question answering.

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::orchestrator::Orchestrator;
use crate::rag::{ContextBuilder, RagEngine};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    settings: Settings,
    prompts: Prompts,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings.clone())?;
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let state = Arc::new(AppState {
        orchestrator,
        settings,
        prompts,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/ask", post(ask))
        .route("/transcripts", get(list_transcripts))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Playbook API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Search", "POST /search");
    Output::kv("Ask (RAG)", "POST /ask");
    Output::kv("Transcripts", "GET  /transcripts");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default = "default_min_score")]
    min_score: f32,
}

fn default_limit() -> usize {
    5
}

fn default_min_score() -> f32 {
    0.3
}

#[derive(Serialize)]
struct SearchHit {
    chunk_id: String,
    video_id: String,
    video_title: String,
    source_url: String,
    content: String,
    score: f32,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    #[serde(default)]
    max_chunks: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<SearchHit>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> impl IntoResponse {
    let builder = ContextBuilder::new(
        state.orchestrator.vector_store(),
        state.orchestrator.embedder(),
    )
    .with_max_chunks(request.limit)
    .with_min_score(request.min_score);

    match builder.build(&request.query).await {
        Ok(bundle) => {
            let results = bundle
                .chunks
                .iter()
                .map(|c| SearchHit {
                    chunk_id: c.chunk_id.clone(),
                    video_id: c.video_id.clone(),
                    video_title: c.video_title.clone(),
                    source_url: c.source_url.clone(),
                    content: c.content.clone(),
                    score: c.score,
                })
                .collect();
            Json(SearchResponse { results }).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> impl IntoResponse {
    let engine = RagEngine::new(
        state.orchestrator.vector_store(),
        state.orchestrator.embedder(),
        &state.settings.rag.model,
        request
            .max_chunks
            .unwrap_or(state.settings.rag.max_context_chunks),
        state.settings.rag.min_score,
    )
    .with_prompts(state.prompts.clone());

    match engine.ask(&request.question).await {
        Ok(response) => {
            let sources = response
                .sources
                .iter()
                .map(|c| SearchHit {
                    chunk_id: c.chunk_id.clone(),
                    video_id: c.video_id.clone(),
                    video_title: c.video_title.clone(),
                    source_url: c.source_url.clone(),
                    content: c.content.clone(),
                    score: c.score,
                })
                .collect();
            Json(AskResponse {
                answer: response.answer,
                sources,
            })
            .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn list_transcripts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.orchestrator.vector_store().list_transcripts().await {
        Ok(transcripts) => Json(transcripts).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
