use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use base64::Engine;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gridmdp::config::{BoardParams, SolverParams};
use gridmdp::history::Series;
use gridmdp::render::{self, Image};
use gridmdp::{Algorithm, Board, BoardSpec, generator, policy};

#[derive(Deserialize)]
struct SolveRequest {
    /// Explicit board; a random one from `random` otherwise.
    board: Option<BoardSpec>,
    #[serde(default)]
    random: BoardParams,
    #[serde(default)]
    solver: SolverParams,
    algorithm: Option<Algorithm>,
    cell_px: Option<usize>,
    #[serde(default)]
    include_history: bool,
}

#[derive(Serialize)]
struct SolveResponse {
    algorithm: Algorithm,
    iterations: usize,
    rows: usize,
    cols: usize,
    board: BoardSpec,
    utilities: Vec<Vec<f64>>,
    policy: Vec<Vec<&'static str>>,
    residuals: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    history: Option<Vec<Series>>,
    layers: Vec<Layer>,
    ms: f64,
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error: e.to_string() }))
}

fn data_url(img: &Image) -> gridmdp::Result<String> {
    let png = render::encode_png(img)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn run(req: SolveRequest) -> gridmdp::Result<SolveResponse> {
    let board = match req.board {
        Some(spec) => Board::try_from(spec)?,
        None => generator::generate(&req.random)?,
    };
    let algorithm = req.algorithm.unwrap_or(Algorithm::ValueIteration);
    let cell_px = req.cell_px.unwrap_or(32).clamp(4, 128);

    let t = std::time::Instant::now();
    let sol = gridmdp::solve(&board, algorithm, &req.solver)?;
    let ms = t.elapsed().as_secs_f64() * 1000.0;

    let layers = vec![
        Layer {
            name: "utility".into(),
            data_url: data_url(&render::render_utility(&board, &sol.utilities, cell_px))?,
        },
        Layer {
            name: "policy".into(),
            data_url: data_url(&render::render_policy(&board, &sol.policy, cell_px))?,
        },
        Layer {
            name: "history".into(),
            data_url: data_url(&render::render_history(&sol.history, 800, 600))?,
        },
    ];

    Ok(SolveResponse {
        algorithm,
        iterations: sol.iterations,
        rows: board.rows(),
        cols: board.cols(),
        board: board.to_spec(),
        utilities: sol.utilities.to_rows(),
        policy: policy::symbols(&sol.policy),
        residuals: sol.residuals,
        history: req.include_history.then(|| sol.history.to_series()),
        layers,
        ms,
    })
}

async fn solve_handler(Json(req): Json<SolveRequest>) -> Result<Json<SolveResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || run(req))
        .await
        .map_err(|e| {
            error!(%e, "solver task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: e.to_string() }))
        })?
        .map_err(bad_request)?;

    info!(
        algorithm = %response.algorithm,
        iterations = response.iterations,
        ms = response.ms,
        "solved"
    );
    Ok(Json(response))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = Router::new()
        .route("/api/solve", post(solve_handler))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("gridmdp server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
