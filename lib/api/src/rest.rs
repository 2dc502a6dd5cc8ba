use crate::ApiError;
use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError, Result as ActixResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shortlist_catalog::{CatalogRecord, Rejection};
use shortlist_engine::{validate_top_k, Recommendation, Recommender};
use std::sync::Arc;
use tracing::{error, info};

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
const DEFAULT_CATALOG_LIMIT: i64 = 10;
const MAX_CATALOG_LIMIT: i64 = 100;

#[derive(Deserialize)]
struct RecommendRequest {
    query: String,
    top_k: Option<i64>,
}

#[derive(Serialize)]
struct RecommendResponse {
    query: String,
    recommendations: Vec<Recommendation>,
}

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    message: String,
    indexed: usize,
    rejected: Vec<Rejection>,
}

#[derive(Deserialize)]
struct CatalogQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
struct CatalogResponse<'a> {
    total: usize,
    showing: usize,
    assessments: &'a [CatalogRecord],
}

pub struct RestApi;

impl RestApi {
    pub async fn start(recommender: Arc<Recommender>, host: &str, port: u16) -> std::io::Result<()> {
        info!("Binding HTTP server to {}:{}", host, port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(recommender.clone()))
                .configure(Self::configure)
        })
        .bind((host, port))?
        .run()
        .await
    }

    /// Register routes and body limits. Callers add the `Arc<Recommender>`
    /// app data.
    pub fn configure(cfg: &mut web::ServiceConfig) {
        let json = web::JsonConfig::default()
            .limit(MAX_BODY_BYTES)
            .error_handler(|err, _req| {
                let message = err.to_string();
                InternalError::from_response(err, ApiError::BadRequest(message).error_response()).into()
            });

        cfg.app_data(json)
            .route("/", web::get().to(service_info))
            .route("/health", web::get().to(health))
            .route("/recommend", web::post().to(recommend))
            .route("/catalog", web::post().to(upload_catalog))
            .route("/catalog", web::get().to(get_catalog));
    }
}

async fn service_info() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "name": "Shortlist assessment recommender",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
        "endpoints": [
            {"path": "/recommend", "method": "POST", "description": "Get assessment recommendations"},
            {"path": "/catalog", "method": "POST", "description": "Replace and index the catalog"},
            {"path": "/catalog", "method": "GET", "description": "View the current catalog"},
            {"path": "/health", "method": "GET", "description": "Service health"}
        ]
    })))
}

async fn health(recommender: web::Data<Arc<Recommender>>) -> ActixResult<HttpResponse> {
    let snapshot = recommender.snapshot();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "generation": snapshot.generation(),
        "records": snapshot.len(),
        "model_id": snapshot.index().model_id(),
    })))
}

async fn recommend(
    recommender: web::Data<Arc<Recommender>>,
    request: web::Json<RecommendRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = request.into_inner();
    let k = match request.top_k {
        Some(k) => validate_top_k(k).map_err(shortlist_engine::EngineError::from)?,
        None => recommender.config().default_top_k,
    };

    // Embedding and scoring run on the blocking pool.
    let recommender = recommender.get_ref().clone();
    let query = request.query;
    let (query, recommendations) = web::block(move || {
        let recommendations = recommender.recommend(&query, k);
        (query, recommendations)
    })
    .await?;

    Ok(HttpResponse::Ok().json(RecommendResponse {
        query,
        recommendations: recommendations?,
    }))
}

async fn upload_catalog(
    recommender: web::Data<Arc<Recommender>>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let Value::Array(items) = body.into_inner() else {
        return Err(ApiError::BadRequest(
            "Catalog must be a JSON array of assessments".to_string(),
        ));
    };

    let recommender = recommender.get_ref().clone();
    let (snapshot, report) = web::block(move || recommender.reload_from_values(items))
        .await?
        .map_err(|e| {
            error!("Catalog upload failed: {}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(UploadResponse {
        status: "success",
        message: format!("Successfully indexed {} assessments", snapshot.len()),
        indexed: snapshot.len(),
        rejected: report.rejected,
    }))
}

async fn get_catalog(
    recommender: web::Data<Arc<Recommender>>,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_CATALOG_LIMIT);
    if !(1..=MAX_CATALOG_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_CATALOG_LIMIT}, got {limit}"
        )));
    }

    let snapshot = recommender.snapshot();
    let records = snapshot.catalog().records();
    let shown = &records[..records.len().min(limit as usize)];

    Ok(HttpResponse::Ok().json(CatalogResponse {
        total: records.len(),
        showing: shown.len(),
        assessments: shown,
    }))
}
