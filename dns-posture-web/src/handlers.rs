//! HTTP handlers.

use actix_web::{HttpRequest, HttpResponse, web};
use dns_posture_core::{ApiResponse, CheckRequest, CheckService};
use serde_json::json;

use crate::error::{ApiError, invalid_json, invalid_request};

/// Bucket used when the socket peer is unknown (e.g. some test transports).
const UNKNOWN_CLIENT: &str = "unknown";

/// Rate-limit identity: the socket peer IP. Forwarding headers are not
/// trusted since any client can set them.
fn client_id(req: &HttpRequest) -> String {
    req.peer_addr()
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), |addr| addr.ip().to_string())
}

async fn run_check(
    service: &CheckService,
    req: &HttpRequest,
    domain: &str,
) -> Result<HttpResponse, ApiError> {
    let client = client_id(req);
    let report = service.check_for_client(&client, domain).await?;
    tracing::info!(
        domain = %report.domain,
        score = report.overall_score,
        "check complete"
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

/// `POST /api/check` with a JSON or form-encoded `domain`.
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4(), method = "POST"))]
pub async fn post_check(
    service: web::Data<CheckService>,
    req: HttpRequest,
    body: web::Either<web::Json<CheckRequest>, web::Form<CheckRequest>>,
) -> Result<HttpResponse, ApiError> {
    let request = match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };
    run_check(&service, &req, &request.domain).await
}

/// `GET /api/check?domain=...`
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4(), method = "GET"))]
pub async fn get_check(
    service: web::Data<CheckService>,
    req: HttpRequest,
    query: web::Query<CheckRequest>,
) -> Result<HttpResponse, ApiError> {
    run_check(&service, &req, &query.domain).await
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Register every route, with extractor failures rendered as JSON.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(invalid_json))
        .app_data(web::FormConfig::default().error_handler(|err, _req| invalid_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| invalid_request(err)));

    cfg.route("/health", web::get().to(health)).service(
        web::resource("/api/check")
            .route(web::post().to(post_check))
            .route(web::get().to(get_check)),
    );
}
