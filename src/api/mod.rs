//! HTTP surface over the core: average-temperature queries and the
//! data reload trigger.

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, Error as ActixError, HttpResponse};
use log::error;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::models::YearlyAverage;
use crate::query::TemperatureService;
use crate::reload::ReloadCoordinator;

/// API request handling result envelope (reload endpoint).
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Shared application state handed to every handler.
pub struct AppState {
    /// Query facade
    pub service: Arc<TemperatureService>,
    /// Reload coordinator
    pub coordinator: Arc<ReloadCoordinator>,
    /// Source file re-ingested on POST /update-data
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AverageQuery {
    city: String,
}

/// Configure the API routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/average-temperatures",
        web::get().to(get_average_temperatures),
    )
    .route("/update-data", web::post().to(update_data));
}

/// Match the original presentation: one decimal place.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

async fn get_average_temperatures(
    state: web::Data<AppState>,
    query: web::Query<AverageQuery>,
) -> Result<HttpResponse, ActixError> {
    let service = Arc::clone(&state.service);
    let city = query.into_inner().city;

    // The query layer blocks on locks; keep it off the event loop.
    let averages = web::block(move || service.get_yearly_averages(&city)).await?;

    if averages.is_empty() {
        return Ok(HttpResponse::NotFound().finish());
    }

    let response: Vec<YearlyAverage> = averages
        .iter()
        .map(|(&year, &avg)| YearlyAverage {
            year,
            average_temperature: round_to_tenth(avg),
        })
        .collect();
    Ok(HttpResponse::Ok().json(response))
}

async fn update_data(state: web::Data<AppState>) -> Result<HttpResponse, ActixError> {
    let coordinator = Arc::clone(&state.coordinator);
    let source_path = state.source_path.clone();

    let result = web::block(move || coordinator.run_ingestion(&source_path)).await?;

    Ok(match result {
        Ok(summary) => HttpResponse::Ok().json(ApiResponse {
            success: true,
            message: None,
            data: Some(summary),
        }),
        Err(ServiceError::ReloadInProgress) => HttpResponse::Conflict().json(ApiResponse::<()> {
            success: false,
            message: Some(ServiceError::ReloadInProgress.to_string()),
            data: None,
        }),
        Err(err) => {
            error!("reload request failed: {}", err);
            HttpResponse::InternalServerError().json(ApiResponse::<()> {
                success: false,
                message: Some(err.to_string()),
                data: None,
            })
        }
    })
}
