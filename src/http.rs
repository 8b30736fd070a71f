use crate::backend::ReservationBackend;
use crate::calendar::BusinessCalendar;
use crate::configuration::Configuration;
use crate::engine::ReservationEngine;
use crate::error::EngineError;
use crate::policy::{authorize, Actor, IdentityProvider};
use crate::types::{hhmm, DayAvailability, Reservation, ReservationRequest};
use axum::extract::{Path, Query, Request};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json, Router};
use axum_valid::Valid;
use chrono::{NaiveDate, NaiveTime, Utc};
use futures::{Stream, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

pub const OPERATOR_HEADER: &str = "x-operator-password";

lazy_static! {
    static ref CONTACT_PATTERN: Regex =
        Regex::new(r"^\s*\+?[0-9][0-9 ()./-]{4,22}\s*$").expect("contact pattern is valid");
}

pub struct AppState<B: ReservationBackend> {
    pub engine: ReservationEngine<B>,
    pub identities: Arc<dyn IdentityProvider>,
}

impl<B: ReservationBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            identities: self.identities.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct ReservationBody {
    date: NaiveDate,
    #[serde(with = "hhmm")]
    slot: NaiveTime,
    #[validate(length(min = 1, max = 100))]
    holder_name: String,
    #[validate(regex(path = *CONTACT_PATTERN, message = "expected a phone number"))]
    holder_contact: String,
    #[validate(length(max = 100))]
    service: Option<String>,
}

impl From<ReservationBody> for ReservationRequest {
    fn from(body: ReservationBody) -> Self {
        Self {
            date: body.date,
            slot: body.slot,
            holder_name: body.holder_name,
            holder_contact: body.holder_contact,
            service: body.service,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EventFilter {
    date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    Unauthorized,
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Engine(err) => {
                let status = match &err {
                    EngineError::Validation(_) => StatusCode::BAD_REQUEST,
                    EngineError::Conflict { .. } => StatusCode::CONFLICT,
                    EngineError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
                    EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
                    EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                };
                (status, err.kind(), err.to_string())
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "unknown operator credentials".to_string(),
            ),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
            }
        };
        let body = ErrorBody {
            error: error.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

pub fn create_app<B: ReservationBackend, C: Configuration>(backend: B, configuration: C) -> Router {
    let calendar = BusinessCalendar::new(configuration.timezone(), configuration.closed_weekday());
    let engine = ReservationEngine::new(
        Arc::new(backend),
        calendar,
        configuration.business_hours(),
        configuration.service_label(),
    );
    info!(
        timezone = %engine.calendar().timezone(),
        closed_weekday = %engine.calendar().closed_weekday(),
        slots_per_day = engine.hours().slot_count(),
        "Reservation engine ready"
    );
    let state = AppState {
        engine,
        identities: Arc::new(configuration.operators()),
    };
    router(state)
}

pub fn router<B: ReservationBackend>(state: AppState<B>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/availability/{date}", get(get_availability))
        .route("/reservations", post(create_reservation))
        .route("/reservations/{id}", delete(cancel_reservation))
        .route(
            "/operator/reservations",
            post(create_manual_reservation).get(list_all_reservations),
        )
        .route("/operator/reservations/{date}", get(list_reservations))
        .route("/events", get(availability_events))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_actor::<B>,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Turns the optional operator header into an [`Actor`]. No header means a
/// client; a header nobody recognises is rejected outright.
async fn resolve_actor<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = match request.headers().get(OPERATOR_HEADER) {
        None => None,
        Some(value) => {
            let credential = value.to_str().map_err(|_| ApiError::Unauthorized)?;
            match state.identities.resolve(credential) {
                Some(identity) => Some(identity),
                None => {
                    warn!(path = %request.uri().path(), "Rejected unknown operator credentials");
                    return Err(ApiError::Unauthorized);
                }
            }
        }
    };
    request.extensions_mut().insert(authorize(identity.as_ref()));
    Ok(next.run(request).await)
}

/// Store calls block; keep them off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(err) => {
            error!(?err, "Blocking engine task failed");
            Err(ApiError::Internal("engine task failed".into()))
        }
    }
}

async fn get_availability<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Extension(actor): Extension<Actor>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayAvailability>, ApiError> {
    let engine = state.engine.clone();
    let view = blocking(move || engine.enumerate_day(date, Utc::now(), &actor)).await?;
    Ok(Json(view))
}

async fn create_reservation<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Extension(actor): Extension<Actor>,
    Valid(Json(body)): Valid<Json<ReservationBody>>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let engine = state.engine.clone();
    let created = blocking(move || engine.reserve(body.into(), &actor, Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn create_manual_reservation<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Extension(actor): Extension<Actor>,
    Valid(Json(body)): Valid<Json<ReservationBody>>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let engine = state.engine.clone();
    let created =
        blocking(move || engine.reserve_on_behalf(body.into(), &actor, Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_reservations<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Extension(actor): Extension<Actor>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    let engine = state.engine.clone();
    let reservations = blocking(move || engine.reservations_for_day(date, &actor)).await?;
    Ok(Json(reservations))
}

async fn list_all_reservations<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Reservation>>, ApiError> {
    let engine = state.engine.clone();
    let reservations = blocking(move || engine.all_reservations(&actor)).await?;
    Ok(Json(reservations))
}

async fn cancel_reservation<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let engine = state.engine.clone();
    blocking(move || engine.cancel(id, &actor)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn availability_events<B: ReservationBackend>(
    State(state): State<AppState<B>>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let wanted = filter.date;
    let changes = BroadcastStream::new(state.engine.subscribe())
        .filter_map(move |change| async move {
            match change {
                Ok(change) if wanted.map_or(true, |date| date == change.date) => Some(change),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    warn!(missed, "Event subscriber fell behind");
                    None
                }
            }
        })
        .map(|change| Event::default().event("availability").json_data(change));
    Sse::new(changes).keep_alive(KeepAlive::default())
}
