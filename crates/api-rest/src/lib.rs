//! # API REST
//!
//! REST API implementation for MediCard.
//!
//! Handles:
//! - HTTP endpoints with axum (scan lookup, patient registration and search)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! The scan endpoint preserves the scan error taxonomy on the wire: a
//! payload with no usable identifier, a lookup that matched nothing, and a
//! backend failure each map to their own status code and `kind` tag, so
//! clients can offer the right recovery (rescan vs. manual entry).

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use medicard_core::{
    derived_patient_id, CoreConfig, DirectoryStore, IdentifierText, ManualSource, PatientRecord,
    ScanError, SessionController, StoreError, TraceObserver,
};

pub mod wire;

use wire::{
    CreatePatientReq, HealthRes, ListPatientsRes, PatientRes, ScanErrorRes, ScanReq, SearchParams,
};

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request
/// handlers; services are constructed per request from the startup-resolved
/// configuration.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, scan_patient, list_patients, create_patient, search_patients),
    components(schemas(
        HealthRes,
        ScanReq,
        ScanErrorRes,
        PatientRes,
        ListPatientsRes,
        CreatePatientReq,
    ))
)]
struct ApiDoc;

/// Build the MediCard REST application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scan", post(scan_patient))
        .route("/patients", get(list_patients))
        .route("/patients", post(create_patient))
        .route("/patients/search", get(search_patients))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the MediCard REST API service.
/// This endpoint is used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "MediCard REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/scan",
    request_body = ScanReq,
    responses(
        (status = 200, description = "Patient identified", body = PatientRes),
        (status = 404, description = "No patient matched", body = ScanErrorRes),
        (status = 422, description = "Payload carried no usable identifier", body = ScanErrorRes),
        (status = 502, description = "Lookup backend failure", body = ScanErrorRes)
    )
)]
/// Identify a patient from a scanned payload
///
/// Runs a complete scan session: the payload is interpreted with the card's
/// field precedence, resolved against the patient directory, and the settled
/// session is mapped onto the response.
///
/// # Errors
/// The three scan failure causes map to distinct statuses:
/// - `422`: the payload could not be interpreted (rescan),
/// - `404`: the lookup found nothing (rescan or register),
/// - `502`: the lookup backend failed (retry or fall back to manual entry).
#[axum::debug_handler]
async fn scan_patient(
    State(state): State<AppState>,
    Json(req): Json<ScanReq>,
) -> Result<Json<PatientRes>, (StatusCode, Json<ScanErrorRes>)> {
    let store = DirectoryStore::new(state.cfg.clone());
    let mut controller = SessionController::new(ManualSource::new(), store, TraceObserver);

    controller.start_scan();
    controller.process_payload(&req.payload).await;

    let session = controller.session();
    match (session.patient(), session.error()) {
        (Some(patient), _) => Ok(Json(PatientRes::from(patient.clone()))),
        (None, Some(error)) => Err(scan_error_response(error.clone())),
        (None, None) => Err(scan_error_response(ScanError::Transport(
            "scan session did not settle".into(),
        ))),
    }
}

fn scan_error_response(error: ScanError) -> (StatusCode, Json<ScanErrorRes>) {
    let status = match error {
        ScanError::NoUsableIdentifier => StatusCode::UNPROCESSABLE_ENTITY,
        ScanError::NotFound => StatusCode::NOT_FOUND,
        ScanError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ScanErrorRes::from(error)))
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "List of patients", body = ListPatientsRes)
    )
)]
/// List all patients in the system
///
/// Retrieves a list of all patient records from the sharded patient
/// directory.
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> Json<ListPatientsRes> {
    let store = DirectoryStore::new(state.cfg.clone());
    let patients = store.list().into_iter().map(PatientRes::from).collect();
    Json(ListPatientsRes { patients })
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 200, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Identifier already registered"),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a new patient record
///
/// Creates a patient with a generated record id. When no `patient_id` is
/// supplied, a card-printable one is derived from the record id. Identity
/// values (`patient_id`, `nfc_id`, `qr_code`) must be unique across all
/// patients and columns; collisions are rejected with `409`.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> Result<Json<PatientRes>, (StatusCode, &'static str)> {
    let id = Uuid::new_v4();

    let patient_id = match req.patient_id {
        Some(supplied) => match IdentifierText::new(&supplied) {
            Ok(patient_id) => patient_id,
            Err(e) => {
                tracing::error!("Invalid patient_id: {:?}", e);
                return Err((StatusCode::BAD_REQUEST, "Invalid patient_id"));
            }
        },
        None => derived_patient_id(&id),
    };

    if req.full_name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "full_name is required"));
    }

    let record = PatientRecord {
        id,
        patient_id,
        nfc_id: req.nfc_id,
        qr_code: req.qr_code,
        full_name: req.full_name,
        date_of_birth: req.date_of_birth,
        gender: req.gender,
        blood_type: req.blood_type,
        allergies: req.allergies,
        medical_conditions: req.medical_conditions,
        phone: req.phone,
        email: req.email,
        emergency_contact_name: req.emergency_contact_name,
        emergency_contact_phone: req.emergency_contact_phone,
        created_at: Utc::now(),
    };

    let store = DirectoryStore::new(state.cfg.clone());
    match store.create(&record) {
        Ok(()) => Ok(Json(PatientRes::from(record))),
        Err(StoreError::DuplicateIdentifier(_)) => {
            Err((StatusCode::CONFLICT, "Identifier already registered"))
        }
        Err(StoreError::InvalidInput(_)) => Err((StatusCode::BAD_REQUEST, "Invalid patient")),
        Err(e) => {
            tracing::error!("Create patient error: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error"))
        }
    }
}

#[utoipa::path(
    get,
    path = "/patients/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching patients", body = ListPatientsRes)
    )
)]
/// Search patients by name, patient id or phone
///
/// Case-insensitive substring match, as used by the staff admin screen.
#[axum::debug_handler]
async fn search_patients(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<ListPatientsRes> {
    let store = DirectoryStore::new(state.cfg.clone());
    let patients = store
        .search(&params.q)
        .into_iter()
        .map(PatientRes::from)
        .collect();
    Json(ListPatientsRes { patients })
}
