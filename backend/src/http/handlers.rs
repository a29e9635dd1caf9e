//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer in [`crate::db::services`]. Admin endpoints take [`AdminUser`] as
//! their first argument, so the token is checked before the body is read or
//! the store is touched.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use super::auth::AdminUser;
use super::dto::{
    AssistantReply, AssistantRequest, AvailabilityRequest, DashboardStats, DoctorListing,
    DonationRequestExportRow, DonorExportRow, DonorQuery, ExportSheet, GroupQuery,
    HealthResponse, MessageResponse, QueueQuery,
};
use super::error::{ApiJson, AppError};
use super::state::AppState;
use crate::db::services as db_services;
use crate::models::{
    DonationRequest, DonationRequestUpdate, Doctor, DoctorUpdate, Donor, DonorUpdate, Hospital,
    HospitalUpdate, NewDonationRequest, NewDoctor, NewDonor, NewHospital, Record, RecordId,
    SettingsUpdate, SystemSettings,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for create handlers, which answer 201.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

fn deleted<T: Record>(id: &RecordId) -> Json<MessageResponse> {
    Json(MessageResponse::new(format!("{} {} deleted", T::LABEL, id)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Doctors
// =============================================================================

/// GET /api/doctors
pub async fn list_doctors(State(state): State<AppState>) -> HandlerResult<Vec<DoctorListing>> {
    let doctors = db_services::list_doctor_listings(state.repository.as_ref()).await?;
    Ok(Json(doctors))
}

/// POST /api/doctors
pub async fn create_doctor(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiJson(form): ApiJson<NewDoctor>,
) -> CreatedResult<Doctor> {
    let doctor = db_services::create_doctor(state.repository.as_ref(), form).await?;
    info!(admin = %admin.uid, id = %doctor.id, "Doctor created");
    Ok((StatusCode::CREATED, Json(doctor)))
}

/// PUT /api/doctors/{id}
pub async fn update_doctor(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    ApiJson(update): ApiJson<DoctorUpdate>,
) -> HandlerResult<Doctor> {
    let doctor = db_services::update_doctor(state.repository.as_ref(), &id, update).await?;
    info!(admin = %admin.uid, id = %id, "Doctor updated");
    Ok(Json(doctor))
}

/// DELETE /api/doctors/{id}
pub async fn delete_doctor(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> HandlerResult<MessageResponse> {
    let existed = db_services::delete_doctor(state.repository.as_ref(), &id).await?;
    info!(admin = %admin.uid, id = %id, existed, "Doctor deleted");
    Ok(deleted::<Doctor>(&id))
}

// =============================================================================
// Hospitals
// =============================================================================

/// GET /api/hospitals
pub async fn list_hospitals(State(state): State<AppState>) -> HandlerResult<Vec<Hospital>> {
    let hospitals = db_services::list_hospitals(state.repository.as_ref()).await?;
    Ok(Json(hospitals))
}

/// POST /api/hospitals
pub async fn create_hospital(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiJson(form): ApiJson<NewHospital>,
) -> CreatedResult<Hospital> {
    let hospital = db_services::create_hospital(state.repository.as_ref(), form).await?;
    info!(admin = %admin.uid, id = %hospital.id, "Hospital created");
    Ok((StatusCode::CREATED, Json(hospital)))
}

/// PUT /api/hospitals/{id}
pub async fn update_hospital(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    ApiJson(update): ApiJson<HospitalUpdate>,
) -> HandlerResult<Hospital> {
    let hospital = db_services::update_hospital(state.repository.as_ref(), &id, update).await?;
    info!(admin = %admin.uid, id = %id, "Hospital updated");
    Ok(Json(hospital))
}

/// DELETE /api/hospitals/{id}
pub async fn delete_hospital(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> HandlerResult<MessageResponse> {
    let existed = db_services::delete_hospital(state.repository.as_ref(), &id).await?;
    info!(admin = %admin.uid, id = %id, existed, "Hospital deleted");
    Ok(deleted::<Hospital>(&id))
}

// =============================================================================
// Donors
// =============================================================================

/// GET /api/donors
///
/// The public directory: approved donors only.
pub async fn list_donors(
    State(state): State<AppState>,
    Query(query): Query<DonorQuery>,
) -> HandlerResult<Vec<Donor>> {
    let filter = query.filter()?;
    let donors = db_services::list_public_donors(state.repository.as_ref(), &filter).await?;
    Ok(Json(donors))
}

/// POST /api/donors
///
/// Public registration. The record stays hidden until an admin approves it.
pub async fn register_donor(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<NewDonor>,
) -> CreatedResult<Donor> {
    let donor = db_services::register_donor(state.repository.as_ref(), form).await?;
    info!(id = %donor.id, blood_group = %donor.blood_group, "Donor registered");
    Ok((StatusCode::CREATED, Json(donor)))
}

/// GET /api/donors/pending
pub async fn list_pending_donors(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> HandlerResult<Vec<Donor>> {
    let donors = db_services::list_pending_donors(state.repository.as_ref()).await?;
    Ok(Json(donors))
}

/// GET /api/donors/approved
pub async fn list_approved_donors(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> HandlerResult<Vec<Donor>> {
    let group = query.group()?;
    let donors = db_services::list_approved_donors(state.repository.as_ref(), group).await?;
    Ok(Json(donors))
}

/// GET /api/donors/export
pub async fn export_donors(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> HandlerResult<ExportSheet<DonorExportRow>> {
    let group = query.group()?;
    let sheet = db_services::export_donors(state.repository.as_ref(), group).await?;
    info!(admin = %admin.uid, rows = sheet.rows.len(), file = %sheet.file_name, "Donors exported");
    Ok(Json(sheet))
}

/// PUT /api/donors/{id}
pub async fn update_donor(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    ApiJson(update): ApiJson<DonorUpdate>,
) -> HandlerResult<Donor> {
    let donor = db_services::update_donor(state.repository.as_ref(), &id, update).await?;
    info!(admin = %admin.uid, id = %id, "Donor updated");
    Ok(Json(donor))
}

/// PUT /api/donors/{id}/availability
pub async fn set_donor_availability(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    ApiJson(body): ApiJson<AvailabilityRequest>,
) -> HandlerResult<Donor> {
    let donor = db_services::set_donor_availability(
        state.repository.as_ref(),
        &id,
        body.is_available_for_emergency,
    )
    .await?;
    info!(
        admin = %admin.uid,
        id = %id,
        available = body.is_available_for_emergency,
        "Donor availability changed"
    );
    Ok(Json(donor))
}

/// POST /api/donors/{id}/approve
pub async fn approve_donor(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> HandlerResult<Donor> {
    let donor = db_services::approve_donor(state.repository.as_ref(), &id).await?;
    info!(admin = %admin.uid, id = %id, "Donor approved");
    Ok(Json(donor))
}

/// DELETE /api/donors/{id}
///
/// Also used to reject a pending registration.
pub async fn delete_donor(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> HandlerResult<MessageResponse> {
    let existed = db_services::delete_donor(state.repository.as_ref(), &id).await?;
    info!(admin = %admin.uid, id = %id, existed, "Donor deleted");
    Ok(deleted::<Donor>(&id))
}

// =============================================================================
// Donation Requests
// =============================================================================

/// POST /api/donation-requests
pub async fn submit_donation_request(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<NewDonationRequest>,
) -> CreatedResult<DonationRequest> {
    let request = db_services::submit_donation_request(state.repository.as_ref(), form).await?;
    info!(id = %request.id, "Donation request submitted");
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /api/donation-requests?status=pending|approved
pub async fn list_donation_requests(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<QueueQuery>,
) -> HandlerResult<Vec<DonationRequest>> {
    let status = query.status()?;
    let requests = db_services::list_donation_requests(state.repository.as_ref(), status).await?;
    Ok(Json(requests))
}

/// GET /api/donation-requests/export
pub async fn export_donation_requests(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
) -> HandlerResult<ExportSheet<DonationRequestExportRow>> {
    let today = Utc::now().date_naive();
    let sheet = db_services::export_donation_requests(state.repository.as_ref(), today).await?;
    info!(admin = %admin.uid, rows = sheet.rows.len(), file = %sheet.file_name, "Donation requests exported");
    Ok(Json(sheet))
}

/// PUT /api/donation-requests/{id}
pub async fn update_donation_request(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    ApiJson(update): ApiJson<DonationRequestUpdate>,
) -> HandlerResult<DonationRequest> {
    let request =
        db_services::update_donation_request(state.repository.as_ref(), &id, update).await?;
    info!(admin = %admin.uid, id = %id, "Donation request updated");
    Ok(Json(request))
}

/// POST /api/donation-requests/{id}/approve
pub async fn approve_donation_request(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> HandlerResult<DonationRequest> {
    let request = db_services::approve_donation_request(state.repository.as_ref(), &id).await?;
    info!(admin = %admin.uid, id = %id, "Donation request approved");
    Ok(Json(request))
}

/// DELETE /api/donation-requests/{id}
pub async fn delete_donation_request(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> HandlerResult<MessageResponse> {
    let existed = db_services::delete_donation_request(state.repository.as_ref(), &id).await?;
    info!(admin = %admin.uid, id = %id, existed, "Donation request deleted");
    Ok(deleted::<DonationRequest>(&id))
}

// =============================================================================
// Settings & Dashboard
// =============================================================================

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> HandlerResult<SystemSettings> {
    let settings = db_services::get_settings(state.repository.as_ref()).await?;
    Ok(Json(settings))
}

/// PUT /api/settings
pub async fn update_settings(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiJson(update): ApiJson<SettingsUpdate>,
) -> HandlerResult<SystemSettings> {
    let settings = db_services::update_settings(state.repository.as_ref(), update).await?;
    info!(admin = %admin.uid, use_central_phone = settings.use_central_phone, "Settings updated");
    Ok(Json(settings))
}

/// GET /api/stats
pub async fn dashboard_stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> HandlerResult<DashboardStats> {
    let stats = db_services::dashboard_stats(state.repository.as_ref()).await?;
    Ok(Json(stats))
}

// =============================================================================
// Assistant
// =============================================================================

/// POST /api/assistant
///
/// Always answers 200 with a reply once the query is non-empty; backend
/// failures turn into a fixed apology.
pub async fn ask_assistant(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AssistantRequest>,
) -> HandlerResult<AssistantReply> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }
    let reply = state.assistant.advise(query).await;
    Ok(Json(AssistantReply { reply }))
}
