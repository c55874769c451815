// FranchiseController: HTTP handlers for franchises, batches and students
//
// Endpoints:
// - POST /franchises                                  - Register a franchise
// - GET  /franchises                                  - List franchises
// - GET  /franchises/{id}                             - Franchise details
// - PUT  /franchises/{id}                             - Update a franchise
// - POST /franchises/{id}/batches                     - Create a batch (and its fee ledger)
// - GET  /franchises/{id}/batches                     - List batches
// - GET  /batches/{batch_id}                          - Batch details
// - POST /batches/{batch_id}/students                 - Enroll a student
// - GET  /batches/{batch_id}/students                 - List enrolled students
// - GET  /batches/{batch_id}/students/{user_id}/fees  - A student's schedule
// - PUT  /students/{user_id}/registration             - Update-or-create registration
// - GET  /students/{user_id}/registration             - Registration details

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::Result;
use crate::middleware::AdminCapability;
use crate::modules::franchises::models::{FranchiseInput, NewBatch, RegistrationInput};
use crate::modules::installments::controllers::ScheduleResponse;
use crate::state::AppState;

/// Request for POST /batches/{batch_id}/students
#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub user_id: i64,
}

pub async fn register_franchise(
    _admin: AdminCapability,
    request: web::Json<FranchiseInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let franchise = state.franchises.register_franchise(&request).await?;
    Ok(HttpResponse::Created().json(franchise))
}

pub async fn list_franchises(
    _admin: AdminCapability,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let franchises = state.franchises.list_franchises().await?;
    Ok(HttpResponse::Ok().json(franchises))
}

pub async fn get_franchise(
    _admin: AdminCapability,
    franchise_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let franchise = state.franchises.get_franchise(&franchise_id).await?;
    Ok(HttpResponse::Ok().json(franchise))
}

pub async fn update_franchise(
    _admin: AdminCapability,
    franchise_id: web::Path<String>,
    request: web::Json<FranchiseInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let franchise = state
        .franchises
        .update_franchise(&franchise_id, &request)
        .await?;
    Ok(HttpResponse::Ok().json(franchise))
}

pub async fn create_batch(
    _admin: AdminCapability,
    franchise_id: web::Path<String>,
    request: web::Json<NewBatch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let created = state
        .franchises
        .create_batch(&franchise_id, &request)
        .await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn list_batches(
    _admin: AdminCapability,
    franchise_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let batches = state.franchises.list_batches(&franchise_id).await?;
    Ok(HttpResponse::Ok().json(batches))
}

pub async fn get_batch(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let batch = state.franchises.get_batch(&batch_id).await?;
    Ok(HttpResponse::Ok().json(batch))
}

/// 201 on first enrollment, 200 when the student was already a member
pub async fn enroll_student(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    request: web::Json<EnrollRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let enrollment = state
        .franchises
        .enroll_student(&batch_id, request.user_id)
        .await?;

    Ok(if enrollment.membership.was_created() {
        HttpResponse::Created().json(enrollment)
    } else {
        HttpResponse::Ok().json(enrollment)
    })
}

pub async fn list_batch_students(
    _admin: AdminCapability,
    batch_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let students = state.franchises.list_batch_students(&batch_id).await?;
    Ok(HttpResponse::Ok().json(students))
}

pub async fn student_schedule(
    _admin: AdminCapability,
    path: web::Path<(String, i64)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (batch_id, user_id) = path.into_inner();
    let schedule = state
        .franchises
        .student_schedule(&batch_id, user_id)
        .await?;
    Ok(HttpResponse::Ok().json(ScheduleResponse::from(schedule)))
}

pub async fn register_student(
    _admin: AdminCapability,
    user_id: web::Path<i64>,
    request: web::Json<RegistrationInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let registration = state
        .franchises
        .register_student(*user_id, &request)
        .await?;

    Ok(if registration.was_created() {
        HttpResponse::Created().json(registration.into_inner())
    } else {
        HttpResponse::Ok().json(registration.into_inner())
    })
}

pub async fn get_registration(
    _admin: AdminCapability,
    user_id: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let registration = state.franchises.get_registration(*user_id).await?;
    Ok(HttpResponse::Ok().json(registration))
}

/// Configure franchise routes
///
/// Everything is registered as a resource so the paths can share prefixes
/// with the fee, report and installment routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/franchises")
            .route(web::post().to(register_franchise))
            .route(web::get().to(list_franchises)),
    )
    .service(
        web::resource("/franchises/{franchise_id}")
            .route(web::get().to(get_franchise))
            .route(web::put().to(update_franchise)),
    )
    .service(
        web::resource("/franchises/{franchise_id}/batches")
            .route(web::post().to(create_batch))
            .route(web::get().to(list_batches)),
    )
    .service(web::resource("/batches/{batch_id}").route(web::get().to(get_batch)))
    .service(
        web::resource("/batches/{batch_id}/students")
            .route(web::post().to(enroll_student))
            .route(web::get().to(list_batch_students)),
    )
    .service(
        web::resource("/batches/{batch_id}/students/{user_id}/fees")
            .route(web::get().to(student_schedule)),
    )
    .service(
        web::resource("/students/{user_id}/registration")
            .route(web::put().to(register_student))
            .route(web::get().to(get_registration)),
    );
}
