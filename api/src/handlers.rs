use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use chrono::NaiveDate;
use entity::{account, department, employee, performance_review, role};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::AppState;
use crate::auth::{hash_password, issue_token, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::extract::Json;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Auth

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let existing = account::Entity::find()
        .filter(account::Column::Username.eq(payload.username.as_str()))
        .one(state.db.as_ref())
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Username already taken".into()));
    }
    account::ActiveModel {
        username: Set(payload.username.clone()),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(payload.role),
        ..Default::default()
    }
    .insert(state.db.as_ref())
    .await?;
    info!(username = %payload.username, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered",
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    // Unknown username and wrong password are indistinguishable to the caller.
    let account = account::Entity::find()
        .filter(account::Column::Username.eq(payload.username.as_str()))
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::Unauthorized("Invalid credentials"))?;
    if !verify_password(&payload.password, &account.password_hash) {
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }
    let access_token = issue_token(&account.username, &account.role, &state.auth)
        .map_err(|err| ApiError::internal(anyhow::anyhow!("failed to issue token: {err}")))?;
    Ok(Json(TokenResponse { access_token }))
}

// ---------------------------------------------------------------------------
// Employees

#[derive(Deserialize)]
pub struct EmployeePayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub department_id: Option<i32>,
    #[serde(default)]
    pub role_id: Option<i32>,
}

#[derive(Serialize)]
pub struct EmployeeSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<i32>,
    pub role_id: Option<i32>,
}

impl From<employee::Model> for EmployeeSummary {
    fn from(model: employee::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            department_id: model.department_id,
            role_id: model.role_id,
        }
    }
}

/// Denormalized read: related names instead of ids, null when unset or when
/// the reference dangles.
#[derive(Serialize)]
pub struct EmployeeDetail {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: Option<String>,
    pub role: Option<String>,
}

pub async fn create_employee(
    State(state): State<AppState>,
    Json(payload): Json<EmployeePayload>,
) -> ApiResult<(StatusCode, Json<EmployeeSummary>)> {
    let created = employee::ActiveModel {
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        email: Set(payload.email),
        department_id: Set(payload.department_id),
        role_id: Set(payload.role_id),
        ..Default::default()
    }
    .insert(state.db.as_ref())
    .await
    .map_err(conflict_on_duplicate("Email already in use"))?;
    info!(employee_id = created.id, "employee created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn list_employees(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<EmployeeSummary>>> {
    let rows = employee::Entity::find()
        .order_by_asc(employee::Column::Id)
        .all(state.db.as_ref())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<EmployeeDetail>> {
    let found = employee::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Employee"))?;
    let department = match found.department_id {
        Some(department_id) => department::Entity::find_by_id(department_id)
            .one(state.db.as_ref())
            .await?
            .map(|d| d.name),
        None => None,
    };
    let role = match found.role_id {
        Some(role_id) => role::Entity::find_by_id(role_id)
            .one(state.db.as_ref())
            .await?
            .map(|r| r.name),
        None => None,
    };
    Ok(Json(EmployeeDetail {
        first_name: found.first_name,
        last_name: found.last_name,
        email: found.email,
        department,
        role,
    }))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<EmployeePayload>,
) -> ApiResult<Json<EmployeeSummary>> {
    let existing = employee::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Employee"))?;
    let mut active: employee::ActiveModel = existing.into();
    active.first_name = Set(payload.first_name);
    active.last_name = Set(payload.last_name);
    active.email = Set(payload.email);
    active.department_id = Set(payload.department_id);
    active.role_id = Set(payload.role_id);
    let updated = active
        .update(state.db.as_ref())
        .await
        .map_err(conflict_on_duplicate("Email already in use"))?;
    Ok(Json(updated.into()))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<MessageResponse>> {
    let existing = employee::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Employee"))?;
    // Unconditional: reviews referencing this employee are left in place.
    existing.delete(state.db.as_ref()).await?;
    Ok(Json(MessageResponse {
        message: "Employee deleted",
    }))
}

// ---------------------------------------------------------------------------
// Departments

#[derive(Deserialize)]
pub struct NamePayload {
    pub name: String,
}

#[derive(Serialize)]
pub struct NamedResponse {
    pub id: i32,
    pub name: String,
}

pub async fn create_department(
    State(state): State<AppState>,
    Json(payload): Json<NamePayload>,
) -> ApiResult<(StatusCode, Json<NamedResponse>)> {
    let created = department::ActiveModel {
        name: Set(payload.name),
        ..Default::default()
    }
    .insert(state.db.as_ref())
    .await
    .map_err(conflict_on_duplicate("Department already exists"))?;
    Ok((
        StatusCode::CREATED,
        Json(NamedResponse {
            id: created.id,
            name: created.name,
        }),
    ))
}

pub async fn list_departments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<NamedResponse>>> {
    let rows = department::Entity::find()
        .order_by_asc(department::Column::Id)
        .all(state.db.as_ref())
        .await?;
    Ok(Json(
        rows.into_iter()
            .map(|d| NamedResponse {
                id: d.id,
                name: d.name,
            })
            .collect(),
    ))
}

pub async fn get_department(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<NamedResponse>> {
    let found = department::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Department"))?;
    Ok(Json(NamedResponse {
        id: found.id,
        name: found.name,
    }))
}

pub async fn update_department(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<NamePayload>,
) -> ApiResult<Json<NamedResponse>> {
    let existing = department::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Department"))?;
    let mut active: department::ActiveModel = existing.into();
    active.name = Set(payload.name);
    let updated = active
        .update(state.db.as_ref())
        .await
        .map_err(conflict_on_duplicate("Department already exists"))?;
    Ok(Json(NamedResponse {
        id: updated.id,
        name: updated.name,
    }))
}

pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<MessageResponse>> {
    let existing = department::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Department"))?;
    // Unguarded: employees may keep a dangling department_id.
    existing.delete(state.db.as_ref()).await?;
    Ok(Json(MessageResponse {
        message: "Department deleted",
    }))
}

// ---------------------------------------------------------------------------
// Roles

pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<NamePayload>,
) -> ApiResult<(StatusCode, Json<NamedResponse>)> {
    let created = role::ActiveModel {
        name: Set(payload.name),
        ..Default::default()
    }
    .insert(state.db.as_ref())
    .await
    .map_err(conflict_on_duplicate("Role already exists"))?;
    Ok((
        StatusCode::CREATED,
        Json(NamedResponse {
            id: created.id,
            name: created.name,
        }),
    ))
}

pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Json<Vec<NamedResponse>>> {
    let rows = role::Entity::find()
        .order_by_asc(role::Column::Id)
        .all(state.db.as_ref())
        .await?;
    Ok(Json(
        rows.into_iter()
            .map(|r| NamedResponse {
                id: r.id,
                name: r.name,
            })
            .collect(),
    ))
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<NamedResponse>> {
    let found = role::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Role"))?;
    Ok(Json(NamedResponse {
        id: found.id,
        name: found.name,
    }))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<NamePayload>,
) -> ApiResult<Json<NamedResponse>> {
    let existing = role::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Role"))?;
    let mut active: role::ActiveModel = existing.into();
    active.name = Set(payload.name);
    let updated = active
        .update(state.db.as_ref())
        .await
        .map_err(conflict_on_duplicate("Role already exists"))?;
    Ok(Json(NamedResponse {
        id: updated.id,
        name: updated.name,
    }))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<MessageResponse>> {
    let existing = role::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Role"))?;
    existing.delete(state.db.as_ref()).await?;
    Ok(Json(MessageResponse {
        message: "Role deleted",
    }))
}

// ---------------------------------------------------------------------------
// Performance reviews

#[derive(Deserialize)]
pub struct ReviewPayload {
    pub employee_id: i32,
    pub review_date: NaiveDate,
    pub comments: String,
    pub rating: i32,
}

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: i32,
    pub employee_id: i32,
    pub review_date: NaiveDate,
    pub comments: String,
    pub rating: i32,
}

impl From<performance_review::Model> for ReviewResponse {
    fn from(model: performance_review::Model) -> Self {
        Self {
            id: model.id,
            employee_id: model.employee_id,
            review_date: model.review_date,
            comments: model.comments,
            rating: model.rating,
        }
    }
}

// No referential check on employee_id and no bounds on rating.
pub async fn create_review(
    State(state): State<AppState>,
    Json(payload): Json<ReviewPayload>,
) -> ApiResult<(StatusCode, Json<ReviewResponse>)> {
    let created = performance_review::ActiveModel {
        employee_id: Set(payload.employee_id),
        review_date: Set(payload.review_date),
        comments: Set(payload.comments),
        rating: Set(payload.rating),
        ..Default::default()
    }
    .insert(state.db.as_ref())
    .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn list_reviews(State(state): State<AppState>) -> ApiResult<Json<Vec<ReviewResponse>>> {
    let rows = performance_review::Entity::find()
        .order_by_asc(performance_review::Column::Id)
        .all(state.db.as_ref())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<ReviewResponse>> {
    let found = performance_review::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Performance review"))?;
    Ok(Json(found.into()))
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ReviewPayload>,
) -> ApiResult<Json<ReviewResponse>> {
    let existing = performance_review::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Performance review"))?;
    let mut active: performance_review::ActiveModel = existing.into();
    active.employee_id = Set(payload.employee_id);
    active.review_date = Set(payload.review_date);
    active.comments = Set(payload.comments);
    active.rating = Set(payload.rating);
    let updated = active.update(state.db.as_ref()).await?;
    Ok(Json(updated.into()))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<MessageResponse>> {
    let existing = performance_review::Entity::find_by_id(id)
        .one(state.db.as_ref())
        .await?
        .ok_or(ApiError::NotFound("Performance review"))?;
    existing.delete(state.db.as_ref()).await?;
    Ok(Json(MessageResponse {
        message: "Performance review deleted",
    }))
}

// ---------------------------------------------------------------------------
// Pages + health

pub async fn index_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    render_page(&state, "index.html").await
}

pub async fn login_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    render_page(&state, "login.html").await
}

pub async fn register_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    render_page(&state, "register.html").await
}

// Templates are an external collaborator; a missing file is a 404, not a
// packaging error.
async fn render_page(state: &AppState, name: &str) -> ApiResult<Html<String>> {
    let path = state.templates_dir.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => Ok(Html(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ApiError::NotFound("Page")),
        Err(err) => Err(ApiError::internal(err)),
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub db_ok: bool,
    pub version: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = state.db.ping().await.is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn conflict_on_duplicate(message: &str) -> impl Fn(sea_orm::DbErr) -> ApiError + '_ {
    move |err| match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::Conflict(message.to_string()),
        other => other,
    }
}
