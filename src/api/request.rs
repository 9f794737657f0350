use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::request::{OffdayRequest, RequestStatus, leave_days};
use crate::model::role::Role;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateRequest {
    #[schema(example = "Conference")]
    pub subject: String,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Attending conf")]
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRequest {
    pub subject: Option<String>,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2024-03-03", format = "date", value_type = String)]
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RequestFilter {
    /// Filter by workflow status, or "all"
    pub status: Option<String>,
    /// Case-insensitive substring match on owner name/email/subject
    pub search: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub limit: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct RequestListResponse {
    pub items: Vec<OffdayRequest>,
    #[schema(example = 1)]
    pub total_items: i64,
    #[schema(example = 1)]
    pub total_pages: i64,
    #[schema(example = 1)]
    pub current_page: u32,
}

// Helper enum for typed SQLx binding in partial updates
enum BindValue {
    Str(String),
    Date(NaiveDate),
    Int(i64),
}

const REQUEST_COLUMNS: &str =
    "id, owner_email, subject, start_date, end_date, days, description, status, \
     rejection_message, created_at";

pub(crate) async fn fetch_request(
    pool: &MySqlPool,
    id: u64,
) -> Result<Option<OffdayRequest>, ApiError> {
    let sql = format!("SELECT {} FROM offday_requests WHERE id = ?", REQUEST_COLUMNS);
    let row = sqlx::query_as::<_, OffdayRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

async fn fetch_owned_request(
    pool: &MySqlPool,
    id: u64,
    owner_email: &str,
) -> Result<Option<OffdayRequest>, ApiError> {
    let sql = format!(
        "SELECT {} FROM offday_requests WHERE id = ? AND owner_email = ?",
        REQUEST_COLUMNS
    );
    let row = sqlx::query_as::<_, OffdayRequest>(&sql)
        .bind(id)
        .bind(owner_email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub(crate) fn total_pages(total_items: i64, limit: i64) -> i64 {
    if total_items <= 0 {
        0
    } else {
        (total_items + limit - 1) / limit
    }
}

fn validate_subject(subject: &str) -> Result<&str, ApiError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(ApiError::validation("Subject must not be empty"));
    }
    Ok(subject)
}

fn validate_description(description: &str) -> Result<&str, ApiError> {
    let description = description.trim();
    if description.len() < 5 {
        return Err(ApiError::validation(
            "Description must be at least 5 characters",
        ));
    }
    Ok(description)
}

/* =========================
Create request (teacher)
========================= */
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body(
        content = CreateRequest,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request submitted", body = OffdayRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn create_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_teacher()?;

    let subject = validate_subject(&payload.subject)?;
    let description = validate_description(&payload.description)?;
    let days = leave_days(payload.start_date, payload.end_date)?;

    let result = sqlx::query(
        r#"
        INSERT INTO offday_requests
            (owner_email, subject, start_date, end_date, days, description, status)
        VALUES (?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(&auth.email)
    .bind(subject)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(days)
    .bind(description)
    .execute(pool.get_ref())
    .await?;

    let created = fetch_request(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::Internal)?;

    Ok(HttpResponse::Ok().json(created))
}

/* =========================
List requests (role-scoped)
========================= */
#[utoipa::path(
    get,
    path = "/api/requests",
    params(RequestFilter),
    responses(
        (status = 200, description = "Paginated request list", body = RequestListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RequestFilter>,
) -> Result<HttpResponse, ApiError> {
    // -------------------------
    // Pagination
    // -------------------------
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut conditions: Vec<&str> = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    // Teachers only ever see their own requests
    if auth.role == Role::Teacher {
        conditions.push("r.owner_email = ?");
        bindings.push(auth.email.clone());
    }

    if let Some(status) = query.status.as_deref() {
        if status != "all" {
            let status: RequestStatus = status
                .parse()
                .map_err(|_| ApiError::validation("Unknown status filter"))?;
            conditions.push("r.status = ?");
            bindings.push(status.to_string());
        }
    }

    if let Some(search) = query.search.as_deref() {
        if !search.is_empty() {
            conditions.push("(u.name LIKE ? OR r.owner_email LIKE ? OR r.subject LIKE ?)");
            let like = format!("%{}%", search);
            bindings.push(like.clone());
            bindings.push(like.clone());
            bindings.push(like);
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!(
        "SELECT COUNT(*) FROM offday_requests r LEFT JOIN users u ON u.email = r.owner_email {}",
        where_clause
    );
    debug!(sql = %count_sql, "Counting requests");

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_q = count_q.bind(b);
    }
    let total_items = count_q.fetch_one(pool.get_ref()).await?;

    // -------------------------
    // DATA query: in-progress requests first, then newest
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT r.id, r.owner_email, r.subject, r.start_date, r.end_date, r.days,
               r.description, r.status, r.rejection_message, r.created_at
        FROM offday_requests r
        LEFT JOIN users u ON u.email = r.owner_email
        {}
        ORDER BY CASE WHEN r.status = 'in_progress' THEN {} ELSE {} END, r.created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_clause,
        RequestStatus::InProgress.sort_priority(),
        RequestStatus::Pending.sort_priority()
    );
    debug!(sql = %data_sql, page, limit, "Fetching requests");

    let mut data_q = sqlx::query_as::<_, OffdayRequest>(&data_sql);
    for b in &bindings {
        data_q = data_q.bind(b);
    }
    let items = data_q
        .bind(limit)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(RequestListResponse {
        items,
        total_items,
        total_pages: total_pages(total_items, limit as i64),
        current_page: page,
    }))
}

/* =========================
Edit request (owner, pending only)
========================= */
#[utoipa::path(
    put,
    path = "/api/requests/{id}",
    params(
        ("id" = u64, Path, description = "ID of the request to edit")
    ),
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "Request updated", body = OffdayRequest),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn edit_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    auth.require_teacher()?;

    let id = path.into_inner();

    let existing = fetch_owned_request(pool.get_ref(), id, &auth.email)
        .await?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    if existing.current_status()? != RequestStatus::Pending {
        return Err(ApiError::conflict(
            "Cannot edit a request that is already processed",
        ));
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut binds: Vec<BindValue> = Vec::new();

    if let Some(subject) = payload.subject.as_deref() {
        let subject = validate_subject(subject)?;
        sets.push("subject = ?");
        binds.push(BindValue::Str(subject.to_string()));
    }

    if let Some(description) = payload.description.as_deref() {
        let description = validate_description(description)?;
        sets.push("description = ?");
        binds.push(BindValue::Str(description.to_string()));
    }

    // Recompute the day count whenever either date moves; the untouched side
    // falls back to the stored value.
    if payload.start_date.is_some() || payload.end_date.is_some() {
        let start = payload.start_date.unwrap_or(existing.start_date);
        let end = payload.end_date.unwrap_or(existing.end_date);
        let days = leave_days(start, end)?;

        if let Some(start) = payload.start_date {
            sets.push("start_date = ?");
            binds.push(BindValue::Date(start));
        }
        if let Some(end) = payload.end_date {
            sets.push("end_date = ?");
            binds.push(BindValue::Date(end));
        }
        sets.push("days = ?");
        binds.push(BindValue::Int(days));
    }

    if sets.is_empty() {
        return Err(ApiError::validation("No fields provided for update"));
    }

    let sql = format!(
        "UPDATE offday_requests SET {} WHERE id = ? AND owner_email = ? AND status = 'pending'",
        sets.join(", ")
    );

    let mut q = sqlx::query(&sql);
    for b in binds {
        q = match b {
            BindValue::Str(v) => q.bind(v),
            BindValue::Date(v) => q.bind(v),
            BindValue::Int(v) => q.bind(v),
        };
    }

    let result = q
        .bind(id)
        .bind(&auth.email)
        .execute(pool.get_ref())
        .await?;

    // A decision raced the edit and won
    if result.rows_affected() == 0 {
        return Err(ApiError::conflict(
            "Cannot edit a request that is already processed",
        ));
    }

    let updated = fetch_request(pool.get_ref(), id)
        .await?
        .ok_or(ApiError::Internal)?;

    Ok(HttpResponse::Ok().json(updated))
}

/* =========================
Delete request (owner, pending only)
========================= */
#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    params(
        ("id" = u64, Path, description = "ID of the request to delete")
    ),
    responses(
        (status = 200, description = "Request deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn delete_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_teacher()?;

    let id = path.into_inner();

    let existing = fetch_owned_request(pool.get_ref(), id, &auth.email)
        .await?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    if existing.current_status()? != RequestStatus::Pending {
        return Err(ApiError::conflict(
            "Cannot delete a request that is already processed",
        ));
    }

    let result = sqlx::query(
        "DELETE FROM offday_requests WHERE id = ? AND owner_email = ? AND status = 'pending'",
    )
    .bind(id)
    .bind(&auth.email)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict(
            "Cannot delete a request that is already processed",
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(21, 10), 3);
    }

    #[test]
    fn subject_must_be_non_empty() {
        assert!(validate_subject("Conference").is_ok());
        assert_eq!(validate_subject("  padded  ").unwrap(), "padded");
        assert!(validate_subject("").is_err());
        assert!(validate_subject("   ").is_err());
    }

    #[test]
    fn description_has_a_minimum_length() {
        assert!(validate_description("Attending conf").is_ok());
        assert!(validate_description("abcde").is_ok());
        assert!(validate_description("abcd").is_err());
        assert!(validate_description("  ab  ").is_err());
    }
}
