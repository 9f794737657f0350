use crate::api::request::total_pages;
use crate::error::ApiError;
use crate::model::user::{AvailabilityStatus, OffdayInterval, User, availability_on};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct AvailabilityQuery {
    /// Calendar date to project availability for (required)
    pub date: Option<NaiveDate>,
    /// "all" | "on_leave" | "available"
    pub status: Option<String>,
    /// Case-insensitive substring match on name/email
    pub search: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub limit: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilityEntry {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe@school.edu", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "teacher")]
    pub role: String,
    #[schema(example = "on_leave")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub items: Vec<AvailabilityEntry>,
    #[schema(example = 1)]
    pub total_items: i64,
    #[schema(example = 1)]
    pub total_pages: i64,
}

/* =========================
Availability projection for a date
========================= */
#[utoipa::path(
    get,
    path = "/api/users/status",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Per-user availability for the date", body = AvailabilityResponse),
        (status = 400, description = "Date missing or invalid"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn users_status(
    pool: web::Data<MySqlPool>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, ApiError> {
    let date = query
        .date
        .ok_or_else(|| ApiError::validation("Date is required"))?;

    let status_filter = match query.status.as_deref() {
        None | Some("all") => None,
        Some(other) => Some(
            other
                .parse::<AvailabilityStatus>()
                .map_err(|_| ApiError::validation("Unknown status filter"))?,
        ),
    };

    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut conditions: Vec<&str> = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(search) = query.search.as_deref() {
        if !search.is_empty() {
            conditions.push("(name LIKE ? OR email LIKE ?)");
            let like = format!("%{}%", search);
            bindings.push(like.clone());
            bindings.push(like);
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_q = count_q.bind(b);
    }
    let total_items = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT id, name, email, role, department FROM users {} ORDER BY id LIMIT ? OFFSET ?",
        where_clause
    );
    let mut data_q = sqlx::query_as::<_, User>(&data_sql);
    for b in &bindings {
        data_q = data_q.bind(b);
    }
    let users = data_q
        .bind(limit)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    // -------------------------
    // Ledger lookup for the page
    // -------------------------
    let mut ledgers: HashMap<String, Vec<OffdayInterval>> = HashMap::new();
    if !users.is_empty() {
        let placeholders = vec!["?"; users.len()].join(", ");
        let ledger_sql = format!(
            "SELECT user_email, start_date, end_date FROM user_offdays WHERE user_email IN ({})",
            placeholders
        );
        let mut ledger_q = sqlx::query_as::<_, (String, NaiveDate, NaiveDate)>(&ledger_sql);
        for user in &users {
            ledger_q = ledger_q.bind(&user.email);
        }
        for (email, start_date, end_date) in ledger_q.fetch_all(pool.get_ref()).await? {
            ledgers.entry(email).or_default().push(OffdayInterval {
                start_date,
                end_date,
            });
        }
    }

    // -------------------------
    // Projection + optional status filter on the page
    // -------------------------
    static EMPTY: &[OffdayInterval] = &[];
    let items: Vec<AvailabilityEntry> = users
        .into_iter()
        .filter_map(|user| {
            let offdays = ledgers.get(&user.email).map_or(EMPTY, Vec::as_slice);
            let status = availability_on(date, offdays);
            if status_filter.is_some_and(|wanted| wanted != status) {
                return None;
            }
            Some(AvailabilityEntry {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
                status: status.to_string(),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(AvailabilityResponse {
        items,
        total_items,
        total_pages: total_pages(total_items, limit as i64),
    }))
}
