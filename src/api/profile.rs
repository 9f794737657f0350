use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::user::User;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe@school.edu", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "teacher")]
    pub role: String,
    #[schema(example = "Physics")]
    pub department: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub department: Option<String>,
}

async fn fetch_profile(pool: &MySqlPool, email: &str) -> Result<ProfileResponse, ApiError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, role, department FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ProfileResponse {
        name: user.name,
        email: user.email,
        role: user.role,
        department: user.department.unwrap_or_default(),
    })
}

/* =========================
Get own profile
========================= */
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Caller profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn get_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let profile = fetch_profile(pool.get_ref(), &auth.email).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/* =========================
Update own profile (name/department only)
========================= */
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_profile(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<UpdateProfile>,
) -> Result<HttpResponse, ApiError> {
    let mut sets: Vec<&str> = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(name) = payload.name.as_deref() {
        let name = name.trim();
        if name.len() < 2 {
            return Err(ApiError::validation("Name must be at least 2 characters"));
        }
        sets.push("name = ?");
        bindings.push(name.to_string());
    }

    if let Some(department) = payload.department.as_deref() {
        sets.push("department = ?");
        bindings.push(department.trim().to_string());
    }

    if sets.is_empty() {
        return Err(ApiError::validation("No fields provided for update"));
    }

    let sql = format!("UPDATE users SET {} WHERE email = ?", sets.join(", "));
    let mut q = sqlx::query(&sql);
    for b in &bindings {
        q = q.bind(b);
    }
    let result = q.bind(&auth.email).execute(pool.get_ref()).await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    let profile = fetch_profile(pool.get_ref(), &auth.email).await?;
    Ok(HttpResponse::Ok().json(profile))
}
