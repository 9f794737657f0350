use crate::api::request::fetch_request;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::request::{ChairmanAction, DirectorAction, OffdayRequest};
use crate::model::role::DecisionStage;
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DecisionPayload {
    /// Director: "forward" | "reject". Chairman: "accept" | "reject".
    #[schema(example = "forward")]
    pub action: String,
    /// Stored as the rejection message on reject; ignored otherwise.
    pub message: Option<String>,
}

/* =========================
Decision endpoint (director/chairman)
========================= */
#[utoipa::path(
    patch,
    path = "/api/requests/{id}/status",
    params(
        ("id" = u64, Path, description = "ID of the request to decide")
    ),
    request_body(
        content = DecisionPayload,
        description = "Decision payload; valid actions depend on the caller's role",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Decision applied", body = OffdayRequest),
        (status = 400, description = "Unknown action"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not in the required state")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn decide(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<DecisionPayload>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    match auth.role.decision_stage() {
        None => Err(ApiError::Forbidden),
        Some(DecisionStage::Director) => director_decide(pool.get_ref(), id, &payload).await,
        Some(DecisionStage::Chairman) => chairman_decide(pool.get_ref(), id, &payload).await,
    }
}

/// Director stage: forward to the chairman or reject outright. Valid only
/// while the request is still pending.
async fn director_decide(
    pool: &MySqlPool,
    id: u64,
    payload: &DecisionPayload,
) -> Result<HttpResponse, ApiError> {
    let action: DirectorAction = payload
        .action
        .parse()
        .map_err(|_| ApiError::validation("Unknown action"))?;

    let request = fetch_request(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    let next = request.current_status()?.director_transition(action)?;

    // Conditional write keyed on the expected state: a concurrent decision
    // leaves rows_affected at zero and the loser reports the conflict.
    let result = match action {
        DirectorAction::Forward => {
            sqlx::query(
                "UPDATE offday_requests SET status = ?, rejection_message = NULL \
                 WHERE id = ? AND status = 'pending'",
            )
            .bind(next.to_string())
            .bind(id)
        }
        DirectorAction::Reject => {
            sqlx::query(
                "UPDATE offday_requests SET status = ?, rejection_message = ? \
                 WHERE id = ? AND status = 'pending'",
            )
            .bind(next.to_string())
            .bind(payload.message.clone().unwrap_or_default())
            .bind(id)
        }
    }
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Already processed"));
    }

    info!(id, action = %action, "Director decision applied");

    let updated = fetch_request(pool, id).await?.ok_or(ApiError::Internal)?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Chairman stage: final accept or reject, valid only once the director has
/// forwarded the request. Accepting flips the status and appends the leave
/// interval to the owner's ledger in one transaction; the interval and target
/// are taken from the request row itself, never from the caller.
async fn chairman_decide(
    pool: &MySqlPool,
    id: u64,
    payload: &DecisionPayload,
) -> Result<HttpResponse, ApiError> {
    let action: ChairmanAction = payload
        .action
        .parse()
        .map_err(|_| ApiError::validation("Unknown action"))?;

    let request = fetch_request(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    let next = request.current_status()?.chairman_transition(action)?;

    match action {
        ChairmanAction::Accept => {
            let mut tx = pool.begin().await?;

            let result = sqlx::query(
                "UPDATE offday_requests SET status = ?, rejection_message = NULL \
                 WHERE id = ? AND status = 'in_progress'",
            )
            .bind(next.to_string())
            .bind(id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(ApiError::conflict("Not ready for acceptance"));
            }

            // Ledger append, idempotent per request id via the UNIQUE key.
            let append = sqlx::query(
                "INSERT INTO user_offdays (user_email, start_date, end_date, request_id) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&request.owner_email)
            .bind(request.start_date)
            .bind(request.end_date)
            .bind(id)
            .execute(&mut *tx)
            .await;

            if let Err(e) = append {
                tx.rollback().await.ok();
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code() == Some("23000".into()) {
                        return Err(ApiError::conflict("Already processed"));
                    }
                }
                return Err(e.into());
            }

            tx.commit().await?;

            info!(id, owner = %request.owner_email, "Request accepted, leave recorded");
        }
        ChairmanAction::Reject => {
            let result = sqlx::query(
                "UPDATE offday_requests SET status = ?, rejection_message = ? \
                 WHERE id = ? AND status = 'in_progress'",
            )
            .bind(next.to_string())
            .bind(payload.message.clone().unwrap_or_default())
            .bind(id)
            .execute(pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(ApiError::conflict("Already processed"));
            }

            info!(id, "Request rejected by chairman");
        }
    }

    let updated = fetch_request(pool, id).await?.ok_or(ApiError::Internal)?;
    Ok(HttpResponse::Ok().json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::RequestStatus;

    #[test]
    fn director_actions_parse() {
        assert_eq!("forward".parse::<DirectorAction>().unwrap(), DirectorAction::Forward);
        assert_eq!("reject".parse::<DirectorAction>().unwrap(), DirectorAction::Reject);
        assert!("accept".parse::<DirectorAction>().is_err());
    }

    #[test]
    fn chairman_actions_parse() {
        assert_eq!("accept".parse::<ChairmanAction>().unwrap(), ChairmanAction::Accept);
        assert_eq!("reject".parse::<ChairmanAction>().unwrap(), ChairmanAction::Reject);
        assert!("forward".parse::<ChairmanAction>().is_err());
    }

    #[test]
    fn transitions_back_the_conditional_writes() {
        // The WHERE guards in this module must agree with the pure state machine.
        assert_eq!(
            RequestStatus::Pending
                .director_transition(DirectorAction::Forward)
                .unwrap()
                .to_string(),
            "in_progress"
        );
        assert_eq!(
            RequestStatus::InProgress
                .chairman_transition(ChairmanAction::Accept)
                .unwrap()
                .to_string(),
            "accepted"
        );
    }
}
