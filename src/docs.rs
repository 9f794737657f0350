use crate::api::availability::{AvailabilityEntry, AvailabilityResponse};
use crate::api::decision::DecisionPayload;
use crate::api::profile::{ProfileResponse, UpdateProfile};
use crate::api::request::{CreateRequest, RequestListResponse, UpdateRequest};
use crate::model::request::OffdayRequest;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Offday Management API",
        version = "1.0.0",
        description = r#"
## Offday Management System

Leave-request workflow for an academic institution with three roles.

### 🔹 Key Features
- **Requests**
  - Teachers submit, edit, and withdraw pending leave requests
- **Approval workflow**
  - Directors forward or reject pending requests
  - Chairmen accept or reject forwarded requests; accepted leave lands on the teacher's calendar
- **Availability**
  - Per-date on-leave/available projection over recorded leave

### 🔐 Security
Endpoints under the API prefix are protected with **JWT Bearer authentication**.
Decisions are gated to the **director** and **chairman** roles.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::request::create_request,
        crate::api::request::list_requests,
        crate::api::request::edit_request,
        crate::api::request::delete_request,

        crate::api::decision::decide,

        crate::api::availability::users_status,

        crate::api::profile::get_profile,
        crate::api::profile::update_profile,
    ),
    components(
        schemas(
            OffdayRequest,
            CreateRequest,
            UpdateRequest,
            RequestListResponse,
            DecisionPayload,
            AvailabilityEntry,
            AvailabilityResponse,
            ProfileResponse,
            UpdateProfile
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Requests", description = "Leave request lifecycle APIs"),
        (name = "Users", description = "Availability and profile APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
