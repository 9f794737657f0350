use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// Caller identity extracted from the bearer token. The lifecycle engine
/// trusts these fields verbatim and never re-derives them.
#[derive(Debug)]
pub struct AuthUser {
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthorized)),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::Internal)),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ApiError::Unauthorized)),
        };

        ready(Ok(AuthUser {
            email: claims.sub,
            name: claims.name,
            role: claims.role,
        }))
    }
}

impl AuthUser {
    /// Submission, edit, and delete are teacher-only operations.
    pub fn require_teacher(&self) -> Result<(), ApiError> {
        if self.role.may_submit() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::test::TestRequest;

    fn test_config() -> Config {
        Config {
            database_url: "mysql://unused".to_string(),
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 600,
            refresh_token_ttl: 3600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
        }
    }

    #[actix_web::test]
    async fn extracts_identity_from_bearer_token() {
        let config = test_config();
        let token = generate_access_token(
            1,
            "jane.doe@school.edu".to_string(),
            "Jane Doe".to_string(),
            Role::Teacher,
            &config.jwt_secret,
            config.access_token_ttl,
        );

        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .app_data(Data::new(config))
            .to_http_request();

        let user = AuthUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(user.email, "jane.doe@school.edu");
        assert_eq!(user.role, Role::Teacher);
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(test_config()))
            .to_http_request();

        let err = AuthUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn only_teachers_pass_the_submission_gate() {
        for (role, ok) in [
            (Role::Teacher, true),
            (Role::Director, false),
            (Role::Chairman, false),
        ] {
            let user = AuthUser {
                email: "someone@school.edu".to_string(),
                name: "Someone".to_string(),
                role,
            };
            assert_eq!(user.require_teacher().is_ok(), ok);
        }
    }
}
