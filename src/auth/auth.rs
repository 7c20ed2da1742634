use crate::config::Config;
use crate::timecard::ApprovalAuthority;
use crate::{auth::jwt::verify_token, model::role::Role, models::TokenType};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already resolved by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized(json!({"error": "Missing token"})))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) if c.token_type == TokenType::Access => c,
            _ => return ready(Err(ErrorUnauthorized(json!({"error": "Invalid token"})))),
        };

        ready(Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.sub,
            name: claims.name,
            role: claims.role,
        }))
    }
}

impl AuthUser {
    pub fn require_foreman(&self) -> actix_web::Result<()> {
        if self.role == Role::Foreman {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden(json!({"error": "Foreman only"})))
        }
    }

    /// Capability handed to `Timecard::approve`
    pub fn approval_authority(&self) -> actix_web::Result<ApprovalAuthority> {
        ApprovalAuthority::for_role(self.role, self.user_id)
            .ok_or_else(|| actix_web::error::ErrorForbidden(json!({"error": "Foreman only"})))
    }
}
