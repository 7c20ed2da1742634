use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Dana Ruiz")]
    pub name: String,
    #[schema(example = "dana@crew.example", format = "email")]
    pub email: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
    pub role: Role,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "dana@crew.example", format = "email")]
    pub email: String,
    pub password: String,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64, // BIGINT UNSIGNED
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserDto {
    #[schema(example = 7)]
    pub id: u64,
    #[schema(example = "Dana Ruiz")]
    pub name: String,
    #[schema(example = "dana@crew.example")]
    pub email: String,
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String, // email
    pub name: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
