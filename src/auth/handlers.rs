use crate::{
    auth::{
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    model::role::Role,
    models::{AuthResponse, LoginReqDto, RegisterReq, TokenType, UserDto, UserSql},
    utils::{email_cache, email_filter},
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({ "error": "Internal Server Error" }))
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Issues an access/refresh pair and records the refresh token's jti.
async fn issue_tokens(
    user: &UserSql,
    role: Role,
    pool: &MySqlPool,
    config: &Config,
) -> Result<AuthResponse, HttpResponse> {
    let access_token = generate_access_token(
        user.id,
        user.email.clone(),
        user.name.clone(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        internal_error()
    })?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user.id,
        user.email.clone(),
        user.name.clone(),
        role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign refresh token");
        internal_error()
    })?;

    debug!(user_id = user.id, jti = %refresh_claims.jti, "Storing refresh token");

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to store refresh token");
        internal_error()
    })?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: UserDto {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role,
        },
    })
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    let email = email_filter::normalize(email);

    // 1️⃣ Cuckoo filter: fast negative
    if !email_filter::might_exist(&email) {
        return true;
    }

    // 2️⃣ Moka cache: fast positive
    if email_cache::is_taken(&email).await {
        return false;
    }

    // 3️⃣ Database fallback
    let matches = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(pool)
        .await
        .unwrap_or(1); // fail-safe

    matches == 0
}

async fn fetch_user(email: &str, pool: &MySqlPool) -> Result<Option<UserSql>, sqlx::Error> {
    sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, name, email, password_hash, role
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Register a crew member and log them in
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Missing field(s)"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(payload, pool, config), fields(email = %payload.email))]
pub async fn register(
    payload: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let name = payload.name.trim();
    let email = email_filter::normalize(&payload.email);

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "Missing field(s)" }));
    }

    if !is_email_available(&email, pool.get_ref()).await {
        return HttpResponse::Conflict().json(json!({ "error": "Email already exists" }));
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Password hashing failed");
            return internal_error();
        }
    };

    let result = sqlx::query(
        r#"INSERT INTO users (name, email, password_hash, role) VALUES (?, ?, ?, ?)"#,
    )
    .bind(name)
    .bind(&email)
    .bind(&password_hash)
    .bind(payload.role.as_ref())
    .execute(pool.get_ref())
    .await;

    let user_id = match result {
        Ok(done) => done.last_insert_id(),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return HttpResponse::Conflict()
                        .json(json!({ "error": "Email already exists" }));
                }
            }
            error!(error = %e, "Register failed");
            return internal_error();
        }
    };

    // keep the fast paths in sync with the table
    email_filter::insert(&email);
    email_cache::mark_taken(&email).await;

    info!(user_id, "User registered");

    let user = UserSql {
        id: user_id,
        name: name.to_string(),
        email,
        password_hash,
        role: payload.role.to_string(),
    };

    match issue_tokens(&user, payload.role, pool.get_ref(), config.get_ref()).await {
        Ok(body) => HttpResponse::Created().json(body),
        Err(resp) => resp,
    }
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Email and password required"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, payload),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    let email = email_filter::normalize(&payload.email);

    // 1️⃣ Basic validation
    if email.is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({ "error": "Email and password required" }));
    }

    // 2️⃣ Fetch user
    let user = match fetch_user(&email, pool.get_ref()).await {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" }));
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return internal_error();
        }
    };

    // 3️⃣ Verify password
    if let Err(e) = verify_password(&payload.password, &user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" }));
    }

    let role: Role = match user.role.parse() {
        Ok(r) => r,
        Err(_) => {
            error!(user_id = user.id, role = %user.role, "Stored role is not recognised");
            return internal_error();
        }
    };

    // 4️⃣ Tokens
    let body = match issue_tokens(&user, role, pool.get_ref(), config.get_ref()).await {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    // 5️⃣ Update last_login_at (non-fatal)
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    email_cache::mark_taken(&email).await;

    info!("Login successful");

    HttpResponse::Ok().json(body)
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = AuthResponse),
        (status = 401, description = "Unknown, revoked or invalid refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return HttpResponse::Unauthorized().json(json!({ "error": "No token" }));
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::Unauthorized().finish(),
    };

    // 🔍 find refresh token in DB
    let record = sqlx::query_as::<_, (u64, u64, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE jti = ?
        "#,
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await;

    let (record_id, user_id) = match record {
        Ok(Some((id, user_id, false))) => (id, user_id),
        Ok(_) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return internal_error();
        }
    };

    // 🔥 revoke old refresh token
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
        return internal_error();
    }

    // the role may have changed since the token was issued
    let user = match fetch_user(&claims.sub, pool.get_ref()).await {
        Ok(Some(u)) if u.id == user_id => u,
        Ok(_) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return internal_error();
        }
    };

    let Ok(role) = user.role.parse::<Role>() else {
        return internal_error();
    };

    match issue_tokens(&user, role, pool.get_ref(), config.get_ref()).await {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(resp) => resp,
    }
}

/// Revoke a refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // idempotent
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token on logout");
    }

    HttpResponse::NoContent().finish()
}
