use crate::{
    api::{job_site, timecard},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    // finish() only fails on zero period or burst, both clamped above
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/jobsites")
                    // /jobsites
                    .service(
                        web::resource("")
                            .route(web::get().to(job_site::list_job_sites))
                            .route(web::post().to(job_site::create_job_site)),
                    )
                    // /jobsites/{id}
                    .service(
                        web::resource("/{id}").route(web::put().to(job_site::update_job_site)),
                    ),
            )
            .service(
                web::scope("/timecards")
                    // fixed paths first so they are not captured by /{id}
                    .service(
                        web::resource("/current-week").route(web::get().to(timecard::current_week)),
                    )
                    .service(web::resource("/new").route(web::post().to(timecard::create_timecard)))
                    .service(web::resource("/{id}").route(web::get().to(timecard::get_timecard)))
                    .service(
                        web::resource("/{id}/add-template")
                            .route(web::post().to(timecard::add_template)),
                    )
                    .service(
                        web::resource("/{id}/edit-days").route(web::post().to(timecard::edit_days)),
                    )
                    .service(
                        web::resource("/{id}/remove-days")
                            .route(web::post().to(timecard::remove_days)),
                    )
                    .service(
                        web::resource("/{id}/submit")
                            .route(web::post().to(timecard::submit_timecard)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::post().to(timecard::approve_timecard)),
                    ),
            )
            .service(
                web::resource("/crew/timecards").route(web::get().to(timecard::crew_timecards)),
            ),
    );
}

// LOGIN / REGISTER
//  ├─ accessToken (15 min)
//  └─ refreshToken (7 days)

// API REQUEST
//  └─ Authorization: Bearer accessToken

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refreshToken
//       └─ returns a new pair, old refresh token revoked
