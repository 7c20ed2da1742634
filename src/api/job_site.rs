use crate::{
    auth::auth::AuthUser,
    model::job_site::{JobSite, JobSiteStatus},
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobSite {
    #[schema(example = "Riverside Clinic")]
    pub job_name: Option<String>,
    #[schema(example = "J-2291")]
    pub job_number: Option<String>,
    #[schema(example = "410 River Rd")]
    pub location: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobSite {
    #[schema(example = "Riverside Clinic, Phase 2")]
    pub job_name: Option<String>,
    #[schema(example = "J-2291B")]
    pub job_number: Option<String>,
}

/// Both names are required and must not be blank
fn required_names<'a>(
    job_name: &'a Option<String>,
    job_number: &'a Option<String>,
) -> Option<(&'a str, &'a str)> {
    let name = job_name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let number = job_number.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    Some((name, number))
}

const SELECT_JOB_SITE: &str = r#"
    SELECT id, job_name, job_number, location, status, requested_by, created_at, updated_at
    FROM job_sites
"#;

async fn fetch_job_site(pool: &MySqlPool, id: u64) -> Result<Option<JobSite>, sqlx::Error> {
    sqlx::query_as::<_, JobSite>(&format!("{SELECT_JOB_SITE} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

fn storage_error(e: sqlx::Error, what: &'static str) -> actix_web::Error {
    error!(error = %e, "{what}");
    actix_web::error::ErrorInternalServerError(json!({ "error": what }))
}

/// Active job sites, newest first
#[utoipa::path(
    get,
    path = "/api/jobsites",
    responses(
        (status = 200, description = "Active job sites", body = Vec<JobSite>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "JobSite"
)]
pub async fn list_job_sites(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let sites = sqlx::query_as::<_, JobSite>(&format!(
        "{SELECT_JOB_SITE} WHERE status = ? ORDER BY created_at DESC, id DESC"
    ))
    .bind(JobSiteStatus::Active.as_ref())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| storage_error(e, "Failed to load jobsites"))?;

    Ok(HttpResponse::Ok().json(sites))
}

/// Create a job site; it is active straight away
#[utoipa::path(
    post,
    path = "/api/jobsites",
    request_body = CreateJobSite,
    responses(
        (status = 200, description = "Created job site", body = JobSite),
        (status = 400, description = "jobName and jobNumber required"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "JobSite"
)]
pub async fn create_job_site(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateJobSite>,
) -> actix_web::Result<impl Responder> {
    let Some((job_name, job_number)) = required_names(&payload.job_name, &payload.job_number)
    else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "jobName and jobNumber required"
        })));
    };
    let location = payload.location.as_deref().map(str::trim).unwrap_or("");

    let result = sqlx::query(
        r#"
        INSERT INTO job_sites (job_name, job_number, location, status, requested_by)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(job_name)
    .bind(job_number)
    .bind(location)
    .bind(JobSiteStatus::Active.as_ref())
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| storage_error(e, "Failed to create jobsite"))?;

    let id = result.last_insert_id();
    info!(job_site_id = id, user_id = auth.user_id, "Job site created");

    match fetch_job_site(pool.get_ref(), id)
        .await
        .map_err(|e| storage_error(e, "Failed to create jobsite"))?
    {
        Some(site) => Ok(HttpResponse::Ok().json(site)),
        None => Err(actix_web::error::ErrorInternalServerError(json!({
            "error": "Failed to create jobsite"
        }))),
    }
}

/// Rename a job site. Only the user who created it may do so.
#[utoipa::path(
    put,
    path = "/api/jobsites/{id}",
    request_body = UpdateJobSite,
    params(("id" = u64, Path, description = "Job site id")),
    responses(
        (status = 200, description = "Updated job site", body = JobSite),
        (status = 400, description = "jobName and jobNumber required"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "JobSite"
)]
pub async fn update_job_site(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateJobSite>,
) -> actix_web::Result<impl Responder> {
    let Some((job_name, job_number)) = required_names(&payload.job_name, &payload.job_number)
    else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "jobName and jobNumber required"
        })));
    };

    let id = path.into_inner();

    let Some(site) = fetch_job_site(pool.get_ref(), id)
        .await
        .map_err(|e| storage_error(e, "Failed to update jobsite"))?
    else {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Not found" })));
    };

    if site.requested_by != Some(auth.user_id) {
        return Ok(HttpResponse::Forbidden().json(json!({ "error": "Forbidden" })));
    }

    sqlx::query("UPDATE job_sites SET job_name = ?, job_number = ? WHERE id = ?")
        .bind(job_name)
        .bind(job_number)
        .bind(id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| storage_error(e, "Failed to update jobsite"))?;

    let updated = fetch_job_site(pool.get_ref(), id)
        .await
        .map_err(|e| storage_error(e, "Failed to update jobsite"))?;

    match updated {
        Some(site) => Ok(HttpResponse::Ok().json(site)),
        None => Ok(HttpResponse::NotFound().json(json!({ "error": "Not found" }))),
    }
}
