use std::collections::BTreeSet;

use crate::{
    auth::auth::AuthUser,
    model::{
        job_site::JobSiteStatus,
        timecard::{TimecardMeta, TimecardRow, TimecardView},
    },
    timecard::{
        DayEntry, EntryPatch, ShiftTimes, Timecard, TimecardError, TimecardResult, WeekDay,
        WeekRange,
    },
};
use actix_web::{HttpResponse, Responder, ResponseError, http::StatusCode, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::{MySql, MySqlPool, Transaction, types::Json};
use tracing::{debug, error, info};
use utoipa::ToSchema;

impl ResponseError for TimecardError {
    fn status_code(&self) -> StatusCode {
        match self {
            TimecardError::Validation(_) => StatusCode::BAD_REQUEST,
            TimecardError::IllegalTransition { .. } => StatusCode::CONFLICT,
            TimecardError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTimecardReq {
    #[schema(example = 4)]
    pub job_site_id: u64,
}

/// Template times plus the days to stamp them on
#[derive(Deserialize, ToSchema)]
pub struct ApplyTemplateReq {
    #[schema(example = json!(["Mon", "Tue"]))]
    pub days: Vec<WeekDay>,
    #[serde(flatten)]
    pub template: ShiftTimes,
}

#[derive(Deserialize, ToSchema)]
pub struct EditDaysReq {
    #[schema(example = json!(["Mon"]))]
    pub days: Vec<WeekDay>,
    pub patch: Option<EntryPatch>,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoveDaysReq {
    #[schema(example = json!(["Sat", "Sun"]))]
    pub days: Vec<WeekDay>,
}

#[derive(Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReq {
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
    pub signature_data_url: Option<String>,
}

/// Request-shape checks done before the database is touched
fn day_set(days: &[WeekDay]) -> TimecardResult<BTreeSet<WeekDay>> {
    if days.is_empty() {
        return Err(TimecardError::Validation("Select days".to_string()));
    }
    Ok(days.iter().copied().collect())
}

fn require_patch(patch: Option<&EntryPatch>) -> TimecardResult<&EntryPatch> {
    match patch {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(TimecardError::Validation("Missing patch".to_string())),
    }
}

fn require_template(template: &ShiftTimes) -> TimecardResult<&ShiftTimes> {
    if template.is_blank() {
        return Err(TimecardError::Validation("Missing template".to_string()));
    }
    Ok(template)
}

const SELECT_TIMECARD: &str = r#"
    SELECT t.id, t.user_id, t.job_site_id, t.week_start, t.week_end, t.entries, t.status,
           t.signature_image, t.signed_at, t.approved_by, t.created_at, t.updated_at,
           j.job_name, j.job_number, u.name AS worker_name, u.role AS worker_role
    FROM timecards t
    JOIN job_sites j ON j.id = t.job_site_id
    JOIN users u ON u.id = t.user_id
"#;

fn storage_error(e: impl std::fmt::Display, what: &'static str) -> actix_web::Error {
    error!(error = %e, "{what}");
    actix_web::error::ErrorInternalServerError(json!({ "error": what }))
}

fn not_found() -> actix_web::Error {
    actix_web::error::ErrorNotFound(json!({ "error": "Not found" }))
}

fn into_views(rows: Vec<TimecardRow>) -> actix_web::Result<Vec<TimecardView>> {
    rows.into_iter()
        .map(|row| -> actix_web::Result<TimecardView> {
            let (card, meta) = row
                .into_parts()
                .map_err(|e| storage_error(e, "Stored timecard is unreadable"))?;
            Ok(TimecardView::new(&card, &meta))
        })
        .collect()
}

async fn fetch_timecard(
    pool: &MySqlPool,
    id: u64,
) -> actix_web::Result<Option<(Timecard, TimecardMeta)>> {
    let row = sqlx::query_as::<_, TimecardRow>(&format!("{SELECT_TIMECARD} WHERE t.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| storage_error(e, "Failed to load timecard"))?;

    row.map(|r| {
        r.into_parts()
            .map_err(|e| storage_error(e, "Stored timecard is unreadable"))
    })
    .transpose()
}

async fn save_timecard(
    tx: &mut Transaction<'_, MySql>,
    card: &Timecard,
) -> Result<(), sqlx::Error> {
    let signature = card.signature();

    sqlx::query(
        r#"
        UPDATE timecards
        SET entries = ?, status = ?, signature_image = ?, signed_at = ?, approved_by = ?
        WHERE id = ?
        "#,
    )
    .bind(Json(card.entries()))
    .bind(card.status().as_ref())
    .bind(signature.map(|s| s.image_data_url.as_str()))
    .bind(signature.map(|s| s.signed_at))
    .bind(card.approved_by())
    .bind(card.id())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Runs one command against a timecard as a single read-modify-write.
///
/// The row is locked for the duration, so commands on the same card are
/// serialized; a rejected command rolls back without writing.
async fn run_command<F>(pool: &MySqlPool, id: u64, command: F) -> actix_web::Result<TimecardView>
where
    F: FnOnce(&mut Timecard) -> TimecardResult<()>,
{
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| storage_error(e, "Failed to update timecard"))?;

    let row = sqlx::query_as::<_, TimecardRow>(&format!(
        "{SELECT_TIMECARD} WHERE t.id = ? FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| storage_error(e, "Failed to load timecard"))?;

    let Some(row) = row else {
        return Err(not_found());
    };
    let (mut card, mut meta) = row
        .into_parts()
        .map_err(|e| storage_error(e, "Stored timecard is unreadable"))?;

    if let Err(rejected) = command(&mut card) {
        debug!(timecard_id = id, reason = %rejected, "Timecard command rejected");
        return Err(rejected.into());
    }

    save_timecard(&mut tx, &card)
        .await
        .map_err(|e| storage_error(e, "Failed to save timecard"))?;
    tx.commit()
        .await
        .map_err(|e| storage_error(e, "Failed to save timecard"))?;

    meta.updated_at = Utc::now();
    Ok(TimecardView::new(&card, &meta))
}

/// The caller's timecards for the current week
#[utoipa::path(
    get,
    path = "/api/timecards/current-week",
    responses(
        (status = 200, description = "Timecards for this week, newest first", body = Vec<TimecardView>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn current_week(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let week = WeekRange::current();

    let rows = sqlx::query_as::<_, TimecardRow>(&format!(
        "{SELECT_TIMECARD} WHERE t.user_id = ? AND t.week_start = ? AND t.week_end = ? \
         ORDER BY t.created_at DESC, t.id DESC"
    ))
    .bind(auth.user_id)
    .bind(week.start)
    .bind(week.end)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| storage_error(e, "Failed to load timecards"))?;

    Ok(HttpResponse::Ok().json(into_views(rows)?))
}

/// Start a draft timecard for the current week at a job site
#[utoipa::path(
    post,
    path = "/api/timecards/new",
    request_body = NewTimecardReq,
    responses(
        (status = 200, description = "New draft timecard", body = TimecardView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Job site not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn create_timecard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewTimecardReq>,
) -> actix_web::Result<impl Responder> {
    let active_sites = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM job_sites WHERE id = ? AND status = ?",
    )
    .bind(payload.job_site_id)
    .bind(JobSiteStatus::Active.as_ref())
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| storage_error(e, "Failed to create timecard"))?;

    if active_sites == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "error": "Job site not found" })));
    }

    let week = WeekRange::current();
    let draft = Timecard::draft(0, auth.user_id, payload.job_site_id, week);

    let result = sqlx::query(
        r#"
        INSERT INTO timecards (user_id, job_site_id, week_start, week_end, entries, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(draft.user_id())
    .bind(draft.job_site_id())
    .bind(week.start)
    .bind(week.end)
    .bind(Json(Vec::<DayEntry>::new()))
    .bind(draft.status().as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| storage_error(e, "Failed to create timecard"))?;

    let id = result.last_insert_id();
    info!(timecard_id = id, user_id = auth.user_id, week_start = %week.start, "Timecard created");

    let (card, meta) = fetch_timecard(pool.get_ref(), id)
        .await?
        .ok_or_else(|| storage_error("row vanished after insert", "Failed to create timecard"))?;

    Ok(HttpResponse::Ok().json(TimecardView::new(&card, &meta)))
}

/// A single timecard; visible to its owner and to foremen
#[utoipa::path(
    get,
    path = "/api/timecards/{id}",
    params(("id" = u64, Path, description = "Timecard id")),
    responses(
        (status = 200, description = "Timecard", body = TimecardView),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn get_timecard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let Some((card, meta)) = fetch_timecard(pool.get_ref(), path.into_inner()).await? else {
        return Err(not_found());
    };

    if !card.visible_to(auth.user_id, auth.role) {
        return Err(TimecardError::Forbidden("Forbidden".to_string()).into());
    }

    Ok(HttpResponse::Ok().json(TimecardView::new(&card, &meta)))
}

/// Stamp the template times onto the selected days, replacing what was there
#[utoipa::path(
    post,
    path = "/api/timecards/{id}/add-template",
    params(("id" = u64, Path, description = "Timecard id")),
    request_body = ApplyTemplateReq,
    responses(
        (status = 200, description = "Updated timecard", body = TimecardView),
        (status = 400, description = "Select days / Missing template"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Timecard locked")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn add_template(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ApplyTemplateReq>,
) -> actix_web::Result<impl Responder> {
    let days = day_set(&payload.days)?;
    let template = require_template(&payload.template)?;

    let view = run_command(pool.get_ref(), path.into_inner(), |card| {
        card.ensure_owner(auth.user_id)?;
        card.apply_template(&days, template).map(|_| ())
    })
    .await?;

    Ok(HttpResponse::Ok().json(view))
}

/// Overlay patch fields onto the selected days that already have entries
#[utoipa::path(
    post,
    path = "/api/timecards/{id}/edit-days",
    params(("id" = u64, Path, description = "Timecard id")),
    request_body = EditDaysReq,
    responses(
        (status = 200, description = "Updated timecard", body = TimecardView),
        (status = 400, description = "Select days / Missing patch"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Timecard locked")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn edit_days(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<EditDaysReq>,
) -> actix_web::Result<impl Responder> {
    let days = day_set(&payload.days)?;
    let patch = require_patch(payload.patch.as_ref())?;

    let view = run_command(pool.get_ref(), path.into_inner(), |card| {
        card.ensure_owner(auth.user_id)?;
        card.edit_days(&days, patch).map(|_| ())
    })
    .await?;

    Ok(HttpResponse::Ok().json(view))
}

/// Clear the selected days
#[utoipa::path(
    post,
    path = "/api/timecards/{id}/remove-days",
    params(("id" = u64, Path, description = "Timecard id")),
    request_body = RemoveDaysReq,
    responses(
        (status = 200, description = "Updated timecard", body = TimecardView),
        (status = 400, description = "Select days"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Timecard locked")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn remove_days(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RemoveDaysReq>,
) -> actix_web::Result<impl Responder> {
    let days = day_set(&payload.days)?;

    let view = run_command(pool.get_ref(), path.into_inner(), |card| {
        card.ensure_owner(auth.user_id)?;
        card.remove_days(&days).map(|_| ())
    })
    .await?;

    Ok(HttpResponse::Ok().json(view))
}

/// Hand the week in for approval, optionally signed
#[utoipa::path(
    post,
    path = "/api/timecards/{id}/submit",
    params(("id" = u64, Path, description = "Timecard id")),
    request_body(content = SubmitReq, description = "Optional signature"),
    responses(
        (status = 200, description = "Submitted timecard", body = TimecardView),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already submitted")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn submit_timecard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: Option<web::Json<SubmitReq>>,
) -> actix_web::Result<impl Responder> {
    let signature = payload.and_then(|p| p.into_inner().signature_data_url);
    let id = path.into_inner();

    let view = run_command(pool.get_ref(), id, |card| {
        card.ensure_owner(auth.user_id)?;
        card.submit(signature, Utc::now()).map(|_| ())
    })
    .await?;

    info!(timecard_id = id, user_id = auth.user_id, "Timecard submitted");
    Ok(HttpResponse::Ok().json(view))
}

/// Foreman sign-off on a submitted timecard
#[utoipa::path(
    post,
    path = "/api/timecards/{id}/approve",
    params(("id" = u64, Path, description = "Timecard id")),
    responses(
        (status = 200, description = "Approved timecard", body = TimecardView),
        (status = 403, description = "Foreman only"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Must be submitted")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn approve_timecard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let authority = auth.approval_authority()?;
    let id = path.into_inner();

    let view = run_command(pool.get_ref(), id, |card| {
        card.approve(&authority).map(|_| ())
    })
    .await?;

    info!(timecard_id = id, approved_by = auth.user_id, "Timecard approved");
    Ok(HttpResponse::Ok().json(view))
}

/// Every crew member's timecards for the current week
#[utoipa::path(
    get,
    path = "/api/crew/timecards",
    responses(
        (status = 200, description = "Crew timecards, newest first", body = Vec<TimecardView>),
        (status = 403, description = "Foreman only")
    ),
    security(("bearer_auth" = [])),
    tag = "Timecard"
)]
pub async fn crew_timecards(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_foreman()?;

    let week = WeekRange::current();

    let rows = sqlx::query_as::<_, TimecardRow>(&format!(
        "{SELECT_TIMECARD} WHERE t.week_start = ? AND t.week_end = ? \
         ORDER BY t.created_at DESC, t.id DESC"
    ))
    .bind(week.start)
    .bind(week.end)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| storage_error(e, "Failed to load crew timecards"))?;

    Ok(HttpResponse::Ok().json(into_views(rows)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timecard::{Action, TimecardStatus};

    #[test]
    fn error_statuses() {
        assert_eq!(
            TimecardError::Validation("Select days".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TimecardError::Forbidden("Forbidden".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            TimecardError::IllegalTransition {
                status: TimecardStatus::Approved,
                action: Action::Edit,
            }
            .status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn day_set_dedupes_and_rejects_empty() {
        let set = day_set(&[WeekDay::Wed, WeekDay::Mon, WeekDay::Wed]).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![WeekDay::Mon, WeekDay::Wed]);
        assert!(day_set(&[]).is_err());
    }

    #[test]
    fn template_request_reads_flat_fields() {
        let req: ApplyTemplateReq = serde_json::from_value(json!({
            "days": ["Mon", "Tue"],
            "start": "7:00", "startTime": "AM",
            "breakOut": "9:00", "breakOutTime": "AM",
            "breakIn": "9:15", "breakInTime": "AM",
            "end": "3:30", "endTime": "PM"
        }))
        .unwrap();
        assert_eq!(req.days, vec![WeekDay::Mon, WeekDay::Tue]);
        assert_eq!(req.template.break_in, "9:15");
    }

    #[test]
    fn unknown_day_label_fails_to_parse() {
        let parsed = serde_json::from_value::<RemoveDaysReq>(json!({ "days": ["Funday"] }));
        assert!(parsed.is_err());
    }

    #[test]
    fn template_needs_a_clock_reading() {
        assert!(require_template(&ShiftTimes::default()).is_err());
        let template = ShiftTimes {
            start: "7:00".into(),
            ..Default::default()
        };
        assert!(require_template(&template).is_ok());
    }

    #[test]
    fn patch_must_carry_a_field() {
        assert!(require_patch(None).is_err());
        assert!(require_patch(Some(&EntryPatch::default())).is_err());
        let patch = EntryPatch {
            end: Some("4:00".into()),
            ..Default::default()
        };
        assert!(require_patch(Some(&patch)).is_ok());
    }
}
