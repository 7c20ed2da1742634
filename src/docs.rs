use crate::api::job_site::{CreateJobSite, UpdateJobSite};
use crate::api::timecard::{
    ApplyTemplateReq, EditDaysReq, NewTimecardReq, RemoveDaysReq, SubmitReq,
};
use crate::model::job_site::{JobSite, JobSiteStatus};
use crate::model::role::Role;
use crate::model::timecard::{JobSiteRef, TimecardView, WorkerRef};
use crate::models::{AuthResponse, LoginReqDto, RegisterReq, UserDto};
use crate::timecard::{EntryPatch, Meridiem, ShiftTimes, TimecardStatus, WeekDay};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Crew Timecards API",
        version = "0.1.0",
        description = r#"
## Crew Timecards

Weekly work-hour timecards for construction crews.

### Flow
1. A worker picks a **job site** and starts a draft timecard for the current week.
2. Start / break-out / break-in / end times are stamped onto weekdays with a **template**,
   then adjusted per day with **edit-days** or cleared with **remove-days**.
3. The worker **submits** the card, optionally with a signature image.
4. A **foreman** reviews the crew's cards and **approves** them.

### Rules
- Worked minutes per day are `(breakOut - start) + (endTime - breakIn)`; unreadable or
  out-of-order times count as 0.
- Only draft cards can be edited. `draft → submitted → approved`, never backwards.

### 🔐 Security
All `/api` endpoints require a **JWT Bearer** access token from `/auth/login` or `/auth/register`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::job_site::list_job_sites,
        crate::api::job_site::create_job_site,
        crate::api::job_site::update_job_site,

        crate::api::timecard::current_week,
        crate::api::timecard::create_timecard,
        crate::api::timecard::get_timecard,
        crate::api::timecard::add_template,
        crate::api::timecard::edit_days,
        crate::api::timecard::remove_days,
        crate::api::timecard::submit_timecard,
        crate::api::timecard::approve_timecard,
        crate::api::timecard::crew_timecards
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            AuthResponse,
            UserDto,
            Role,
            JobSite,
            JobSiteStatus,
            CreateJobSite,
            UpdateJobSite,
            NewTimecardReq,
            ApplyTemplateReq,
            EditDaysReq,
            RemoveDaysReq,
            SubmitReq,
            ShiftTimes,
            EntryPatch,
            Meridiem,
            WeekDay,
            TimecardStatus,
            TimecardView,
            JobSiteRef,
            WorkerRef
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token rotation"),
        (name = "JobSite", description = "Job site management"),
        (name = "Timecard", description = "Weekly timecards and approval"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths
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
