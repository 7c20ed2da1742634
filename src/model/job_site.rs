use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobSiteStatus {
    Pending,
    Active,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 4,
        "jobName": "Riverside Clinic",
        "jobNumber": "J-2291",
        "location": "410 River Rd",
        "status": "active",
        "requestedBy": 7,
        "createdAt": "2026-01-05T14:03:00Z",
        "updatedAt": "2026-01-05T14:03:00Z"
    })
)]
pub struct JobSite {
    #[schema(example = 4)]
    pub id: u64,

    #[schema(example = "Riverside Clinic")]
    pub job_name: String,

    #[schema(example = "J-2291")]
    pub job_number: String,

    #[schema(example = "410 River Rd")]
    pub location: String,

    #[schema(example = "active")]
    pub status: String,

    #[schema(example = 7, nullable = true)]
    pub requested_by: Option<u64>,

    #[schema(example = "2026-01-05T14:03:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,

    #[schema(example = "2026-01-05T14:03:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}
