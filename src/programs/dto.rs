use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo_types::{Participant, Program, ProgramStatus};

#[derive(Debug, Deserialize)]
pub struct CreateProgramRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "crate::iso_date")]
    pub start_date: Date,
    #[serde(default, with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
    pub objectives: Option<String>,
    pub coordinator_charge: Uuid,
    pub status: Option<ProgramStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgramRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "crate::iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "crate::iso_date::option")]
    pub end_date: Option<Date>,
    pub objectives: Option<String>,
    pub coordinator_charge: Option<Uuid>,
    pub status: Option<ProgramStatus>,
}

/// What a coordinator may change on a program in their charge.
#[derive(Debug, Deserialize)]
pub struct CoordinatorProgramUpdate {
    pub description: Option<String>,
    pub objectives: Option<String>,
    pub status: Option<ProgramStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ProgramFilter {
    pub status: Option<ProgramStatus>,
}

#[derive(Debug, Serialize)]
pub struct ProgramDetails {
    #[serde(flatten)]
    pub program: Program,
    pub volunteers: i64,
    pub beneficiaries: i64,
}

#[derive(Debug, Serialize)]
pub struct ParticipantsResponse {
    pub program_id: Uuid,
    pub volunteers: Vec<Participant>,
    pub beneficiaries: Vec<Participant>,
}
