use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome marker included in every JSON response body
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Yes,
    No,
    #[default]
    Unset,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Guest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub seating_zone: String,
    #[serde(default)]
    pub table_assigned: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub rsvp_status: RsvpStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GuestWithCheckIn {
    #[serde(flatten)]
    pub guest: Guest,
    pub checked_in: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CheckIn {
    pub timestamp: DateTime<Utc>,
    pub code: String,
    pub name: String,
    pub table_assigned: String,
    pub designation: String,
    pub attendant: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckCodeRequest {
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckCodeResponse {
    pub status: ResponseStatus,
    pub redirect_url: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckInRequest {
    pub code: String,
    #[serde(default)]
    pub attendant: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CheckInResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub check_in: CheckIn,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GuestCodeRequest {
    pub code: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ZoneSummary {
    pub seating_zone: String,
    pub total: usize,
    pub attending: usize,
    pub checked_in: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    pub total_guests: usize,
    pub attending: usize,
    pub declined: usize,
    pub pending: usize,
    pub checked_in: usize,
    pub zones: Vec<ZoneSummary>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Dashboard {
    pub admin_name: String,
    pub summary: Summary,
    pub check_ins: Vec<CheckIn>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: String,
    pub guests_loaded: usize,
}
