use crate::data_store::{AdminId, CheckInId};
use chrono::{DateTime, Utc};
use diesel::deserialize::FromSql;
use diesel::prelude::*;
use diesel::query_builder::bind_collector::RawBytesBindCollector;
use diesel::serialize::ToSql;
use diesel::{AsExpression, FromSqlRow};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Normalize a guest code as entered by a guest or staff member: surrounding whitespace is
/// stripped and letters are uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Clone, Debug, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::guests)]
#[diesel(primary_key(code))]
pub struct Guest {
    pub code: String,
    pub name: String,
    pub seating_zone: String,
    pub table_assigned: String,
    pub designation: String,
    pub rsvp_status: RsvpStatus,
}

impl Guest {
    /// Normalize the guest code and surrounding whitespace of the name and check that neither is
    /// empty.
    pub fn validated(mut self) -> Result<Self, String> {
        self.code = normalize_code(&self.code);
        self.name = self.name.trim().to_owned();
        if self.code.is_empty() {
            return Err("Guest code must not be empty".to_owned());
        }
        if self.code.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(format!("Guest code '{}' contains whitespace", self.code));
        }
        if self.name.is_empty() {
            return Err(format!("Name of guest {} must not be empty", self.code));
        }
        Ok(self)
    }
}

impl From<rsvp_api_types::Guest> for Guest {
    fn from(value: rsvp_api_types::Guest) -> Self {
        Self {
            code: value.code,
            name: value.name,
            seating_zone: value.seating_zone,
            table_assigned: value.table_assigned,
            designation: value.designation,
            rsvp_status: value.rsvp_status.into(),
        }
    }
}

impl From<Guest> for rsvp_api_types::Guest {
    fn from(value: Guest) -> Self {
        Self {
            code: value.code,
            name: value.name,
            seating_zone: value.seating_zone,
            table_assigned: value.table_assigned,
            designation: value.designation,
            rsvp_status: value.rsvp_status.into(),
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::check_ins)]
pub struct CheckIn {
    pub id: CheckInId,
    pub checked_in_at: DateTime<Utc>,
    pub guest_code: String,
    pub guest_name: String,
    pub table_assigned: String,
    pub designation: String,
    pub attendant: String,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::check_ins)]
pub struct NewCheckIn {
    pub checked_in_at: DateTime<Utc>,
    pub guest_code: String,
    pub guest_name: String,
    pub table_assigned: String,
    pub designation: String,
    pub attendant: String,
}

impl NewCheckIn {
    /// Create the check-in log row for the given guest, taking the current time as timestamp.
    pub fn for_guest(guest: &Guest, attendant: String) -> Self {
        Self {
            checked_in_at: Utc::now(),
            guest_code: guest.code.clone(),
            guest_name: guest.name.clone(),
            table_assigned: guest.table_assigned.clone(),
            designation: guest.designation.clone(),
            attendant,
        }
    }
}

impl From<CheckIn> for rsvp_api_types::CheckIn {
    fn from(value: CheckIn) -> Self {
        Self {
            timestamp: value.checked_in_at,
            code: value.guest_code,
            name: value.guest_name,
            table_assigned: value.table_assigned,
            designation: value.designation,
            attendant: value.attendant,
        }
    }
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::rsvp_log)]
pub struct RsvpLogEntry {
    pub id: i32,
    pub logged_at: DateTime<Utc>,
    pub code: String,
    pub name: String,
    pub attendance: RsvpStatus,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::rsvp_log)]
pub struct NewRsvpLogEntry {
    pub logged_at: DateTime<Utc>,
    pub code: String,
    pub name: String,
    pub attendance: RsvpStatus,
}

#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name=super::schema::admins)]
pub struct Admin {
    pub id: AdminId,
    pub username: String,
    pub password_hash: String,
    pub name: String,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::admins)]
pub struct NewAdmin {
    pub username: String,
    pub password_hash: String,
    pub name: String,
}

/// A guest's answer to the invitation. Stored as text ("yes", "no", "unset") in the database.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, FromSqlRow, AsExpression)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum RsvpStatus {
    Yes,
    No,
    #[default]
    Unset,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Yes => "yes",
            RsvpStatus::No => "no",
            RsvpStatus::Unset => "unset",
        }
    }
}

impl Display for RsvpStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct InvalidRsvpStatus(pub String);

impl Display for InvalidRsvpStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' is not a valid attendance value (expected 'yes' or 'no')",
            self.0
        )
    }
}

impl FromStr for RsvpStatus {
    type Err = InvalidRsvpStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Ok(RsvpStatus::Yes),
            "no" => Ok(RsvpStatus::No),
            "unset" | "" => Ok(RsvpStatus::Unset),
            _ => Err(InvalidRsvpStatus(s.to_owned())),
        }
    }
}

impl From<rsvp_api_types::RsvpStatus> for RsvpStatus {
    fn from(value: rsvp_api_types::RsvpStatus) -> Self {
        match value {
            rsvp_api_types::RsvpStatus::Yes => Self::Yes,
            rsvp_api_types::RsvpStatus::No => Self::No,
            rsvp_api_types::RsvpStatus::Unset => Self::Unset,
        }
    }
}

impl From<RsvpStatus> for rsvp_api_types::RsvpStatus {
    fn from(value: RsvpStatus) -> Self {
        match value {
            RsvpStatus::Yes => Self::Yes,
            RsvpStatus::No => Self::No,
            RsvpStatus::Unset => Self::Unset,
        }
    }
}

impl<DB> ToSql<diesel::sql_types::Text, DB> for RsvpStatus
where
    DB: diesel::backend::Backend,
    for<'c> DB: diesel::backend::Backend<BindCollector<'c> = RawBytesBindCollector<DB>>,
    str: ToSql<diesel::sql_types::Text, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        <str as ToSql<diesel::sql_types::Text, DB>>::to_sql(self.as_str(), &mut out.reborrow())
    }
}

impl<DB> FromSql<diesel::sql_types::Text, DB> for RsvpStatus
where
    DB: diesel::backend::Backend,
    String: FromSql<diesel::sql_types::Text, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let value = String::from_sql(bytes)?;
        Ok(value.parse::<RsvpStatus>().map_err(|e| e.to_string())?)
    }
}
