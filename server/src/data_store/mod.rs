//! The backend part of the backend: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [GuestStore] trait. This object can be shared between threads in a
//! global application state and be used to create [GuestStoreFacade] instances for interaction
//! with the database. These provide a CRUD-like interface, using the data models from the [models]
//! module.
//!
//! The primary implementation of [GuestStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [GuestStoreFacade] objects
//! ([postgres::PgDataStoreFacade]) hold a reference to one pooled connection each, using the Diesel
//! query DSL for implementing the database interaction.
//!
//! There is also a mock implementation for unittests.

use crate::cli_error::CliError;
use crate::setup;
use auth_token::{AuthToken, Privilege};
use std::fmt::Debug;

pub mod auth_token;
pub mod models;
pub mod password;
mod postgres;
mod schema;
#[cfg(test)]
pub mod store_mock;

/// Get a [GuestStore] instance, according the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PosgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl GuestStore, CliError> {
    Ok(postgres::PgDataStore::new(
        &setup::get_database_url_from_env()?,
    )?)
}

pub type AdminId = i32;
pub type CheckInId = i32;

pub trait GuestStoreFacade {
    /// Get all guests, ordered by code
    fn get_guests(&mut self, auth_token: &AuthToken) -> Result<Vec<models::Guest>, StoreError>;

    /// Get a single guest by its (already normalized) code
    fn get_guest(&mut self, auth_token: &AuthToken, code: &str)
        -> Result<models::Guest, StoreError>;

    /// Create a new guest or update the existing guest with the same code.
    ///
    /// # return value
    /// - `Ok(true)` if the guest has been created, successfully
    /// - `Ok(false)` if an existing guest has been updated, successfully
    /// - `Err(_)` if something went wrong, as usual
    fn create_or_update_guest(
        &mut self,
        auth_token: &AuthToken,
        guest: models::Guest,
    ) -> Result<bool, StoreError>;

    /// Create or update all given guests within a single transaction.
    ///
    /// Returns the number of newly created guests.
    fn import_guests(
        &mut self,
        auth_token: &AuthToken,
        guests: Vec<models::Guest>,
    ) -> Result<usize, StoreError>;

    fn delete_guest(&mut self, auth_token: &AuthToken, code: &str) -> Result<(), StoreError>;

    /// Set the RSVP status of the guest and append an entry to the RSVP log, atomically.
    ///
    /// Returns the updated guest or `Err(StoreError::NotExisting)` if there is no guest with the
    /// given code.
    fn record_rsvp(
        &mut self,
        auth_token: &AuthToken,
        code: &str,
        attendance: models::RsvpStatus,
    ) -> Result<models::Guest, StoreError>;

    /// Get the RSVP audit log in chronological order
    fn get_rsvp_log(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<Vec<models::RsvpLogEntry>, StoreError>;

    /// Append a check-in row for the guest, unless the guest has been checked in already.
    ///
    /// # return value
    /// - `Ok(check_in)` with the new check-in row
    /// - `Err(StoreError::ConflictEntityExists)` if a check-in for the guest code exists already.
    ///   No row is appended in this case.
    /// - `Err(_)` if something different went wrong, as usual
    fn check_in_guest(
        &mut self,
        auth_token: &AuthToken,
        check_in: models::NewCheckIn,
    ) -> Result<models::CheckIn, StoreError>;

    /// Get the check-in log in chronological order
    fn get_check_ins(&mut self, auth_token: &AuthToken)
        -> Result<Vec<models::CheckIn>, StoreError>;

    fn get_admin(
        &mut self,
        auth_token: &AuthToken,
        admin_id: AdminId,
    ) -> Result<models::Admin, StoreError>;

    fn get_admins(&mut self, auth_token: &AuthToken) -> Result<Vec<models::Admin>, StoreError>;

    /// Create a new admin account.
    ///
    /// Returns `Err(StoreError::ConflictEntityExists)` if the username is taken already.
    fn create_admin(
        &mut self,
        auth_token: &AuthToken,
        admin: models::NewAdmin,
    ) -> Result<AdminId, StoreError>;

    /// Check the given admin credentials.
    ///
    /// Returns the admin account on success and `Err(StoreError::NotExisting)` if the username is
    /// unknown or the password does not match.
    fn authenticate_admin(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<models::Admin, StoreError>;

    /// Get an [AuthToken] instance for the admin account the client has logged in as.
    ///
    /// Returns `Err(StoreError::NotExisting)` if the admin account does not exist (anymore).
    fn get_auth_token_for_session(&mut self, admin_id: AdminId) -> Result<AuthToken, StoreError>;
}

pub trait GuestStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn GuestStoreFacade + 'a>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be commited due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be created because it already exists.
    ConflictEntityExists,
    /// The client is not authorized for this action. It would need to authenticate for an access
    /// role qualifying for the `required_privilege`.
    PermissionDenied { required_privilege: Privilege },
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                e @ diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | e @ diesel::result::DatabaseErrorKind::CheckViolation
                | e @ diesel::result::DatabaseErrorKind::NotNullViolation,
                _,
            ) => Self::InvalidInputData(format!("{:?}", e)),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str("Database transaction could not be commited due to a conflicting concurrent transaction"),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ConflictEntityExists => f.write_str("Database record exists already."),
            Self::PermissionDenied { required_privilege } => {
                write!(f, "Client is not authorized to perform this action. {:?} privilege required.", required_privilege)
            }
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            Self::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            },
        }
    }
}

impl std::error::Error for StoreError {}
