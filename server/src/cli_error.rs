use crate::data_store::password::PasswordHashError;
use crate::data_store::StoreError;
use crate::setup::SetupError;
use diesel::ConnectionError;
use std::path::PathBuf;

/// Errors of the command line subcommands, each mapped to a process exit code
#[derive(Debug)]
pub enum CliError {
    /// Environment variables are missing or invalid
    SetupError(String),
    CouldNotConnectToDatabase(String),
    /// The database failed in a way that is not caused by the user's input
    UnexpectedStoreError(String),
    BindError(std::io::Error),
    ServerError(std::io::Error),
    DatabaseMigrationError(String),
    /// Cannot serve while one or more database schema migrations are pending
    DatabaseMigrationRequired { missing_migrations: Vec<String> },
    /// The guest list file could not be read
    GuestFileUnreadable { path: PathBuf, error: std::io::Error },
    /// The guest list or other user input is not valid
    InvalidGuestData(String),
    /// An admin account with the entered username exists already
    AdminExists,
    PasswordHashError(PasswordHashError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SetupError(_) => 1,
            CliError::GuestFileUnreadable { .. } => 1,
            CliError::InvalidGuestData(_) => 1,
            CliError::AdminExists => 1,
            CliError::UnexpectedStoreError(_) => 2,
            CliError::PasswordHashError(_) => 2,
            CliError::BindError(_) => 3,
            CliError::ServerError(_) => 3,
            CliError::CouldNotConnectToDatabase(_) => 4,
            CliError::DatabaseMigrationError(_) => 4,
            CliError::DatabaseMigrationRequired { .. } => 5,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::SetupError(e) => write!(f, "Setup invalid: {}", e),
            CliError::CouldNotConnectToDatabase(e) => {
                write!(f, "Could not connect to database: {}", e)
            }
            CliError::UnexpectedStoreError(e) => write!(f, "Unexpected database error: {}", e),
            CliError::BindError(e) => {
                write!(f, "Could not bind web server socket to TCP port: {}", e)
            }
            CliError::ServerError(e) => write!(f, "Web server failed: {}", e),
            CliError::DatabaseMigrationError(e) => {
                write!(f, "Error while applying database migrations: {}", e)
            }
            CliError::DatabaseMigrationRequired { missing_migrations } => write!(
                f,
                "Database is not up to date. Run the migrate-database command first. Pending \
                 migrations: {}",
                missing_migrations.join(", ")
            ),
            CliError::GuestFileUnreadable { path, error } => {
                write!(f, "Could not read guest list {:?}: {}", path, error)
            }
            CliError::InvalidGuestData(e) => write!(f, "Invalid guest data: {}", e),
            CliError::AdminExists => f.write_str("An admin with this username exists already"),
            CliError::PasswordHashError(e) => write!(f, "{}", e),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(e) => Self::CouldNotConnectToDatabase(e),
            StoreError::QueryError(e) => Self::UnexpectedStoreError(e.to_string()),
            StoreError::TransactionConflict => {
                Self::UnexpectedStoreError("Concurrent transaction conflict".to_string())
            }
            StoreError::NotExisting => Self::InvalidGuestData("Guest not found".to_string()),
            StoreError::ConflictEntityExists => Self::AdminExists,
            StoreError::PermissionDenied { required_privilege } => Self::UnexpectedStoreError(
                format!("Missing privilege: {:?}", required_privilege),
            ),
            StoreError::InvalidInputData(e) => Self::InvalidGuestData(e),
            StoreError::InvalidDataInDatabase(e) => Self::UnexpectedStoreError(e),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidGuestData(value.to_string())
    }
}

impl From<SetupError> for CliError {
    fn from(value: SetupError) -> Self {
        Self::SetupError(value.to_string())
    }
}

impl From<ConnectionError> for CliError {
    fn from(value: ConnectionError) -> Self {
        Self::CouldNotConnectToDatabase(value.to_string())
    }
}

impl From<PasswordHashError> for CliError {
    fn from(value: PasswordHashError) -> Self {
        Self::PasswordHashError(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_guest_and_admin_errors() {
        let e: CliError = StoreError::InvalidInputData("Guest code must not be empty".into()).into();
        assert_eq!(e.exit_code(), 1);
        assert_eq!(e.to_string(), "Invalid guest data: Guest code must not be empty");

        let e: CliError = StoreError::ConflictEntityExists.into();
        assert!(matches!(e, CliError::AdminExists));

        let e: CliError = StoreError::ConnectionError("refused".into()).into();
        assert_eq!(e.exit_code(), 4);
    }

    #[test]
    fn test_migration_required_lists_migrations() {
        let e = CliError::DatabaseMigrationRequired {
            missing_migrations: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(e.exit_code(), 5);
        assert!(e.to_string().ends_with("Pending migrations: a, b"));
    }
}
