//! Entry points of the command line subcommands, apart from `serve`

pub mod database_migration;
pub mod manage_admins;
pub mod manage_guests;
mod util;

/// Key for creating admin [crate::data_store::auth_token::AuthToken]s without a login session.
///
/// It can only be constructed explicitly, which keeps the web code from creating such tokens by
/// accident.
pub struct CliAuthTokenKey {
    _private: (),
}

impl CliAuthTokenKey {
    #[allow(clippy::new_without_default)] // We always want to explicitly create these objects
    pub fn new() -> Self {
        Self { _private: () }
    }
}
