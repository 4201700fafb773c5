mod data_store;

mod auth_session;
pub mod cli;
pub mod cli_error;
mod directory;
mod rate_limit;
mod setup;
mod summary;
pub mod web;

pub use cli::CliAuthTokenKey;

fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
