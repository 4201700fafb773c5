use crate::cli::database_migration::check_migration_state;
use crate::cli_error::CliError;
use crate::data_store::{get_store_from_env, GuestStore};
use crate::directory::{DirectoryCache, GuestDirectory};
use crate::rate_limit::AttemptLimiter;
use crate::setup::{
    get_directory_max_age_from_env, get_directory_preload_from_env, get_listen_address_from_env,
    get_listen_port_from_env, get_rate_limit_max_failures_from_env, get_rate_limit_window_from_env,
    get_secret_from_env,
};
use actix_web::{middleware, web, App, HttpRequest, HttpServer};
use error::APIError;
use log::{info, warn};
use std::sync::Arc;

mod admin_endpoints;
mod error;
mod guest_endpoints;
mod http_error_logging;
mod pages;

pub fn serve() -> Result<(), CliError> {
    check_migration_state()?;
    let state = AppState::new()?;
    if get_directory_preload_from_env()? {
        let mut store = state.store.get_facade()?;
        let directory = state.directory.reload(store.as_mut())?;
        info!("Preloaded guest directory with {} guests", directory.len());
        if directory.is_empty() {
            warn!("The guest list is empty. Use the load-guests command to import guests.");
        }
    }
    let listen_address = get_listen_address_from_env()?;
    let listen_port = get_listen_port_from_env()?;
    info!(
        "Starting rsvp-server {} on {}:{}",
        crate::get_version(),
        listen_address,
        listen_port
    );

    actix_web::rt::System::new()
        .block_on(
            HttpServer::new(move || {
                App::new()
                    .configure(configure_app)
                    .app_data(web::Data::new(state.clone()))
                    .wrap(middleware::from_fn(
                        http_error_logging::error_logging_middleware,
                    ))
                    .wrap(middleware::Compress::default())
            })
            .bind((listen_address, listen_port))
            .map_err(CliError::BindError)?
            .run(),
        )
        .map_err(CliError::ServerError)
}

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| APIError::InvalidJson(err).into());
    let form_config = web::FormConfig::default()
        .error_handler(|err, _req| APIError::InvalidRequest(err.to_string()).into());
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| APIError::InvalidRequest(err.to_string()).into());
    cfg.app_data(json_config)
        .app_data(form_config)
        .app_data(query_config)
        .configure(pages::configure_app)
        .configure(guest_endpoints::configure_app)
        .configure(admin_endpoints::configure_app);
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn GuestStore>,
    secret: String,
    directory: Arc<DirectoryCache>,
    limiter: Arc<AttemptLimiter>,
}

impl AppState {
    pub fn new() -> Result<Self, CliError> {
        Ok(Self {
            store: Arc::new(get_store_from_env()?),
            secret: get_secret_from_env()?,
            directory: Arc::new(DirectoryCache::new(get_directory_max_age_from_env()?)),
            limiter: Arc::new(AttemptLimiter::new(
                get_rate_limit_max_failures_from_env()?,
                get_rate_limit_window_from_env()?,
            )),
        })
    }

    /// Get the current guest directory, (re)loading it from the store on the blocking thread pool
    /// if necessary.
    async fn guest_directory(&self) -> Result<Arc<GuestDirectory>, APIError> {
        let store = self.store.clone();
        let directory = self.directory.clone();
        web::block(move || -> Result<_, APIError> {
            let mut store = store.get_facade()?;
            Ok(directory.get(store.as_mut())?)
        })
        .await?
    }
}

/// Key for counting failed attempts of the requesting client
fn client_key(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_owned()
}
