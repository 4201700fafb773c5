use std::env;
use std::env::VarError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// Get the database URL from the environment variable.
pub fn get_database_url_from_env() -> Result<String, SetupError> {
    env::var("DATABASE_URL").map_err(|e| SetupError::from_env_error(e, "DATABASE_URL"))
}

/// Get the cryptographic application secret for signing admin session tokens from the environment
/// variable.
pub fn get_secret_from_env() -> Result<String, SetupError> {
    let secret = env::var("SECRET").map_err(|e| SetupError::from_env_error(e, "SECRET"))?;
    if secret.len() < 16 {
        return Err(SetupError::EnvVariableInvalid {
            variable_name: "SECRET",
            problem: "Must be at least 16 characters long",
        });
    }
    Ok(secret)
}

/// Get the web server TCP listening port from the environment variable
pub fn get_listen_port_from_env() -> Result<u16, SetupError> {
    env::var("LISTEN_PORT")
        .map_err(|e| SetupError::from_env_error(e, "LISTEN_PORT"))
        .and_then(|v| {
            v.parse().map_err(|_| SetupError::EnvVariableInvalid {
                variable_name: "LISTEN_PORT",
                problem: "Not a valid uint16",
            })
        })
}

/// Get the web server TCP listening interface address from the environment variable
pub fn get_listen_address_from_env() -> Result<String, SetupError> {
    env::var("LISTEN_ADDRESS").map_err(|e| SetupError::from_env_error(e, "LISTEN_ADDRESS"))
}

/// Maximum age of the in-memory guest directory before it is reloaded from the store.
pub fn get_directory_max_age_from_env() -> Result<Duration, SetupError> {
    Ok(Duration::from_secs(get_optional_from_env(
        "DIRECTORY_MAX_AGE",
        300,
        "Not a valid number of seconds",
    )?))
}

/// Whether the guest directory should be loaded at startup instead of on first use.
pub fn get_directory_preload_from_env() -> Result<bool, SetupError> {
    get_optional_from_env("DIRECTORY_PRELOAD", false, "Must be 'true' or 'false'")
}

/// Number of failed code/login attempts of one client, after which it is blocked.
pub fn get_rate_limit_max_failures_from_env() -> Result<u32, SetupError> {
    get_optional_from_env("RATE_LIMIT_MAX_FAILURES", 5, "Not a valid uint32")
}

/// Length of the window in which failed attempts are counted.
pub fn get_rate_limit_window_from_env() -> Result<Duration, SetupError> {
    Ok(Duration::from_secs(get_optional_from_env(
        "RATE_LIMIT_WINDOW",
        900,
        "Not a valid number of seconds",
    )?))
}

fn get_optional_from_env<T: FromStr>(
    variable_name: &'static str,
    default: T,
    problem: &'static str,
) -> Result<T, SetupError> {
    match env::var(variable_name) {
        Ok(v) => v.trim().parse().map_err(|_| SetupError::EnvVariableInvalid {
            variable_name,
            problem,
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(e) => Err(SetupError::from_env_error(e, variable_name)),
    }
}

#[derive(Debug)]
pub enum SetupError {
    EnvVariableMissing {
        variable_name: &'static str,
    },
    EnvVariableInvalid {
        variable_name: &'static str,
        problem: &'static str,
    },
}

impl SetupError {
    fn from_env_error(error: VarError, variable_name: &'static str) -> Self {
        match error {
            VarError::NotPresent => Self::EnvVariableMissing { variable_name },
            VarError::NotUnicode(_) => Self::EnvVariableInvalid {
                variable_name,
                problem: "no valid unicode",
            },
        }
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::EnvVariableMissing { variable_name } => {
                write!(f, "Environment variable {} must be defined", variable_name)
            }
            SetupError::EnvVariableInvalid {
                variable_name,
                problem,
            } => write!(
                f,
                "Value of environment variable {} is invalid: {}",
                variable_name, problem
            ),
        }
    }
}

impl std::error::Error for SetupError {}
