use crate::auth_session::SessionError;
use crate::data_store::auth_token::Privilege;
use crate::data_store::StoreError;
use actix_web::error::JsonPayloadError;
use actix_web::http::header;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use rsvp_api_types::{MessageResponse, ResponseStatus};
use std::fmt::Display;

pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

#[derive(Debug)]
pub enum APIError {
    GuestNotFound,
    CodeNotFound,
    NotExisting,
    AlreadyExisting,
    AlreadyCheckedIn {
        name: String,
    },
    PermissionDenied {
        required_privilege: Privilege,
    },
    NoSession,
    InvalidSession(SessionError),
    AuthenticationFailed,
    TooManyAttempts,
    InvalidJson(JsonPayloadError),
    InvalidRequest(String),
    InvalidData(String),
    TransactionConflict,
    StoreUnavailable(String),
    InternalError(String),
}

impl Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GuestNotFound => f.write_str("Guest not found"),
            Self::CodeNotFound => f.write_str("Code not found"),
            Self::NotExisting => f.write_str("Element does not exist"),
            Self::AlreadyExisting => f.write_str("Element already exists"),
            Self::AlreadyCheckedIn { name } => write!(f, "{} has already been checked in", name),
            Self::PermissionDenied { required_privilege } => write!(
                f,
                "Client is not authorized to perform this action. Authentication as {} is required.",
                required_privilege
                    .qualifying_roles()
                    .iter()
                    .map(|role| role.name().to_owned())
                    .collect::<Vec<String>>()
                    .join(" or ")
            ),
            Self::NoSession => f.write_str("Please log in as admin."),
            Self::InvalidSession(_) => {
                f.write_str("Admin session is not valid or has expired. Please log in again.")
            }
            Self::AuthenticationFailed => f.write_str("Invalid credentials"),
            Self::TooManyAttempts => {
                f.write_str("Too many failed attempts. Please try again later.")
            }
            Self::InvalidJson(e) => write!(f, "Invalid JSON request data: {}", e),
            Self::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            Self::InvalidData(e) => write!(f, "Invalid request data: {}", e),
            Self::TransactionConflict => {
                f.write_str("Concurrent database transaction conflict. Please retry request.")
            }
            Self::StoreUnavailable(_) => {
                f.write_str("Guest database is currently not available. Please retry later.")
            }
            Self::InternalError(_) => f.write_str("Internal server error"),
        }
    }
}

impl ResponseError for APIError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::GuestNotFound | Self::CodeNotFound | Self::NotExisting => StatusCode::NOT_FOUND,
            Self::AlreadyExisting | Self::AlreadyCheckedIn { .. } => StatusCode::CONFLICT,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NoSession | Self::InvalidSession(_) => StatusCode::SEE_OTHER,
            Self::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidJson(e) => match e {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonPayloadError::Deserialize(json_error) if json_error.is_data() => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TransactionConflict | Self::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Self::NoSession | Self::InvalidSession(_) = self {
            response.insert_header((header::LOCATION, ADMIN_LOGIN_PATH));
        }
        response.json(MessageResponse {
            status: ResponseStatus::Error,
            message: self.to_string(),
            redirect_url: None,
        })
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => Self::StoreUnavailable(error),
            StoreError::QueryError(diesel_error) => Self::InternalError(format!(
                "Error while executing database query: {}",
                diesel_error
            )),
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::NotExisting,
            StoreError::ConflictEntityExists => Self::AlreadyExisting,
            StoreError::PermissionDenied { required_privilege } => {
                Self::PermissionDenied { required_privilege }
            }
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<actix_web::error::BlockingError> for APIError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        APIError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<SessionError> for APIError {
    fn from(e: SessionError) -> Self {
        APIError::InvalidSession(e)
    }
}
