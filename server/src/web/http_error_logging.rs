use crate::web::error::APIError;
use log::{error, warn};

pub async fn error_logging_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<B>, actix_web::Error> {
    let response = next.call(req).await?;

    if let Some(error) = response.response().error() {
        let client = response
            .request()
            .connection_info()
            .realip_remote_addr()
            .unwrap_or("unknown")
            .to_owned();
        if let Some(api_error) = error.as_error::<APIError>() {
            match api_error {
                APIError::PermissionDenied { required_privilege } => {
                    warn!(
                        "HTTP {} permission denied at <{}>. Client: <{}> Requires privilege: {:?}",
                        response.response().status(),
                        response.request().uri(),
                        client,
                        required_privilege,
                    );
                }
                APIError::InvalidSession(session_error) => {
                    warn!(
                        "HTTP {} invalid session token. Client: <{}> Cause: {:?}",
                        response.response().status(),
                        client,
                        session_error
                    );
                }
                APIError::AuthenticationFailed => {
                    warn!(
                        "HTTP {} admin authentication failed. Client: <{}>",
                        response.response().status(),
                        client,
                    );
                }
                APIError::TooManyAttempts => {
                    warn!(
                        "HTTP {} rejected blocked client at <{}>. Client: <{}>",
                        response.response().status(),
                        response.request().uri(),
                        client,
                    );
                }
                APIError::GuestNotFound
                | APIError::CodeNotFound
                | APIError::NotExisting
                | APIError::AlreadyExisting
                | APIError::AlreadyCheckedIn { .. }
                | APIError::NoSession
                | APIError::InvalidJson(_)
                | APIError::InvalidRequest(_)
                | APIError::InvalidData(_)
                | APIError::TransactionConflict => {}
                APIError::StoreUnavailable(e) => {
                    error!(
                        "HTTP {} database connection error: {}",
                        response.response().status(),
                        e
                    );
                }
                APIError::InternalError(e) => {
                    error!(
                        "HTTP {} internal server error at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
            }
        } else {
            error!(
                "HTTP {} unexpected error at <{}>: {:?}",
                response.response().status(),
                response.request().uri(),
                error
            );
        }
    }
    Ok(response)
}
