//! Endpoints for guests (RSVP) and door staff (check-in, search), which are used without login

use crate::data_store::auth_token::AuthToken;
use crate::data_store::models::{Guest, NewCheckIn, RsvpStatus};
use crate::data_store::StoreError;
use crate::directory::DEFAULT_SEARCH_LIMIT;
use crate::summary::compute_summary;
use crate::web::error::APIError;
use crate::web::{client_key, AppState};
use actix_web::{get, post, web, HttpRequest, Responder};
use log::info;
use rsvp_api_types::{
    CheckCodeRequest, CheckCodeResponse, CheckInRequest, CheckInResponse, Health,
    MessageResponse, ResponseStatus,
};
use serde::Deserialize;
use std::str::FromStr;

pub const MAX_SEARCH_LIMIT: usize = 50;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(check_code)
        .service(confirm_attendance)
        .service(check_in_guest_code)
        .service(search_guest)
        .service(summary)
        .service(health);
}

#[post("/check-code")]
async fn check_code(
    req: HttpRequest,
    body: web::Json<CheckCodeRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let client = client_key(&req);
    if state.limiter.is_blocked(&client) {
        return Err(APIError::TooManyAttempts);
    }
    let directory = state.guest_directory().await?;
    let Some(guest) = directory.find(&body.code) else {
        state.limiter.record_failure(&client);
        return Err(APIError::CodeNotFound);
    };
    Ok(web::Json(CheckCodeResponse {
        status: ResponseStatus::Success,
        redirect_url: confirm_page_url(guest)?,
    }))
}

/// URL of the confirmation page, carrying the guest's details as query parameters
fn confirm_page_url(guest: &Guest) -> Result<String, APIError> {
    let query = serde_urlencoded::to_string([
        ("code", &guest.code),
        ("guest_name", &guest.name),
        ("seating_zone", &guest.seating_zone),
        ("table_assigned", &guest.table_assigned),
        ("designation", &guest.designation),
    ])
    .map_err(|e| APIError::InternalError(format!("Could not encode redirect URL: {}", e)))?;
    Ok(format!("/confirm?{}", query))
}

#[derive(Deserialize)]
struct ConfirmAttendanceForm {
    code: String,
    attendance: String,
}

#[post("/confirm-attendance")]
async fn confirm_attendance(
    form: web::Form<ConfirmAttendanceForm>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let form = form.into_inner();
    let attendance = match RsvpStatus::from_str(&form.attendance) {
        Ok(RsvpStatus::Unset) => {
            return Err(APIError::InvalidData(
                "attendance must be 'yes' or 'no'".to_owned(),
            ))
        }
        Ok(status) => status,
        Err(e) => return Err(APIError::InvalidData(e.to_string())),
    };
    let directory = state.guest_directory().await?;
    let code = directory
        .find(&form.code)
        .ok_or(APIError::GuestNotFound)?
        .code
        .clone();

    let store = state.store.clone();
    let guest = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        store
            .record_rsvp(&AuthToken::public(), &code, attendance)
            .map_err(|e| match e {
                StoreError::NotExisting => APIError::GuestNotFound,
                e => e.into(),
            })
    })
    .await??;
    state.directory.invalidate();
    info!("Guest {} answered RSVP with '{}'", guest.code, attendance);

    Ok(web::Json(MessageResponse {
        status: ResponseStatus::Success,
        message: "Attendance updated and logged successfully".to_owned(),
        redirect_url: Some(
            match attendance {
                RsvpStatus::Yes => "/confirmed",
                _ => "/declined",
            }
            .to_owned(),
        ),
    }))
}

#[post("/check-in")]
async fn check_in_guest_code(
    body: web::Json<CheckInRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let body = body.into_inner();
    let attendant = body.attendant.unwrap_or_default().trim().to_owned();
    check_in_guest(&state, &body.code, attendant, AuthToken::public()).await
}

/// Look up the guest in the directory and append a check-in row for it, unless it has been
/// checked in before.
pub(super) async fn check_in_guest(
    state: &AppState,
    code: &str,
    attendant: String,
    auth_token: AuthToken,
) -> Result<web::Json<CheckInResponse>, APIError> {
    let directory = state.guest_directory().await?;
    let guest = directory.find(code).ok_or(APIError::GuestNotFound)?;
    let new_check_in = NewCheckIn::for_guest(guest, attendant);
    let guest_name = guest.name.clone();

    let store = state.store.clone();
    let check_in = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        store
            .check_in_guest(&auth_token, new_check_in)
            .map_err(|e| match e {
                StoreError::ConflictEntityExists => APIError::AlreadyCheckedIn { name: guest_name },
                e => e.into(),
            })
    })
    .await??;
    info!(
        "Checked in guest {} (attendant: '{}')",
        check_in.guest_code, check_in.attendant
    );

    Ok(web::Json(CheckInResponse {
        status: ResponseStatus::Success,
        message: "Check-in successful".to_owned(),
        check_in: check_in.into(),
    }))
}

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .min(MAX_SEARCH_LIMIT)
    }
}

#[get("/search-guest")]
async fn search_guest(
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let directory = state.guest_directory().await?;
    let result: Vec<rsvp_api_types::Guest> = directory
        .search(&query.q, query.effective_limit())
        .into_iter()
        .map(|g| g.clone().into())
        .collect();
    Ok(web::Json(result))
}

#[get("/summary")]
async fn summary(state: web::Data<AppState>) -> Result<impl Responder, APIError> {
    let directory = state.guest_directory().await?;
    let store = state.store.clone();
    let check_ins = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        Ok(store.get_check_ins(&AuthToken::public())?)
    })
    .await??;
    Ok(web::Json(compute_summary(directory.guests(), &check_ins)))
}

#[get("/health")]
async fn health(state: web::Data<AppState>) -> Result<impl Responder, APIError> {
    let directory = state.guest_directory().await.map_err(|e| match e {
        APIError::StoreUnavailable(_) => e,
        e => APIError::StoreUnavailable(format!("{:?}", e)),
    })?;
    Ok(web::Json(Health {
        status: "ok".to_owned(),
        guests_loaded: directory.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_limit_is_capped() {
        let query = SearchQuery {
            q: "a".to_string(),
            limit: Some(1000),
        };
        assert_eq!(query.effective_limit(), MAX_SEARCH_LIMIT);
        let query = SearchQuery {
            q: "a".to_string(),
            limit: None,
        };
        assert_eq!(query.effective_limit(), DEFAULT_SEARCH_LIMIT);
    }
}
