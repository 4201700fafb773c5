//! Endpoints of the admin area. Apart from the login, all of them require a valid admin session
//! cookie and redirect to the login page otherwise.

use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{normalize_code, Admin, CheckIn, Guest, RsvpStatus};
use crate::data_store::{GuestStoreFacade, StoreError};
use crate::summary::compute_summary;
use crate::web::error::{APIError, ADMIN_LOGIN_PATH};
use crate::web::guest_endpoints::{check_in_guest, SearchQuery};
use crate::web::{client_key, AppState};
use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpRequest, HttpResponse, HttpResponseBuilder, Responder};
use log::info;
use rsvp_api_types::{
    Dashboard, GuestCodeRequest, GuestWithCheckIn, MessageResponse, ResponseStatus,
};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

const SESSION_COOKIE_NAME: &str = "rsvp-admin-session";
#[allow(clippy::identity_op)] // We want to explicitly state that it's "1" day
pub const SESSION_COOKIE_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(1 * 86400);
const DASHBOARD_PATH: &str = "/admin/dashboard";

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(logout)
        .service(dashboard)
        .service(search)
        .service(admin_check_in)
        .service(edit_guest)
        .service(delete_guest)
        .service(export_csv);
}

/// Extract the session token from the session token cookie and validate its signature and age
fn extract_session_token(state: &AppState, req: &HttpRequest) -> Result<SessionToken, APIError> {
    let cookie = req.cookie(SESSION_COOKIE_NAME).ok_or(APIError::NoSession)?;
    Ok(SessionToken::from_string(
        cookie.value(),
        &state.secret,
        SESSION_COOKIE_MAX_AGE,
    )?)
}

/// Get the [AuthToken] for the admin account of the session. A session of a deleted admin
/// account is treated like a missing session.
fn admin_auth_token(
    store: &mut dyn GuestStoreFacade,
    session_token: &SessionToken,
) -> Result<AuthToken, APIError> {
    store
        .get_auth_token_for_session(session_token.admin_id())
        .map_err(|e| match e {
            StoreError::NotExisting => APIError::NoSession,
            e => e.into(),
        })
}

/// Get the admin account an [AuthToken] from [admin_auth_token] has been created for
fn current_admin(store: &mut dyn GuestStoreFacade, auth: &AuthToken) -> Result<Admin, APIError> {
    let admin_id = auth.admin_id().ok_or(APIError::NoSession)?;
    Ok(store.get_admin(auth, admin_id)?)
}

fn create_session_cookie(
    session_token: &SessionToken,
    secret: &str,
) -> actix_web::cookie::Cookie<'static> {
    let mut cookie =
        actix_web::cookie::Cookie::new(SESSION_COOKIE_NAME, session_token.as_string(secret));
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(actix_web::cookie::SameSite::Lax);
    cookie.set_expires(actix_web::cookie::time::OffsetDateTime::now_utc() + SESSION_COOKIE_MAX_AGE);
    cookie
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[post("/admin/login")]
async fn login(
    req: HttpRequest,
    form: web::Form<LoginForm>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let client = client_key(&req);
    if state.limiter.is_blocked(&client) {
        return Err(APIError::TooManyAttempts);
    }
    let form = form.into_inner();
    let store = state.store.clone();
    let result = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        store
            .authenticate_admin(form.username.trim(), &form.password)
            .map_err(|e| match e {
                StoreError::NotExisting => APIError::AuthenticationFailed,
                e => e.into(),
            })
    })
    .await?;
    let admin = match result {
        Ok(admin) => admin,
        Err(APIError::AuthenticationFailed) => {
            state.limiter.record_failure(&client);
            return Err(APIError::AuthenticationFailed);
        }
        Err(e) => return Err(e),
    };
    info!("Admin {} logged in", admin.username);

    Ok(HttpResponse::SeeOther()
        .cookie(create_session_cookie(
            &SessionToken::new(admin.id),
            &state.secret,
        ))
        .insert_header((header::LOCATION, DASHBOARD_PATH))
        .finish())
}

#[get("/admin/logout")]
async fn logout() -> impl Responder {
    let mut cookie = actix_web::cookie::Cookie::new(SESSION_COOKIE_NAME, "");
    cookie.set_path("/");
    cookie.make_removal();
    HttpResponse::SeeOther()
        .cookie(cookie)
        .insert_header((header::LOCATION, ADMIN_LOGIN_PATH))
        .finish()
}

#[get("/admin/dashboard")]
async fn dashboard(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let session_token = extract_session_token(&state, &req)?;
    let directory = state.guest_directory().await?;
    let store = state.store.clone();
    let (admin, check_ins) = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = admin_auth_token(store.as_mut(), &session_token)?;
        Ok((
            current_admin(store.as_mut(), &auth)?,
            store.get_check_ins(&auth)?,
        ))
    })
    .await??;

    Ok(web::Json(Dashboard {
        admin_name: admin.name,
        summary: compute_summary(directory.guests(), &check_ins),
        check_ins: check_ins.into_iter().map(|c| c.into()).collect(),
    }))
}

#[get("/admin/search")]
async fn search(
    req: HttpRequest,
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let session_token = extract_session_token(&state, &req)?;
    let directory = state.guest_directory().await?;
    let store = state.store.clone();
    let check_ins = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = admin_auth_token(store.as_mut(), &session_token)?;
        auth.check_privilege(Privilege::ViewReports)?;
        Ok(store.get_check_ins(&auth)?)
    })
    .await??;
    let checked_in: HashSet<&str> = check_ins.iter().map(|c| c.guest_code.as_str()).collect();

    let result: Vec<GuestWithCheckIn> = directory
        .search(&query.q, query.effective_limit())
        .into_iter()
        .map(|g| GuestWithCheckIn {
            checked_in: checked_in.contains(g.code.as_str()),
            guest: g.clone().into(),
        })
        .collect();
    Ok(web::Json(result))
}

#[post("/admin/checkin")]
async fn admin_check_in(
    req: HttpRequest,
    body: web::Json<GuestCodeRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let session_token = extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (auth, admin) = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = admin_auth_token(store.as_mut(), &session_token)?;
        let admin = current_admin(store.as_mut(), &auth)?;
        Ok((auth, admin))
    })
    .await??;
    check_in_guest(&state, &body.code, admin.username, auth).await
}

/// Guest data submitted by the admin edit form. If `rsvp_status` is missing, the status of an
/// existing guest is kept.
#[derive(Deserialize)]
struct EditGuestRequest {
    code: String,
    name: String,
    #[serde(default)]
    seating_zone: String,
    #[serde(default)]
    table_assigned: String,
    #[serde(default)]
    designation: String,
    #[serde(default)]
    rsvp_status: Option<rsvp_api_types::RsvpStatus>,
}

#[post("/admin/edit")]
async fn edit_guest(
    req: HttpRequest,
    body: web::Json<EditGuestRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let session_token = extract_session_token(&state, &req)?;
    let body = body.into_inner();
    let store = state.store.clone();
    let (code, created) = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = admin_auth_token(store.as_mut(), &session_token)?;
        let code = normalize_code(&body.code);
        let rsvp_status = match body.rsvp_status {
            Some(status) => status.into(),
            None => match store.get_guest(&auth, &code) {
                Ok(existing) => existing.rsvp_status,
                Err(StoreError::NotExisting) => RsvpStatus::Unset,
                Err(e) => return Err(e.into()),
            },
        };
        let guest = Guest {
            code: code.clone(),
            name: body.name,
            seating_zone: body.seating_zone,
            table_assigned: body.table_assigned,
            designation: body.designation,
            rsvp_status,
        };
        Ok((code, store.create_or_update_guest(&auth, guest)?))
    })
    .await??;
    state.directory.invalidate();
    info!(
        "Guest {} {} by admin",
        code,
        if created { "created" } else { "updated" }
    );

    Ok(web::Json(MessageResponse {
        status: ResponseStatus::Success,
        message: if created {
            format!("Guest {} created", code)
        } else {
            format!("Guest {} updated", code)
        },
        redirect_url: None,
    }))
}

#[post("/admin/delete")]
async fn delete_guest(
    req: HttpRequest,
    body: web::Json<GuestCodeRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let session_token = extract_session_token(&state, &req)?;
    let code = normalize_code(&body.code);
    let store = state.store.clone();
    let deleted_code = code.clone();
    web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = admin_auth_token(store.as_mut(), &session_token)?;
        store
            .delete_guest(&auth, &deleted_code)
            .map_err(|e| match e {
                StoreError::NotExisting => APIError::GuestNotFound,
                e => e.into(),
            })
    })
    .await??;
    state.directory.invalidate();
    info!("Guest {} deleted by admin", code);

    Ok(web::Json(MessageResponse {
        status: ResponseStatus::Success,
        message: format!("Guest {} deleted", code),
        redirect_url: None,
    }))
}

#[get("/admin/export/csv")]
async fn export_csv(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let session_token = extract_session_token(&state, &req)?;
    let store = state.store.clone();
    let (guests, check_ins) = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        let auth = admin_auth_token(store.as_mut(), &session_token)?;
        auth.check_privilege(Privilege::ViewReports)?;
        Ok((store.get_guests(&auth)?, store.get_check_ins(&auth)?))
    })
    .await??;

    Ok(HttpResponseBuilder::new(StatusCode::OK)
        .content_type("text/csv; charset=utf-8")
        .append_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(String::from("guests.csv"))],
        })
        .body(generate_csv(&guests, &check_ins)))
}

const CSV_HEADER: [&str; 8] = [
    "code",
    "name",
    "seating_zone",
    "table_assigned",
    "designation",
    "rsvp_status",
    "checked_in",
    "checked_in_at",
];

/// Render the guest list as CSV, one row per guest, with the time of the (first) check-in of each
/// guest.
fn generate_csv(guests: &[Guest], check_ins: &[CheckIn]) -> String {
    let mut check_in_times = HashMap::new();
    for check_in in check_ins {
        check_in_times
            .entry(check_in.guest_code.as_str())
            .or_insert(check_in.checked_in_at);
    }

    let mut result = String::new();
    push_csv_row(&mut result, CSV_HEADER.iter().map(|s| Cow::Borrowed(*s)));
    for guest in guests {
        let checked_in_at = check_in_times.get(guest.code.as_str());
        push_csv_row(
            &mut result,
            [
                csv_field(&guest.code),
                csv_field(&guest.name),
                csv_field(&guest.seating_zone),
                csv_field(&guest.table_assigned),
                csv_field(&guest.designation),
                Cow::Borrowed(guest.rsvp_status.as_str()),
                Cow::Borrowed(if checked_in_at.is_some() { "yes" } else { "no" }),
                Cow::Owned(
                    checked_in_at
                        .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                        .unwrap_or_default(),
                ),
            ],
        );
    }
    result
}

fn push_csv_row<'a>(out: &mut String, fields: impl IntoIterator<Item = Cow<'a, str>>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&field);
    }
    out.push_str("\r\n");
}

/// Quote a CSV field if it contains a separator, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_csv_field() {
        assert_eq!(csv_field("Table 4"), "Table 4");
        assert_eq!(csv_field("Mensah, Abena"), "\"Mensah, Abena\"");
        assert_eq!(csv_field("the \"Boss\""), "\"the \"\"Boss\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_generate_csv() {
        let guests = vec![
            Guest {
                code: "JO001".to_string(),
                name: "Boateng, Kwame".to_string(),
                seating_zone: "VIP".to_string(),
                table_assigned: "1".to_string(),
                designation: "Family".to_string(),
                rsvp_status: RsvpStatus::Yes,
            },
            Guest {
                code: "JO002".to_string(),
                name: "Abena Owusu".to_string(),
                seating_zone: "".to_string(),
                table_assigned: "".to_string(),
                designation: "".to_string(),
                rsvp_status: RsvpStatus::Unset,
            },
        ];
        let check_ins = vec![CheckIn {
            id: 1,
            checked_in_at: chrono::Utc.with_ymd_and_hms(2025, 6, 14, 15, 30, 0).unwrap(),
            guest_code: "JO001".to_string(),
            guest_name: "Boateng, Kwame".to_string(),
            table_assigned: "1".to_string(),
            designation: "Family".to_string(),
            attendant: "door".to_string(),
        }];

        assert_eq!(
            generate_csv(&guests, &check_ins),
            "code,name,seating_zone,table_assigned,designation,rsvp_status,checked_in,checked_in_at\r\n\
             JO001,\"Boateng, Kwame\",VIP,1,Family,yes,yes,2025-06-14T15:30:00Z\r\n\
             JO002,Abena Owusu,,,,unset,no,\r\n"
        );
    }
}
