use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{get, web, HttpResponse, Responder};
use rust_embed::Embed;

/// Static HTML pages by path. The pages fetch their data from the JSON endpoints.
const PAGES: [(&str, &str); 7] = [
    ("/", "index.html"),
    ("/rsvp", "rsvp.html"),
    ("/confirm", "confirm.html"),
    ("/confirmed", "confirmed.html"),
    ("/declined", "declined.html"),
    ("/checkin", "checkin.html"),
    ("/admin/login", "admin_login.html"),
];

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(static_resources);
    for (path, file) in PAGES {
        cfg.route(path, web::get().to(move || async move { Resources::handle_page(file) }));
    }
}

#[derive(Embed)]
#[folder = "static/"]
struct Resources;

impl Resources {
    fn handle_embedded_file(path: &str) -> HttpResponse {
        match Self::get(path) {
            Some(content) => HttpResponse::Ok()
                .content_type(mime_guess::from_path(path).first_or_octet_stream().as_ref())
                .append_header(CacheControl(vec![CacheDirective::MaxAge(86400)]))
                .body(content.data.into_owned()),
            None => {
                HttpResponse::NotFound().body(format!("Static resource file '{}' not found", path))
            }
        }
    }

    fn handle_page(file: &str) -> HttpResponse {
        match Self::get(file) {
            Some(content) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .append_header(CacheControl(vec![CacheDirective::NoCache]))
                .body(content.data.into_owned()),
            None => HttpResponse::NotFound().body(format!("Page '{}' not found", file)),
        }
    }
}

#[get("/static/{_:.*}")]
async fn static_resources(path: web::Path<String>) -> impl Responder {
    Resources::handle_embedded_file(path.as_str())
}
