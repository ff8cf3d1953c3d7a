use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, Cors, CorsOptions};
use std::env;

/// Origins a browser board may be served from, comma separated.
pub fn allowed_origins() -> Vec<String> {
    parse_origins(
        &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string()),
    )
}

fn parse_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn create_cors() -> Result<Cors, rocket_cors::Error> {
    let allowed_origins = AllowedOrigins::some_exact(&allowed_origins());

    CorsOptions {
        allowed_origins,
        allowed_methods: [Method::Get, Method::Post, Method::Options]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::some(&["Accept", "Content-Type", "X-Requested-With"]),
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()
}
