//! Middleware chain for {{ app_name }}.

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use std::time::Instant;
use tower_http::cors::CorsLayer;

use crate::log::{self, Field};

pub fn wrap(router: Router) -> Router {
    router
        .layer(middleware::from_fn(authenticate))
        .layer(middleware::from_fn(trim_query))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(access_log))
}

pub fn serve(port: u16, app: Router) -> std::io::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        axum::serve(listener, app).await
    })
}

async fn access_log(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().to_string();
    let response = next.run(req).await;

    log::info(
        &path,
        &[
            Field::new("status", response.status().as_u16()),
            Field::string("method", method),
            Field::duration("cost", start.elapsed()),
        ],
    );
    response
}

/// Login check. Accepts everything until an identity provider is wired in.
async fn authenticate(req: Request, next: Next) -> Response {
    next.run(req).await
}

/// Strip surrounding whitespace from query parameter values.
async fn trim_query(mut req: Request, next: Next) -> Response {
    if let Some(query) = req.uri().query() {
        let trimmed: Vec<String> = query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) => format!("{}={}", k, v.trim_matches(|c| c == ' ' || c == '+')),
                None => pair.to_string(),
            })
            .collect();
        let rebuilt = format!("{}?{}", req.uri().path(), trimmed.join("&"));
        if let Ok(uri) = rebuilt.parse() {
            *req.uri_mut() = uri;
        }
    }
    next.run(req).await
}
