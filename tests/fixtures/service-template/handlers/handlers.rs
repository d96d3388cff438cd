//! HTTP handlers for {{ app_name }}.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::log::{self, Field};

pub fn routes(prefix: &str) -> Router {
    Router::new().nest(prefix, Router::new().route("/", get(home)))
}

async fn home() -> Json<Value> {
    let err = std::io::Error::new(std::io::ErrorKind::Other, "example failure");
    log::error("error", &err);
    log::warn("warn", &[Field::error(&err)]);
    log::info("hello", &[Field::string("name", "world")]);

    Json(json!({ "status": true, "msg": "Hello World" }))
}
