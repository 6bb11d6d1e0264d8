//! `GET /healthcheck`.

use serde_json::{Value, json};

use crate::extract::Json;

pub async fn handler() -> Json<Value> { Json(json!({ "status": "ok" })) }
