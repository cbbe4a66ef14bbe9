//! AWS Lambda handler for projection operations
//!
//! Accepts a tagged `CallRequest` as the JSON body of a Lambda Function URL
//! request and returns the `CallResponse` envelope.
//!
//! Set `RETIREMENT_TABLES_DIR` to load assumption tables from CSV instead of
//! the built-in tables.

use aws_lambda_events::event::lambda_function_urls::{LambdaFunctionUrlRequest, LambdaFunctionUrlResponse};
use aws_lambda_events::http::{HeaderMap, HeaderValue};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::{info, warn};
use retirement_projection::api::{self, CallResponse};
use retirement_projection::Assumptions;
use std::path::Path;
use std::time::Instant;

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert("access-control-allow-methods", HeaderValue::from_static("POST, OPTIONS"));
    headers.insert("access-control-allow-headers", HeaderValue::from_static("Content-Type"));
    headers
}

fn respond(status: i64, body: Option<String>) -> LambdaFunctionUrlResponse {
    LambdaFunctionUrlResponse {
        status_code: status,
        headers: cors_headers(),
        body,
        is_base64_encoded: false,
        cookies: Vec::new(),
    }
}

fn json_response(status: i64, response: &CallResponse) -> Result<LambdaFunctionUrlResponse, Error> {
    Ok(respond(status, Some(serde_json::to_string(response)?)))
}

fn handle(request: &LambdaFunctionUrlRequest, assumptions: &Assumptions) -> Result<LambdaFunctionUrlResponse, Error> {
    let start = Instant::now();

    // CORS preflight
    if request.request_context.http.method.as_deref() == Some("OPTIONS") {
        return Ok(respond(200, None));
    }

    if request.is_base64_encoded {
        return json_response(400, &CallResponse::failure("Binary request bodies are not supported"));
    }

    let body = request.body.as_deref().unwrap_or("{}");
    let response = api::dispatch_json(body, assumptions);

    info!(
        "Request handled in {} ms (success: {})",
        start.elapsed().as_millis(),
        response.success
    );

    let status = if response.success { 200 } else { 400 };
    json_response(status, &response)
}

fn load_assumptions() -> Assumptions {
    match std::env::var("RETIREMENT_TABLES_DIR") {
        Ok(dir) => match Assumptions::from_csv_path(Path::new(&dir)) {
            Ok(assumptions) => assumptions,
            Err(e) => {
                warn!("Failed to load tables from {}: {}; using built-in tables", dir, e);
                Assumptions::default_tables()
            }
        },
        Err(_) => Assumptions::default_tables(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let assumptions = load_assumptions();
    let assumptions = &assumptions;

    run(service_fn(move |event: LambdaEvent<LambdaFunctionUrlRequest>| async move {
        handle(&event.payload, assumptions)
    }))
    .await
}
