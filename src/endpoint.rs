/// HTTP endpoint for the climate API
///
/// Endpoints:
/// - GET / - Route index (HTML)
/// - GET /api/v1.0/precipitation - Daily precipitation totals for the last year
/// - GET /api/v1.0/stations - Stations with at least one measurement
/// - GET /api/v1.0/tobs - Daily temperature observations for one station
/// - GET /api/v1.0/trip/{start}[/{end}] - Min/avg/max temperature for a date range
/// - GET /health - Service health check
///
/// Routing and response building are plain functions over `QueryService`;
/// only `start_endpoint_server` touches tiny_http.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use threadpool::ThreadPool;
use tracing::{debug, error, info, warn};

use crate::schema::SCHEMA_VERSION;
use crate::service::{QueryService, TripFailure};
use crate::store::WeatherStore;

const API_PREFIX: &str = "/api/v1.0";

const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/",
    "/api/v1.0/precipitation",
    "/api/v1.0/stations",
    "/api/v1.0/tobs",
    "/api/v1.0/trip/{start_date}",
    "/api/v1.0/trip/{start_date}/{end_date}",
    "/health",
];

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Precipitation,
    Stations,
    Tobs,
    Trip { start: String, end: Option<String> },
    Health,
    NotFound,
    MethodNotAllowed,
}

/// Map a request method and raw URL to a route.
///
/// The query string is ignored, a trailing slash is tolerated, and trip
/// path segments are percent-decoded.
pub fn route(method: &str, url: &str) -> Route {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };

    let matched = match path {
        "" | "/" => Route::Welcome,
        "/health" => Route::Health,
        _ => match path.strip_prefix(API_PREFIX) {
            Some("/precipitation") => Route::Precipitation,
            Some("/stations") => Route::Stations,
            Some("/tobs") => Route::Tobs,
            Some(rest) => match rest.strip_prefix("/trip/") {
                Some(params) => trip_route(params),
                None => Route::NotFound,
            },
            None => Route::NotFound,
        },
    };

    if matched != Route::NotFound && !matches!(method, "GET" | "HEAD") {
        return Route::MethodNotAllowed;
    }
    matched
}

fn trip_route(params: &str) -> Route {
    let segments: Vec<&str> = params.split('/').collect();
    let decode = |s: &str| {
        urlencoding::decode(s)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| s.to_string())
    };

    match segments[..] {
        [start] if !start.is_empty() => Route::Trip { start: decode(start), end: None },
        [start, end] if !start.is_empty() && !end.is_empty() => Route::Trip {
            start: decode(start),
            end: Some(decode(end)),
        },
        _ => Route::NotFound,
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A response body ready to hand to the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, content_type: "application/json", body },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self::error(500, "Failed to serialize response")
            }
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }

    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body }
    }
}

/// Build the response for a route.
pub fn handle<S: WeatherStore>(service: &QueryService<S>, route: &Route) -> ApiResponse {
    match route {
        Route::Welcome => ApiResponse::html(service.welcome()),
        Route::Health => handle_health(),
        Route::Precipitation => store_result(service.precipitation()),
        Route::Stations => store_result(service.stations()),
        Route::Tobs => store_result(service.tobs()),
        Route::Trip { start, end } => handle_trip(service, start, end.as_deref()),
        Route::MethodNotAllowed => ApiResponse::error(405, "Method not allowed"),
        Route::NotFound => ApiResponse::json(
            404,
            &serde_json::json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS,
            }),
        ),
    }
}

/// Handle /health endpoint
fn handle_health() -> ApiResponse {
    ApiResponse::json(
        200,
        &serde_json::json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "schema_version": SCHEMA_VERSION,
        }),
    )
}

fn store_result<T: Serialize, E: std::fmt::Display>(result: Result<T, E>) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::json(200, &value),
        Err(e) => {
            error!("Store query failed: {}", e);
            ApiResponse::error(500, "Internal server error")
        }
    }
}

/// Handle /api/v1.0/trip/{start}[/{end}]
fn handle_trip<S: WeatherStore>(
    service: &QueryService<S>,
    start: &str,
    end: Option<&str>,
) -> ApiResponse {
    match service.trip(start, end) {
        Ok(stats) => ApiResponse::json(200, &stats),
        Err(TripFailure::Trip(e)) => {
            debug!(start, end = ?end, "trip request rejected: {}", e);
            ApiResponse::error(404, &e.to_string())
        }
        Err(TripFailure::Store(e)) => store_result::<(), _>(Err(e)),
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on `address` and serve until the listener
/// closes. Requests are handled on a pool of `workers` threads.
pub fn start_endpoint_server<S>(
    address: &str,
    workers: usize,
    service: Arc<QueryService<S>>,
) -> Result<(), String>
where
    S: WeatherStore + 'static,
{
    let server = tiny_http::Server::http(address)
        .map_err(|e| format!("Failed to start HTTP server on {}: {}", address, e))?;

    info!(address, workers, "HTTP endpoint listening");
    for endpoint in AVAILABLE_ENDPOINTS {
        debug!("   GET {}", endpoint);
    }

    let pool = ThreadPool::with_name("surfsup-http".to_string(), workers);

    for request in server.incoming_requests() {
        let service = Arc::clone(&service);
        pool.execute(move || serve_request(&service, request));
    }

    pool.join();
    Ok(())
}

fn serve_request<S: WeatherStore>(service: &QueryService<S>, request: tiny_http::Request) {
    let started = Instant::now();
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();

    let route = route(&method, &url);
    let response = handle(service, &route);
    let status = response.status;

    if let Err(e) = request.respond(to_http_response(response)) {
        warn!("Failed to send response: {}", e);
    }

    info!(
        method = %method,
        path = %url,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request served"
    );
}

/// Create HTTP response from an `ApiResponse`
fn to_http_response(response: ApiResponse) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let mut http = tiny_http::Response::from_data(response.body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(response.status));

    match tiny_http::Header::from_bytes(&b"Content-Type"[..], response.content_type.as_bytes()) {
        Ok(header) => http.add_header(header),
        Err(()) => warn!("Invalid content type header: {}", response.content_type),
    }
    http
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
