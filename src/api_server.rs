// Axum API Server Module
//
// Serves the advisor form, the multipart analysis endpoint, the fixed demo,
// and uploaded images. The analysis itself is synchronous; only upload writes
// touch the filesystem asynchronously.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::advisor::{Advisor, AnalysisReport, AnalysisRequest};
use crate::config::ServerConfig;
use crate::disease::DiseaseKnowledgeBase;
use crate::uploads::{self, UploadError};
use crate::web::handlers::pages;

pub const DEFAULT_FORM_PH: f64 = 7.0;
pub const DEFAULT_FORM_TEMPERATURE: f64 = 25.0;
pub const SAMPLE_IMAGE: &str = "img/rice_sample.jpg";

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<Advisor>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let diseases = match &config.disease_db {
            Some(path) => {
                tracing::info!("Loading disease knowledge base from {:?}", path);
                DiseaseKnowledgeBase::load(path)?
            }
            None => DiseaseKnowledgeBase::builtin(),
        };

        tracing::info!("Loading models from {:?}...", config.models_dir);
        let advisor = Advisor::from_dir(&config.models_dir, diseases);

        let upload_dir = config.upload_dir();
        match uploads::check_upload_dir(&upload_dir) {
            Ok(()) => tracing::info!("Upload directory ready: {:?}", upload_dir),
            Err(e) => tracing::warn!("{}; image uploads will fail until this is fixed", e),
        }

        Ok(Self::with_advisor(advisor, config))
    }

    /// Build state around an already-constructed advisor
    pub fn with_advisor(advisor: Advisor, config: ServerConfig) -> Self {
        Self {
            advisor: Arc::new(advisor),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Pages
        .route("/", get(pages::index_page))
        .route("/analyze", post(analyze))
        .route("/analyze_demo", get(analyze_demo))

        // Stylesheets, sample image, uploads
        .nest_service("/static", static_files)

        // Middleware (applied in reverse order)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
        .unwrap_or(false)
}

/// Parsed multipart form for `/analyze`
#[derive(Debug, Default)]
struct AnalysisForm {
    ph: Option<String>,
    temperature: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

impl AnalysisForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("ph") => form.ph = Some(field.text().await?),
                Some("temperature") => form.temperature = Some(field.text().await?),
                Some("image") => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    if !filename.is_empty() {
                        form.image = Some((filename, bytes.to_vec()));
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// Blank or missing fields take the form default
fn parse_number(field: &str, raw: Option<&str>, default: f64) -> Result<f64, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<f64>()
            .map_err(|_| AppError::BadRequest(format!("Invalid {} value: {:?}", field, value))),
    }
}

async fn analyze(State(state): State<AppState>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let ajax = is_ajax(&headers);

    match run_analysis(&state, &mut multipart).await {
        Ok(report) if ajax => Json(report).into_response(),
        Ok(report) => pages::render_index(Some(report), None).into_response(),
        Err(err) if ajax => err.into_response(),
        Err(err) => {
            tracing::warn!("Analysis request rejected: {}", err.message());
            let status = err.status();
            (status, pages::render_index(None, Some(err.message()))).into_response()
        }
    }
}

async fn run_analysis(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<AnalysisReport, AppError> {
    let form = AnalysisForm::read(multipart).await?;

    let ph = parse_number("ph", form.ph.as_deref(), DEFAULT_FORM_PH)?;
    let temperature = parse_number("temperature", form.temperature.as_deref(), DEFAULT_FORM_TEMPERATURE)?;

    let image_path = match form.image {
        Some((filename, bytes)) => {
            match uploads::save_upload(&state.config.upload_dir(), &filename, &bytes).await {
                Ok(url) => Some(url),
                Err(e @ UploadError::Io { .. }) => return Err(AppError::Internal(e.to_string())),
                Err(e) => {
                    tracing::warn!("Ignoring upload: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let request = AnalysisRequest {
        ph,
        temperature,
        image_path,
        is_demo: false,
    };

    let mut rng = StdRng::from_entropy();
    Ok(state.advisor.analyze(request, &mut rng))
}

/// Fixed demo readings; shows the bundled sample image if there is one,
/// otherwise the first uploaded image
async fn analyze_demo(State(state): State<AppState>) -> Response {
    let static_dir = state.config.static_dir.clone();
    let upload_dir = state.config.upload_dir();

    let image_path = tokio::task::spawn_blocking(move || {
        uploads::demo_image(&static_dir, SAMPLE_IMAGE, &upload_dir)
    })
    .await
    .unwrap_or_else(|e| {
        tracing::warn!("Demo image lookup failed: {}", e);
        None
    });

    if image_path.is_none() {
        tracing::debug!("No sample image available for demo");
    }

    let mut rng = StdRng::from_entropy();
    let report = state.advisor.analyze(AnalysisRequest::demo(image_path), &mut rng);
    pages::render_index(Some(report), None).into_response()
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Multipart(MultipartError),
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::BadRequest(msg) | AppError::Internal(msg) => msg.clone(),
            AppError::Multipart(e) => e.body_text(),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Multipart(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message());
        }

        let body = Json(serde_json::json!({
            "error": self.message()
        }));

        (status, body).into_response()
    }
}
