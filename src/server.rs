//! HTTP surface.
//!
//! Every `/api/v1/info` response is a JSON body with a `status_code` field,
//! and the transport status always mirrors it.

use crate::db::InfoStore;
use crate::error::ApiError;
use crate::i18n::{LanguageDirectory, DEFAULT_LANGUAGE};
use crate::info::InfoReader;
use crate::response::{InfoResponse, SyncResponse};
use crate::sync::{SyncOptions, Synchronizer, TranslatePayload};
use crate::translation::TranslationProvider;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared state for all handlers.
pub struct AppState<S, P> {
    pub reader: InfoReader<S>,
    pub synchronizer: Synchronizer<S, P>,
}

impl<S: InfoStore + Clone, P: TranslationProvider> AppState<S, P> {
    pub fn new(
        store: S,
        provider: P,
        directory: Arc<LanguageDirectory>,
        options: SyncOptions,
    ) -> Self {
        Self {
            reader: InfoReader::new(store.clone(), Arc::clone(&directory)),
            synchronizer: Synchronizer::new(store, provider, directory).with_options(options),
        }
    }
}

/// Build the application router.
pub fn router<S, P>(state: Arc<AppState<S, P>>) -> Router
where
    S: InfoStore,
    P: TranslationProvider,
{
    Router::new()
        .route("/", get(root))
        .route(
            "/api/v1/info",
            get(get_default_info::<S, P>).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/info/",
            get(get_default_info::<S, P>).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/info/translate",
            post(translate::<S, P>).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/info/:language",
            get(get_info::<S, P>).fallback(method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn root() -> &'static str {
    "Hello, World!"
}

async fn method_not_allowed(method: Method) -> (StatusCode, Json<InfoResponse>) {
    let response = InfoResponse::failure(&ApiError::MethodNotAllowed(method.to_string()));
    (status(response.status_code), Json(response))
}

async fn get_default_info<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
) -> (StatusCode, Json<InfoResponse>)
where
    S: InfoStore,
    P: TranslationProvider,
{
    let response = state.reader.read(DEFAULT_LANGUAGE).await;
    (status(response.status_code), Json(response))
}

async fn get_info<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    Path(language): Path<String>,
) -> (StatusCode, Json<InfoResponse>)
where
    S: InfoStore,
    P: TranslationProvider,
{
    let response = state.reader.read(&language).await;
    (status(response.status_code), Json(response))
}

async fn translate<S, P>(
    State(state): State<Arc<AppState<S, P>>>,
    payload: Result<Json<TranslatePayload>, JsonRejection>,
) -> (StatusCode, Json<SyncResponse>)
where
    S: InfoStore,
    P: TranslationProvider,
{
    let response = match payload {
        Ok(Json(payload)) => state.synchronizer.synchronize(payload).await,
        Err(rejection) => {
            debug!("Rejected translate body: {}", rejection.body_text());
            SyncResponse::failure(&ApiError::invalid_input(rejection.body_text()))
        }
    };
    (status(response.status_code), Json(response))
}
