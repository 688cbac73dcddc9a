use super::sessions::session_cookie;
use super::{CardOutcome, Direction, Explorer, ExplorerSnapshot, GalleryQuery};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{Html, IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

/// Explorer of the requesting viewer with `collection_id` mounted.
struct MountedExplorer {
    explorer: Arc<Explorer>,
    set_cookie: Option<HeaderValue>,
}

impl MountedExplorer {
    fn respond(self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if let Some(cookie) = self.set_cookie {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        response
    }

    async fn snapshot_json(self) -> Response {
        let snapshot = self.explorer.snapshot().await;
        self.respond(Json(snapshot))
    }
}

async fn mount_for_request(
    app_state: &AppState,
    collection_id: &str,
    headers: &HeaderMap,
) -> Result<MountedExplorer, Response> {
    let Some(props) = app_state.collections.props_for(collection_id) else {
        warn!(collection_id, "Unknown collection requested");
        return Err((StatusCode::NOT_FOUND, "Collection not found").into_response());
    };

    let (session_id, explorer, created) = app_state.sessions.resolve(headers).await;
    explorer.mount(props).await;

    let set_cookie = if created {
        HeaderValue::from_str(&session_cookie(session_id)).ok()
    } else {
        None
    };

    Ok(MountedExplorer {
        explorer,
        set_cookie,
    })
}

fn gallery_context(app_state: &AppState, snapshot: &ExplorerSnapshot) -> Result<liquid::Object, String> {
    let explorer = liquid::model::to_value(snapshot).map_err(|e| e.to_string())?;

    let mut globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "base_url": app_state.config.app.base_url,
        "page_title": snapshot.title,
        "api_base": format!(
            "/api/gallery/{}",
            urlencoding::encode(&snapshot.collection_id)
        ),
    });
    globals.insert("explorer".into(), explorer);
    Ok(globals)
}

#[axum::debug_handler]
pub async fn gallery_page_handler(
    State(app_state): State<AppState>,
    Path(collection_id): Path<String>,
    Query(query): Query<GalleryQuery>,
    headers: HeaderMap,
) -> Response {
    let mounted = match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => mounted,
        Err(response) => return response,
    };

    if let Some(page) = query.page {
        mounted.explorer.set_page(page).await;
    }

    let snapshot = mounted.explorer.snapshot().await;
    let globals = match gallery_context(&app_state, &snapshot) {
        Ok(globals) => globals,
        Err(e) => {
            error!("Failed to build gallery context: {}", e);
            return mounted.respond(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match app_state
        .template_engine
        .render_template("gallery.html.liquid", globals)
        .await
    {
        Ok(html) => mounted.respond(Html(html)),
        Err(e) => {
            error!("Template rendering error: {}", e);
            mounted.respond(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn gallery_json_handler(
    State(app_state): State<AppState>,
    Path(collection_id): Path<String>,
    Query(query): Query<GalleryQuery>,
    headers: HeaderMap,
) -> Response {
    match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => {
            if let Some(page) = query.page {
                mounted.explorer.set_page(page).await;
            }
            mounted.snapshot_json().await
        }
        Err(response) => response,
    }
}

pub async fn retry_handler(
    State(app_state): State<AppState>,
    Path(collection_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => {
            mounted.explorer.retry().await;
            mounted.snapshot_json().await
        }
        Err(response) => response,
    }
}

pub async fn page_handler(
    State(app_state): State<AppState>,
    Path((collection_id, page)): Path<(String, usize)>,
    headers: HeaderMap,
) -> Response {
    match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => {
            mounted.explorer.set_page(page).await;
            mounted.snapshot_json().await
        }
        Err(response) => response,
    }
}

pub async fn open_lightbox_handler(
    State(app_state): State<AppState>,
    Path((collection_id, ordinal)): Path<(String, usize)>,
    headers: HeaderMap,
) -> Response {
    match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => {
            if mounted.explorer.activate(ordinal).await.is_none() {
                return mounted.respond((StatusCode::NOT_FOUND, "Image not loaded"));
            }
            mounted.snapshot_json().await
        }
        Err(response) => response,
    }
}

pub async fn navigate_handler(
    State(app_state): State<AppState>,
    Path((collection_id, direction)): Path<(String, Direction)>,
    headers: HeaderMap,
) -> Response {
    match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => {
            mounted.explorer.navigate(direction).await;
            mounted.snapshot_json().await
        }
        Err(response) => response,
    }
}

pub async fn close_lightbox_handler(
    State(app_state): State<AppState>,
    Path(collection_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => {
            mounted.explorer.close().await;
            mounted.snapshot_json().await
        }
        Err(response) => response,
    }
}

pub async fn lightbox_failed_handler(
    State(app_state): State<AppState>,
    Path(collection_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => {
            mounted.explorer.lightbox_image_failed().await;
            mounted.snapshot_json().await
        }
        Err(response) => response,
    }
}

pub async fn card_outcome_handler(
    State(app_state): State<AppState>,
    Path((collection_id, ordinal, outcome)): Path<(String, usize, CardOutcome)>,
    headers: HeaderMap,
) -> Response {
    match mount_for_request(&app_state, &collection_id, &headers).await {
        Ok(mounted) => {
            if !mounted.explorer.report_card(ordinal, outcome).await {
                return mounted.respond((StatusCode::NOT_FOUND, "Image not loaded"));
            }
            mounted.snapshot_json().await
        }
        Err(response) => response,
    }
}
