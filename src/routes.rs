use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState, auth,
    auth::{AdminUser, CurrentUser},
    db::now_sec,
    error::{AppError, AppResult},
    importer::{self, CheckImport},
    models::{
        EmbeddingInput, EpisodeInput, EpisodeOut, HistoryEntry, HistoryInput, IdsRequest,
        MovieDetail, MovieInput, MovieListQuery, MovieSummary, Page, ProfileUpdate, SlugsRequest,
        UserProfile, ViewResult,
    },
    movies,
    recommend::{self, RecentMovie},
    taxonomy, uploads, user,
    vector::{self, VectorHit, VectorSearchRequest},
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/session", post(auth::create_session).delete(auth::delete_session))
        .route("/api/auth/refresh", post(auth::refresh_session))
        .merge(taxonomy::router())
        .route("/api/movies", get(list_movies).post(create_movie).delete(delete_movies))
        .route("/api/movies/recent", get(recent_movies))
        .route("/api/movies/search/vector", post(vector_search))
        .route("/api/movies/{id}", get(movie_detail).put(update_movie).delete(delete_movie))
        .route("/api/movies/{id}/episodes", post(add_episode))
        .route("/api/movies/{id}/embedding", put(set_embedding))
        .route("/api/episodes/{id}", delete(delete_episode))
        .route("/api/user/profile", get(profile).patch(update_profile))
        .route("/api/user/view/{movie_id}", post(record_view))
        .route("/api/user/history", get(history).post(record_progress))
        .route("/api/user/history/{movie_id}", delete(forget_history))
        .route("/api/import/catalog", get(catalog_page))
        .route("/api/import/check", post(check_import))
        .route("/api/import", post(run_import))
        .route("/api/upload/presign", post(presign_upload))
        .route("/api/upload/cloudinary", post(cloudinary_upload))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<MovieListQuery>,
) -> AppResult<Json<Page<MovieSummary>>> {
    Ok(Json(movies::list(&state.db, &q).await?))
}

pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(movies::detail(&state.db, &slug).await?))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Json(input): Json<MovieInput>,
) -> AppResult<(StatusCode, Json<MovieDetail>)> {
    let created = movies::create(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<MovieInput>,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(movies::update(&state.db, id, input).await?))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    movies::delete(&state.db, id).await?;
    Ok(Json(json!({ "deleted": id })))
}

pub async fn delete_movies(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Json(req): Json<IdsRequest>,
) -> AppResult<Json<Value>> {
    let deleted = movies::delete_many(&state.db, &req.ids).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

pub async fn add_episode(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<EpisodeInput>,
) -> AppResult<(StatusCode, Json<EpisodeOut>)> {
    let episode = movies::add_episode(&state.db, id, input).await?;
    Ok((StatusCode::CREATED, Json(episode)))
}

pub async fn delete_episode(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    movies::delete_episode(&state.db, id).await?;
    Ok(Json(json!({ "deleted": id })))
}

pub async fn set_embedding(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<EmbeddingInput>,
) -> AppResult<Json<Value>> {
    movies::set_embedding(&state.db, id, &input.embedding).await?;
    Ok(Json(json!({ "id": id, "dimensions": input.embedding.len() })))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(rename = "type")]
    type_slug: Option<String>,
    limit: Option<usize>,
}

pub async fn recent_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RecentQuery>,
) -> AppResult<Json<Vec<RecentMovie>>> {
    let type_slug = q
        .type_slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("type is required"))?;
    let limit = q.limit.unwrap_or(recommend::DEFAULT_LIMIT);
    let recent = recommend::recently_added_by_type(
        &state.db,
        type_slug,
        state.config.recent_window_days,
        limit,
        now_sec(),
    )
    .await?;
    Ok(Json(recent))
}

pub async fn vector_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VectorSearchRequest>,
) -> AppResult<Json<Vec<VectorHit>>> {
    Ok(Json(vector::search(&state.db, req).await?))
}

pub async fn profile(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(user.into())
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Json(input): Json<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    let updated = user::update_profile(&state.db, current, input).await?;
    Ok(Json(updated.into()))
}

pub async fn record_view(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<ViewResult>> {
    Ok(Json(user::record_view(&state.db, current.id, movie_id).await?))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
) -> AppResult<Json<Vec<HistoryEntry>>> {
    Ok(Json(user::history(&state.db, current.id).await?))
}

pub async fn record_progress(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Json(input): Json<HistoryInput>,
) -> AppResult<Json<HistoryEntry>> {
    Ok(Json(user::record_progress(&state.db, current.id, input).await?))
}

pub async fn forget_history(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<Value>> {
    user::forget(&state.db, current.id, movie_id).await?;
    Ok(Json(json!({ "deleted": movie_id })))
}

#[derive(Debug, Deserialize)]
pub struct CatalogPageQuery {
    page: Option<u32>,
}

pub async fn catalog_page(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Query(q): Query<CatalogPageQuery>,
) -> AppResult<Json<Value>> {
    let page = q.page.unwrap_or(1).max(1);
    let (items, pagination) = importer::listing(&state.db, &state.catalog, page).await?;
    Ok(Json(json!({ "items": items, "pagination": pagination })))
}

pub async fn check_import(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Json(req): Json<SlugsRequest>,
) -> AppResult<Json<CheckImport>> {
    Ok(Json(importer::check(&state.db, &req.slugs).await?))
}

pub async fn run_import(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<SlugsRequest>,
) -> AppResult<Json<Value>> {
    if req.slugs.iter().all(|s| s.trim().is_empty()) {
        return Err(AppError::bad_request("slugs must not be empty"));
    }
    tracing::info!(admin = admin.id, requested = req.slugs.len(), "import requested");

    let results = importer::import_many(
        &state.db,
        &state.catalog,
        req.slugs,
        state.config.max_concurrent_imports,
    )
    .await;
    Ok(Json(json!({ "results": results })))
}

#[derive(Debug, Deserialize)]
pub struct PresignRequest {
    filename: String,
    content_type: Option<String>,
    folder: Option<String>,
}

pub async fn presign_upload(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Json(req): Json<PresignRequest>,
) -> AppResult<Json<uploads::PresignedUpload>> {
    let s3 = state
        .config
        .s3
        .as_ref()
        .ok_or_else(|| AppError::not_configured("S3 uploads are not configured"))?;
    let presigned = uploads::presign_put(
        s3,
        &req.filename,
        req.content_type,
        req.folder.as_deref(),
        jiff::Timestamp::now(),
    )?;
    Ok(Json(presigned))
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryRequest {
    file: String,
    folder: Option<String>,
}

pub async fn cloudinary_upload(
    State(state): State<Arc<AppState>>,
    AdminUser(_): AdminUser,
    Json(req): Json<CloudinaryRequest>,
) -> AppResult<Json<uploads::CloudinaryUpload>> {
    let cfg = state
        .config
        .cloudinary
        .as_ref()
        .ok_or_else(|| AppError::not_configured("Cloudinary uploads are not configured"))?;
    let uploaded =
        uploads::cloudinary_upload(&state.http, cfg, &req.file, req.folder.as_deref(), now_sec())
            .await?;
    Ok(Json(uploaded))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use crate::testing::{TestApp, seed_movie};

    #[tokio::test]
    async fn health_reports_ok() {
        let app = TestApp::new().await;
        let (status, body) = app.get("/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn movie_lifecycle_with_episode_and_cascade_delete() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;

        let (_, genre) = app.post("/api/genres", Some(&admin), json!({ "name": "Kinh Dị" })).await;
        let (status, created) = app
            .post(
                "/api/movies",
                Some(&admin),
                json!({
                    "name": "Hầm Ngục",
                    "year": 2024,
                    "actors": ["A", " ", "B"],
                    "genre_ids": [genre["id"]],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["slug"], "ham-nguc");
        assert_eq!(created["actors"], json!(["A", "B"]));
        let id = created["id"].as_i64().unwrap();

        let (status, episode) = app
            .post(
                &format!("/api/movies/{id}/episodes"),
                Some(&admin),
                json!({
                    "name": "Tập 1",
                    "servers": [{ "server_name": "Vietsub", "link_m3u8": "https://cdn/1.m3u8" }],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(episode["slug"], "tap-1");

        let (status, _) = app
            .post(&format!("/api/movies/{id}/episodes"), Some(&admin), json!({ "name": "Tập 1" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, detail) = app.get("/api/movies/ham-nguc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["genres"][0]["slug"], "kinh-di");
        assert_eq!(detail["episodes"][0]["servers"][0]["link_m3u8"], "https://cdn/1.m3u8");

        let (status, _) = app.delete(&format!("/api/movies/{id}"), Some(&admin)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.get("/api/movies/ham-nguc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let genre_path = format!("/api/genres/{}", genre["id"]);
        let (status, _) = app.delete(&genre_path, Some(&admin)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn update_clears_fields_sent_as_null() {
        let app = TestApp::new().await;
        let movie = seed_movie(&app.state.db, "phim-le", "Oldboy", 0).await;
        let admin = app.sign_in_admin().await;
        let path = format!("/api/movies/{}", movie.id);

        let (status, body) = app
            .put(
                &path,
                Some(&admin),
                json!({ "trailer_url": "https://youtu.be/x", "year": 2003, "quality": "HD" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trailer_url"], "https://youtu.be/x");
        assert_eq!(body["movie_type"]["slug"], "phim-le");

        let (status, body) = app
            .put(&path, Some(&admin), json!({ "trailer_url": null, "type_id": null, "year": null }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["trailer_url"].is_null());
        assert!(body["year"].is_null());
        assert!(body["type_id"].is_null());
        assert!(body["movie_type"].is_null());
        assert_eq!(body["quality"], "HD");
        assert_eq!(body["name"], "Oldboy");
    }

    #[tokio::test]
    async fn movie_validation_errors() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;

        let (status, _) = app.post("/api/movies", Some(&admin), json!({ "year": 2020 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            app.post("/api/movies", Some(&admin), json!({ "name": "X", "type_id": 42 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        app.post("/api/movies", Some(&admin), json!({ "name": "Dune" })).await;
        let (status, body) = app.post("/api/movies", Some(&admin), json!({ "name": "Dune" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("already exists"));

        let (status, _) = app.put("/api/movies/999", Some(&admin), json!({ "name": "Y" })).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_by_type_and_paginates() {
        let app = TestApp::new().await;
        for name in ["One", "Two", "Three"] {
            seed_movie(&app.state.db, "phim-bo", name, 0).await;
        }
        seed_movie(&app.state.db, "phim-le", "Solo", 0).await;

        let (status, body) = app.get("/api/movies?type=phim-bo&limit=2&page=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total_items"], 3);
        assert_eq!(body["pagination"]["total_pages"], 2);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);

        let (_, body) = app.get("/api/movies?type=unknown", None).await;
        assert_eq!(body["items"], json!([]));

        let (_, body) = app.get("/api/movies?q=Sol", None).await;
        assert_eq!(body["items"][0]["slug"], "solo");
    }

    #[tokio::test]
    async fn list_rejects_page_beyond_offset_range() {
        let app = TestApp::new().await;
        seed_movie(&app.state.db, "phim-bo", "One", 0).await;

        let (status, body) = app.get("/api/movies?page=18446744073709551615&limit=100", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("out of range"));

        let (status, _) = app.get("/api/movies?page=100000000000000000&limit=100", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app.get("/api/movies?page=1000000&limit=100", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], json!([]));
        assert_eq!(body["pagination"]["total_items"], 1);
    }

    #[tokio::test]
    async fn bulk_delete_requires_ids() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;
        let a = seed_movie(&app.state.db, "phim-bo", "A", 0).await;
        let b = seed_movie(&app.state.db, "phim-bo", "B", 0).await;

        let (status, _) = app.delete_json("/api/movies", Some(&admin), json!({ "ids": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .delete_json("/api/movies", Some(&admin), json!({ "ids": [a.id, b.id, 999] }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 2);
    }

    #[tokio::test]
    async fn recent_requires_known_type() {
        let app = TestApp::new().await;
        let now = crate::db::now_sec();
        let movie = seed_movie(&app.state.db, "phim-bo", "Recent", now - 10).await;

        let (status, body) = app.get("/api/movies/recent?type=phim-bo", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], movie.id);
        assert_eq!(body[0]["latest_episode_at"], now - 10);

        let (status, _) = app.get("/api/movies/recent", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app.get("/api/movies/recent?type=nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn embedding_round_trips_into_vector_search() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;
        let near = seed_movie(&app.state.db, "phim-le", "Near", 0).await;
        let far = seed_movie(&app.state.db, "phim-le", "Far", 0).await;

        for (movie, embedding) in [(&near, json!([1.0, 0.0])), (&far, json!([0.0, 1.0]))] {
            let path = format!("/api/movies/{}/embedding", movie.id);
            let (status, _) = app.put(&path, Some(&admin), json!({ "embedding": embedding })).await;
            assert_eq!(status, StatusCode::OK);
        }

        let path = format!("/api/movies/{}/embedding", near.id);
        let (status, _) = app.put(&path, Some(&admin), json!({ "embedding": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .post("/api/movies/search/vector", None, json!({ "vector": [0.9, 0.1], "limit": 1 }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["slug"], "near");
    }

    #[tokio::test]
    async fn deleting_episode_removes_it_from_detail() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;
        seed_movie(&app.state.db, "phim-bo", "Show", 0).await;

        let (_, detail) = app.get("/api/movies/show", None).await;
        let episode_id = detail["episodes"][0]["id"].as_i64().unwrap();

        let path = format!("/api/episodes/{episode_id}");
        let (status, _) = app.delete(&path, Some(&admin)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.delete(&path, Some(&admin)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, detail) = app.get("/api/movies/show", None).await;
        assert_eq!(detail["episodes"], json!([]));
    }

    #[tokio::test]
    async fn import_check_splits_existing_and_missing() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;
        seed_movie(&app.state.db, "phim-bo", "Known", 0).await;

        let (status, body) = app
            .post(
                "/api/import/check",
                Some(&admin),
                json!({ "slugs": ["new-one", "known", "new-one"] }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "existing": ["known"], "missing": ["new-one"] }));

        let (status, _) = app.post("/api/import", Some(&admin), json!({ "slugs": [" "] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn catalog_listing_flags_imported_entries_and_imports() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/danh-sach/phim-moi-cap-nhat"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "name": "Known", "slug": "known" },
                    { "name": "Ngôi Trường Xác Sống", "slug": "ngoi-truong-xac-song" }
                ],
                "pagination": { "totalItems": 2, "totalItemsPerPage": 10, "currentPage": 1, "totalPages": 1 }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/phim/ngoi-truong-xac-song"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(crate::catalog::SAMPLE_DETAIL, "application/json"),
            )
            .mount(&server)
            .await;

        let app = TestApp::with_catalog(server.uri()).await;
        let admin = app.sign_in_admin().await;
        seed_movie(&app.state.db, "phim-bo", "Known", 0).await;

        let (status, body) = app.get("/api/import/catalog", Some(&admin)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["imported"], true);
        assert_eq!(body["items"][1]["imported"], false);
        assert_eq!(body["pagination"]["totalPages"], 1);

        let (status, body) = app
            .post("/api/import", Some(&admin), json!({ "slugs": ["ngoi-truong-xac-song", "known"] }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["status"], "imported");
        assert_eq!(body["results"][1]["status"], "skipped");

        let (_, body) = app.get("/api/import/catalog", Some(&admin)).await;
        assert_eq!(body["items"][1]["imported"], true);

        let user = app.sign_in("viewer-uid", "viewer@example.com").await;
        let (status, _) = app.get("/api/import/catalog", Some(&user)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn uploads_report_missing_configuration() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;

        let (status, body) = app
            .post("/api/upload/presign", Some(&admin), json!({ "filename": "poster.jpg" }))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "S3 uploads are not configured");

        let (status, _) =
            app.post("/api/upload/cloudinary", Some(&admin), json!({ "file": "x" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn presign_with_s3_configured() {
        let app = TestApp::with_s3().await;
        let admin = app.sign_in_admin().await;

        let (status, body) = app
            .post(
                "/api/upload/presign",
                Some(&admin),
                json!({ "filename": "Trailer.MP4", "content_type": "video/mp4" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["key"].as_str().unwrap().ends_with("-trailer.mp4"));
        assert!(body["upload_url"].as_str().unwrap().contains("X-Amz-Signature="));

        let (status, _) =
            app.post("/api/upload/presign", Some(&admin), json!({ "filename": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
