//! Genres, countries and movie types share one shape (`id`, `name`, unique
//! `slug`) and one set of admin operations, generated per table below.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, sea_query::OnConflict,
};
use serde_json::{Value, json};

use crate::{
    AppState,
    auth::AdminUser,
    db::now_sec,
    error::{AppError, AppResult},
    models::TaxonomyInput,
    slug::resolve_slug,
};

macro_rules! taxonomy {
    ($module:ident, $entity:ident, $label:literal, $path:literal, $usage:ty, $usage_col:expr) => {
        pub mod $module {
            use super::*;
            use crate::entities::$entity::{ActiveModel, Column, Entity, Model};

            pub fn router() -> Router<Arc<AppState>> {
                Router::new()
                    .route($path, get(list).post(create))
                    .route(concat!($path, "/{id}"), get(show).put(update).delete(remove))
            }

            pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<Model> {
                Entity::find_by_id(id)
                    .one(db)
                    .await?
                    .ok_or_else(|| AppError::not_found(concat!($label, " not found")))
            }

            /// Returns the row with `slug`, inserting it with `name` when missing.
            /// An existing row keeps its name.
            pub async fn ensure<C: ConnectionTrait>(
                db: &C,
                name: &str,
                slug: &str,
                now: i64,
            ) -> AppResult<Model> {
                Entity::insert(ActiveModel {
                    name: Set(name.to_string()),
                    slug: Set(slug.to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                })
                .on_conflict(OnConflict::column(Column::Slug).do_nothing().to_owned())
                .exec_without_returning(db)
                .await?;

                Entity::find()
                    .filter(Column::Slug.eq(slug))
                    .one(db)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(anyhow::anyhow!(concat!($label, " missing after upsert")))
                    })
            }

            async fn ensure_slug_free<C: ConnectionTrait>(
                db: &C,
                slug: &str,
                except: Option<i32>,
            ) -> AppResult<()> {
                let existing = Entity::find().filter(Column::Slug.eq(slug)).one(db).await?;
                match existing {
                    Some(row) if Some(row.id) != except => Err(AppError::bad_request(format!(
                        concat!($label, " slug {:?} already exists"),
                        slug
                    ))),
                    _ => Ok(()),
                }
            }

            fn validated(input: &TaxonomyInput) -> AppResult<(String, String)> {
                let name = input.name.trim();
                if name.is_empty() {
                    return Err(AppError::bad_request(concat!($label, " name is required")));
                }
                let slug = resolve_slug(input.slug.as_deref(), name)?;
                Ok((name.to_string(), slug))
            }

            pub async fn list(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Model>>> {
                let rows = Entity::find().order_by_asc(Column::Name).all(&state.db).await?;
                Ok(Json(rows))
            }

            pub async fn show(
                State(state): State<Arc<AppState>>,
                Path(id): Path<i32>,
            ) -> AppResult<Json<Model>> {
                Ok(Json(find(&state.db, id).await?))
            }

            pub async fn create(
                State(state): State<Arc<AppState>>,
                AdminUser(admin): AdminUser,
                Json(input): Json<TaxonomyInput>,
            ) -> AppResult<(StatusCode, Json<Model>)> {
                let (name, slug) = validated(&input)?;
                ensure_slug_free(&state.db, &slug, None).await?;

                let now = now_sec();
                let model = ActiveModel {
                    name: Set(name),
                    slug: Set(slug),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&state.db)
                .await?;

                tracing::info!(id = model.id, slug = %model.slug, admin = admin.id, concat!("created ", $label));
                Ok((StatusCode::CREATED, Json(model)))
            }

            pub async fn update(
                State(state): State<Arc<AppState>>,
                AdminUser(_): AdminUser,
                Path(id): Path<i32>,
                Json(input): Json<TaxonomyInput>,
            ) -> AppResult<Json<Model>> {
                let existing = find(&state.db, id).await?;
                let (name, slug) = validated(&input)?;
                ensure_slug_free(&state.db, &slug, Some(id)).await?;

                let mut model: ActiveModel = existing.into();
                model.name = Set(name);
                model.slug = Set(slug);
                model.updated_at = Set(now_sec());
                Ok(Json(model.update(&state.db).await?))
            }

            pub async fn remove(
                State(state): State<Arc<AppState>>,
                AdminUser(_): AdminUser,
                Path(id): Path<i32>,
            ) -> AppResult<Json<Value>> {
                find(&state.db, id).await?;

                let in_use = <$usage as EntityTrait>::find()
                    .filter($usage_col.eq(id))
                    .count(&state.db)
                    .await?;
                if in_use > 0 {
                    return Err(AppError::bad_request(format!(
                        concat!("cannot delete ", $label, ": {} associated movie(s)"),
                        in_use
                    )));
                }

                Entity::delete_by_id(id).exec(&state.db).await?;
                tracing::info!(id = id, concat!("deleted ", $label));
                Ok(Json(json!({ "deleted": id })))
            }
        }
    };
}

taxonomy!(
    genres,
    genre,
    "genre",
    "/api/genres",
    crate::entities::movie_genre::Entity,
    crate::entities::movie_genre::Column::GenreId
);

taxonomy!(
    countries,
    country,
    "country",
    "/api/countries",
    crate::entities::movie_country::Entity,
    crate::entities::movie_country::Column::CountryId
);

taxonomy!(
    types,
    movie_type,
    "movie type",
    "/api/types",
    crate::entities::movie::Entity,
    crate::entities::movie::Column::TypeId
);

pub fn router() -> Router<Arc<AppState>> {
    Router::new().merge(genres::router()).merge(countries::router()).merge(types::router())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::{TestApp, seed_movie};

    #[tokio::test]
    async fn duplicate_genre_slug_is_rejected() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;

        let (status, body) =
            app.post("/api/genres", Some(&admin), json!({ "name": "Hành Động" })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "hanh-dong");

        let (status, body) = app
            .post("/api/genres", Some(&admin), json!({ "name": "Action", "slug": "hanh-dong" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn country_with_movies_cannot_be_deleted() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;

        let (_, country) =
            app.post("/api/countries", Some(&admin), json!({ "name": "Hàn Quốc" })).await;
        let country_id = country["id"].as_i64().unwrap();

        let (status, _) = app
            .post(
                "/api/movies",
                Some(&admin),
                json!({ "name": "Squid Game", "country_ids": [country_id] }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let path = format!("/api/countries/{country_id}");
        let (status, body) = app.delete(&path, Some(&admin)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("associated movie"));
    }

    #[tokio::test]
    async fn unused_type_is_deleted_and_then_missing() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;

        let (_, ty) = app.post("/api/types", Some(&admin), json!({ "name": "Phim Lẻ" })).await;
        let path = format!("/api/types/{}", ty["id"]);

        let (status, _) = app.delete(&path, Some(&admin)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get(&path, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn type_referenced_by_movie_cannot_be_deleted() {
        let app = TestApp::new().await;
        let movie = seed_movie(&app.state.db, "phim-bo", "Tales", 0).await;

        let admin = app.sign_in_admin().await;
        let path = format!("/api/types/{}", movie.type_id.unwrap());
        let (status, _) = app.delete(&path, Some(&admin)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_renames_and_checks_slug() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;

        let (_, a) = app.post("/api/genres", Some(&admin), json!({ "name": "Drama" })).await;
        app.post("/api/genres", Some(&admin), json!({ "name": "Comedy" })).await;

        let path = format!("/api/genres/{}", a["id"]);
        let (status, _) =
            app.put(&path, Some(&admin), json!({ "name": "Drama", "slug": "comedy" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            app.put(&path, Some(&admin), json!({ "name": "Chính Kịch" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "chinh-kich");
    }

    #[tokio::test]
    async fn writes_require_admin() {
        let app = TestApp::new().await;

        let (status, _) = app.post("/api/genres", None, json!({ "name": "Drama" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user = app.sign_in("viewer-uid", "viewer@example.com").await;
        let (status, _) = app.post("/api/genres", Some(&user), json!({ "name": "Drama" })).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.get("/api/genres", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn ensure_returns_existing_row_untouched() {
        let db = crate::db::test_db().await;

        let first = super::genres::ensure(&db, "Hành Động", "hanh-dong", 10).await.unwrap();
        let again = super::genres::ensure(&db, "Action", "hanh-dong", 20).await.unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.name, "Hành Động");
        assert_eq!(again.created_at, 10);

        let other = super::genres::ensure(&db, "Hài Hước", "hai-huoc", 30).await.unwrap();
        assert_ne!(other.id, first.id);
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let app = TestApp::new().await;
        let admin = app.sign_in_admin().await;
        let (status, _) = app.post("/api/countries", Some(&admin), json!({ "name": "  " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
