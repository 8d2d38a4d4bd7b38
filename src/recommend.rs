//! "Recently added" rows for the home page: movies of one type that received
//! new episodes inside a trailing window, most recent first.

use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    entities::{episode, movie, movie_type},
    error::{AppError, AppResult},
    models::MovieSummary,
    movies::summaries_by_ids,
};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 50;

#[derive(Clone, Debug, Serialize)]
pub struct RecentMovie {
    #[serde(flatten)]
    pub movie: MovieSummary,
    pub latest_episode_at: i64,
}

/// Collapses `(movie_id, created_at)` rows to one entry per movie.
///
/// Rows must arrive newest first; the first time seen for a movie is kept.
/// The result is ordered by that time descending (ties: higher movie id
/// first) and cut to `limit`.
pub fn group_recent(rows: impl IntoIterator<Item = (i32, i64)>, limit: usize) -> Vec<(i32, i64)> {
    let mut seen = HashSet::new();
    let mut groups: Vec<(i32, i64)> =
        rows.into_iter().filter(|(movie_id, _)| seen.insert(*movie_id)).collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
    groups.truncate(limit);
    groups
}

pub async fn recently_added_by_type(
    db: &DatabaseConnection,
    type_slug: &str,
    window_days: i64,
    limit: usize,
    now: i64,
) -> AppResult<Vec<RecentMovie>> {
    let ty = movie_type::Entity::find()
        .filter(movie_type::Column::Slug.eq(type_slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("movie type {type_slug:?} not found")))?;

    let cutoff = now - window_days.max(0) * 86_400;
    let limit = limit.clamp(1, MAX_LIMIT);

    let rows: Vec<(i32, i64)> = episode::Entity::find()
        .select_only()
        .column(episode::Column::MovieId)
        .column(episode::Column::CreatedAt)
        .inner_join(movie::Entity)
        .filter(movie::Column::TypeId.eq(ty.id))
        .filter(episode::Column::CreatedAt.gte(cutoff))
        .order_by_desc(episode::Column::CreatedAt)
        .into_tuple()
        .all(db)
        .await?;

    let groups = group_recent(rows, limit);
    debug!(type_slug = %type_slug, movies = groups.len(), "grouped recent episodes");

    let ids: Vec<i32> = groups.iter().map(|(id, _)| *id).collect();
    let mut summaries = summaries_by_ids(db, &ids).await?;

    Ok(groups
        .into_iter()
        .filter_map(|(id, at)| {
            summaries.remove(&id).map(|movie| RecentMovie { movie, latest_episode_at: at })
        })
        .collect())
}
