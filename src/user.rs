//! Per-user state: profile edits, view counting and watch history.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;

use crate::{
    db::now_sec,
    entities::{episode, movie, user, user_interaction, watch_history},
    error::{AppError, AppResult},
    models::{HistoryEntry, HistoryInput, MovieSummary, ProfileUpdate, ViewResult},
    movies::{self, summaries_by_ids},
};

pub async fn update_profile(
    db: &DatabaseConnection,
    current: user::Model,
    input: ProfileUpdate,
) -> AppResult<user::Model> {
    let mut model: user::ActiveModel = current.into();
    if let Some(name) = input.name {
        model.name = Set(non_blank(name));
    }
    if let Some(avatar) = input.avatar {
        model.avatar = Set(non_blank(avatar));
    }
    model.updated_at = Set(now_sec());
    Ok(model.update(db).await?)
}

/// Counts at most one view per user and movie.
pub async fn record_view(
    db: &DatabaseConnection,
    user_id: i32,
    movie_id: i32,
) -> AppResult<ViewResult> {
    let txn = db.begin().await?;
    movies::find(&txn, movie_id).await?;

    let inserted = user_interaction::Entity::insert(user_interaction::ActiveModel {
        user_id: Set(user_id),
        movie_id: Set(movie_id),
        kind: Set(user_interaction::KIND_VIEW.to_string()),
        created_at: Set(now_sec()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            user_interaction::Column::UserId,
            user_interaction::Column::MovieId,
            user_interaction::Column::Kind,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    let counted = inserted > 0;
    if counted {
        movie::Entity::update_many()
            .col_expr(movie::Column::View, Expr::col(movie::Column::View).add(1))
            .filter(movie::Column::Id.eq(movie_id))
            .exec(&txn)
            .await?;
    }

    let view = movies::find(&txn, movie_id).await?.view;
    txn.commit().await?;

    debug!(user_id = user_id, movie_id = movie_id, counted = counted, "recorded view");
    Ok(ViewResult { counted, view })
}

pub async fn history(db: &DatabaseConnection, user_id: i32) -> AppResult<Vec<HistoryEntry>> {
    let rows = watch_history::Entity::find()
        .filter(watch_history::Column::UserId.eq(user_id))
        .order_by_desc(watch_history::Column::UpdatedAt)
        .order_by_desc(watch_history::Column::Id)
        .all(db)
        .await?;

    let ids: Vec<i32> = rows.iter().map(|h| h.movie_id).collect();
    let summaries = summaries_by_ids(db, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|h| {
            let movie = summaries.get(&h.movie_id).cloned();
            entry(h, movie)
        })
        .collect())
}

/// Upserts the single history row for `(user, movie)`.
pub async fn record_progress(
    db: &DatabaseConnection,
    user_id: i32,
    input: HistoryInput,
) -> AppResult<HistoryEntry> {
    if input.progress < 0 {
        return Err(AppError::bad_request("progress must not be negative"));
    }
    if input.duration.is_some_and(|d| d < 0) {
        return Err(AppError::bad_request("duration must not be negative"));
    }

    let txn = db.begin().await?;
    let movie = movies::find(&txn, input.movie_id).await?;

    if let Some(episode_id) = input.episode_id {
        let belongs = episode::Entity::find_by_id(episode_id)
            .one(&txn)
            .await?
            .is_some_and(|ep| ep.movie_id == movie.id);
        if !belongs {
            return Err(AppError::bad_request(format!(
                "episode {episode_id} does not belong to movie {}",
                movie.id
            )));
        }
    }

    watch_history::Entity::insert(watch_history::ActiveModel {
        user_id: Set(user_id),
        movie_id: Set(movie.id),
        episode_id: Set(input.episode_id),
        progress: Set(input.progress),
        duration: Set(input.duration),
        updated_at: Set(now_sec()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([watch_history::Column::UserId, watch_history::Column::MovieId])
            .update_columns([
                watch_history::Column::EpisodeId,
                watch_history::Column::Progress,
                watch_history::Column::Duration,
                watch_history::Column::UpdatedAt,
            ])
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    let row = watch_history::Entity::find()
        .filter(watch_history::Column::UserId.eq(user_id))
        .filter(watch_history::Column::MovieId.eq(movie.id))
        .one(&txn)
        .await?
        .ok_or_else(|| anyhow::anyhow!("history row missing after upsert"))?;
    txn.commit().await?;

    Ok(entry(row, Some((&movie).into())))
}

pub async fn forget(db: &DatabaseConnection, user_id: i32, movie_id: i32) -> AppResult<()> {
    let res = watch_history::Entity::delete_many()
        .filter(watch_history::Column::UserId.eq(user_id))
        .filter(watch_history::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::not_found(format!("no history for movie {movie_id}")));
    }
    Ok(())
}

fn entry(h: watch_history::Model, movie: Option<MovieSummary>) -> HistoryEntry {
    HistoryEntry {
        movie_id: h.movie_id,
        episode_id: h.episode_id,
        progress: h.progress,
        duration: h.duration,
        updated_at: h.updated_at,
        movie,
    }
}

fn non_blank(s: String) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
