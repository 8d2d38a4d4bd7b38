use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Query},
};
use tracing::{debug, info};

use crate::{
    db::now_sec,
    entities::{
        country, episode, episode_server, genre, movie, movie_country, movie_genre, movie_type,
        user_interaction, watch_history,
    },
    error::{AppError, AppResult},
    models::{
        EpisodeInput, EpisodeOut, MovieDetail, MovieInput, MovieListQuery, MovieSummary, Page,
        Pagination,
    },
    slug::resolve_slug,
};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

pub async fn list(db: &DatabaseConnection, q: &MovieListQuery) -> AppResult<Page<MovieSummary>> {
    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    // SQLite offsets are signed 64-bit.
    if (page - 1).checked_mul(limit).is_none_or(|offset| offset > i64::MAX as u64) {
        return Err(AppError::bad_request(format!("page {page} is out of range")));
    }

    let mut select = movie::Entity::find();

    if let Some(slug) = non_blank(q.type_slug.as_deref()) {
        let Some(ty) =
            movie_type::Entity::find().filter(movie_type::Column::Slug.eq(slug)).one(db).await?
        else {
            return Ok(empty_page(page, limit));
        };
        select = select.filter(movie::Column::TypeId.eq(ty.id));
    }

    if let Some(slug) = non_blank(q.genre.as_deref()) {
        let Some(g) = genre::Entity::find().filter(genre::Column::Slug.eq(slug)).one(db).await?
        else {
            return Ok(empty_page(page, limit));
        };
        select = select.filter(
            movie::Column::Id.in_subquery(
                Query::select()
                    .column(movie_genre::Column::MovieId)
                    .from(movie_genre::Entity)
                    .and_where(movie_genre::Column::GenreId.eq(g.id))
                    .to_owned(),
            ),
        );
    }

    if let Some(slug) = non_blank(q.country.as_deref()) {
        let Some(c) =
            country::Entity::find().filter(country::Column::Slug.eq(slug)).one(db).await?
        else {
            return Ok(empty_page(page, limit));
        };
        select = select.filter(
            movie::Column::Id.in_subquery(
                Query::select()
                    .column(movie_country::Column::MovieId)
                    .from(movie_country::Entity)
                    .and_where(movie_country::Column::CountryId.eq(c.id))
                    .to_owned(),
            ),
        );
    }

    if let Some(text) = non_blank(q.q.as_deref()) {
        select = select.filter(
            Condition::any()
                .add(movie::Column::Name.contains(text))
                .add(movie::Column::OriginName.contains(text))
                .add(movie::Column::Slug.contains(text)),
        );
    }

    if let Some(year) = q.year {
        select = select.filter(movie::Column::Year.eq(year));
    }

    let paginator = select
        .order_by_desc(movie::Column::UpdatedAt)
        .order_by_desc(movie::Column::Id)
        .paginate(db, limit);
    let total_items = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items: rows.iter().map(MovieSummary::from).collect(),
        pagination: Pagination {
            page,
            limit,
            total_items,
            total_pages: total_items.div_ceil(limit),
        },
    })
}

pub async fn detail(db: &DatabaseConnection, slug: &str) -> AppResult<MovieDetail> {
    let movie = movie::Entity::find()
        .filter(movie::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("movie {slug:?} not found")))?;
    build_detail(db, movie).await
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> AppResult<movie::Model> {
    movie::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("movie {id} not found")))
}

pub async fn build_detail<C: ConnectionTrait>(db: &C, movie: movie::Model) -> AppResult<MovieDetail> {
    let movie_type = match movie.type_id {
        Some(id) => movie_type::Entity::find_by_id(id).one(db).await?,
        None => None,
    };
    let genres =
        movie.find_related(genre::Entity).order_by_asc(genre::Column::Name).all(db).await?;
    let countries =
        movie.find_related(country::Entity).order_by_asc(country::Column::Name).all(db).await?;

    let episodes =
        movie.find_related(episode::Entity).order_by_asc(episode::Column::Id).all(db).await?;
    let episode_ids: Vec<i32> = episodes.iter().map(|e| e.id).collect();
    let mut servers: HashMap<i32, Vec<episode_server::Model>> = HashMap::new();
    if !episode_ids.is_empty() {
        for server in episode_server::Entity::find()
            .filter(episode_server::Column::EpisodeId.is_in(episode_ids))
            .order_by_asc(episode_server::Column::Id)
            .all(db)
            .await?
        {
            servers.entry(server.episode_id).or_default().push(server);
        }
    }
    let episodes = episodes
        .into_iter()
        .map(|ep| {
            let s = servers.remove(&ep.id).unwrap_or_default();
            EpisodeOut::new(ep, s)
        })
        .collect();

    Ok(MovieDetail {
        summary: MovieSummary::from(&movie),
        content: movie.content,
        trailer_url: movie.trailer_url,
        time: movie.time,
        episode_total: movie.episode_total,
        actors: serde_json::from_str(&movie.actors).unwrap_or_default(),
        directors: serde_json::from_str(&movie.directors).unwrap_or_default(),
        has_embedding: movie.embedding.is_some(),
        movie_type,
        genres,
        countries,
        episodes,
    })
}

pub async fn summaries_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> AppResult<HashMap<i32, MovieSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = movie::Entity::find().filter(movie::Column::Id.is_in(ids.to_vec())).all(db).await?;
    Ok(rows.iter().map(|m| (m.id, MovieSummary::from(m))).collect())
}

pub async fn create(db: &DatabaseConnection, input: MovieInput) -> AppResult<MovieDetail> {
    let name = non_blank(input.name.as_deref())
        .ok_or_else(|| AppError::bad_request("movie name is required"))?
        .to_string();
    let slug = resolve_slug(input.slug.as_deref(), &name)?;

    let txn = db.begin().await?;
    ensure_slug_free(&txn, &slug, None).await?;
    validate_refs(&txn, &input).await?;

    let now = now_sec();
    let model = movie::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        origin_name: Set(input.origin_name.flatten()),
        content: Set(input.content.flatten()),
        poster_url: Set(input.poster_url.flatten()),
        thumb_url: Set(input.thumb_url.flatten()),
        trailer_url: Set(input.trailer_url.flatten()),
        time: Set(input.time.flatten()),
        episode_current: Set(input.episode_current.flatten()),
        episode_total: Set(input.episode_total.flatten()),
        quality: Set(input.quality.flatten()),
        lang: Set(input.lang.flatten()),
        year: Set(input.year.flatten()),
        status: Set(input.status.flatten()),
        view: Set(0),
        actors: Set(names_json(input.actors.as_deref().unwrap_or_default())?),
        directors: Set(names_json(input.directors.as_deref().unwrap_or_default())?),
        type_id: Set(input.type_id.flatten()),
        embedding: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(ids) = &input.genre_ids {
        replace_genres(&txn, model.id, ids).await?;
    }
    if let Some(ids) = &input.country_ids {
        replace_countries(&txn, model.id, ids).await?;
    }
    txn.commit().await?;

    info!(id = model.id, slug = %model.slug, "created movie");
    build_detail(db, model).await
}

pub async fn update(db: &DatabaseConnection, id: i32, input: MovieInput) -> AppResult<MovieDetail> {
    let txn = db.begin().await?;
    let existing = find(&txn, id).await?;
    validate_refs(&txn, &input).await?;

    let mut model: movie::ActiveModel = existing.into();

    if let Some(name) = &input.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("movie name is required"));
        }
        model.name = Set(name.to_string());
    }
    if let Some(slug) = non_blank(input.slug.as_deref()) {
        let slug = resolve_slug(Some(slug), "")?;
        ensure_slug_free(&txn, &slug, Some(id)).await?;
        model.slug = Set(slug);
    }

    macro_rules! set_present {
        ($($field:ident),+ $(,)?) => {
            $(
                if let Some(v) = input.$field {
                    model.$field = Set(v);
                }
            )+
        };
    }
    set_present!(
        origin_name,
        content,
        poster_url,
        thumb_url,
        trailer_url,
        time,
        episode_current,
        episode_total,
        quality,
        lang,
        year,
        status,
        type_id,
    );

    if let Some(actors) = &input.actors {
        model.actors = Set(names_json(actors)?);
    }
    if let Some(directors) = &input.directors {
        model.directors = Set(names_json(directors)?);
    }
    model.updated_at = Set(now_sec());
    let model = model.update(&txn).await?;

    if let Some(ids) = &input.genre_ids {
        replace_genres(&txn, id, ids).await?;
    }
    if let Some(ids) = &input.country_ids {
        replace_countries(&txn, id, ids).await?;
    }
    txn.commit().await?;

    build_detail(db, model).await
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> AppResult<()> {
    let txn = db.begin().await?;
    find(&txn, id).await?;
    delete_movies(&txn, &[id]).await?;
    txn.commit().await?;
    info!(id = id, "deleted movie");
    Ok(())
}

pub async fn delete_many(db: &DatabaseConnection, ids: &[i32]) -> AppResult<u64> {
    if ids.is_empty() {
        return Err(AppError::bad_request("ids must not be empty"));
    }
    let txn = db.begin().await?;
    let deleted = delete_movies(&txn, ids).await?;
    txn.commit().await?;
    info!(requested = ids.len(), deleted = deleted, "bulk deleted movies");
    Ok(deleted)
}

/// Removes movies with every row hanging off them. Returns the number of movies removed.
async fn delete_movies<C: ConnectionTrait>(db: &C, ids: &[i32]) -> AppResult<u64> {
    let ids = ids.to_vec();

    let episode_ids: Vec<i32> = episode::Entity::find()
        .select_only()
        .column(episode::Column::Id)
        .filter(episode::Column::MovieId.is_in(ids.clone()))
        .into_tuple()
        .all(db)
        .await?;
    if !episode_ids.is_empty() {
        episode_server::Entity::delete_many()
            .filter(episode_server::Column::EpisodeId.is_in(episode_ids))
            .exec(db)
            .await?;
    }

    episode::Entity::delete_many()
        .filter(episode::Column::MovieId.is_in(ids.clone()))
        .exec(db)
        .await?;
    movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.is_in(ids.clone()))
        .exec(db)
        .await?;
    movie_country::Entity::delete_many()
        .filter(movie_country::Column::MovieId.is_in(ids.clone()))
        .exec(db)
        .await?;
    user_interaction::Entity::delete_many()
        .filter(user_interaction::Column::MovieId.is_in(ids.clone()))
        .exec(db)
        .await?;
    watch_history::Entity::delete_many()
        .filter(watch_history::Column::MovieId.is_in(ids.clone()))
        .exec(db)
        .await?;

    let res = movie::Entity::delete_many().filter(movie::Column::Id.is_in(ids)).exec(db).await?;
    Ok(res.rows_affected)
}

pub async fn add_episode(
    db: &DatabaseConnection,
    movie_id: i32,
    input: EpisodeInput,
) -> AppResult<EpisodeOut> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("episode name is required"));
    }
    let slug = resolve_slug(input.slug.as_deref(), name)?;

    let txn = db.begin().await?;
    let movie = find(&txn, movie_id).await?;

    let taken = episode::Entity::find()
        .filter(episode::Column::MovieId.eq(movie_id))
        .filter(episode::Column::Slug.eq(slug.as_str()))
        .count(&txn)
        .await?;
    if taken > 0 {
        return Err(AppError::bad_request(format!("episode slug {slug:?} already exists")));
    }

    let now = now_sec();
    let ep = episode::ActiveModel {
        movie_id: Set(movie_id),
        name: Set(name.to_string()),
        slug: Set(slug),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut servers = Vec::with_capacity(input.servers.len());
    for s in input.servers {
        let server_name = s.server_name.trim();
        if server_name.is_empty() {
            return Err(AppError::bad_request("server_name is required"));
        }
        let server = episode_server::ActiveModel {
            episode_id: Set(ep.id),
            server_name: Set(server_name.to_string()),
            filename: Set(s.filename),
            link_embed: Set(s.link_embed),
            link_m3u8: Set(s.link_m3u8),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        servers.push(server);
    }

    let mut touched: movie::ActiveModel = movie.into();
    touched.updated_at = Set(now);
    touched.update(&txn).await?;

    txn.commit().await?;
    debug!(movie_id = movie_id, episode_id = ep.id, servers = servers.len(), "added episode");
    Ok(EpisodeOut::new(ep, servers))
}

pub async fn delete_episode(db: &DatabaseConnection, id: i32) -> AppResult<()> {
    let txn = db.begin().await?;
    episode::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("episode {id} not found")))?;

    episode_server::Entity::delete_many()
        .filter(episode_server::Column::EpisodeId.eq(id))
        .exec(&txn)
        .await?;
    watch_history::Entity::update_many()
        .col_expr(watch_history::Column::EpisodeId, Expr::value(Option::<i32>::None))
        .filter(watch_history::Column::EpisodeId.eq(id))
        .exec(&txn)
        .await?;
    episode::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(())
}

pub async fn set_embedding(db: &DatabaseConnection, id: i32, embedding: &[f32]) -> AppResult<()> {
    if embedding.is_empty() {
        return Err(AppError::bad_request("embedding must not be empty"));
    }
    if embedding.iter().any(|x| !x.is_finite()) {
        return Err(AppError::bad_request("embedding must contain only finite numbers"));
    }

    let existing = find(db, id).await?;
    let mut model: movie::ActiveModel = existing.into();
    model.embedding = Set(Some(serde_json::to_string(embedding)?));
    model.update(db).await?;
    debug!(id = id, dims = embedding.len(), "stored embedding");
    Ok(())
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<i32>,
) -> AppResult<()> {
    let existing = movie::Entity::find().filter(movie::Column::Slug.eq(slug)).one(db).await?;
    match existing {
        Some(m) if Some(m.id) != except => {
            Err(AppError::bad_request(format!("movie slug {slug:?} already exists")))
        },
        _ => Ok(()),
    }
}

async fn validate_refs<C: ConnectionTrait>(db: &C, input: &MovieInput) -> AppResult<()> {
    if let Some(Some(type_id)) = input.type_id {
        if movie_type::Entity::find_by_id(type_id).one(db).await?.is_none() {
            return Err(AppError::bad_request(format!("unknown movie type {type_id}")));
        }
    }
    if let Some(ids) = &input.genre_ids {
        let wanted: HashSet<i32> = ids.iter().copied().collect();
        let found = genre::Entity::find()
            .filter(genre::Column::Id.is_in(wanted.iter().copied()))
            .count(db)
            .await?;
        if found != wanted.len() as u64 {
            return Err(AppError::bad_request("unknown genre id"));
        }
    }
    if let Some(ids) = &input.country_ids {
        let wanted: HashSet<i32> = ids.iter().copied().collect();
        let found = country::Entity::find()
            .filter(country::Column::Id.is_in(wanted.iter().copied()))
            .count(db)
            .await?;
        if found != wanted.len() as u64 {
            return Err(AppError::bad_request("unknown country id"));
        }
    }
    Ok(())
}

pub(crate) async fn replace_genres<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    genre_ids: &[i32],
) -> AppResult<()> {
    movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;
    let rows: Vec<movie_genre::ActiveModel> = dedup(genre_ids)
        .into_iter()
        .map(|genre_id| movie_genre::ActiveModel { movie_id: Set(movie_id), genre_id: Set(genre_id) })
        .collect();
    if !rows.is_empty() {
        movie_genre::Entity::insert_many(rows).exec_without_returning(db).await?;
    }
    Ok(())
}

pub(crate) async fn replace_countries<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    country_ids: &[i32],
) -> AppResult<()> {
    movie_country::Entity::delete_many()
        .filter(movie_country::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;
    let rows: Vec<movie_country::ActiveModel> = dedup(country_ids)
        .into_iter()
        .map(|country_id| movie_country::ActiveModel {
            movie_id: Set(movie_id),
            country_id: Set(country_id),
        })
        .collect();
    if !rows.is_empty() {
        movie_country::Entity::insert_many(rows).exec_without_returning(db).await?;
    }
    Ok(())
}

pub(crate) fn names_json(names: &[String]) -> AppResult<String> {
    let cleaned: Vec<&str> = names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()).collect();
    Ok(serde_json::to_string(&cleaned)?)
}

fn dedup(ids: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn empty_page<T>(page: u64, limit: u64) -> Page<T> {
    Page { items: Vec::new(), pagination: Pagination { page, limit, total_items: 0, total_pages: 0 } }
}
