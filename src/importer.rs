use std::collections::{HashMap, HashSet};

use futures::{StreamExt, stream};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    catalog::{CatalogClient, CatalogItem, CatalogMovie, CatalogServer},
    db::now_sec,
    entities::{episode, episode_server, movie},
    error::{AppError, AppResult},
    movies::{names_json, replace_countries, replace_genres},
    slug::slugify,
    taxonomy::{countries, genres, types},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckImport {
    pub existing: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Imported,
    Skipped,
    Failed,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImportOutcome {
    pub slug: String,
    pub status: ImportStatus,
    pub movie_id: Option<i32>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CatalogListing {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub imported: bool,
}

/// Catalog `type` values and the local movie type each one lands in.
fn movie_type_for(kind: &str) -> Option<(&'static str, &'static str)> {
    match kind {
        "series" => Some(("phim-bo", "Phim Bộ")),
        "single" => Some(("phim-le", "Phim Lẻ")),
        "hoathinh" => Some(("hoat-hinh", "Hoạt Hình")),
        "tvshows" => Some(("tv-shows", "TV Shows")),
        _ => None,
    }
}

/// Splits `slugs` into those already stored and those not, keeping input order.
pub async fn check(db: &DatabaseConnection, slugs: &[String]) -> AppResult<CheckImport> {
    let mut seen = HashSet::new();
    let wanted: Vec<String> = slugs
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect();

    let stored: HashSet<String> = if wanted.is_empty() {
        HashSet::new()
    } else {
        movie::Entity::find()
            .select_only()
            .column(movie::Column::Slug)
            .filter(movie::Column::Slug.is_in(wanted.clone()))
            .into_tuple::<String>()
            .all(db)
            .await?
            .into_iter()
            .collect()
    };

    let (existing, missing) = wanted.into_iter().partition(|s| stored.contains(s));
    Ok(CheckImport { existing, missing })
}

/// A catalog listing page annotated with which entries are already imported.
pub async fn listing(
    db: &DatabaseConnection,
    catalog: &CatalogClient,
    page: u32,
) -> AppResult<(Vec<CatalogListing>, crate::catalog::CatalogPagination)> {
    let page = catalog.recent_page(page).await?;
    let slugs: Vec<String> = page.items.iter().map(|i| i.slug.clone()).collect();
    let status = check(db, &slugs).await?;
    let existing: HashSet<&String> = status.existing.iter().collect();

    let items = page
        .items
        .into_iter()
        .map(|item| {
            let imported = existing.contains(&item.slug);
            CatalogListing { item, imported }
        })
        .collect();
    Ok((items, page.pagination))
}

/// Imports every slug, at most `max_concurrent` at a time. Results keep input order.
pub async fn import_many(
    db: &DatabaseConnection,
    catalog: &CatalogClient,
    slugs: Vec<String>,
    max_concurrent: usize,
) -> Vec<ImportOutcome> {
    let mut seen = HashSet::new();
    let slugs: Vec<String> = slugs
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect();

    debug!(total = slugs.len(), "starting import");

    let outcomes: Vec<ImportOutcome> = stream::iter(slugs)
        .map(|slug| async move {
            match import_one(db, catalog, &slug).await {
                Ok(Some(id)) => ImportOutcome {
                    slug,
                    status: ImportStatus::Imported,
                    movie_id: Some(id),
                    error: None,
                },
                Ok(None) => {
                    ImportOutcome { slug, status: ImportStatus::Skipped, movie_id: None, error: None }
                },
                Err(err) => {
                    warn!(slug = %slug, error = %err, "failed to import movie");
                    ImportOutcome {
                        slug,
                        status: ImportStatus::Failed,
                        movie_id: None,
                        error: Some(err.to_string()),
                    }
                },
            }
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let imported = outcomes.iter().filter(|o| o.status == ImportStatus::Imported).count();
    info!(total = outcomes.len(), imported = imported, "import finished");
    outcomes
}

/// Returns the new movie id, or `None` when the slug is already stored.
async fn import_one(
    db: &DatabaseConnection,
    catalog: &CatalogClient,
    slug: &str,
) -> AppResult<Option<i32>> {
    if movie::Entity::find().filter(movie::Column::Slug.eq(slug)).one(db).await?.is_some() {
        debug!(slug = %slug, "already imported");
        return Ok(None);
    }

    let detail = catalog.movie_detail(slug).await?;
    let Some(movie) = detail.movie else {
        return Err(AppError::not_found(format!("catalog movie {slug:?} not found")));
    };
    let stored = store(db, movie, detail.episodes).await?;
    Ok(Some(stored.id))
}

/// Persists one catalog movie with its taxonomy and episodes in a single transaction.
pub async fn store(
    db: &DatabaseConnection,
    movie: CatalogMovie,
    servers: Vec<CatalogServer>,
) -> AppResult<movie::Model> {
    let name = movie.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("catalog movie has no name"));
    }
    let slug = match movie.slug.trim() {
        "" => slugify(&name),
        s => s.to_string(),
    };

    let now = now_sec();
    let txn = db.begin().await?;

    if movie::Entity::find().filter(movie::Column::Slug.eq(slug.as_str())).one(&txn).await?.is_some()
    {
        return Err(AppError::bad_request(format!("movie slug {slug:?} already exists")));
    }

    let type_id = match movie_type_for(&movie.kind) {
        Some((type_slug, type_name)) => Some(types::ensure(&txn, type_name, type_slug, now).await?.id),
        None => None,
    };

    let mut genre_ids = Vec::with_capacity(movie.category.len());
    for term in &movie.category {
        let term_slug = term_slug(&term.slug, &term.name);
        if term_slug.is_empty() {
            continue;
        }
        genre_ids.push(genres::ensure(&txn, term.name.trim(), &term_slug, now).await?.id);
    }

    let mut country_ids = Vec::with_capacity(movie.country.len());
    for term in &movie.country {
        let term_slug = term_slug(&term.slug, &term.name);
        if term_slug.is_empty() {
            continue;
        }
        country_ids.push(countries::ensure(&txn, term.name.trim(), &term_slug, now).await?.id);
    }

    let stored = movie::ActiveModel {
        name: Set(name),
        slug: Set(slug),
        origin_name: Set(non_empty(movie.origin_name)),
        content: Set(non_empty(movie.content)),
        poster_url: Set(non_empty(movie.poster_url)),
        thumb_url: Set(non_empty(movie.thumb_url)),
        trailer_url: Set(non_empty(movie.trailer_url)),
        time: Set(non_empty(movie.time)),
        episode_current: Set(non_empty(movie.episode_current)),
        episode_total: Set(non_empty(movie.episode_total)),
        quality: Set(non_empty(movie.quality)),
        lang: Set(non_empty(movie.lang)),
        year: Set(movie.year.filter(|y| *y > 0)),
        status: Set(non_empty(movie.status)),
        view: Set(0),
        actors: Set(names_json(&movie.actor)?),
        directors: Set(names_json(&movie.director)?),
        type_id: Set(type_id),
        embedding: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_genres(&txn, stored.id, &genre_ids).await?;
    replace_countries(&txn, stored.id, &country_ids).await?;

    let grouped = group_episodes(servers);
    for group in &grouped {
        let ep = episode::ActiveModel {
            movie_id: Set(stored.id),
            name: Set(group.name.clone()),
            slug: Set(group.slug.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for source in &group.sources {
            episode_server::ActiveModel {
                episode_id: Set(ep.id),
                server_name: Set(source.server_name.clone()),
                filename: Set(source.filename.clone()),
                link_embed: Set(source.link_embed.clone()),
                link_m3u8: Set(source.link_m3u8.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    info!(id = stored.id, slug = %stored.slug, episodes = grouped.len(), "imported movie");
    Ok(stored)
}

#[derive(Clone, Debug, PartialEq)]
struct EpisodeGroup {
    slug: String,
    name: String,
    sources: Vec<EpisodeSource>,
}

#[derive(Clone, Debug, PartialEq)]
struct EpisodeSource {
    server_name: String,
    filename: Option<String>,
    link_embed: Option<String>,
    link_m3u8: Option<String>,
}

/// The catalog lists episodes per server; regroup them per episode slug, in
/// first-seen order, with one source per server.
fn group_episodes(servers: Vec<CatalogServer>) -> Vec<EpisodeGroup> {
    let mut groups: Vec<EpisodeGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for server in servers {
        let server_name = server.server_name.trim().to_string();
        for ep in server.server_data {
            let slug = term_slug(&ep.slug, &ep.name);
            if slug.is_empty() {
                continue;
            }
            let pos = *index.entry(slug.clone()).or_insert_with(|| {
                let name = match ep.name.trim() {
                    "" => slug.clone(),
                    n => n.to_string(),
                };
                groups.push(EpisodeGroup { slug: slug.clone(), name, sources: Vec::new() });
                groups.len() - 1
            });
            groups[pos].sources.push(EpisodeSource {
                server_name: server_name.clone(),
                filename: non_empty(ep.filename),
                link_embed: non_empty(ep.link_embed),
                link_m3u8: non_empty(ep.link_m3u8),
            });
        }
    }

    groups
}

fn term_slug(slug: &str, name: &str) -> String {
    match slug.trim() {
        "" => slugify(name),
        s => s.to_string(),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
