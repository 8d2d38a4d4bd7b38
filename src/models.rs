use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::{country, episode, episode_server, genre, movie, movie_type};

#[derive(Debug, Deserialize)]
pub struct TaxonomyInput {
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(rename = "type")]
    pub type_slug: Option<String>,
    pub genre: Option<String>,
    pub country: Option<String>,
    pub q: Option<String>,
    pub year: Option<i32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub origin_name: Option<String>,
    pub poster_url: Option<String>,
    pub thumb_url: Option<String>,
    pub year: Option<i32>,
    pub quality: Option<String>,
    pub lang: Option<String>,
    pub episode_current: Option<String>,
    pub status: Option<String>,
    pub view: i64,
    pub type_id: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&movie::Model> for MovieSummary {
    fn from(m: &movie::Model) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            slug: m.slug.clone(),
            origin_name: m.origin_name.clone(),
            poster_url: m.poster_url.clone(),
            thumb_url: m.thumb_url.clone(),
            year: m.year,
            quality: m.quality.clone(),
            lang: m.lang.clone(),
            episode_current: m.episode_current.clone(),
            status: m.status.clone(),
            view: m.view,
            type_id: m.type_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EpisodeOut {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub created_at: i64,
    pub servers: Vec<episode_server::Model>,
}

impl EpisodeOut {
    pub fn new(ep: episode::Model, servers: Vec<episode_server::Model>) -> Self {
        Self { id: ep.id, name: ep.name, slug: ep.slug, created_at: ep.created_at, servers }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: MovieSummary,
    pub content: Option<String>,
    pub trailer_url: Option<String>,
    pub time: Option<String>,
    pub episode_total: Option<String>,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
    pub has_embedding: bool,
    pub movie_type: Option<movie_type::Model>,
    pub genres: Vec<genre::Model>,
    pub countries: Vec<country::Model>,
    pub episodes: Vec<EpisodeOut>,
}

/// Create and update payload. On update only the present fields change; an
/// explicit `null` clears a nullable column.
#[derive(Debug, Default, Deserialize)]
pub struct MovieInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub origin_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub content: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub poster_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub thumb_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub trailer_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub time: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub episode_current: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub episode_total: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub quality: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub lang: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub status: Option<Option<String>>,
    pub actors: Option<Vec<String>>,
    pub directors: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub type_id: Option<Option<i32>>,
    pub genre_ids: Option<Vec<i32>>,
    pub country_ids: Option<Vec<i32>>,
}

/// Keeps `null` apart from an absent field: absent stays `None` through
/// `#[serde(default)]`, `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct ServerInput {
    pub server_name: String,
    pub filename: Option<String>,
    pub link_embed: Option<String>,
    pub link_m3u8: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeInput {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub servers: Vec<ServerInput>,
}

#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SlugsRequest {
    pub slugs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingInput {
    pub embedding: Vec<f32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub created_at: i64,
}

impl From<crate::entities::user::Model> for UserProfile {
    fn from(u: crate::entities::user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            avatar: u.avatar,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryInput {
    pub movie_id: i32,
    pub episode_id: Option<i32>,
    pub progress: i32,
    pub duration: Option<i32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryEntry {
    pub movie_id: i32,
    pub episode_id: Option<i32>,
    pub progress: i32,
    pub duration: Option<i32>,
    pub updated_at: i64,
    pub movie: Option<MovieSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ViewResult {
    pub counted: bool,
    pub view: i64,
}
