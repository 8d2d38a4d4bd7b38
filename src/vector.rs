//! Similarity search over stored movie embeddings.
//!
//! A request runs a fixed pipeline: vector search (top candidates by cosine
//! similarity), an optional match on movie fields, projection to hits, and a
//! final limit.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;
const CANDIDATES_PER_RESULT: usize = 10;

#[derive(Clone, Debug, Deserialize)]
pub struct VectorSearchRequest {
    pub vector: Vec<f32>,
    pub limit: Option<usize>,
    pub num_candidates: Option<usize>,
    pub filter: Option<VectorFilter>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VectorFilter {
    pub type_id: Option<i32>,
    pub year: Option<i32>,
    pub status: Option<String>,
}

impl VectorFilter {
    fn matches(&self, m: &movie::Model) -> bool {
        self.type_id.is_none_or(|t| m.type_id == Some(t))
            && self.year.is_none_or(|y| m.year == Some(y))
            && self.status.as_deref().is_none_or(|s| m.status.as_deref() == Some(s))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VectorHit {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub poster_url: Option<String>,
    pub year: Option<i32>,
    pub score: f64,
}

#[derive(Clone, Debug)]
pub struct Pipeline {
    query: Vec<f32>,
    num_candidates: usize,
    filter: Option<VectorFilter>,
    limit: usize,
}

impl Pipeline {
    pub fn from_request(req: VectorSearchRequest) -> AppResult<Self> {
        if req.vector.is_empty() {
            return Err(AppError::bad_request("vector must not be empty"));
        }
        if req.vector.iter().any(|x| !x.is_finite()) {
            return Err(AppError::bad_request("vector must contain only finite numbers"));
        }
        let limit = req.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let num_candidates =
            req.num_candidates.unwrap_or(limit * CANDIDATES_PER_RESULT).max(limit);
        Ok(Self { query: req.vector, num_candidates, filter: req.filter, limit })
    }

    pub fn run(&self, docs: impl IntoIterator<Item = movie::Model>) -> Vec<VectorHit> {
        let candidates = self.vector_search(docs);
        let matched = self.match_stage(candidates);
        let projected = matched.into_iter().map(project);
        projected.take(self.limit).collect()
    }

    fn vector_search(
        &self,
        docs: impl IntoIterator<Item = movie::Model>,
    ) -> Vec<(movie::Model, f64)> {
        let mut scored: Vec<(movie::Model, f64)> = docs
            .into_iter()
            .filter_map(|m| {
                let embedding = parse_embedding(m.embedding.as_deref()?)?;
                if embedding.len() != self.query.len() {
                    return None;
                }
                let score = cosine_similarity(&self.query, &embedding);
                Some((m, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.id.cmp(&b.0.id)));
        scored.truncate(self.num_candidates);
        scored
    }

    fn match_stage(&self, candidates: Vec<(movie::Model, f64)>) -> Vec<(movie::Model, f64)> {
        match &self.filter {
            Some(filter) => candidates.into_iter().filter(|(m, _)| filter.matches(m)).collect(),
            None => candidates,
        }
    }
}

fn project((m, score): (movie::Model, f64)) -> VectorHit {
    VectorHit {
        id: m.id,
        name: m.name,
        slug: m.slug,
        poster_url: m.poster_url,
        year: m.year,
        score,
    }
}

fn parse_embedding(raw: &str) -> Option<Vec<f32>> {
    serde_json::from_str(raw).ok()
}

/// Cosine similarity in `[-1.0, 1.0]`; `0.0` for mismatched, empty or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

pub async fn search(
    db: &DatabaseConnection,
    req: VectorSearchRequest,
) -> AppResult<Vec<VectorHit>> {
    let pipeline = Pipeline::from_request(req)?;
    let docs = movie::Entity::find().filter(movie::Column::Embedding.is_not_null()).all(db).await?;
    let hits = pipeline.run(docs);
    debug!(hits = hits.len(), candidates = pipeline.num_candidates, "vector search");
    Ok(hits)
}
