use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Client for the third-party movie catalog the importer pulls from.
pub struct CatalogClient {
    client: wreq::Client,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl CatalogClient {
    pub fn new(client: wreq::Client, base_url: String, rps: u32) -> Self {
        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        Self { client, base_url, limiter: Arc::new(RateLimiter::direct(quota)) }
    }

    /// One page of the "recently updated" listing, 1-based.
    pub async fn recent_page(&self, page: u32) -> AppResult<CatalogPage> {
        self.limiter.until_ready().await;

        let url = format!("{}/danh-sach/phim-moi-cap-nhat", self.base_url.trim_end_matches('/'));
        debug!(page = page, "fetching catalog page");
        let resp: CatalogPage = self
            .client
            .get(url)
            .query(&[("page", page.max(1))])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }

    pub async fn movie_detail(&self, slug: &str) -> AppResult<CatalogDetail> {
        self.limiter.until_ready().await;

        let url = format!(
            "{}/phim/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(slug)
        );
        debug!(slug = %slug, "fetching catalog detail");
        let resp = self.client.get(url).send().await?;
        if resp.status().as_u16() == 404 {
            return Err(AppError::not_found(format!("catalog has no movie {slug:?}")));
        }

        let detail: CatalogDetail = resp.error_for_status()?.json().await?;
        if !detail.status || detail.movie.is_none() {
            let msg = detail.msg.unwrap_or_else(|| "not found".to_string());
            return Err(AppError::not_found(format!("catalog movie {slug:?}: {msg}")));
        }
        Ok(detail)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub items: Vec<CatalogItem>,
    #[serde(default)]
    pub pagination: CatalogPagination,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPagination {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_items_per_page: u64,
    #[serde(default)]
    pub current_page: u64,
    #[serde(default)]
    pub total_pages: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CatalogItem {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub origin_name: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub thumb_url: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogDetail {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub movie: Option<CatalogMovie>,
    #[serde(default)]
    pub episodes: Vec<CatalogServer>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogMovie {
    pub name: String,
    pub slug: String,
    pub origin_name: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Option<String>,
    pub poster_url: Option<String>,
    pub thumb_url: Option<String>,
    pub trailer_url: Option<String>,
    pub time: Option<String>,
    pub episode_current: Option<String>,
    pub episode_total: Option<String>,
    pub quality: Option<String>,
    pub lang: Option<String>,
    pub year: Option<i32>,
    pub actor: Vec<String>,
    pub director: Vec<String>,
    pub category: Vec<CatalogTerm>,
    pub country: Vec<CatalogTerm>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogTerm {
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogServer {
    pub server_name: String,
    #[serde(default)]
    pub server_data: Vec<CatalogEpisode>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogEpisode {
    pub name: String,
    pub slug: String,
    pub filename: Option<String>,
    pub link_embed: Option<String>,
    pub link_m3u8: Option<String>,
}

#[cfg(test)]
pub(crate) const SAMPLE_DETAIL: &str = r##"{
    "status": true,
    "msg": "",
    "movie": {
        "_id": "a1b2",
        "name": "Ngôi Trường Xác Sống",
        "slug": "ngoi-truong-xac-song",
        "origin_name": "All of Us Are Dead",
        "content": "<p>A school becomes ground zero.</p>",
        "type": "series",
        "status": "completed",
        "poster_url": "https://img.example.com/poster.jpg",
        "thumb_url": "https://img.example.com/thumb.jpg",
        "trailer_url": "",
        "time": "60 phút/tập",
        "episode_current": "Hoàn Tất (12/12)",
        "episode_total": "12",
        "quality": "FHD",
        "lang": "Vietsub",
        "year": 2022,
        "view": 0,
        "actor": ["Park Ji-hu", "Yoon Chan-young"],
        "director": ["Lee JQ"],
        "category": [
            { "id": "c1", "name": "Hành Động", "slug": "hanh-dong" },
            { "id": "c2", "name": "Kinh Dị", "slug": "kinh-di" }
        ],
        "country": [{ "id": "k1", "name": "Hàn Quốc", "slug": "han-quoc" }]
    },
    "episodes": [
        {
            "server_name": "#Hà Nội (Vietsub)",
            "server_data": [
                { "name": "Tập 01", "slug": "tap-01", "filename": "E01", "link_embed": "https://e.example.com/1", "link_m3u8": "https://m.example.com/1.m3u8" },
                { "name": "Tập 02", "slug": "tap-02", "filename": "E02", "link_embed": "https://e.example.com/2", "link_m3u8": "https://m.example.com/2.m3u8" }
            ]
        },
        {
            "server_name": "#Hà Nội (Lồng Tiếng)",
            "server_data": [
                { "name": "Tập 01", "slug": "tap-01", "filename": "E01-LT", "link_embed": "https://e.example.com/1lt", "link_m3u8": "" }
            ]
        }
    ]
}"##;

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;

    fn client_for(server: &MockServer) -> CatalogClient {
        CatalogClient::new(wreq::Client::builder().build().unwrap(), server.uri(), 100)
    }

    #[test]
    fn detail_parses_catalog_payload() {
        let detail: CatalogDetail = serde_json::from_str(SAMPLE_DETAIL).unwrap();
        let movie = detail.movie.unwrap();
        assert_eq!(movie.kind, "series");
        assert_eq!(movie.category.len(), 2);
        assert_eq!(movie.country[0].slug, "han-quoc");
        assert_eq!(detail.episodes.len(), 2);
        assert_eq!(detail.episodes[0].server_data[1].slug, "tap-02");
    }

    #[test]
    fn page_parses_camel_case_pagination() {
        let body = r#"{
            "status": true,
            "items": [{ "name": "A", "slug": "a", "year": 2024, "modified": { "time": "2024-01-01T00:00:00.000Z" } }],
            "pagination": { "totalItems": 24000, "totalItemsPerPage": 10, "currentPage": 3, "totalPages": 2400 }
        }"#;
        let page: CatalogPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.items[0].slug, "a");
        assert_eq!(page.pagination.current_page, 3);
        assert_eq!(page.pagination.total_pages, 2400);
    }

    #[tokio::test]
    async fn recent_page_requests_page_and_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/danh-sach/phim-moi-cap-nhat"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "items": [
                    { "name": "A", "slug": "a", "year": 2024 },
                    { "name": "B", "slug": "b" }
                ],
                "pagination": { "totalItems": 20, "totalItemsPerPage": 10, "currentPage": 2, "totalPages": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server).recent_page(2).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].year, None);
        assert_eq!(page.pagination.current_page, 2);
    }

    #[tokio::test]
    async fn detail_maps_missing_movies_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/phim/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/phim/unknown"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": false, "msg": "Movie not found", "movie": null })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.movie_detail("gone").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");

        let err = client.movie_detail("unknown").await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("Movie not found")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn detail_parses_movie_and_upstream_failure_is_internal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/phim/ngoi-truong-xac-song"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SAMPLE_DETAIL, "application/json"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/phim/broken"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let detail = client.movie_detail("ngoi-truong-xac-song").await.unwrap();
        assert_eq!(detail.movie.unwrap().name, "Ngôi Trường Xác Sống");

        let err = client.movie_detail("broken").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
