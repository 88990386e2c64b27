//! Author API endpoints
//!
//! - GET /api/v1/authors/featured - Featured authors
//! - GET /api/v1/authors/{slug} - Author profile with recent articles
//! - GET /api/v1/authors/{slug}/articles - Live articles by the author

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{LimitQuery, PageQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ArticleSummary, ListResponse};
use crate::models::{Author, SocialLinks};
use crate::services::AuthorProfile;

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorsResponse {
    pub authors: Vec<Author>,
}

/// Author page: profile fields, present social links and recent articles
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorProfileResponse {
    pub author: Author,
    /// Only the social links that are set, as `(network, url)` pairs
    pub social_links: Vec<(String, String)>,
    pub recent_articles: Vec<ArticleSummary>,
}

impl From<AuthorProfile> for AuthorProfileResponse {
    fn from(profile: AuthorProfile) -> Self {
        let social_links = present_links(&profile.author.social);
        Self {
            author: profile.author,
            social_links,
            recent_articles: profile.recent_articles.into_iter().map(Into::into).collect(),
        }
    }
}

fn present_links(social: &SocialLinks) -> Vec<(String, String)> {
    social
        .present()
        .into_iter()
        .map(|(network, url)| (network.to_string(), url.to_string()))
        .collect()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/featured", get(get_featured))
        .route("/{slug}", get(get_author))
        .route("/{slug}/articles", get(get_author_articles))
}

/// GET /api/v1/authors/featured
async fn get_featured(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<AuthorsResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.ranking_service.config().default_limit as i64);
    let authors = state.author_service.featured(limit).await?;
    Ok(Json(AuthorsResponse { authors }))
}

/// GET /api/v1/authors/{slug}
async fn get_author(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<AuthorProfileResponse>, ApiError> {
    let limit = state.ranking_service.config().default_limit as i64;
    let profile = state.author_service.profile(&slug, limit).await?;
    Ok(Json(profile.into()))
}

/// GET /api/v1/authors/{slug}/articles
async fn get_author_articles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<ArticleSummary>>, ApiError> {
    let result = state.ranking_service.by_author(&slug, query.page).await?;
    Ok(Json(ListResponse::from_paged(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_context;
    use crate::models::{CreateArticleInput, CreateAuthorInput};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_author_profile_and_articles() {
        let ctx = test_context().await;
        let mut input = CreateAuthorInput::new("acct-42", "Asha Rao");
        input.is_featured = true;
        input.social.twitter_url = "https://twitter.com/asharao".to_string();
        let author = ctx.state.author_service.create(input).await.unwrap();

        for title in ["Dam Levels Rise", "Rainfall Deficit"] {
            let article = ctx
                .state
                .article_service
                .create(CreateArticleInput::new(title, "Water report").with_author(author.id))
                .await
                .unwrap();
            ctx.state.article_service.publish(article.id).await.unwrap();
        }
        ctx.state
            .article_service
            .create(CreateArticleInput::new("Draft Column", "Unfinished").with_author(author.id))
            .await
            .unwrap();

        let profile: AuthorProfileResponse = ctx.server.get("/api/v1/authors/asha-rao").await.json();
        assert_eq!(profile.author.id, author.id);
        assert_eq!(profile.recent_articles.len(), 2);
        assert_eq!(
            profile.social_links,
            vec![("twitter".to_string(), "https://twitter.com/asharao".to_string())]
        );

        let listing: ListResponse<ArticleSummary> = ctx
            .server
            .get("/api/v1/authors/asha-rao/articles")
            .await
            .json();
        assert_eq!(listing.total, 2);

        let featured: AuthorsResponse = ctx.server.get("/api/v1/authors/featured").await.json();
        let slugs: Vec<&str> = featured.authors.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["asha-rao"]);

        ctx.server
            .get("/api/v1/authors/nobody")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
