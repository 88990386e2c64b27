//! Topic API endpoints
//!
//! - GET /api/v1/topics/{slug} - Topic with related topics, counts a view
//! - GET /api/v1/topics/{slug}/articles - Live articles tagged with the topic
//! - GET /api/v1/topics/{slug}/trending - Trending within the topic

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::common::{PageQuery, TrendingQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ArticleSummary, ArticlesResponse, ListResponse};
use crate::models::TopicDetail;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(get_topic))
        .route("/{slug}/articles", get(get_topic_articles))
        .route("/{slug}/trending", get(get_topic_trending))
}

/// GET /api/v1/topics/{slug}
async fn get_topic(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TopicDetail>, ApiError> {
    let mut detail = state.topic_service.detail(&slug).await?;
    if state.topic_service.record_view(detail.topic.id).await {
        detail.topic.view_count += 1;
    }
    Ok(Json(detail))
}

/// GET /api/v1/topics/{slug}/articles
async fn get_topic_articles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<ArticleSummary>>, ApiError> {
    let result = state.ranking_service.by_topic(&slug, query.page).await?;
    Ok(Json(ListResponse::from_paged(result)))
}

/// GET /api/v1/topics/{slug}/trending
async fn get_topic_trending(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let articles = state
        .ranking_service
        .topic_trending(&slug, query.days, query.limit)
        .await?;
    Ok(Json(articles.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_context;
    use crate::models::{CreateArticleInput, CreateTopicInput};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_topic_detail_and_listing() {
        let ctx = test_context().await;
        let topics = &ctx.state.topic_service;
        let election = topics.create(CreateTopicInput::new("Election 2024")).await.unwrap();
        let budget = topics.create(CreateTopicInput::new("Budget")).await.unwrap();
        topics.add_related(election.id, budget.id).await.unwrap();

        let article = ctx
            .state
            .article_service
            .create(CreateArticleInput::new("Polling Day", "Queues form early").with_topics(vec![election.id]))
            .await
            .unwrap();
        ctx.state.article_service.publish(article.id).await.unwrap();

        let detail: TopicDetail = ctx.server.get("/api/v1/topics/election-2024").await.json();
        assert_eq!(detail.topic.view_count, 1);
        let related: Vec<&str> = detail.related_topics.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(related, vec!["budget"]);

        let listing: ListResponse<ArticleSummary> = ctx
            .server
            .get("/api/v1/topics/election-2024/articles")
            .await
            .json();
        assert_eq!(listing.total, 1);

        let trending: ArticlesResponse = ctx
            .server
            .get("/api/v1/topics/election-2024/trending")
            .await
            .json();
        assert_eq!(trending.articles.len(), 1);

        let wide = ctx
            .server
            .get("/api/v1/topics/election-2024/trending")
            .add_query_param("days", 200_000_000)
            .await;
        wide.assert_status_ok();
        assert_eq!(wide.json::<ArticlesResponse>().articles.len(), 1);

        let stored = topics.get_by_id(election.id).await.unwrap();
        assert_eq!(stored.view_count, 1);
    }

    #[tokio::test]
    async fn test_unknown_topic() {
        let ctx = test_context().await;
        for path in [
            "/api/v1/topics/missing",
            "/api/v1/topics/missing/articles",
            "/api/v1/topics/missing/trending",
        ] {
            ctx.server.get(path).await.assert_status(StatusCode::NOT_FOUND);
        }
    }
}
