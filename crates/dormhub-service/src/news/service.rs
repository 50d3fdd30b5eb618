//! News CRUD. Publishing notifies every student.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_database::repositories::NewsRepository;
use dormhub_entity::account::Role;
use dormhub_entity::news::News;

use crate::context::RequestContext;
use crate::effects::{EffectExecutor, Outcome};
use crate::notification::rules;

/// Title and body of a news post.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsRequest {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
}

impl NewsRequest {
    fn validate(&self) -> AppResult<(String, String)> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || title.chars().count() > 200 {
            return Err(AppError::validation("Title must be 1 to 200 characters"));
        }
        if content.is_empty() {
            return Err(AppError::validation("Content must not be empty"));
        }
        Ok((title.to_string(), content.to_string()))
    }
}

/// News posts.
#[derive(Debug, Clone)]
pub struct NewsService {
    news_repo: Arc<NewsRepository>,
    effects: Arc<EffectExecutor>,
}

impl NewsService {
    /// Creates a new news service.
    pub fn new(news_repo: Arc<NewsRepository>, effects: Arc<EffectExecutor>) -> Self {
        Self { news_repo, effects }
    }

    /// Newest first.
    pub async fn list(&self, page: PageRequest) -> AppResult<PageResponse<News>> {
        self.news_repo.find_all(&page.normalized()).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<News> {
        self.news_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("News not found"))
    }

    /// Publishes a post and tells every student about it.
    pub async fn publish(&self, ctx: &RequestContext, req: NewsRequest) -> AppResult<News> {
        ctx.require_role(Role::Admin)?;
        let (title, content) = req.validate()?;
        let now = Utc::now();
        let news = News {
            id: Uuid::new_v4(),
            title,
            content,
            image_path: None,
            author_id: ctx.user_id,
            created_at: now,
            updated_at: now,
        };
        let news = self.news_repo.create(&news).await?;
        info!(news_id = %news.id, admin_id = %ctx.user_id, "News published");

        let notice = rules::news_published(&news);
        Ok(self.effects.apply(Outcome::new(news).notify(notice)).await)
    }

    pub async fn update(&self, ctx: &RequestContext, id: Uuid, req: NewsRequest) -> AppResult<News> {
        ctx.require_role(Role::Admin)?;
        let (title, content) = req.validate()?;
        let mut news = self.get(id).await?;
        news.title = title;
        news.content = content;
        news.updated_at = Utc::now();
        self.news_repo.update(&news).await
    }

    /// Replaces the post image. Returns the post and the path it replaced.
    pub async fn set_image(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        path: String,
    ) -> AppResult<(News, Option<String>)> {
        ctx.require_role(Role::Admin)?;
        let mut news = self.get(id).await?;
        let previous = news.image_path.replace(path);
        news.updated_at = Utc::now();
        let news = self.news_repo.update(&news).await?;
        Ok((news, previous))
    }

    /// Deletes a post. Returns its image path, if any, for cleanup.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Option<String>> {
        ctx.require_role(Role::Admin)?;
        let news = self.get(id).await?;
        if !self.news_repo.delete(id).await? {
            return Err(AppError::not_found("News not found"));
        }
        info!(news_id = %id, admin_id = %ctx.user_id, "News deleted");
        Ok(news.image_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation_trims() {
        let req = NewsRequest {
            title: "  Water outage ".into(),
            content: " Tuesday 9-12 ".into(),
        };
        assert_eq!(
            req.validate().unwrap(),
            ("Water outage".to_string(), "Tuesday 9-12".to_string())
        );
    }

    #[test]
    fn test_request_validation_rejects_blank() {
        let req = NewsRequest {
            title: " ".into(),
            content: "x".into(),
        };
        assert!(req.validate().is_err());
        let req = NewsRequest {
            title: "x".repeat(201),
            content: "x".into(),
        };
        assert!(req.validate().is_err());
    }
}
