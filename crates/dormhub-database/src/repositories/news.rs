//! News repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_entity::news::News;

/// Repository for news posts.
#[derive(Debug, Clone)]
pub struct NewsRepository {
    pool: PgPool,
}

impl NewsRepository {
    /// Create a new news repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a post by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<News>> {
        sqlx::query_as::<_, News>("SELECT * FROM news WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find news", e))
    }

    /// List posts, newest first.
    pub async fn find_all(&self, page: &PageRequest) -> AppResult<PageResponse<News>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count news", e))?;

        let posts = sqlx::query_as::<_, News>(
            "SELECT * FROM news ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list news", e))?;

        Ok(PageResponse::new(
            posts,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Insert a post.
    pub async fn create(&self, news: &News) -> AppResult<News> {
        sqlx::query_as::<_, News>(
            "INSERT INTO news (id, title, content, image_path, author_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(news.id)
        .bind(&news.title)
        .bind(&news.content)
        .bind(&news.image_path)
        .bind(news.author_id)
        .bind(news.created_at)
        .bind(news.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create news", e))
    }

    /// Persist edits to a post.
    pub async fn update(&self, news: &News) -> AppResult<News> {
        sqlx::query_as::<_, News>(
            "UPDATE news SET title = $2, content = $3, image_path = $4, updated_at = $5 \
             WHERE id = $1 RETURNING *",
        )
        .bind(news.id)
        .bind(&news.title)
        .bind(&news.content)
        .bind(&news.image_path)
        .bind(news.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update news", e))
    }

    /// Delete a post.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete news", e))?;
        Ok(result.rows_affected() > 0)
    }
}
