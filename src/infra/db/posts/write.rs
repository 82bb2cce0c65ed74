use async_trait::async_trait;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams};
use crate::infra::db::map_sqlx_error;

use super::PostgresRepositories;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<i64, RepoError> {
        let CreatePostParams {
            title,
            content,
            username,
            password_hash,
        } = params;

        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO posts (title, content, username, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(username)
        .bind(password_hash)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<u64, RepoError> {
        let UpdatePostParams {
            id,
            title,
            content,
            username,
        } = params;

        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, content = $3, username = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(username)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_post(&self, id: i64) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
