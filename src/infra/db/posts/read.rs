use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::PostRecord;
use crate::domain::posts::PostSearch;
use crate::domain::types::SearchType;
use crate::infra::db::{contains_pattern, map_sqlx_error};

use super::PostgresRepositories;
use super::types::{POST_COLUMNS, PostRow};

fn search_column(search_type: SearchType) -> &'static str {
    match search_type {
        SearchType::Title => "title",
        SearchType::Content => "content",
        SearchType::Username => "username",
    }
}

fn apply_search<'q>(qb: &mut QueryBuilder<'q, Postgres>, search: &PostSearch) {
    if let Some((search_type, keyword)) = search.criteria() {
        qb.push(" AND ");
        qb.push(search_column(search_type));
        qb.push(" LIKE ");
        qb.push_bind(contains_pattern(keyword));
        qb.push(" ESCAPE '\\' ");
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self, search: &PostSearch) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE 1=1 "));
        apply_search(&mut qb, search);
        qb.push(" ORDER BY id DESC");

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}
