//! Post use cases: listing with search and pagination, creation, and the
//! password-gated update and delete paths.

use std::num::NonZeroU32;
use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::pagination::{PageRequest, Pagination};
use crate::application::password::{PasswordError, hash_password, verify_password};
use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::domain::posts::PostSearch;

const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_WINDOW_SIZE: u32 = 5;

#[derive(Debug, Error)]
pub enum PostError {
    #[error("`{0}` must not be empty")]
    Validation(&'static str),
    #[error("password verification failed")]
    PasswordMismatch,
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    pub page_size: NonZeroU32,
    pub window_size: NonZeroU32,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            page_size: NonZeroU32::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU32::MIN),
            window_size: NonZeroU32::new(DEFAULT_WINDOW_SIZE).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl From<&crate::config::ListingSettings> for ListingOptions {
    fn from(settings: &crate::config::ListingSettings) -> Self {
        Self {
            page_size: settings.page_size,
            window_size: settings.page_window_size,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListPostsQuery {
    pub page: u32,
    pub search: PostSearch,
}

#[derive(Debug, Clone)]
pub struct PostListing {
    pub posts: Vec<PostRecord>,
    pub pagination: Pagination,
    pub search: PostSearch,
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Keeps the stored author when absent or blank.
    pub username: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct DeletePostCommand {
    pub id: i64,
    pub password: String,
}

#[derive(Clone)]
pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    options: ListingOptions,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        options: ListingOptions,
    ) -> Self {
        Self {
            reader,
            writer,
            options,
        }
    }

    /// List one page of posts. A store failure is logged and reported as
    /// an empty board.
    pub async fn list(&self, query: ListPostsQuery) -> PostListing {
        let posts = match self.reader.list_posts(&query.search).await {
            Ok(posts) => posts,
            Err(err) => {
                record_store_error("list", &err);
                Vec::new()
            }
        };

        let request = PageRequest::new(
            query.page,
            self.options.page_size,
            self.options.window_size,
        );
        let pagination = Pagination::compute(posts.len() as u64, request);
        let posts = pagination.slice(posts);

        PostListing {
            posts,
            pagination,
            search: query.search,
        }
    }

    pub async fn create(&self, command: CreatePostCommand) -> Result<i64, PostError> {
        let title = required(command.title, "title")?;
        let username = required(command.username, "username")?;
        ensure_non_empty(&command.content, "content")?;
        ensure_non_empty(&command.password, "password")?;

        let password_hash = hash_blocking(command.password).await?;

        let id = self
            .writer
            .create_post(CreatePostParams {
                title,
                content: command.content,
                username,
                password_hash,
            })
            .await
            .inspect_err(|err| record_store_error("create", err))?;

        counter!("bbs_posts_created_total").increment(1);
        info!(target = "bbs::application::posts", post_id = id, "post created");
        Ok(id)
    }

    /// Load a single post. A store failure is logged and reads as missing.
    pub async fn read(&self, id: i64) -> Option<PostRecord> {
        match self.reader.find_by_id(id).await {
            Ok(post) => post,
            Err(err) => {
                record_store_error("read", &err);
                None
            }
        }
    }

    pub async fn update(&self, command: UpdatePostCommand) -> Result<(), PostError> {
        let title = required(command.title, "title")?;
        ensure_non_empty(&command.content, "content")?;

        let original = self.verify_password(command.id, command.password).await?;
        let username = command
            .username
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(original.username);

        let affected = self
            .writer
            .update_post(UpdatePostParams {
                id: command.id,
                title,
                content: command.content,
                username,
            })
            .await
            .inspect_err(|err| record_store_error("update", err))?;

        if affected == 0 {
            return Err(PostError::NotFound);
        }

        counter!("bbs_posts_updated_total").increment(1);
        info!(target = "bbs::application::posts", post_id = command.id, "post updated");
        Ok(())
    }

    pub async fn delete(&self, command: DeletePostCommand) -> Result<(), PostError> {
        self.verify_password(command.id, command.password).await?;

        let affected = self
            .writer
            .delete_post(command.id)
            .await
            .inspect_err(|err| record_store_error("delete", err))?;

        if affected == 0 {
            return Err(PostError::NotFound);
        }

        counter!("bbs_posts_deleted_total").increment(1);
        info!(target = "bbs::application::posts", post_id = command.id, "post deleted");
        Ok(())
    }

    /// Loads the stored post and checks `password` against its hash. A
    /// missing post and a wrong password are indistinguishable to callers.
    async fn verify_password(&self, id: i64, password: String) -> Result<PostRecord, PostError> {
        let original = self
            .reader
            .find_by_id(id)
            .await
            .inspect_err(|err| record_store_error("verify", err))?;

        let Some(original) = original else {
            reject_password(id, "post missing");
            return Err(PostError::PasswordMismatch);
        };

        let stored_hash = original.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .unwrap_or_else(|err| {
                error!(
                    target = "bbs::application::posts",
                    error = %err,
                    "password verification task failed"
                );
                false
            });

        if !matches {
            reject_password(id, "password mismatch");
            return Err(PostError::PasswordMismatch);
        }

        Ok(original)
    }
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), PostError> {
    if value.trim().is_empty() {
        return Err(PostError::Validation(field));
    }
    Ok(())
}

fn required(value: String, field: &'static str) -> Result<String, PostError> {
    ensure_non_empty(&value, field)?;
    Ok(value.trim().to_string())
}

async fn hash_blocking(password: String) -> Result<String, PostError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| PasswordError::Hash(err.to_string()))?
        .map_err(PostError::from)
}

fn record_store_error(operation: &'static str, err: &RepoError) {
    let kind = err.kind();
    counter!("bbs_store_errors_total", "kind" => kind).increment(1);
    error!(
        target = "bbs::application::posts",
        operation,
        kind,
        error = %err,
        "post store operation failed"
    );
}

fn reject_password(id: i64, reason: &'static str) {
    counter!("bbs_password_rejections_total").increment(1);
    warn!(
        target = "bbs::application::posts",
        post_id = id,
        reason,
        "password verification rejected"
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::types::SearchType;

    #[derive(Default)]
    struct InMemoryPosts {
        rows: Mutex<Vec<PostRecord>>,
        failing: AtomicBool,
    }

    impl InMemoryPosts {
        fn check(&self) -> Result<(), RepoError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(RepoError::from_persistence("connection refused"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PostsRepo for InMemoryPosts {
        async fn list_posts(&self, search: &PostSearch) -> Result<Vec<PostRecord>, RepoError> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            let mut posts: Vec<PostRecord> = rows
                .iter()
                .filter(|post| match search.criteria() {
                    Some((SearchType::Title, keyword)) => post.title.contains(keyword),
                    Some((SearchType::Content, keyword)) => post.content.contains(keyword),
                    Some((SearchType::Username, keyword)) => post.username.contains(keyword),
                    None => true,
                })
                .cloned()
                .collect();
            posts.sort_by(|a, b| b.id.cmp(&a.id));
            Ok(posts)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
            self.check()?;
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|post| post.id == id).cloned())
        }
    }

    #[async_trait]
    impl PostsWriteRepo for InMemoryPosts {
        async fn create_post(&self, params: CreatePostParams) -> Result<i64, RepoError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let id = rows.iter().map(|post| post.id).max().unwrap_or(0) + 1;
            let now = OffsetDateTime::now_utc();
            rows.push(PostRecord {
                id,
                title: params.title,
                content: params.content,
                username: params.username,
                password_hash: params.password_hash,
                created_at: now,
                updated_at: now,
            });
            Ok(id)
        }

        async fn update_post(&self, params: UpdatePostParams) -> Result<u64, RepoError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|post| post.id == params.id) {
                Some(post) => {
                    post.title = params.title;
                    post.content = params.content;
                    post.username = params.username;
                    post.updated_at = OffsetDateTime::now_utc();
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        async fn delete_post(&self, id: i64) -> Result<u64, RepoError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|post| post.id != id);
            Ok((before - rows.len()) as u64)
        }
    }

    fn service() -> (PostService, Arc<InMemoryPosts>) {
        let repo = Arc::new(InMemoryPosts::default());
        let service = PostService::new(repo.clone(), repo.clone(), ListingOptions::default());
        (service, repo)
    }

    fn create_command(title: &str, content: &str, username: &str) -> CreatePostCommand {
        CreatePostCommand {
            title: title.to_string(),
            content: content.to_string(),
            username: username.to_string(),
            password: "secret".to_string(),
        }
    }

    fn update_command(id: i64, title: &str, password: &str) -> UpdatePostCommand {
        UpdatePostCommand {
            id,
            title: title.to_string(),
            content: "changed".to_string(),
            username: None,
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_read_keeps_fields_and_hashes_password() {
        let (service, _) = service();

        let id = service
            .create(create_command("hello", "world", "alice"))
            .await
            .expect("create");
        assert!(id > 0);

        let post = service.read(id).await.expect("post exists");
        assert_eq!(post.title, "hello");
        assert_eq!(post.content, "world");
        assert_eq!(post.username, "alice");
        assert_ne!(post.password_hash, "secret");
        assert!(verify_password("secret", &post.password_hash));
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let (service, repo) = service();

        let err = service
            .create(create_command("  ", "world", "alice"))
            .await
            .expect_err("blank title");
        assert!(matches!(err, PostError::Validation("title")));

        let mut command = create_command("hello", "world", "alice");
        command.password = String::new();
        let err = service.create(command).await.expect_err("blank password");
        assert!(matches!(err, PostError::Validation("password")));

        assert!(repo.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_reports_store_failure() {
        let (service, repo) = service();
        repo.failing.store(true, Ordering::SeqCst);

        let err = service
            .create(create_command("hello", "world", "alice"))
            .await
            .expect_err("store down");
        assert!(matches!(err, PostError::Repo(_)));
    }

    #[tokio::test]
    async fn end_to_end_lifecycle() {
        let (service, _) = service();

        let id = service
            .create(create_command("hello", "world", "alice"))
            .await
            .expect("create");
        assert_eq!(service.read(id).await.expect("post").title, "hello");

        let err = service
            .update(update_command(id, "hi", "wrong"))
            .await
            .expect_err("wrong password");
        assert!(matches!(err, PostError::PasswordMismatch));
        let unchanged = service.read(id).await.expect("post");
        assert_eq!(unchanged.title, "hello");
        assert_eq!(unchanged.content, "world");

        service
            .update(update_command(id, "hi", "secret"))
            .await
            .expect("update");
        let updated = service.read(id).await.expect("post");
        assert_eq!(updated.title, "hi");
        assert_eq!(updated.username, "alice");

        service
            .delete(DeletePostCommand {
                id,
                password: "secret".to_string(),
            })
            .await
            .expect("delete");
        assert!(service.read(id).await.is_none());
    }

    #[tokio::test]
    async fn update_can_replace_the_author() {
        let (service, _) = service();
        let id = service
            .create(create_command("hello", "world", "alice"))
            .await
            .expect("create");

        let mut command = update_command(id, "hello", "secret");
        command.username = Some(" bob ".to_string());
        service.update(command).await.expect("update");

        assert_eq!(service.read(id).await.expect("post").username, "bob");
    }

    #[tokio::test]
    async fn delete_with_wrong_password_keeps_the_post() {
        let (service, _) = service();
        let id = service
            .create(create_command("hello", "world", "alice"))
            .await
            .expect("create");

        let err = service
            .delete(DeletePostCommand {
                id,
                password: "wrong".to_string(),
            })
            .await
            .expect_err("wrong password");
        assert!(matches!(err, PostError::PasswordMismatch));
        assert!(service.read(id).await.is_some());
    }

    #[tokio::test]
    async fn missing_post_fails_verification_for_any_password() {
        let (service, _) = service();

        let err = service
            .update(update_command(42, "hi", "secret"))
            .await
            .expect_err("missing");
        assert!(matches!(err, PostError::PasswordMismatch));

        let err = service
            .delete(DeletePostCommand {
                id: 42,
                password: "secret".to_string(),
            })
            .await
            .expect_err("missing");
        assert!(matches!(err, PostError::PasswordMismatch));
    }

    #[tokio::test]
    async fn list_orders_by_id_descending() {
        let (service, _) = service();
        for title in ["first", "second", "third"] {
            service
                .create(create_command(title, "body", "alice"))
                .await
                .expect("create");
        }

        let listing = service.list(ListPostsQuery::default()).await;
        let titles: Vec<&str> = listing.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert_eq!(listing.pagination.total_items, 3);
        assert_eq!(listing.pagination.current_page, 1);
    }

    #[tokio::test]
    async fn list_filters_by_title_keyword() {
        let (service, _) = service();
        for title in ["foo bar", "bar", "a foo", "baz"] {
            service
                .create(create_command(title, "foo in content", "alice"))
                .await
                .expect("create");
        }

        let listing = service
            .list(ListPostsQuery {
                page: 1,
                search: PostSearch::new(Some("title"), Some("foo")),
            })
            .await;

        let titles: Vec<&str> = listing.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["a foo", "foo bar"]);
        assert_eq!(listing.search.search_type, Some(SearchType::Title));
        assert_eq!(listing.search.keyword.as_deref(), Some("foo"));
    }

    #[tokio::test]
    async fn list_paginates_and_clamps() {
        let (service, repo) = service();
        {
            let mut rows = repo.rows.lock().unwrap();
            let now = OffsetDateTime::now_utc();
            for id in 1..=23 {
                rows.push(PostRecord {
                    id,
                    title: format!("post {id}"),
                    content: "body".into(),
                    username: "alice".into(),
                    password_hash: "unused".into(),
                    created_at: now,
                    updated_at: now,
                });
            }
        }

        let third = service
            .list(ListPostsQuery {
                page: 3,
                search: PostSearch::default(),
            })
            .await;
        assert_eq!(third.pagination.total_pages, 3);
        let ids: Vec<i64> = third.posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let clamped = service
            .list(ListPostsQuery {
                page: 5,
                search: PostSearch::default(),
            })
            .await;
        assert_eq!(clamped.pagination.current_page, 3);
        assert_eq!(clamped.posts.len(), 3);
    }

    #[tokio::test]
    async fn store_failure_reads_as_empty() {
        let (service, repo) = service();
        service
            .create(create_command("hello", "world", "alice"))
            .await
            .expect("create");
        repo.failing.store(true, Ordering::SeqCst);

        let listing = service.list(ListPostsQuery::default()).await;
        assert!(listing.posts.is_empty());
        assert_eq!(listing.pagination.total_items, 0);
        assert!(service.read(1).await.is_none());
    }
}
