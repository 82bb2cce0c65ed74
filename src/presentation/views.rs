use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use url::form_urlencoded::Serializer;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::Pagination;
use crate::application::posts::PostListing;
use crate::domain::entities::PostRecord;
use crate::domain::posts::PostSearch;
use crate::domain::types::SearchType;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(flash: Option<FlashView>) -> Response {
    let view = LayoutContext::new(flash, NotFoundView::default());
    let mut response = render_template_response(NotFoundTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Post not found",
    )
    .attach(&mut response);
    response
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// One-shot notice rendered at the top of the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashView {
    pub kind: FlashKind,
    pub message: String,
}

impl FlashView {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

pub struct LayoutContext<T> {
    pub flash: Option<FlashView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(flash: Option<FlashView>, content: T) -> Self {
        Self { flash, content }
    }
}

pub struct PostRowView {
    pub id: i64,
    pub title: String,
    pub username: String,
    pub created_at: String,
    pub href: String,
}

impl From<&PostRecord> for PostRowView {
    fn from(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            username: post.username.clone(),
            created_at: format_timestamp(post.created_at),
            href: post_href(post.id),
        }
    }
}

pub struct SearchOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinkView {
    pub number: u32,
    pub href: String,
    pub is_current: bool,
}

pub struct PaginationView {
    pub current_page: u32,
    pub total_pages: u32,
    pub links: Vec<PageLinkView>,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
}

impl PaginationView {
    fn new(pagination: &Pagination, search: &PostSearch) -> Self {
        let links = pagination
            .window
            .iter()
            .map(|&number| PageLinkView {
                number,
                href: list_href(number, search),
                is_current: number == pagination.current_page,
            })
            .collect();

        Self {
            current_page: pagination.current_page,
            total_pages: pagination.total_pages,
            links,
            previous_href: pagination
                .previous_page()
                .map(|page| list_href(page, search)),
            next_href: pagination.next_page().map(|page| list_href(page, search)),
        }
    }
}

pub struct PostListView {
    pub rows: Vec<PostRowView>,
    pub total_items: u64,
    pub pagination: PaginationView,
    pub search_options: Vec<SearchOptionView>,
    pub search_keyword: String,
}

impl From<&PostListing> for PostListView {
    fn from(listing: &PostListing) -> Self {
        let search = &listing.search;
        let selected = search.search_type.unwrap_or(SearchType::Title);
        let search_options = SearchType::ALL
            .iter()
            .map(|search_type| SearchOptionView {
                value: search_type.as_str(),
                label: search_type.label(),
                selected: *search_type == selected,
            })
            .collect();

        Self {
            rows: listing.posts.iter().map(PostRowView::from).collect(),
            total_items: listing.pagination.total_items,
            pagination: PaginationView::new(&listing.pagination, search),
            search_options,
            search_keyword: search.keyword.clone().unwrap_or_default(),
        }
    }
}

/// Detail page data. The password hash never leaves the record.
pub struct PostDetailView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
    pub edit_href: String,
    pub delete_action: String,
}

impl From<&PostRecord> for PostDetailView {
    fn from(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            content: post.content.clone(),
            username: post.username.clone(),
            created_at: format_timestamp(post.created_at),
            updated_at: format_timestamp(post.updated_at),
            edit_href: format!("/posts/{}/update", post.id),
            delete_action: format!("/posts/{}/delete", post.id),
        }
    }
}

pub struct PostFormView {
    pub heading: &'static str,
    pub action: String,
    pub cancel_href: String,
    pub title: String,
    pub content: String,
    pub username: String,
    pub submit_label: &'static str,
}

impl PostFormView {
    pub fn create() -> Self {
        Self {
            heading: "New post",
            action: "/posts/create".to_string(),
            cancel_href: "/posts".to_string(),
            title: String::new(),
            content: String::new(),
            username: String::new(),
            submit_label: "Publish",
        }
    }

    pub fn update(post: &PostRecord) -> Self {
        Self {
            heading: "Edit post",
            action: format!("/posts/{}/update", post.id),
            cancel_href: post_href(post.id),
            title: post.title.clone(),
            content: post.content.clone(),
            username: post.username.clone(),
            submit_label: "Save changes",
        }
    }
}

pub struct NotFoundView {
    pub title: &'static str,
    pub message: &'static str,
}

impl Default for NotFoundView {
    fn default() -> Self {
        Self {
            title: "Post not found",
            message: "The post you requested does not exist or has been deleted.",
        }
    }
}

#[derive(Template)]
#[template(path = "posts/list.html")]
pub struct PostListTemplate {
    pub view: LayoutContext<PostListView>,
}

#[derive(Template)]
#[template(path = "posts/read.html")]
pub struct PostReadTemplate {
    pub view: LayoutContext<PostDetailView>,
}

#[derive(Template)]
#[template(path = "posts/form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormView>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub view: LayoutContext<NotFoundView>,
}

pub fn post_href(id: i64) -> String {
    format!("/posts/{id}")
}

/// Link to a list page that keeps the active search.
pub fn list_href(page: u32, search: &PostSearch) -> String {
    let mut serializer = Serializer::new(String::new());
    if let Some((search_type, keyword)) = search.criteria() {
        serializer.append_pair("searchType", search_type.as_str());
        serializer.append_pair("searchKeyword", keyword);
    }
    serializer.append_pair("page", &page.to_string());
    format!("/posts?{}", serializer.finish())
}

fn format_timestamp(value: OffsetDateTime) -> String {
    value
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use time::macros::datetime;

    use super::*;
    use crate::application::pagination::PageRequest;

    fn record(id: i64) -> PostRecord {
        PostRecord {
            id,
            title: "hello".into(),
            content: "world".into(),
            username: "alice".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: datetime!(2024-03-01 09:05 UTC),
            updated_at: datetime!(2024-03-02 18:30 UTC),
        }
    }

    #[test]
    fn list_href_keeps_active_search() {
        let search = PostSearch::new(Some("username"), Some("a&b c"));
        assert_eq!(
            list_href(2, &search),
            "/posts?searchType=username&searchKeyword=a%26b+c&page=2"
        );
    }

    #[test]
    fn list_href_without_search_only_carries_page() {
        assert_eq!(list_href(1, &PostSearch::default()), "/posts?page=1");
    }

    #[test]
    fn detail_view_formats_timestamps() {
        let view = PostDetailView::from(&record(7));
        assert_eq!(view.created_at, "2024-03-01 09:05");
        assert_eq!(view.updated_at, "2024-03-02 18:30");
        assert_eq!(view.edit_href, "/posts/7/update");
        assert_eq!(view.delete_action, "/posts/7/delete");
    }

    #[test]
    fn list_view_marks_current_page_and_selected_search() {
        let request = PageRequest::new(
            2,
            NonZeroU32::new(10).expect("non-zero"),
            NonZeroU32::new(5).expect("non-zero"),
        );
        let listing = PostListing {
            posts: vec![record(3)],
            pagination: Pagination::compute(23, request),
            search: PostSearch::new(Some("content"), Some("foo")),
        };

        let view = PostListView::from(&listing);
        let current: Vec<u32> = view
            .pagination
            .links
            .iter()
            .filter(|link| link.is_current)
            .map(|link| link.number)
            .collect();
        assert_eq!(current, vec![2]);
        assert_eq!(
            view.pagination.previous_href.as_deref(),
            Some("/posts?searchType=content&searchKeyword=foo&page=1")
        );
        let selected: Vec<&str> = view
            .search_options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value)
            .collect();
        assert_eq!(selected, vec!["content"]);
        assert_eq!(view.search_keyword, "foo");
    }

    #[test]
    fn rendered_detail_escapes_user_content() {
        let mut post = record(1);
        post.title = "<script>alert(1)</script>".into();
        let html = render_template(PostReadTemplate {
            view: LayoutContext::new(None, PostDetailView::from(&post)),
        })
        .expect("render");

        assert!(!html.0.contains("<script>alert(1)</script>"));
        assert!(!html.0.contains("$argon2id$secret"));
    }

    #[test]
    fn flash_kind_selects_the_notice_class() {
        let html = render_template(PostReadTemplate {
            view: LayoutContext::new(
                Some(FlashView::error("Wrong password")),
                PostDetailView::from(&record(1)),
            ),
        })
        .expect("render");

        assert!(html.0.contains("class=\"flash flash-error\""));
        assert!(html.0.contains("Wrong password"));
    }

    #[test]
    fn unknown_search_type_echoes_no_keyword() {
        let request = PageRequest::new(
            1,
            NonZeroU32::new(10).expect("non-zero"),
            NonZeroU32::new(5).expect("non-zero"),
        );
        let listing = PostListing {
            posts: vec![record(1)],
            pagination: Pagination::compute(1, request),
            search: PostSearch::new(Some("password"), Some("foo")),
        };

        let view = PostListView::from(&listing);
        assert_eq!(view.search_keyword, "");
        assert_eq!(view.pagination.links[0].href, "/posts?page=1");
    }
}
