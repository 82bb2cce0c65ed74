use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    application::{
        posts::{
            CreatePostCommand, DeletePostCommand, ListPostsQuery, PostError, PostService,
            UpdatePostCommand,
        },
        repos::HealthRepo,
    },
    domain::posts::PostSearch,
    presentation::views::{
        FlashView, LayoutContext, PostDetailView, PostFormTemplate, PostFormView,
        PostListTemplate, PostListView, PostReadTemplate, post_href, render_not_found_response,
        render_template_response,
    },
};

use super::{
    db_health_response,
    flash::{set_flash, take_flash},
    middleware::{log_responses, set_request_context},
};

const POSTS_PATH: &str = "/posts";
const CREATE_PATH: &str = "/posts/create";

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostService>,
    pub health: Arc<dyn HealthRepo>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/posts", get(list_posts))
        .route("/posts/create", get(create_form).post(create_post))
        .route("/posts/{id}", get(read_post))
        .route("/posts/{id}/update", get(update_form).post(update_post))
        .route("/posts/{id}/delete", post(delete_post))
        .route("/_health/db", get(db_health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ListQuery {
    search_type: Option<String>,
    search_keyword: Option<String>,
    page: Option<String>,
}

impl ListQuery {
    fn into_query(self) -> ListPostsQuery {
        let page = self
            .page
            .as_deref()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(1);

        ListPostsQuery {
            page,
            search: PostSearch::new(self.search_type.as_deref(), self.search_keyword.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreatePostForm {
    title: String,
    content: String,
    username: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdatePostForm {
    title: String,
    content: String,
    username: Option<String>,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeletePostForm {
    password: String,
}

async fn root() -> Redirect {
    Redirect::to(POSTS_PATH)
}

async fn list_posts(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    let listing = state.posts.list(query.into_query()).await;
    let view = LayoutContext::new(flash, PostListView::from(&listing));

    (
        jar,
        render_template_response(PostListTemplate { view }, StatusCode::OK),
    )
}

async fn create_form(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    let view = LayoutContext::new(flash, PostFormView::create());

    (
        jar,
        render_template_response(PostFormTemplate { view }, StatusCode::OK),
    )
}

async fn create_post(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<CreatePostForm>,
) -> impl IntoResponse {
    let command = CreatePostCommand {
        title: form.title,
        content: form.content,
        username: form.username,
        password: form.password,
    };

    match state.posts.create(command).await {
        Ok(id) => (
            set_flash(jar, FlashView::success("Post created.")),
            Redirect::to(&post_href(id)),
        ),
        Err(err) => (
            set_flash(jar, FlashView::error(failure_message(&err, "created"))),
            Redirect::to(CREATE_PATH),
        ),
    }
}

async fn read_post(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    let response = match state.posts.read(id).await {
        Some(post) => {
            let view = LayoutContext::new(flash, PostDetailView::from(&post));
            render_template_response(PostReadTemplate { view }, StatusCode::OK)
        }
        None => render_not_found_response(flash),
    };

    (jar, response)
}

async fn update_form(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    let response = match state.posts.read(id).await {
        Some(post) => {
            let view = LayoutContext::new(flash, PostFormView::update(&post));
            render_template_response(PostFormTemplate { view }, StatusCode::OK)
        }
        None => render_not_found_response(flash),
    };

    (jar, response)
}

async fn update_post(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<UpdatePostForm>,
) -> impl IntoResponse {
    let command = UpdatePostCommand {
        id,
        title: form.title,
        content: form.content,
        username: form.username,
        password: form.password,
    };

    match state.posts.update(command).await {
        Ok(()) => (
            set_flash(jar, FlashView::success("Post updated.")),
            Redirect::to(&post_href(id)),
        ),
        Err(err) => (
            set_flash(jar, FlashView::error(failure_message(&err, "updated"))),
            Redirect::to(&format!("/posts/{id}/update")),
        ),
    }
}

async fn delete_post(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<i64>,
    Form(form): Form<DeletePostForm>,
) -> impl IntoResponse {
    let command = DeletePostCommand {
        id,
        password: form.password,
    };

    match state.posts.delete(command).await {
        Ok(()) => (
            set_flash(jar, FlashView::success("Post deleted.")),
            Redirect::to(POSTS_PATH),
        ),
        Err(err) => (
            set_flash(jar, FlashView::error(failure_message(&err, "deleted"))),
            Redirect::to(&post_href(id)),
        ),
    }
}

async fn db_health(State(state): State<HttpState>) -> Response {
    db_health_response(state.health.health_check().await)
}

async fn fallback(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = take_flash(jar);
    (jar, render_not_found_response(flash))
}

/// User-facing text for a failed write. A missing post and a wrong
/// password read the same.
fn failure_message(err: &PostError, action: &str) -> String {
    match err {
        PostError::Validation(field) => format!("Please fill in the {field}."),
        PostError::PasswordMismatch | PostError::NotFound => {
            format!("The post could not be {action}: wrong password or the post no longer exists.")
        }
        PostError::Password(_) | PostError::Repo(_) => {
            format!("The post could not be {action}. Please try again.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_page_falls_back_to_first() {
        let query = ListQuery {
            page: Some("abc".into()),
            ..Default::default()
        };
        assert_eq!(query.into_query().page, 1);

        let query = ListQuery {
            page: Some(" 4 ".into()),
            ..Default::default()
        };
        assert_eq!(query.into_query().page, 4);
    }

    #[test]
    fn authorization_failures_share_one_message() {
        assert_eq!(
            failure_message(&PostError::PasswordMismatch, "deleted"),
            failure_message(&PostError::NotFound, "deleted")
        );
    }
}
