use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    posts::{
        dto::{
            CreatePostRequest, CreatedPostResponse, PageQuery, PagedResponse, PostItem,
            PostsResponse, SearchQuery, SearchResponse,
        },
        services,
    },
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/post", post(create_post))
        .route("/posts", get(list_my_posts))
        .route("/posts/all", get(list_all_posts))
        .route("/posts/search", get(search_posts))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedPostResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "rejected post body");
        ApiError::BadRequest
    })?;

    let post = services::create_post(
        state.posts.as_ref(),
        user.id,
        payload.title.as_deref(),
        payload.body.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedPostResponse { post: post.title }),
    ))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_my_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<PostsResponse>, ApiError> {
    let posts = services::list_by_creator(state.posts.as_ref(), user.id).await?;
    Ok(Json(PostsResponse {
        posts: posts.into_iter().map(PostItem::from).collect(),
    }))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_all_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PagedResponse>, ApiError> {
    let Query(query) = query.map_err(|e| {
        warn!(error = %e, "rejected page query");
        ApiError::BadRequest
    })?;

    let (items, meta) = services::list_page(state.posts.as_ref(), query.page).await?;
    Ok(Json(PagedResponse {
        items: items.into_iter().map(PostItem::from).collect(),
        meta,
    }))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn search_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::BadRequest)?;

    let items = services::search(state.posts.as_ref(), query.q.as_deref()).await?;
    Ok(Json(SearchResponse {
        items: items.into_iter().map(PostItem::from).collect(),
    }))
}
