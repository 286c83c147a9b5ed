use serde::{Deserialize, Serialize};

use crate::posts::{paging::PageMeta, repo_types::Post};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedPostResponse {
    pub post: String,
}

/// Client view of a post.
#[derive(Debug, Serialize)]
pub struct PostItem {
    pub title: String,
    pub body: Option<String>,
}

impl From<Post> for PostItem {
    fn from(p: Post) -> Self {
        Self {
            title: p.title,
            body: p.body,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<PostItem>,
}

#[derive(Debug, Serialize)]
pub struct PagedResponse {
    pub items: Vec<PostItem>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<PostItem>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
