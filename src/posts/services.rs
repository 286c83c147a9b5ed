use tracing::{debug, info, warn};

use crate::{
    error::{ApiError, RepoError},
    posts::{
        paging::{PageMeta, PageWindow},
        repo::PostRepo,
        repo_types::Post,
    },
};

pub const MAX_TITLE_LEN: usize = 80;
pub const MAX_BODY_LEN: usize = 150;

/// Create a post attributed to `creator_id`. A missing, blank or duplicate
/// title is a bad request.
pub async fn create_post(
    posts: &dyn PostRepo,
    creator_id: i64,
    title: Option<&str>,
    body: Option<&str>,
) -> Result<Post, ApiError> {
    let title = match title {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            warn!(creator_id, "post without title");
            return Err(ApiError::BadRequest);
        }
    };
    if title.chars().count() > MAX_TITLE_LEN
        || body.is_some_and(|b| b.chars().count() > MAX_BODY_LEN)
    {
        warn!(creator_id, "post title or body too long");
        return Err(ApiError::BadRequest);
    }

    let post = match posts.create(title, body, creator_id).await {
        Ok(p) => p,
        Err(RepoError::UniqueViolation) => {
            warn!(creator_id, "duplicate post title");
            return Err(ApiError::BadRequest);
        }
        Err(e) => return Err(e.into()),
    };
    info!(post_id = post.id, creator_id, "post created");
    Ok(post)
}

pub async fn list_by_creator(posts: &dyn PostRepo, creator_id: i64) -> Result<Vec<Post>, ApiError> {
    Ok(posts.list_by_creator(creator_id).await?)
}

pub async fn list_page(
    posts: &dyn PostRepo,
    requested: Option<i64>,
) -> Result<(Vec<Post>, PageMeta), ApiError> {
    let total = posts.count().await?;
    let window = PageWindow::compute(total, requested).map_err(|e| {
        warn!(?requested, total, "page out of range");
        e
    })?;
    debug!(page = window.page, total, "listing page");
    let items = posts.list_range(window.offset, window.limit).await?;
    Ok((items, window.meta))
}

/// Substring search. Store failures are reported as a bad request and the
/// detail only goes to the log.
pub async fn search(posts: &dyn PostRepo, needle: Option<&str>) -> Result<Vec<Post>, ApiError> {
    let needle = match needle {
        Some(q) if !q.is_empty() => q,
        _ => return Err(ApiError::BadRequest),
    };
    posts.search(needle).await.map_err(|e| {
        warn!(error = %e, "search query failed");
        ApiError::BadRequest
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    async fn seed(store: &MemoryStore, creator: i64, n: usize, prefix: &str) {
        for i in 1..=n {
            create_post(store, creator, Some(&format!("{prefix} {i}")), Some("body"))
                .await
                .expect("seed post");
        }
    }

    #[tokio::test]
    async fn title_is_required() {
        let store = MemoryStore::default();
        for title in [None, Some(""), Some("   ")] {
            let err = create_post(&store, 1, title, None).await.unwrap_err();
            assert!(matches!(err, ApiError::BadRequest));
        }
    }

    #[tokio::test]
    async fn body_is_optional() {
        let store = MemoryStore::default();
        let post = create_post(&store, 1, Some("hello"), None).await.unwrap();
        assert_eq!(post.body, None);
        assert_eq!(post.creator, 1);
    }

    #[tokio::test]
    async fn duplicate_title_is_bad_request() {
        let store = MemoryStore::default();
        create_post(&store, 1, Some("same"), None).await.unwrap();
        let err = create_post(&store, 2, Some("same"), None).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest));
    }

    #[tokio::test]
    async fn overlong_title_is_bad_request() {
        let store = MemoryStore::default();
        let title = "t".repeat(MAX_TITLE_LEN + 1);
        let err = create_post(&store, 1, Some(&title), None).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest));
    }

    #[tokio::test]
    async fn list_by_creator_only_returns_own_posts() {
        let store = MemoryStore::default();
        seed(&store, 1, 3, "alice").await;
        seed(&store, 2, 2, "bob").await;

        let mine = list_by_creator(&store, 1).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert!(mine.iter().all(|p| p.creator == 1));
    }

    #[tokio::test]
    async fn paging_over_twelve_posts() {
        let store = MemoryStore::default();
        seed(&store, 1, 12, "post").await;

        let (items, meta) = list_page(&store, Some(1)).await.unwrap();
        let titles: Vec<_> = items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["post 1", "post 2", "post 3", "post 4", "post 5"]);
        assert_eq!(meta.previous, "none");
        assert_eq!(meta.page_count, 3);

        let (items, meta) = list_page(&store, Some(3)).await.unwrap();
        let titles: Vec<_> = items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["post 11", "post 12"]);
        assert_eq!(meta.next, "none");

        let err = list_page(&store, Some(4)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest));
    }

    #[tokio::test]
    async fn empty_collection_lists_first_page() {
        let store = MemoryStore::default();
        let (items, meta) = list_page(&store, None).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(meta.total_count, 0);
    }

    #[tokio::test]
    async fn search_matches_title_body_and_creator() {
        let store = MemoryStore::default();
        create_post(&store, 7, Some("rust tips"), Some("borrowing")).await.unwrap();
        create_post(&store, 8, Some("cooking"), Some("rusty pans")).await.unwrap();
        create_post(&store, 9, Some("gardening"), None).await.unwrap();

        assert_eq!(search(&store, Some("rust")).await.unwrap().len(), 2);
        assert_eq!(search(&store, Some("9")).await.unwrap().len(), 1);
        assert!(search(&store, Some("o'brien")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_search_is_bad_request() {
        let store = MemoryStore::default();
        for q in [None, Some("")] {
            let err = search(&store, q).await.unwrap_err();
            assert!(matches!(err, ApiError::BadRequest));
        }
    }

    #[tokio::test]
    async fn search_store_failure_is_bad_request() {
        let store = MemoryStore::default();
        store.fail_searches();
        let err = search(&store, Some("x")).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest));
    }
}
