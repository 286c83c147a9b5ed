use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::{db::PgStore, error::RepoError, posts::repo_types::Post};

#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Insert a post; a taken title is `RepoError::UniqueViolation`.
    async fn create(&self, title: &str, body: Option<&str>, creator: i64)
        -> Result<Post, RepoError>;
    async fn list_by_creator(&self, creator: i64) -> Result<Vec<Post>, RepoError>;
    async fn count(&self) -> Result<i64, RepoError>;
    /// Posts ordered by id, skipping `offset` and returning at most `limit`.
    async fn list_range(&self, offset: i64, limit: i64) -> Result<Vec<Post>, RepoError>;
    /// Posts whose title, body or creator id contains `needle` literally.
    async fn search(&self, needle: &str) -> Result<Vec<Post>, RepoError>;
}

/// Escape LIKE metacharacters so the needle matches as a plain substring.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// The search query with the pattern bound, never spliced into the SQL text.
pub(crate) fn search_query(needle: &str) -> QueryBuilder<'static, Postgres> {
    let pattern = like_pattern(needle);
    let mut qb = QueryBuilder::new(
        "SELECT id, title, body, creator, created_at FROM posts WHERE title LIKE ",
    );
    qb.push_bind(pattern.clone())
        .push(r" ESCAPE '\' OR body LIKE ")
        .push_bind(pattern.clone())
        .push(r" ESCAPE '\' OR creator::TEXT LIKE ")
        .push_bind(pattern)
        .push(r" ESCAPE '\' ORDER BY id");
    qb
}

#[async_trait]
impl PostRepo for PgStore {
    async fn create(
        &self,
        title: &str,
        body: Option<&str>,
        creator: i64,
    ) -> Result<Post, RepoError> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, body, creator)
            VALUES ($1, $2, $3)
            RETURNING id, title, body, creator, created_at
            "#,
        )
        .bind(title)
        .bind(body)
        .bind(creator)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)
    }

    async fn list_by_creator(&self, creator: i64) -> Result<Vec<Post>, RepoError> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, body, creator, created_at
            FROM posts
            WHERE creator = $1
            ORDER BY id
            "#,
        )
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count(&self) -> Result<i64, RepoError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn list_range(&self, offset: i64, limit: i64) -> Result<Vec<Post>, RepoError> {
        let rows = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, body, creator, created_at
            FROM posts
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn search(&self, needle: &str) -> Result<Vec<Post>, RepoError> {
        let mut qb = search_query(needle);
        let rows = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
        assert_eq!(like_pattern("it's"), "%it's%");
    }

    #[test]
    fn search_sql_only_holds_placeholders() {
        let hostile = r#"x" OR 1=1; DROP TABLE posts; --'"#;
        let qb = search_query(hostile);
        let sql = qb.sql();
        assert!(sql.contains("$1"));
        assert!(sql.contains("$2"));
        assert!(sql.contains("$3"));
        assert!(!sql.contains("DROP"));
        assert!(!sql.contains("1=1"));
    }

    #[test]
    fn single_quote_does_not_reach_sql_text() {
        let qb = search_query("o'brien");
        assert!(!qb.sql().contains("o'brien"));
    }
}
