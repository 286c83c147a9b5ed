//! In-memory repositories for tests. Enforces the same unique keys as the
//! SQL schema and keeps id order.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    auth::{repo::UserRepo, repo_types::User},
    error::RepoError,
    posts::{repo::PostRepo, repo_types::Post},
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    posts: Mutex<Vec<Post>>,
    fail_search: AtomicBool,
}

impl MemoryStore {
    /// Make every later `search` fail as if the database had errored.
    pub fn fail_searches(&self) {
        self.fail_search.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(RepoError::UniqueViolation);
        }
        let user = User {
            id: users.len() as i64 + 1,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn create(
        &self,
        title: &str,
        body: Option<&str>,
        creator: i64,
    ) -> Result<Post, RepoError> {
        let mut posts = self.posts.lock().unwrap();
        if posts.iter().any(|p| p.title == title) {
            return Err(RepoError::UniqueViolation);
        }
        let post = Post {
            id: posts.len() as i64 + 1,
            title: title.to_string(),
            body: body.map(str::to_string),
            creator,
            created_at: OffsetDateTime::now_utc(),
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn list_by_creator(&self, creator: i64) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.lock().unwrap();
        Ok(posts.iter().filter(|p| p.creator == creator).cloned().collect())
    }

    async fn count(&self) -> Result<i64, RepoError> {
        Ok(self.posts.lock().unwrap().len() as i64)
    }

    async fn list_range(&self, offset: i64, limit: i64) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn search(&self, needle: &str) -> Result<Vec<Post>, RepoError> {
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(RepoError::Database(sqlx::Error::Protocol(
                "simulated search failure".into(),
            )));
        }
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .filter(|p| {
                p.title.contains(needle)
                    || p.body.as_deref().is_some_and(|b| b.contains(needle))
                    || p.creator.to_string().contains(needle)
            })
            .cloned()
            .collect())
    }
}
