use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, Claims};
use crate::features::files::dtos::FileCreateDto;
use crate::features::files::models::File;
use crate::features::files::repositories::FileRepository;
use crate::features::users::models::{NewUser, User};
use crate::features::users::repositories::UserRepository;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_AUDIENCE: &str = "csv-data-hub:auth";

/// Sign an HS256 token for `user_id`; a negative `ttl_secs` yields an expired one
pub fn issue_token(user_id: i32, secret: &str, audience: &str, ttl_secs: i64) -> String {
    let exp = (Utc::now().timestamp() + ttl_secs).max(0) as u64;
    let claims = Claims {
        sub: user_id.to_string(),
        aud: audience.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn create_user(id: i32) -> AuthenticatedUser {
    AuthenticatedUser {
        id,
        email: format!("user{}@example.com", id),
        is_superuser: false,
    }
}

pub fn create_superuser(id: i32) -> AuthenticatedUser {
    AuthenticatedUser {
        id,
        email: format!("admin{}@example.com", id),
        is_superuser: true,
    }
}

/// Put `user` into request extensions the way the auth middleware does
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub async fn insert(&self, email: &str, is_active: bool, is_superuser: bool) -> i32 {
        let mut users = self.users.write().await;
        let id = users.len() as i32 + 1;
        users.push(User {
            id,
            email: email.to_string(),
            hashed_password: "hashed".to_string(),
            is_active,
            is_superuser,
            is_verified: true,
        });
        id
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        let created = User {
            id: users.len() as i32 + 1,
            email: user.email,
            hashed_password: user.hashed_password,
            is_active: true,
            is_superuser: user.is_superuser,
            is_verified: false,
        };
        users.push(created.clone());
        Ok(created)
    }
}

/// File repository backed by a vector, with a switch to make inserts fail
#[derive(Default)]
pub struct InMemoryFileRepository {
    files: RwLock<Vec<File>>,
    next_id: RwLock<i32>,
    fail_create: AtomicBool,
}

impl InMemoryFileRepository {
    pub fn fail_creates(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub async fn insert(&self, filename: &str, user_id: Option<i32>) -> File {
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        let file = File {
            id: *next_id,
            filename: filename.to_string(),
            user_id,
            create_date: Utc::now(),
        };
        self.files.write().await.push(file.clone());
        file
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn get(&self, id: i32) -> Result<Option<File>> {
        Ok(self.files.read().await.iter().find(|f| f.id == id).cloned())
    }

    async fn get_multi(&self, owner: Option<&AuthenticatedUser>) -> Result<Vec<File>> {
        Ok(self
            .files
            .read()
            .await
            .iter()
            .filter(|f| owner.is_none_or(|user| f.user_id == Some(user.id)))
            .cloned()
            .collect())
    }

    async fn get_by_filename(&self, filename: &str) -> Result<Option<File>> {
        Ok(self
            .files
            .read()
            .await
            .iter()
            .find(|f| f.filename == filename)
            .cloned())
    }

    async fn create(
        &self,
        input: FileCreateDto,
        owner: Option<&AuthenticatedUser>,
    ) -> Result<File> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Internal("insert failed".to_string()));
        }
        Ok(self.insert(&input.filename, owner.map(|u| u.id)).await)
    }

    async fn remove(&self, file: File) -> Result<File> {
        self.files.write().await.retain(|f| f.id != file.id);
        Ok(file)
    }
}
