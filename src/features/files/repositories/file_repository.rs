use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::files::dtos::FileCreateDto;
use crate::features::files::models::File;

/// CRUD access to file records
///
/// Lookups return `None` for missing rows; deciding whether that is an error
/// is left to the caller.
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn get(&self, id: i32) -> Result<Option<File>>;

    /// All records, or only those owned by `owner`, in insertion order
    async fn get_multi(&self, owner: Option<&AuthenticatedUser>) -> Result<Vec<File>>;

    /// First record with this filename
    async fn get_by_filename(&self, filename: &str) -> Result<Option<File>>;

    /// Persist a record, stamping `user_id` from `owner` when given
    async fn create(&self, input: FileCreateDto, owner: Option<&AuthenticatedUser>)
        -> Result<File>;

    async fn remove(&self, file: File) -> Result<File>;
}

pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn get(&self, id: i32) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>(
            r#"
            SELECT id, filename, user_id, create_date
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    async fn get_multi(&self, owner: Option<&AuthenticatedUser>) -> Result<Vec<File>> {
        let files = match owner {
            Some(user) => {
                sqlx::query_as::<_, File>(
                    r#"
                    SELECT id, filename, user_id, create_date
                    FROM files
                    WHERE user_id = $1
                    ORDER BY id
                    "#,
                )
                .bind(user.id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, File>(
                    r#"
                    SELECT id, filename, user_id, create_date
                    FROM files
                    ORDER BY id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(files)
    }

    async fn get_by_filename(&self, filename: &str) -> Result<Option<File>> {
        let file = sqlx::query_as::<_, File>(
            r#"
            SELECT id, filename, user_id, create_date
            FROM files
            WHERE filename = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;

        Ok(file)
    }

    async fn create(
        &self,
        input: FileCreateDto,
        owner: Option<&AuthenticatedUser>,
    ) -> Result<File> {
        let file = sqlx::query_as::<_, File>(
            r#"
            INSERT INTO files (filename, user_id)
            VALUES ($1, $2)
            RETURNING id, filename, user_id, create_date
            "#,
        )
        .bind(input.filename)
        .bind(owner.map(|user| user.id))
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    async fn remove(&self, file: File) -> Result<File> {
        sqlx::query(
            r#"
            DELETE FROM files
            WHERE id = $1
            "#,
        )
        .bind(file.id)
        .execute(&self.pool)
        .await?;

        Ok(file)
    }
}
