//! `PostgreSQL` queries for accounts.

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, QueryBuilder};

use store_rating_core::{Address, Email, Role, SortSpec, UserId};

use super::{
    PgRepository, RepositoryError, UserRepository, contains_pattern, map_write_error, parse_email,
};
use crate::models::{NewUser, User, UserFilter, UserSortField};

const USER_COLUMNS: &str = "id, name, email, address, role";

#[derive(FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    address: Option<String>,
    role: Role,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email: parse_email(&row.email)?,
            address: row.address,
            role: row.role,
        })
    }
}

#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (name, email, password_hash, address, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, address, role
            ",
        )
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.address.as_ref().map(Address::as_str))
        .bind(user.role)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, "email already exists", "invalid user reference"))?;

        User::try_from(row)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some((User::try_from(row.user)?, row.password_hash)))
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(hash)
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        sort: Option<SortSpec<UserSortField>>,
    ) -> Result<Vec<User>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));

        if let Some(name) = &filter.name {
            query.push(" AND name ILIKE ").push_bind(contains_pattern(name));
        }
        if let Some(email) = &filter.email {
            query.push(" AND email = ").push_bind(email.clone());
        }
        if let Some(role) = filter.role {
            query.push(" AND role = ").push_bind(role);
        }

        match sort {
            Some(spec) => {
                query
                    .push(" ORDER BY ")
                    .push(spec.field.column())
                    .push(" ")
                    .push(spec.direction.as_sql())
                    .push(", id ASC");
            }
            None => {
                query.push(" ORDER BY id ASC");
            }
        }

        let rows = query
            .build_query_as::<UserRow>()
            .fetch_all(self.pool())
            .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }
}
