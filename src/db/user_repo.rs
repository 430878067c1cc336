// src/db/user_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::query::{push_page, push_search};
use crate::{
    common::{
        error::AppError,
        pagination::Page,
        sorting::{sort_fields, Sort},
    },
    models::{
        auth::{User, UserRole},
        user::UserListQuery,
    },
};

const COLUMNS: &str = "id, name, email, password_hash, role, active, created_at, updated_at";

sort_fields!(UserSort, default = Name, direction = Asc, {
    Name => "name": "name",
    Email => "email": "email",
    Role => "role": "role",
    CreatedAt => "createdAt": "created_at",
});

fn filtered(select: &str, query: &UserListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM users WHERE 1=1"));
    if let Some(role) = query.role {
        qb.push(" AND role = ").push_bind(role);
    }
    if let Some(active) = query.active {
        qb.push(" AND active = ").push_bind(active);
    }
    push_search(&mut qb, &["name", "email"], query.search.as_deref());
    qb
}

pub(crate) fn list_query(query: &UserListQuery, page: Page) -> QueryBuilder<'static, Postgres> {
    let mut qb = filtered(COLUMNS, query);
    Sort::<UserSort>::from_params(query.sort_by.as_deref(), query.sort_order.as_deref())
        .push_order_by(&mut qb);
    push_page(&mut qb, page);
    qb
}

/// Alterações já validadas; `None` mantém o valor atual.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail (sem diferenciar maiúsculas)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn list(&self, query: &UserListQuery, page: Page) -> Result<(Vec<User>, i64), AppError> {
        let items = list_query(query, page)
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;
        let total = filtered("COUNT(*)", query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok((items, total))
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    // Cria um novo usuário; e-mail duplicado vira EmailAlreadyExists
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        ))
        .bind(name.trim())
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_email_violation)
    }

    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
                name = COALESCE($1, name), \
                email = COALESCE($2, email), \
                password_hash = COALESCE($3, password_hash), \
                role = COALESCE($4, role), \
                active = COALESCE($5, active), \
                updated_at = NOW() \
             WHERE id = $6 RETURNING {COLUMNS}"
        ))
        .bind(changes.name.map(|n| n.trim().to_string()))
        .bind(changes.email.map(|e| e.trim().to_lowercase()))
        .bind(changes.password_hash)
        .bind(changes.role)
        .bind(changes.active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_email_violation)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn map_email_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                // O nome padrão que o Postgres cria para "UNIQUE" na coluna email
                Some("users_email_key") | None => AppError::EmailAlreadyExists,
                Some(constraint) => AppError::UniqueConstraintViolation(constraint.to_string()),
            };
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_bind_role_and_active() {
        let q = UserListQuery {
            role: Some(UserRole::Admin),
            active: Some(true),
            search: Some("ana".into()),
            ..Default::default()
        };
        assert_eq!(
            list_query(&q, Page::default()).sql(),
            format!(
                "SELECT {COLUMNS} FROM users WHERE 1=1 AND role = $1 AND active = $2 \
                 AND (name ILIKE $3 OR email ILIKE $4) ORDER BY name ASC, id ASC LIMIT $5 OFFSET $6"
            )
        );
    }

    #[test]
    fn cannot_sort_by_password_hash() {
        let q = UserListQuery {
            sort_by: Some("password_hash".into()),
            ..Default::default()
        };
        assert!(list_query(&q, Page::default()).sql().contains("ORDER BY name ASC"));
    }
}
