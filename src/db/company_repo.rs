// src/db/company_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::query::{push_page, push_search};
use crate::{
    common::{
        error::{map_unique_violation, AppError},
        format::only_digits,
        pagination::Page,
        sorting::{sort_fields, Sort},
    },
    models::company::{Company, CompanyListQuery, CompanyPayload},
};

const COLUMNS: &str = "id, legal_name, trade_name, cnpj, state_registration, street, number, \
    complement, district, city, state, zip_code, phone, email, created_at, updated_at";

const SEARCH_COLUMNS: [&str; 4] = ["legal_name", "trade_name", "cnpj", "city"];

sort_fields!(CompanySort, default = LegalName, direction = Asc, {
    LegalName => "legalName": "legal_name",
    TradeName => "tradeName": "trade_name",
    Cnpj => "cnpj": "cnpj",
    City => "city": "city",
    CreatedAt => "createdAt": "created_at",
});

fn filtered(select: &str, query: &CompanyListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM companies WHERE 1=1"));
    push_search(&mut qb, &SEARCH_COLUMNS, query.search.as_deref());
    qb
}

pub(crate) fn list_query(query: &CompanyListQuery, page: Page) -> QueryBuilder<'static, Postgres> {
    let mut qb = filtered(COLUMNS, query);
    Sort::<CompanySort>::from_params(query.sort_by.as_deref(), query.sort_order.as_deref())
        .push_order_by(&mut qb);
    push_page(&mut qb, page);
    qb
}

pub(crate) fn count_query(query: &CompanyListQuery) -> QueryBuilder<'static, Postgres> {
    filtered("COUNT(*)", query)
}

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &CompanyListQuery,
        page: Page,
    ) -> Result<(Vec<Company>, i64), AppError> {
        let items = list_query(query, page)
            .build_query_as::<Company>()
            .fetch_all(&self.pool)
            .await?;
        let total = count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok((items, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(&format!("SELECT {COLUMNS} FROM companies WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn create(&self, payload: &CompanyPayload) -> Result<Company, AppError> {
        let sql = format!(
            "INSERT INTO companies (legal_name, trade_name, cnpj, state_registration, street, number, \
             complement, district, city, state, zip_code, phone, email) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        bind_payload(sqlx::query_as::<_, Company>(&sql), payload)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Já existe uma empresa com este CNPJ."))
    }

    pub async fn update(&self, id: Uuid, payload: &CompanyPayload) -> Result<Option<Company>, AppError> {
        let sql = format!(
            "UPDATE companies SET legal_name = $1, trade_name = $2, cnpj = $3, state_registration = $4, \
             street = $5, number = $6, complement = $7, district = $8, city = $9, state = $10, \
             zip_code = $11, phone = $12, email = $13, updated_at = NOW() \
             WHERE id = $14 RETURNING {COLUMNS}"
        );
        bind_payload(sqlx::query_as::<_, Company>(&sql), payload)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Já existe uma empresa com este CNPJ."))
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

type CompanyQuery<'q> = sqlx::query::QueryAs<'q, Postgres, Company, sqlx::postgres::PgArguments>;

fn bind_payload<'q>(query: CompanyQuery<'q>, p: &CompanyPayload) -> CompanyQuery<'q> {
    query
        .bind(p.legal_name.trim().to_string())
        .bind(p.trade_name.clone())
        .bind(only_digits(&p.cnpj))
        .bind(p.state_registration.clone())
        .bind(p.street.clone())
        .bind(p.number.clone())
        .bind(p.complement.clone())
        .bind(p.district.clone())
        .bind(p.city.clone())
        .bind(p.state.clone())
        .bind(p.zip_code.as_deref().map(only_digits))
        .bind(p.phone.clone())
        .bind(p.email.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(search: Option<&str>, sort_by: Option<&str>) -> CompanyListQuery {
        CompanyListQuery {
            search: search.map(str::to_string),
            sort_by: sort_by.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn list_and_count_share_filters() {
        let q = query(Some("acme"), None);
        let list = list_query(&q, Page::default());
        let count = count_query(&q);
        assert_eq!(
            list.sql(),
            format!(
                "SELECT {COLUMNS} FROM companies WHERE 1=1 AND (legal_name ILIKE $1 OR trade_name ILIKE $2 \
                 OR cnpj ILIKE $3 OR city ILIKE $4) ORDER BY legal_name ASC, id ASC LIMIT $5 OFFSET $6"
            )
        );
        assert_eq!(
            count.sql(),
            "SELECT COUNT(*) FROM companies WHERE 1=1 AND (legal_name ILIKE $1 OR trade_name ILIKE $2 \
             OR cnpj ILIKE $3 OR city ILIKE $4)"
        );
    }

    #[test]
    fn unknown_sort_is_ignored() {
        let default_sql = list_query(&query(None, None), Page::default()).sql().to_string();
        let hostile = list_query(&query(None, Some("legal_name; DELETE FROM companies")), Page::default());
        assert_eq!(hostile.sql(), default_sql);
        let by_city = list_query(&query(None, Some("city")), Page::default());
        assert!(by_city.sql().contains("ORDER BY city ASC"));
    }
}
