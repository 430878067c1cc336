// src/db/supplier_repo.rs

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
    models::supplier::{ErpStatusFilter, Supplier, SupplierListQuery, SupplierPayload, SupplierUpsert},
};

const COLUMNS: &str = "id, name, cnpj, erp_code, email, phone, city, state, created_at, updated_at";

const SEARCH_COLUMNS: [&str; 3] = ["name", "cnpj", "erp_code"];

// "Cadastrado no ERP" = tem código ERP preenchido
const REGISTERED: &str = "(erp_code IS NOT NULL AND erp_code <> '')";

sort_fields!(SupplierSort, default = Name, direction = Asc, {
    Name => "name": "name",
    Cnpj => "cnpj": "cnpj",
    ErpCode => "erpCode": "erp_code",
    City => "city": "city",
    CreatedAt => "createdAt": "created_at",
});

fn filtered(select: &str, query: &SupplierListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM suppliers WHERE 1=1"));
    match query.erp_status {
        Some(ErpStatusFilter::Registered) => {
            qb.push(" AND ").push(REGISTERED);
        }
        Some(ErpStatusFilter::Unregistered) => {
            qb.push(" AND NOT ").push(REGISTERED);
        }
        None => {}
    }
    push_search(&mut qb, &SEARCH_COLUMNS, query.search.as_deref());
    qb
}

pub(crate) fn list_query(query: &SupplierListQuery, page: Page) -> QueryBuilder<'static, Postgres> {
    let mut qb = filtered(COLUMNS, query);
    Sort::<SupplierSort>::from_params(query.sort_by.as_deref(), query.sort_order.as_deref())
        .push_order_by(&mut qb);
    push_page(&mut qb, page);
    qb
}

pub(crate) fn count_query(query: &SupplierListQuery) -> QueryBuilder<'static, Postgres> {
    filtered("COUNT(*)", query)
}

#[derive(Clone)]
pub struct SupplierRepository {
    pool: PgPool,
}

impl SupplierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &SupplierListQuery,
        page: Page,
    ) -> Result<(Vec<Supplier>, i64), AppError> {
        let items = list_query(query, page)
            .build_query_as::<Supplier>()
            .fetch_all(&self.pool)
            .await?;
        let total = count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok((items, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("SELECT {COLUMNS} FROM suppliers WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    /// (total, cadastrados no ERP)
    pub async fn count_by_registration(&self) -> Result<(i64, i64), AppError> {
        let counts = sqlx::query_as::<_, (i64, i64)>(&format!(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE {REGISTERED}) FROM suppliers"
        ))
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn create(&self, payload: &SupplierPayload) -> Result<Supplier, AppError> {
        sqlx::query_as::<_, Supplier>(&format!(
            "INSERT INTO suppliers (name, cnpj, erp_code, email, phone, city, state) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}"
        ))
        .bind(payload.name.trim())
        .bind(only_digits(&payload.cnpj))
        .bind(payload.erp_code.as_deref().map(str::trim))
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.city.as_deref())
        .bind(payload.state.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um fornecedor com este CNPJ."))
    }

    pub async fn update(&self, id: Uuid, payload: &SupplierPayload) -> Result<Option<Supplier>, AppError> {
        sqlx::query_as::<_, Supplier>(&format!(
            "UPDATE suppliers SET name = $1, cnpj = $2, erp_code = $3, email = $4, phone = $5, \
             city = $6, state = $7, updated_at = NOW() WHERE id = $8 RETURNING {COLUMNS}"
        ))
        .bind(payload.name.trim())
        .bind(only_digits(&payload.cnpj))
        .bind(payload.erp_code.as_deref().map(str::trim))
        .bind(payload.email.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.city.as_deref())
        .bind(payload.state.as_deref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe um fornecedor com este CNPJ."))
    }

    pub async fn set_erp_code(&self, id: Uuid, erp_code: &str) -> Result<Option<Supplier>, AppError> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "UPDATE suppliers SET erp_code = $1, updated_at = NOW() WHERE id = $2 RETURNING {COLUMNS}"
        ))
        .bind(erp_code)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(supplier)
    }

    /// Cria o fornecedor pelo CNPJ ou completa os campos vazios do existente.
    /// Nunca apaga um código ERP já gravado.
    pub async fn upsert(&self, supplier: &SupplierUpsert) -> Result<Supplier, AppError> {
        let upserted = sqlx::query_as::<_, Supplier>(&format!(
            "INSERT INTO suppliers (name, cnpj, email, phone, city, state) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (cnpj) DO UPDATE SET \
                name = COALESCE(NULLIF(suppliers.name, ''), EXCLUDED.name), \
                email = COALESCE(suppliers.email, EXCLUDED.email), \
                phone = COALESCE(suppliers.phone, EXCLUDED.phone), \
                city = COALESCE(suppliers.city, EXCLUDED.city), \
                state = COALESCE(suppliers.state, EXCLUDED.state), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        ))
        .bind(&supplier.name)
        .bind(only_digits(&supplier.cnpj))
        .bind(supplier.email.as_deref())
        .bind(supplier.phone.as_deref())
        .bind(supplier.city.as_deref())
        .bind(supplier.state.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(upserted)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(erp_status: Option<ErpStatusFilter>, search: Option<&str>) -> SupplierListQuery {
        SupplierListQuery {
            erp_status,
            search: search.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn erp_status_filter_uses_erp_code_presence() {
        let registered = count_query(&query(Some(ErpStatusFilter::Registered), None));
        assert_eq!(
            registered.sql(),
            "SELECT COUNT(*) FROM suppliers WHERE 1=1 AND (erp_code IS NOT NULL AND erp_code <> '')"
        );
        let unregistered = count_query(&query(Some(ErpStatusFilter::Unregistered), Some("x")));
        assert_eq!(
            unregistered.sql(),
            "SELECT COUNT(*) FROM suppliers WHERE 1=1 AND NOT (erp_code IS NOT NULL AND erp_code <> '') \
             AND (name ILIKE $1 OR cnpj ILIKE $2 OR erp_code ILIKE $3)"
        );
    }

    #[test]
    fn sort_accepts_camel_case_and_falls_back() {
        let mut q = query(None, None);
        q.sort_by = Some("erpCode".into());
        q.sort_order = Some("desc".into());
        assert!(list_query(&q, Page::default()).sql().contains("ORDER BY erp_code DESC, id ASC"));

        q.sort_by = Some("password_hash".into());
        q.sort_order = None;
        assert!(list_query(&q, Page::default()).sql().contains("ORDER BY name ASC, id ASC"));
    }
}
