// src/db/nfe_repo.rs

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
    models::document::{DocumentListQuery, IntegrationStatus, NewNfeDocument, NfeDocument},
};

const COLUMNS: &str = "id, access_key, number, series, issuer_cnpj, issuer_name, recipient_cnpj, \
    recipient_name, issue_date, total_value, status, erp_message, supplier_id, created_at, updated_at";

const SEARCH_COLUMNS: [&str; 4] = ["number", "access_key", "issuer_name", "recipient_name"];

sort_fields!(NfeSort, default = IssueDate, direction = Desc, {
    IssueDate => "issueDate": "issue_date",
    Number => "number": "number",
    IssuerName => "issuerName": "issuer_name",
    TotalValue => "totalValue": "total_value",
    Status => "status": "status",
    CreatedAt => "createdAt": "created_at",
});

fn filtered(select: &str, query: &DocumentListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM nfe_documents WHERE 1=1"));
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(cnpj) = query.issuer_cnpj.as_deref().map(only_digits).filter(|c| !c.is_empty()) {
        qb.push(" AND issuer_cnpj = ").push_bind(cnpj);
    }
    if let Some(from) = query.date_from {
        qb.push(" AND issue_date >= ").push_bind(from);
    }
    if let Some(to) = query.date_to {
        qb.push(" AND issue_date <= ").push_bind(to);
    }
    push_search(&mut qb, &SEARCH_COLUMNS, query.search.as_deref());
    qb
}

pub(crate) fn list_query(query: &DocumentListQuery, page: Page) -> QueryBuilder<'static, Postgres> {
    let mut qb = filtered(COLUMNS, query);
    Sort::<NfeSort>::from_params(query.sort_by.as_deref(), query.sort_order.as_deref())
        .push_order_by(&mut qb);
    push_page(&mut qb, page);
    qb
}

pub(crate) fn count_query(query: &DocumentListQuery) -> QueryBuilder<'static, Postgres> {
    filtered("COUNT(*)", query)
}

#[derive(Clone)]
pub struct NfeRepository {
    pool: PgPool,
}

impl NfeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &DocumentListQuery,
        page: Page,
    ) -> Result<(Vec<NfeDocument>, i64), AppError> {
        let items = list_query(query, page)
            .build_query_as::<NfeDocument>()
            .fetch_all(&self.pool)
            .await?;
        let total = count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok((items, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<NfeDocument>, AppError> {
        let doc = sqlx::query_as::<_, NfeDocument>(&format!(
            "SELECT {COLUMNS} FROM nfe_documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    pub async fn find_xml(&self, id: Uuid) -> Result<Option<(String, String)>, AppError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT access_key, xml_content FROM nfe_documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn insert(&self, doc: &NewNfeDocument) -> Result<NfeDocument, AppError> {
        sqlx::query_as::<_, NfeDocument>(&format!(
            "INSERT INTO nfe_documents (access_key, number, series, issuer_cnpj, issuer_name, \
             recipient_cnpj, recipient_name, issue_date, total_value, xml_content, supplier_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {COLUMNS}"
        ))
        .bind(&doc.access_key)
        .bind(&doc.number)
        .bind(doc.series.as_deref())
        .bind(&doc.issuer_cnpj)
        .bind(&doc.issuer_name)
        .bind(doc.recipient_cnpj.as_deref())
        .bind(doc.recipient_name.as_deref())
        .bind(doc.issue_date)
        .bind(doc.total_value)
        .bind(&doc.xml_content)
        .bind(doc.supplier_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "NFe com esta chave de acesso já foi importada."))
    }

    pub async fn link_supplier(&self, id: Uuid, supplier_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE nfe_documents SET supplier_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(supplier_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: IntegrationStatus,
        erp_message: Option<&str>,
    ) -> Result<Option<NfeDocument>, AppError> {
        let doc = sqlx::query_as::<_, NfeDocument>(&format!(
            "UPDATE nfe_documents SET status = $1, erp_message = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {COLUMNS}"
        ))
        .bind(status)
        .bind(erp_message)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM nfe_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
