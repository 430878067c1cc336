// src/db/nfse_repo.rs

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
    models::document::{DocumentListQuery, IntegrationStatus, NewNfseDocument, NfseDocument},
};

const COLUMNS: &str = "id, number, verification_code, provider_cnpj, provider_name, taker_cnpj, \
    taker_name, municipality, issue_date, service_value, iss_value, net_value, status, erp_message, \
    supplier_id, created_at, updated_at";

const SEARCH_COLUMNS: [&str; 4] = ["number", "verification_code", "provider_name", "taker_name"];

sort_fields!(NfseSort, default = IssueDate, direction = Desc, {
    IssueDate => "issueDate": "issue_date",
    Number => "number": "number",
    ProviderName => "providerName": "provider_name",
    ServiceValue => "serviceValue": "service_value",
    NetValue => "netValue": "net_value",
    Status => "status": "status",
    CreatedAt => "createdAt": "created_at",
});

fn filtered(select: &str, query: &DocumentListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM nfse_documents WHERE 1=1"));
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(cnpj) = query.issuer_cnpj.as_deref().map(only_digits).filter(|c| !c.is_empty()) {
        qb.push(" AND provider_cnpj = ").push_bind(cnpj);
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
    Sort::<NfseSort>::from_params(query.sort_by.as_deref(), query.sort_order.as_deref())
        .push_order_by(&mut qb);
    push_page(&mut qb, page);
    qb
}

pub(crate) fn count_query(query: &DocumentListQuery) -> QueryBuilder<'static, Postgres> {
    filtered("COUNT(*)", query)
}

#[derive(Clone)]
pub struct NfseRepository {
    pool: PgPool,
}

impl NfseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &DocumentListQuery,
        page: Page,
    ) -> Result<(Vec<NfseDocument>, i64), AppError> {
        let items = list_query(query, page)
            .build_query_as::<NfseDocument>()
            .fetch_all(&self.pool)
            .await?;
        let total = count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok((items, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<NfseDocument>, AppError> {
        let doc = sqlx::query_as::<_, NfseDocument>(&format!(
            "SELECT {COLUMNS} FROM nfse_documents WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    /// (número, XML)
    pub async fn find_xml(&self, id: Uuid) -> Result<Option<(String, String)>, AppError> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT number, xml_content FROM nfse_documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn insert(&self, doc: &NewNfseDocument) -> Result<NfseDocument, AppError> {
        sqlx::query_as::<_, NfseDocument>(&format!(
            "INSERT INTO nfse_documents (number, verification_code, provider_cnpj, provider_name, \
             taker_cnpj, taker_name, municipality, issue_date, service_value, iss_value, net_value, \
             xml_content, supplier_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING {COLUMNS}"
        ))
        .bind(&doc.number)
        .bind(doc.verification_code.as_deref())
        .bind(&doc.provider_cnpj)
        .bind(&doc.provider_name)
        .bind(doc.taker_cnpj.as_deref())
        .bind(doc.taker_name.as_deref())
        .bind(doc.municipality.as_deref())
        .bind(doc.issue_date)
        .bind(doc.service_value)
        .bind(doc.iss_value)
        .bind(doc.net_value)
        .bind(&doc.xml_content)
        .bind(doc.supplier_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "NFSe com este número já foi importada para este prestador."))
    }

    pub async fn link_supplier(&self, id: Uuid, supplier_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE nfse_documents SET supplier_id = $1, updated_at = NOW() WHERE id = $2")
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
    ) -> Result<Option<NfseDocument>, AppError> {
        let doc = sqlx::query_as::<_, NfseDocument>(&format!(
            "UPDATE nfse_documents SET status = $1, erp_message = $2, updated_at = NOW() \
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
        let result = sqlx::query("DELETE FROM nfse_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_target_provider_columns() {
        let q = DocumentListQuery {
            status: Some(IntegrationStatus::NotIntegrated),
            issuer_cnpj: Some("11222333000181".into()),
            search: Some("manutenção".into()),
            ..Default::default()
        };
        assert_eq!(
            count_query(&q).sql(),
            "SELECT COUNT(*) FROM nfse_documents WHERE 1=1 AND status = $1 AND provider_cnpj = $2 \
             AND (number ILIKE $3 OR verification_code ILIKE $4 OR provider_name ILIKE $5 \
             OR taker_name ILIKE $6)"
        );
    }

    #[test]
    fn sort_by_net_value() {
        let q = DocumentListQuery {
            sort_by: Some("netValue".into()),
            sort_order: Some("ASC".into()),
            ..Default::default()
        };
        assert!(list_query(&q, Page::default()).sql().contains("ORDER BY net_value ASC, id ASC"));
    }
}
