// src/db/dashboard_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::dashboard::{MonthlyEntry, StatusCounts, TopSupplierEntry},
};

// Tabela e coluna de valor são fixas (nunca vêm do cliente)
fn status_counts_sql(table: &str, value_column: &str) -> String {
    format!(
        "SELECT \
            COUNT(*) AS total, \
            COUNT(*) FILTER (WHERE status = 'pending') AS pending, \
            COUNT(*) FILTER (WHERE status = 'integrated') AS integrated, \
            COUNT(*) FILTER (WHERE status = 'not_integrated') AS not_integrated, \
            COALESCE(SUM({value_column}), 0) AS total_value \
         FROM {table}"
    )
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn nfe_counts(&self) -> Result<StatusCounts, AppError> {
        let counts = sqlx::query_as::<_, StatusCounts>(&status_counts_sql("nfe_documents", "total_value"))
            .fetch_one(&self.pool)
            .await?;
        Ok(counts)
    }

    pub async fn nfse_counts(&self) -> Result<StatusCounts, AppError> {
        let counts = sqlx::query_as::<_, StatusCounts>(&status_counts_sql("nfse_documents", "service_value"))
            .fetch_one(&self.pool)
            .await?;
        Ok(counts)
    }

    // Últimos 12 meses, incluindo meses sem documento
    pub async fn monthly(&self) -> Result<Vec<MonthlyEntry>, AppError> {
        let data = sqlx::query_as::<_, MonthlyEntry>(
            r#"
            WITH months AS (
                SELECT to_char(date_trunc('month', CURRENT_DATE) - make_interval(months => n), 'YYYY-MM') AS month
                FROM generate_series(0, 11) AS n
            ),
            nfe AS (
                SELECT to_char(issue_date, 'YYYY-MM') AS month, COUNT(*) AS cnt, SUM(total_value) AS total
                FROM nfe_documents
                WHERE issue_date >= date_trunc('month', CURRENT_DATE) - INTERVAL '11 months'
                GROUP BY 1
            ),
            nfse AS (
                SELECT to_char(issue_date, 'YYYY-MM') AS month, COUNT(*) AS cnt, SUM(service_value) AS total
                FROM nfse_documents
                WHERE issue_date >= date_trunc('month', CURRENT_DATE) - INTERVAL '11 months'
                GROUP BY 1
            )
            SELECT
                m.month AS month,
                COALESCE(nfe.cnt, 0) AS nfe_count,
                COALESCE(nfe.total, 0) AS nfe_value,
                COALESCE(nfse.cnt, 0) AS nfse_count,
                COALESCE(nfse.total, 0) AS nfse_value
            FROM months m
            LEFT JOIN nfe ON nfe.month = m.month
            LEFT JOIN nfse ON nfse.month = m.month
            ORDER BY m.month ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }

    // Top 5 emitentes/prestadores por valor somado
    pub async fn top_suppliers(&self) -> Result<Vec<TopSupplierEntry>, AppError> {
        let data = sqlx::query_as::<_, TopSupplierEntry>(
            r#"
            SELECT
                d.cnpj AS cnpj,
                MAX(d.name) AS name,
                COUNT(*) AS document_count,
                COALESCE(SUM(d.value), 0) AS total_value
            FROM (
                SELECT issuer_cnpj AS cnpj, issuer_name AS name, total_value AS value FROM nfe_documents
                UNION ALL
                SELECT provider_cnpj, provider_name, service_value FROM nfse_documents
            ) d
            GROUP BY d.cnpj
            ORDER BY total_value DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_counts_cover_every_status() {
        let sql = status_counts_sql("nfe_documents", "total_value");
        for status in ["pending", "integrated", "not_integrated"] {
            assert!(sql.contains(&format!("status = '{status}'")));
        }
        assert!(sql.ends_with("FROM nfe_documents"));
    }
}
