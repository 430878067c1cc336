// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub integrated: i64,
    pub not_integrated: i64,
    pub total_value: Decimal,
}

// Os cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub nfe: StatusCounts,
    pub nfse: StatusCounts,
    pub suppliers_total: i64,
    pub suppliers_registered: i64,
    pub suppliers_unregistered: i64,
    pub companies_total: i64,
}

// Série mensal: sempre 12 linhas, meses sem documento vêm zerados
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEntry {
    /// `YYYY-MM`
    pub month: String,
    pub nfe_count: i64,
    pub nfe_value: Decimal,
    pub nfse_count: i64,
    pub nfse_value: Decimal,
}

// Top 5 emitentes por valor
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopSupplierEntry {
    pub cnpj: String,
    pub name: String,
    pub document_count: i64,
    pub total_value: Decimal,
}
