// src/models/document.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// Mapeia o CREATE TYPE integration_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "integration_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Pending,
    Integrated,
    NotIntegrated,
}

/// NFe armazenada. O XML fica de fora; é servido por `/xml`.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfeDocument {
    pub id: Uuid,
    pub access_key: String,
    pub number: String,
    pub series: Option<String>,
    pub issuer_cnpj: String,
    pub issuer_name: String,
    pub recipient_cnpj: Option<String>,
    pub recipient_name: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub total_value: Decimal,
    pub status: IntegrationStatus,
    pub erp_message: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// NFSe recebida (prestador -> tomador).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfseDocument {
    pub id: Uuid,
    pub number: String,
    pub verification_code: Option<String>,
    pub provider_cnpj: String,
    pub provider_name: String,
    pub taker_cnpj: Option<String>,
    pub taker_name: Option<String>,
    pub municipality: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub service_value: Decimal,
    pub iss_value: Decimal,
    pub net_value: Decimal,
    pub status: IntegrationStatus,
    pub erp_message: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Linha a inserir, montada a partir do XML extraído.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNfeDocument {
    pub access_key: String,
    pub number: String,
    pub series: Option<String>,
    pub issuer_cnpj: String,
    pub issuer_name: String,
    pub recipient_cnpj: Option<String>,
    pub recipient_name: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub total_value: Decimal,
    pub xml_content: String,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNfseDocument {
    pub number: String,
    pub verification_code: Option<String>,
    pub provider_cnpj: String,
    pub provider_name: String,
    pub taker_cnpj: Option<String>,
    pub taker_name: Option<String>,
    pub municipality: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub service_value: Decimal,
    pub iss_value: Decimal,
    pub net_value: Decimal,
    pub xml_content: String,
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DocumentListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Busca em número, chave/código de verificação, emitente e destinatário
    pub search: Option<String>,
    pub status: Option<IntegrationStatus>,
    /// CNPJ do emitente (NFe) ou do prestador (NFSe); aceita máscara
    pub issuer_cnpj: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: IntegrationStatus,
    pub erp_message: Option<String>,
}

/// Resultado de um arquivo dentro da importação em lote.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub file_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    /// Chave de acesso (NFe) ou número (NFSe)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<ImportOutcome>,
}

impl ImportReport {
    pub fn push(&mut self, outcome: ImportOutcome) {
        self.total += 1;
        if outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(outcome);
    }
}

/// Resultado de `POST /nfe-documents/{id}/check-erp`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErpCheckResult {
    pub integrated: bool,
    pub message: Option<String>,
    pub document: NfeDocument,
}
