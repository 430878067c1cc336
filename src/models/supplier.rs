// src/models/supplier.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_cnpj_or_cpf, validate_uf};

/// Fornecedor. Ter `erp_code` é o que define "cadastrado no ERP".
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub cnpj: String,
    pub erp_code: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    pub fn is_registered_in_erp(&self) -> bool {
        self.erp_code.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    pub name: String,

    /// CNPJ ou CPF (prestadores pessoa física)
    #[validate(custom(function = "validate_cnpj_or_cpf"))]
    pub cnpj: String,

    #[validate(length(min = 1, max = 50, message = "Código ERP inválido."))]
    pub erp_code: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub city: Option<String>,

    #[validate(custom(function = "validate_uf"))]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErpStatusFilter {
    Registered,
    Unregistered,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SupplierListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Busca em nome, CNPJ e código ERP
    pub search: Option<String>,
    pub erp_status: Option<ErpStatusFilter>,
    /// name, cnpj, erpCode, city, createdAt
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Dados mínimos para o upsert feito pela importação.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierUpsert {
    pub name: String,
    pub cnpj: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Resultado de `POST /fornecedores/{id}/sync-erp`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierSyncResult {
    /// `true` quando o CNPJ foi encontrado no ERP
    pub found: bool,
    pub supplier: Supplier,
}
