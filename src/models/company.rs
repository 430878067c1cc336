// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_cnpj, validate_uf};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub cnpj: String,
    pub state_registration: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Usado tanto no POST quanto no PUT (substituição completa)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPayload {
    #[validate(length(min = 1, max = 200, message = "A razão social é obrigatória."))]
    pub legal_name: String,

    pub trade_name: Option<String>,

    #[validate(custom(function = "validate_cnpj"))]
    pub cnpj: String,

    pub state_registration: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,

    #[validate(custom(function = "validate_uf"))]
    pub state: Option<String>,

    #[validate(length(min = 8, max = 9, message = "CEP inválido."))]
    pub zip_code: Option<String>,

    pub phone: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CompanyListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Busca em razão social, nome fantasia, CNPJ e cidade
    pub search: Option<String>,
    /// legalName, tradeName, cnpj, city, createdAt
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}
