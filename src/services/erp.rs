// src/services/erp.rs
//
// Cliente do ERP. Só leitura: procura fornecedor por CNPJ e consulta se um
// documento já foi integrado.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::common::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpDocumentStatus {
    pub integrated: bool,
    pub message: Option<String>,
}

#[async_trait]
pub trait ErpDirectory: Send + Sync {
    /// Código do fornecedor no ERP, ou `None` se o CNPJ não estiver cadastrado.
    async fn find_supplier_code(&self, cnpj: &str) -> Result<Option<String>, AppError>;

    async fn document_status(&self, access_key: &str) -> Result<ErpDocumentStatus, AppError>;
}

#[derive(Debug, Deserialize)]
struct SupplierResponse {
    codigo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentStatusResponse {
    integrado: bool,
    mensagem: Option<String>,
}

pub struct HttpErpClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpErpClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Erp(format!("falha ao criar cliente HTTP: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ErpDirectory for HttpErpClient {
    async fn find_supplier_code(&self, cnpj: &str) -> Result<Option<String>, AppError> {
        let response = self
            .get("/fornecedores")
            .query(&[("cnpj", cnpj)])
            .send()
            .await
            .map_err(|e| AppError::Erp(format!("consulta de fornecedor falhou: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::Erp(format!(
                "consulta de fornecedor retornou {}",
                response.status()
            )));
        }

        let body: SupplierResponse = response
            .json()
            .await
            .map_err(|e| AppError::Erp(format!("resposta de fornecedor inválida: {e}")))?;
        Ok(body.codigo.filter(|c| !c.trim().is_empty()))
    }

    async fn document_status(&self, access_key: &str) -> Result<ErpDocumentStatus, AppError> {
        let response = self
            .get(&format!("/documentos/{access_key}/status"))
            .send()
            .await
            .map_err(|e| AppError::Erp(format!("consulta de documento falhou: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ErpDocumentStatus {
                integrated: false,
                message: Some("Documento não encontrado no ERP".to_string()),
            });
        }
        if !response.status().is_success() {
            return Err(AppError::Erp(format!(
                "consulta de documento retornou {}",
                response.status()
            )));
        }

        let body: DocumentStatusResponse = response
            .json()
            .await
            .map_err(|e| AppError::Erp(format!("resposta de documento inválida: {e}")))?;
        Ok(ErpDocumentStatus {
            integrated: body.integrado,
            message: body.mensagem,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_removed() {
        let client = HttpErpClient::new("https://erp.local/api/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "https://erp.local/api");
    }

    #[test]
    fn parses_erp_payloads() {
        let supplier: SupplierResponse = serde_json::from_str(r#"{"codigo":"F-0042"}"#).unwrap();
        assert_eq!(supplier.codigo.as_deref(), Some("F-0042"));

        let status: DocumentStatusResponse =
            serde_json::from_str(r#"{"integrado":true,"mensagem":"Lançado em 10/04"}"#).unwrap();
        assert!(status.integrado);
        assert_eq!(status.mensagem.as_deref(), Some("Lançado em 10/04"));

        let status: DocumentStatusResponse = serde_json::from_str(r#"{"integrado":false}"#).unwrap();
        assert_eq!(status.mensagem, None);
    }
}
