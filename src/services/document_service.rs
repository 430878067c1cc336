// src/services/document_service.rs
//
// Consulta, status, XML e PDF das NFe e NFSe já importadas.

use std::sync::Arc;

use uuid::Uuid;

use super::erp::ErpDirectory;
use crate::{
    common::{
        error::AppError,
        pagination::{Page, Paginated},
    },
    db::{NfeRepository, NfseRepository},
    fiscal::{extract_nfe, extract_nfse},
    models::document::{
        DocumentListQuery, ErpCheckResult, IntegrationStatus, NfeDocument, NfseDocument,
        UpdateStatusPayload,
    },
    render::{danfe, danfse, PdfRenderer},
};

/// Arquivo pronto para download.
pub struct FileDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct DocumentService {
    nfe_repo: NfeRepository,
    nfse_repo: NfseRepository,
    renderer: PdfRenderer,
    erp: Option<Arc<dyn ErpDirectory>>,
    danfe_max_items: usize,
}

impl DocumentService {
    pub fn new(
        nfe_repo: NfeRepository,
        nfse_repo: NfseRepository,
        renderer: PdfRenderer,
        erp: Option<Arc<dyn ErpDirectory>>,
        danfe_max_items: usize,
    ) -> Self {
        Self {
            nfe_repo,
            nfse_repo,
            renderer,
            erp,
            danfe_max_items,
        }
    }

    // --- NFe ---

    pub async fn list_nfe(&self, query: &DocumentListQuery) -> Result<Paginated<NfeDocument>, AppError> {
        let page = Page::new(query.page, query.limit);
        let (items, total) = self.nfe_repo.list(query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get_nfe(&self, id: Uuid) -> Result<NfeDocument, AppError> {
        self.nfe_repo.find_by_id(id).await?.ok_or(AppError::NotFound("NFe"))
    }

    pub async fn nfe_xml(&self, id: Uuid) -> Result<FileDownload, AppError> {
        let (access_key, xml) = self.nfe_repo.find_xml(id).await?.ok_or(AppError::NotFound("NFe"))?;
        Ok(FileDownload {
            file_name: format!("NFe{access_key}.xml"),
            bytes: xml.into_bytes(),
        })
    }

    pub async fn nfe_danfe(&self, id: Uuid) -> Result<FileDownload, AppError> {
        let (access_key, xml) = self.nfe_repo.find_xml(id).await?.ok_or(AppError::NotFound("NFe"))?;
        let data = extract_nfe(xml.as_bytes())?;
        let template = danfe::layout(&data, self.danfe_max_items);
        let bytes = self.renderer.render_blocking(template).await?;
        Ok(FileDownload {
            file_name: format!("DANFE-{access_key}.pdf"),
            bytes,
        })
    }

    pub async fn update_nfe_status(&self, id: Uuid, payload: &UpdateStatusPayload) -> Result<NfeDocument, AppError> {
        self.nfe_repo
            .update_status(id, payload.status, payload.erp_message.as_deref())
            .await?
            .ok_or(AppError::NotFound("NFe"))
    }

    /// Pergunta ao ERP se a nota já foi lançada e grava o resultado.
    pub async fn check_nfe_erp(&self, id: Uuid) -> Result<ErpCheckResult, AppError> {
        let erp = self
            .erp
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Integração com o ERP não configurada.".into()))?;
        let doc = self.get_nfe(id).await?;

        let status = erp.document_status(&doc.access_key).await?;
        let new_status = if status.integrated {
            IntegrationStatus::Integrated
        } else {
            IntegrationStatus::NotIntegrated
        };
        let document = self
            .nfe_repo
            .update_status(id, new_status, status.message.as_deref())
            .await?
            .ok_or(AppError::NotFound("NFe"))?;

        tracing::info!(document_id = %id, integrated = status.integrated, "Status no ERP consultado");
        Ok(ErpCheckResult {
            integrated: status.integrated,
            message: status.message,
            document,
        })
    }

    pub async fn delete_nfe(&self, id: Uuid) -> Result<(), AppError> {
        if self.nfe_repo.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("NFe"))
        }
    }

    // --- NFSe ---

    pub async fn list_nfse(&self, query: &DocumentListQuery) -> Result<Paginated<NfseDocument>, AppError> {
        let page = Page::new(query.page, query.limit);
        let (items, total) = self.nfse_repo.list(query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get_nfse(&self, id: Uuid) -> Result<NfseDocument, AppError> {
        self.nfse_repo.find_by_id(id).await?.ok_or(AppError::NotFound("NFS-e"))
    }

    pub async fn nfse_xml(&self, id: Uuid) -> Result<FileDownload, AppError> {
        let (number, xml) = self.nfse_repo.find_xml(id).await?.ok_or(AppError::NotFound("NFS-e"))?;
        Ok(FileDownload {
            file_name: format!("NFSe-{number}.xml"),
            bytes: xml.into_bytes(),
        })
    }

    pub async fn nfse_danfse(&self, id: Uuid) -> Result<FileDownload, AppError> {
        let (number, xml) = self.nfse_repo.find_xml(id).await?.ok_or(AppError::NotFound("NFS-e"))?;
        let data = extract_nfse(xml.as_bytes())?;
        let bytes = self.renderer.render_blocking(danfse::layout(&data)).await?;
        Ok(FileDownload {
            file_name: format!("DANFSe-{number}.pdf"),
            bytes,
        })
    }

    /// DANFSe direto do XML enviado, sem gravar nada.
    pub async fn preview_danfse(&self, raw: &[u8]) -> Result<FileDownload, AppError> {
        let data = extract_nfse(raw)?;
        let template = danfse::layout(&data);
        let bytes = self.renderer.render_blocking(template).await?;
        let number = if data.number.is_empty() { "preview".to_string() } else { data.number };
        Ok(FileDownload {
            file_name: format!("DANFSe-{number}.pdf"),
            bytes,
        })
    }

    pub async fn update_nfse_status(&self, id: Uuid, payload: &UpdateStatusPayload) -> Result<NfseDocument, AppError> {
        self.nfse_repo
            .update_status(id, payload.status, payload.erp_message.as_deref())
            .await?
            .ok_or(AppError::NotFound("NFS-e"))
    }

    pub async fn delete_nfse(&self, id: Uuid) -> Result<(), AppError> {
        if self.nfse_repo.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("NFS-e"))
        }
    }
}
