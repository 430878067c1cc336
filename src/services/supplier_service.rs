// src/services/supplier_service.rs

use std::sync::Arc;

use uuid::Uuid;

use super::erp::ErpDirectory;
use crate::{
    common::{
        error::AppError,
        pagination::{Page, Paginated},
    },
    db::SupplierRepository,
    models::supplier::{Supplier, SupplierListQuery, SupplierPayload, SupplierSyncResult},
};

#[derive(Clone)]
pub struct SupplierService {
    repo: SupplierRepository,
    erp: Option<Arc<dyn ErpDirectory>>,
}

impl SupplierService {
    pub fn new(repo: SupplierRepository, erp: Option<Arc<dyn ErpDirectory>>) -> Self {
        Self { repo, erp }
    }

    pub async fn list(&self, query: &SupplierListQuery) -> Result<Paginated<Supplier>, AppError> {
        let page = Page::new(query.page, query.limit);
        let (items, total) = self.repo.list(query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, id: Uuid) -> Result<Supplier, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Fornecedor"))
    }

    pub async fn create(&self, payload: &SupplierPayload) -> Result<Supplier, AppError> {
        self.repo.create(payload).await
    }

    pub async fn update(&self, id: Uuid, payload: &SupplierPayload) -> Result<Supplier, AppError> {
        self.repo
            .update(id, payload)
            .await?
            .ok_or(AppError::NotFound("Fornecedor"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Fornecedor"))
        }
    }

    /// Consulta o CNPJ no ERP e grava o código quando encontrado.
    /// Um fornecedor não encontrado fica como está.
    pub async fn sync_erp(&self, id: Uuid) -> Result<SupplierSyncResult, AppError> {
        let erp = self
            .erp
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Integração com o ERP não configurada.".into()))?;
        let supplier = self.get(id).await?;

        match erp.find_supplier_code(&supplier.cnpj).await? {
            Some(code) => {
                let updated = self
                    .repo
                    .set_erp_code(id, &code)
                    .await?
                    .ok_or(AppError::NotFound("Fornecedor"))?;
                tracing::info!(supplier_id = %id, erp_code = %code, "🔗 Fornecedor sincronizado com o ERP");
                Ok(SupplierSyncResult { found: true, supplier: updated })
            }
            None => {
                tracing::info!(supplier_id = %id, cnpj = %supplier.cnpj, "Fornecedor não encontrado no ERP");
                Ok(SupplierSyncResult { found: false, supplier })
            }
        }
    }
}
