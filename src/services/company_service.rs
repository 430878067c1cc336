// src/services/company_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, Paginated},
    },
    db::CompanyRepository,
    models::company::{Company, CompanyListQuery, CompanyPayload},
};

#[derive(Clone)]
pub struct CompanyService {
    repo: CompanyRepository,
}

impl CompanyService {
    pub fn new(repo: CompanyRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, query: &CompanyListQuery) -> Result<Paginated<Company>, AppError> {
        let page = Page::new(query.page, query.limit);
        let (items, total) = self.repo.list(query, page).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, id: Uuid) -> Result<Company, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Empresa"))
    }

    pub async fn create(&self, payload: &CompanyPayload) -> Result<Company, AppError> {
        let company = self.repo.create(payload).await?;
        tracing::info!(company_id = %company.id, cnpj = %company.cnpj, "🏢 Empresa cadastrada");
        Ok(company)
    }

    pub async fn update(&self, id: Uuid, payload: &CompanyPayload) -> Result<Company, AppError> {
        self.repo
            .update(id, payload)
            .await?
            .ok_or(AppError::NotFound("Empresa"))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Empresa"))
        }
    }
}
