// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::{CompanyRepository, DashboardRepository, SupplierRepository},
    models::dashboard::{DashboardStats, MonthlyEntry, TopSupplierEntry},
};

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    supplier_repo: SupplierRepository,
    company_repo: CompanyRepository,
}

impl DashboardService {
    pub fn new(
        repo: DashboardRepository,
        supplier_repo: SupplierRepository,
        company_repo: CompanyRepository,
    ) -> Self {
        Self {
            repo,
            supplier_repo,
            company_repo,
        }
    }

    pub async fn get_stats(&self) -> Result<DashboardStats, AppError> {
        let (nfe, nfse, (suppliers_total, suppliers_registered), companies_total) = tokio::try_join!(
            self.repo.nfe_counts(),
            self.repo.nfse_counts(),
            self.supplier_repo.count_by_registration(),
            self.company_repo.count(),
        )?;

        Ok(DashboardStats {
            nfe,
            nfse,
            suppliers_total,
            suppliers_registered,
            suppliers_unregistered: suppliers_total - suppliers_registered,
            companies_total,
        })
    }

    pub async fn get_monthly(&self) -> Result<Vec<MonthlyEntry>, AppError> {
        self.repo.monthly().await
    }

    pub async fn get_top_suppliers(&self) -> Result<Vec<TopSupplierEntry>, AppError> {
        self.repo.top_suppliers().await
    }
}
