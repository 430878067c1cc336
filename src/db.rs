pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod nfe_repo;
pub use nfe_repo::NfeRepository;
pub mod nfse_repo;
pub use nfse_repo::NfseRepository;
pub mod supplier_repo;
pub use supplier_repo::SupplierRepository;
pub mod user_repo;
pub use user_repo::{UserChanges, UserRepository};

mod query;
