pub mod auth;
pub mod company_service;
pub mod dashboard_service;
pub mod document_service;
pub mod erp;
pub mod import_service;
pub mod mailer;
pub mod supplier_service;
pub mod user_service;
