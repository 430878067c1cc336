// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::fiscal;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Companies ---
        handlers::companies::list_companies,
        handlers::companies::get_company,
        handlers::companies::create_company,
        handlers::companies::update_company,
        handlers::companies::delete_company,

        // --- Suppliers ---
        handlers::suppliers::list_suppliers,
        handlers::suppliers::get_supplier,
        handlers::suppliers::create_supplier,
        handlers::suppliers::update_supplier,
        handlers::suppliers::delete_supplier,
        handlers::suppliers::sync_supplier_erp,

        // --- NFe ---
        handlers::documents::list_nfe,
        handlers::documents::get_nfe,
        handlers::documents::get_nfe_xml,
        handlers::documents::get_nfe_danfe,
        handlers::documents::update_nfe_status,
        handlers::documents::check_nfe_erp,
        handlers::documents::delete_nfe,
        handlers::documents::import_nfe,

        // --- NFSe ---
        handlers::documents::list_nfse,
        handlers::documents::get_nfse,
        handlers::documents::get_nfse_xml,
        handlers::documents::get_nfse_danfse,
        handlers::documents::preview_nfse,
        handlers::documents::update_nfse_status,
        handlers::documents::delete_nfse,
        handlers::documents::import_nfse,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_monthly,
        handlers::dashboard::get_top_suppliers,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::user::CreateUserPayload,
            models::user::UpdateUserPayload,

            // --- Cadastros ---
            models::company::Company,
            models::company::CompanyPayload,
            models::supplier::Supplier,
            models::supplier::SupplierPayload,
            models::supplier::ErpStatusFilter,
            models::supplier::SupplierSyncResult,

            // --- Documentos ---
            models::document::IntegrationStatus,
            models::document::NfeDocument,
            models::document::NfseDocument,
            models::document::UpdateStatusPayload,
            models::document::ErpCheckResult,
            models::document::ImportOutcome,
            models::document::ImportReport,
            handlers::documents::XmlUpload,

            // --- Dados extraídos do XML ---
            fiscal::Party,
            fiscal::Address,
            fiscal::NfseData,

            // --- Dashboard ---
            models::dashboard::StatusCounts,
            models::dashboard::DashboardStats,
            models::dashboard::MonthlyEntry,
            models::dashboard::TopSupplierEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Login e usuário atual"),
        (name = "Users", description = "Gestão de usuários (admin)"),
        (name = "Companies", description = "Empresas do grupo"),
        (name = "Suppliers", description = "Fornecedores e vínculo com o ERP"),
        (name = "NFe", description = "NFe importadas, XML e DANFE"),
        (name = "NFSe", description = "NFS-e recebidas, XML e DANFSe"),
        (name = "Dashboard", description = "Indicadores e séries mensais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
