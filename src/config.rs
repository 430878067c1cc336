// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        CompanyRepository, DashboardRepository, NfeRepository, NfseRepository, SupplierRepository,
        UserRepository,
    },
    render::PdfRenderer,
    services::{
        auth::AuthService,
        company_service::CompanyService,
        dashboard_service::DashboardService,
        document_service::DocumentService,
        erp::{ErpDirectory, HttpErpClient},
        import_service::{ImportService, PgDocumentStore},
        mailer::{EmailProvider, HttpMailer, Mailer},
        supplier_service::SupplierService,
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (e do `.env`, quando existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub danfe_max_items: usize,
    pub erp_base_url: Option<String>,
    pub erp_token: Option<String>,
    pub http_timeout: Duration,
    pub email_provider: Option<EmailProvider>,
    pub email_api_key: Option<String>,
    pub email_from: Option<String>,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Variável vazia conta como ausente
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        fn parse<T: FromStr>(key: &str, value: Option<String>, default: T) -> anyhow::Result<T> {
            match value {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| anyhow!("{key} inválido: '{raw}'")),
                None => Ok(default),
            }
        }

        let email_provider = match get("EMAIL_PROVIDER").as_deref() {
            None | Some("none") => None,
            Some(name) => Some(EmailProvider::from_str(name).map_err(|e| anyhow!(e))?),
        };
        let email_api_key = get("EMAIL_API_KEY");
        let email_from = get("EMAIL_FROM");
        if email_provider.is_some() && (email_api_key.is_none() || email_from.is_none()) {
            bail!("EMAIL_API_KEY e EMAIL_FROM são obrigatórios quando EMAIL_PROVIDER está definido");
        }

        Ok(Self {
            database_url: get("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: get("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse("PORT", get("PORT"), 3000)?,
            database_max_connections: parse("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), 5)?,
            fonts_dir: get("FONTS_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./fonts")),
            font_family: get("FONT_FAMILY").unwrap_or_else(|| "Roboto".to_string()),
            danfe_max_items: parse("DANFE_MAX_ITEMS", get("DANFE_MAX_ITEMS"), 25)?,
            erp_base_url: get("ERP_BASE_URL"),
            erp_token: get("ERP_TOKEN"),
            http_timeout: Duration::from_secs(parse("HTTP_TIMEOUT_SECS", get("HTTP_TIMEOUT_SECS"), 15)?),
            email_provider,
            email_api_key,
            email_from,
            bootstrap_admin_email: get("BOOTSTRAP_ADMIN_EMAIL"),
            bootstrap_admin_password: get("BOOTSTRAP_ADMIN_PASSWORD"),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn connect_pool(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await?;
        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub company_service: CompanyService,
    pub supplier_service: SupplierService,
    pub document_service: DocumentService,
    pub import_service: ImportService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn new(config: &Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let supplier_repo = SupplierRepository::new(db_pool.clone());
        let nfe_repo = NfeRepository::new(db_pool.clone());
        let nfse_repo = NfseRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let erp: Option<Arc<dyn ErpDirectory>> = match &config.erp_base_url {
            Some(url) => {
                let client = HttpErpClient::new(url, config.erp_token.clone(), config.http_timeout)?;
                tracing::info!(base_url = %url, "🔗 Cliente do ERP habilitado");
                Some(Arc::new(client))
            }
            None => {
                tracing::warn!("ERP_BASE_URL não definida: consultas ao ERP desabilitadas");
                None
            }
        };

        let mailer: Option<Arc<dyn Mailer>> =
            match (config.email_provider, &config.email_api_key, &config.email_from) {
                (Some(provider), Some(api_key), Some(from)) => Some(Arc::new(HttpMailer::new(
                    provider,
                    api_key.clone(),
                    from.clone(),
                    config.http_timeout,
                )?)),
                _ => None,
            };

        let renderer = PdfRenderer::new(config.fonts_dir.clone(), config.font_family.clone());
        let store = Arc::new(PgDocumentStore::new(
            nfe_repo.clone(),
            nfse_repo.clone(),
            supplier_repo.clone(),
        ));

        Ok(Self {
            auth_service: AuthService::new(user_repo.clone(), config.jwt_secret.clone()),
            user_service: UserService::new(user_repo, mailer),
            company_service: CompanyService::new(company_repo.clone()),
            supplier_service: SupplierService::new(supplier_repo.clone(), erp.clone()),
            document_service: DocumentService::new(
                nfe_repo,
                nfse_repo,
                renderer,
                erp.clone(),
                config.danfe_max_items,
            ),
            import_service: ImportService::new(store, erp),
            dashboard_service: DashboardService::new(dashboard_repo, supplier_repo, company_repo),
            db_pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/fiscal"),
        ("JWT_SECRET", "segredo"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.fonts_dir, PathBuf::from("./fonts"));
        assert_eq!(config.font_family, "Roboto");
        assert_eq!(config.danfe_max_items, 25);
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.erp_base_url.is_none());
        assert!(config.email_provider.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn invalid_number_is_reported_by_name() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "http"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn email_provider_requires_credentials() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EMAIL_PROVIDER", "resend"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());

        pairs.push(("EMAIL_API_KEY", "re_123"));
        pairs.push(("EMAIL_FROM", "no-reply@fiscal.com.br"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.email_provider, Some(EmailProvider::Resend));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ERP_BASE_URL", "  "));
        pairs.push(("EMAIL_PROVIDER", "none"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.erp_base_url.is_none());
        assert!(config.email_provider.is_none());
    }
}
