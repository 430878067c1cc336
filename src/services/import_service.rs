// src/services/import_service.rs
//
// Importação em lote de XMLs. Os arquivos são processados um a um; a falha
// de um arquivo vira um item com `success = false` e o lote continua.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::erp::ErpDirectory;
use crate::{
    common::{error::AppError, format::only_digits},
    db::{NfeRepository, NfseRepository, SupplierRepository},
    fiscal::{decode_payload, extract_nfe, extract_nfse, NfeData, NfseData, Party},
    models::{
        document::{ImportOutcome, ImportReport, NewNfeDocument, NewNfseDocument},
        supplier::{Supplier, SupplierUpsert},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Nfe,
    Nfse,
}

/// Arquivo recebido no multipart.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Persistência usada pela importação.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_nfe(&self, doc: &NewNfeDocument) -> Result<Uuid, AppError>;
    async fn insert_nfse(&self, doc: &NewNfseDocument) -> Result<Uuid, AppError>;
    async fn upsert_supplier(&self, supplier: &SupplierUpsert) -> Result<Supplier, AppError>;
    async fn link_supplier(&self, kind: DocumentKind, document_id: Uuid, supplier_id: Uuid) -> Result<(), AppError>;
    async fn set_supplier_erp_code(&self, supplier_id: Uuid, erp_code: &str) -> Result<(), AppError>;
}

pub struct PgDocumentStore {
    nfe_repo: NfeRepository,
    nfse_repo: NfseRepository,
    supplier_repo: SupplierRepository,
}

impl PgDocumentStore {
    pub fn new(nfe_repo: NfeRepository, nfse_repo: NfseRepository, supplier_repo: SupplierRepository) -> Self {
        Self { nfe_repo, nfse_repo, supplier_repo }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_nfe(&self, doc: &NewNfeDocument) -> Result<Uuid, AppError> {
        Ok(self.nfe_repo.insert(doc).await?.id)
    }

    async fn insert_nfse(&self, doc: &NewNfseDocument) -> Result<Uuid, AppError> {
        Ok(self.nfse_repo.insert(doc).await?.id)
    }

    async fn upsert_supplier(&self, supplier: &SupplierUpsert) -> Result<Supplier, AppError> {
        self.supplier_repo.upsert(supplier).await
    }

    async fn link_supplier(&self, kind: DocumentKind, document_id: Uuid, supplier_id: Uuid) -> Result<(), AppError> {
        match kind {
            DocumentKind::Nfe => self.nfe_repo.link_supplier(document_id, supplier_id).await,
            DocumentKind::Nfse => self.nfse_repo.link_supplier(document_id, supplier_id).await,
        }
    }

    async fn set_supplier_erp_code(&self, supplier_id: Uuid, erp_code: &str) -> Result<(), AppError> {
        self.supplier_repo.set_erp_code(supplier_id, erp_code).await?;
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `2024-03-15`, `2024-03-15T10:30:00-03:00`, `15/03/2024` ou `20240315`.
pub(crate) fn parse_issue_date(value: &str) -> Option<NaiveDate> {
    let v = value.trim();
    let head = v.get(0..10).unwrap_or(v);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%d/%m/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(v, "%Y%m%d"))
        .ok()
}

pub(crate) fn new_nfe_document(data: &NfeData, xml_content: String) -> Result<NewNfeDocument, AppError> {
    let access_key = only_digits(&data.access_key);
    if access_key.len() != 44 {
        return Err(AppError::BadRequest("Chave de acesso ausente ou inválida.".into()));
    }
    let issuer_cnpj = only_digits(&data.issuer.document);
    if issuer_cnpj.is_empty() {
        return Err(AppError::BadRequest("CNPJ do emitente ausente no XML.".into()));
    }

    Ok(NewNfeDocument {
        access_key,
        number: data.number.trim().to_string(),
        series: non_empty(&data.series),
        issuer_cnpj,
        issuer_name: data.issuer.name.trim().to_string(),
        recipient_cnpj: non_empty(&only_digits(&data.recipient.document)),
        recipient_name: non_empty(&data.recipient.name),
        issue_date: parse_issue_date(&data.issue_date),
        total_value: data.totals.total,
        xml_content,
        supplier_id: None,
    })
}

pub(crate) fn new_nfse_document(data: &NfseData, xml_content: String) -> Result<NewNfseDocument, AppError> {
    let number = data.number.trim().to_string();
    if number.is_empty() {
        return Err(AppError::BadRequest("Número da NFS-e ausente no XML.".into()));
    }
    let provider_cnpj = only_digits(&data.provider.document);
    if provider_cnpj.is_empty() {
        return Err(AppError::BadRequest("CNPJ do prestador ausente no XML.".into()));
    }

    Ok(NewNfseDocument {
        number,
        verification_code: non_empty(&data.verification_code),
        provider_cnpj,
        provider_name: data.provider.name.trim().to_string(),
        taker_cnpj: non_empty(&only_digits(&data.taker.document)),
        taker_name: non_empty(&data.taker.name),
        municipality: non_empty(&data.municipality),
        issue_date: parse_issue_date(&data.issue_date).or_else(|| parse_issue_date(&data.competence)),
        service_value: data.values.service_amount,
        iss_value: data.values.iss_amount,
        net_value: data.values.net_amount,
        xml_content,
        supplier_id: None,
    })
}

fn supplier_from_party(party: &Party) -> SupplierUpsert {
    SupplierUpsert {
        name: party.name.trim().to_string(),
        cnpj: only_digits(&party.document),
        email: non_empty(&party.email),
        phone: non_empty(&only_digits(&party.phone)),
        city: non_empty(&party.address.city),
        state: non_empty(&party.address.state),
    }
}

#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn DocumentStore>,
    erp: Option<Arc<dyn ErpDirectory>>,
}

impl ImportService {
    pub fn new(store: Arc<dyn DocumentStore>, erp: Option<Arc<dyn ErpDirectory>>) -> Self {
        Self { store, erp }
    }

    pub async fn import(&self, kind: DocumentKind, files: Vec<UploadedFile>) -> ImportReport {
        let mut report = ImportReport::default();

        for file in files {
            let result = match kind {
                DocumentKind::Nfe => self.import_nfe(&file).await,
                DocumentKind::Nfse => self.import_nfse(&file).await,
            };

            let outcome = match result {
                Ok((document_id, key)) => {
                    tracing::info!(file = %file.file_name, %document_id, %key, "📥 Documento importado");
                    ImportOutcome {
                        file_name: file.file_name,
                        success: true,
                        document_id: Some(document_id),
                        key: Some(key),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(file = %file.file_name, error = %e, "Falha ao importar arquivo");
                    ImportOutcome {
                        file_name: file.file_name,
                        success: false,
                        document_id: None,
                        key: None,
                        error: Some(e.client_message()),
                    }
                }
            };
            report.push(outcome);
        }

        tracing::info!(
            kind = ?kind,
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            "Importação concluída"
        );
        report
    }

    async fn import_nfe(&self, file: &UploadedFile) -> Result<(Uuid, String), AppError> {
        let xml = decode_payload(&file.bytes)?;
        let data = extract_nfe(xml.as_bytes())?;
        let doc = new_nfe_document(&data, xml)?;
        let id = self.store.insert_nfe(&doc).await?;
        self.enrich_supplier(DocumentKind::Nfe, id, &data.issuer).await;
        Ok((id, doc.access_key))
    }

    async fn import_nfse(&self, file: &UploadedFile) -> Result<(Uuid, String), AppError> {
        let xml = decode_payload(&file.bytes)?;
        let data = extract_nfse(xml.as_bytes())?;
        let doc = new_nfse_document(&data, xml)?;
        let id = self.store.insert_nfse(&doc).await?;
        self.enrich_supplier(DocumentKind::Nfse, id, &data.provider).await;
        Ok((id, doc.number))
    }

    // O documento já está gravado: daqui em diante nada derruba o arquivo
    async fn enrich_supplier(&self, kind: DocumentKind, document_id: Uuid, issuer: &Party) {
        let upsert = supplier_from_party(issuer);
        let supplier = match self.store.upsert_supplier(&upsert).await {
            Ok(supplier) => supplier,
            Err(e) => {
                tracing::warn!(cnpj = %upsert.cnpj, error = %e, "Falha ao registrar fornecedor");
                return;
            }
        };

        if let Err(e) = self.store.link_supplier(kind, document_id, supplier.id).await {
            tracing::warn!(%document_id, supplier_id = %supplier.id, error = %e, "Falha ao vincular fornecedor");
        }

        let Some(erp) = &self.erp else { return };
        if supplier.is_registered_in_erp() {
            return;
        }
        match erp.find_supplier_code(&supplier.cnpj).await {
            Ok(Some(code)) => {
                if let Err(e) = self.store.set_supplier_erp_code(supplier.id, &code).await {
                    tracing::warn!(supplier_id = %supplier.id, error = %e, "Falha ao gravar código ERP");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(cnpj = %supplier.cnpj, error = %e, "Consulta ao ERP falhou"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::{nfe::tests::NFE_PROC, nfse::tests::NATIONAL};
    use crate::services::erp::ErpDocumentStatus;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        nfe_keys: Mutex<Vec<String>>,
        nfse_numbers: Mutex<Vec<String>>,
        suppliers: Mutex<Vec<Supplier>>,
        links: Mutex<Vec<(DocumentKind, Uuid, Uuid)>>,
        erp_codes: Mutex<Vec<(Uuid, String)>>,
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn insert_nfe(&self, doc: &NewNfeDocument) -> Result<Uuid, AppError> {
            let mut keys = self.nfe_keys.lock().unwrap();
            if keys.contains(&doc.access_key) {
                return Err(AppError::UniqueConstraintViolation(
                    "NFe com esta chave de acesso já foi importada.".into(),
                ));
            }
            keys.push(doc.access_key.clone());
            Ok(Uuid::new_v4())
        }

        async fn insert_nfse(&self, doc: &NewNfseDocument) -> Result<Uuid, AppError> {
            self.nfse_numbers.lock().unwrap().push(doc.number.clone());
            Ok(Uuid::new_v4())
        }

        async fn upsert_supplier(&self, supplier: &SupplierUpsert) -> Result<Supplier, AppError> {
            let mut suppliers = self.suppliers.lock().unwrap();
            if let Some(existing) = suppliers.iter().find(|s| s.cnpj == supplier.cnpj) {
                return Ok(existing.clone());
            }
            let created = Supplier {
                id: Uuid::new_v4(),
                name: supplier.name.clone(),
                cnpj: supplier.cnpj.clone(),
                erp_code: None,
                email: supplier.email.clone(),
                phone: supplier.phone.clone(),
                city: supplier.city.clone(),
                state: supplier.state.clone(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            suppliers.push(created.clone());
            Ok(created)
        }

        async fn link_supplier(&self, kind: DocumentKind, document_id: Uuid, supplier_id: Uuid) -> Result<(), AppError> {
            self.links.lock().unwrap().push((kind, document_id, supplier_id));
            Ok(())
        }

        async fn set_supplier_erp_code(&self, supplier_id: Uuid, erp_code: &str) -> Result<(), AppError> {
            self.erp_codes.lock().unwrap().push((supplier_id, erp_code.to_string()));
            Ok(())
        }
    }

    struct FakeErp {
        code: Result<Option<String>, String>,
    }

    #[async_trait]
    impl ErpDirectory for FakeErp {
        async fn find_supplier_code(&self, _cnpj: &str) -> Result<Option<String>, AppError> {
            self.code.clone().map_err(AppError::Erp)
        }

        async fn document_status(&self, _access_key: &str) -> Result<ErpDocumentStatus, AppError> {
            Ok(ErpDocumentStatus { integrated: false, message: None })
        }
    }

    fn file(name: &str, content: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            bytes: content.as_bytes().to_vec(),
        }
    }

    fn second_nfe() -> String {
        NFE_PROC.replace(
            "35240311222333000181550010000001231000001234",
            "35240311222333000181550010000001241000001240",
        )
    }

    #[tokio::test]
    async fn one_malformed_file_does_not_abort_the_batch() {
        let store = Arc::new(MemoryStore::default());
        let service = ImportService::new(store.clone(), None);

        let files = vec![
            file("a.xml", NFE_PROC),
            file("lixo.xml", "isto não é xml"),
            file("b.xml", &second_nfe()),
        ];
        let report = service.import(DocumentKind::Nfe, files).await;

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.results[1].file_name, "lixo.xml");
        assert!(!report.results[1].success);
        assert!(report.results[1].error.is_some());
        assert_eq!(
            report.results[0].key.as_deref(),
            Some("35240311222333000181550010000001231000001234")
        );
        assert_eq!(store.nfe_keys.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_key_is_reported_per_file() {
        let store = Arc::new(MemoryStore::default());
        let service = ImportService::new(store.clone(), None);

        let report = service
            .import(DocumentKind::Nfe, vec![file("a.xml", NFE_PROC), file("a-copia.xml", NFE_PROC)])
            .await;

        assert_eq!((report.succeeded, report.failed), (1, 1));
        assert_eq!(
            report.results[1].error.as_deref(),
            Some("NFe com esta chave de acesso já foi importada.")
        );
    }

    #[tokio::test]
    async fn issuer_becomes_a_linked_supplier() {
        let store = Arc::new(MemoryStore::default());
        let service = ImportService::new(store.clone(), None);

        let report = service
            .import(DocumentKind::Nfe, vec![file("a.xml", NFE_PROC), file("b.xml", &second_nfe())])
            .await;
        assert_eq!(report.succeeded, 2);

        // Mesmo emitente nos dois arquivos: um fornecedor só
        let suppliers = store.suppliers.lock().unwrap();
        assert_eq!(suppliers.len(), 1);
        assert_eq!(suppliers[0].cnpj, "11222333000181");
        assert_eq!(suppliers[0].name, "Fornecedor Exemplo LTDA");
        assert_eq!(store.links.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn erp_code_is_stored_when_found() {
        let store = Arc::new(MemoryStore::default());
        let erp: Arc<dyn ErpDirectory> = Arc::new(FakeErp { code: Ok(Some("F-0042".into())) });
        let service = ImportService::new(store.clone(), Some(erp));

        service.import(DocumentKind::Nfse, vec![file("n.xml", NATIONAL)]).await;

        let codes = store.erp_codes.lock().unwrap();
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].1, "F-0042");
    }

    #[tokio::test]
    async fn erp_failure_does_not_fail_the_file() {
        let store = Arc::new(MemoryStore::default());
        let erp: Arc<dyn ErpDirectory> = Arc::new(FakeErp { code: Err("timeout".into()) });
        let service = ImportService::new(store.clone(), Some(erp));

        let report = service.import(DocumentKind::Nfse, vec![file("n.xml", NATIONAL)]).await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.results[0].key.as_deref(), Some("124"));
        assert!(store.erp_codes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn accepts_base64_uploads() {
        let store = Arc::new(MemoryStore::default());
        let service = ImportService::new(store.clone(), None);

        let encoded = STANDARD.encode(NATIONAL);
        let report = service.import(DocumentKind::Nfse, vec![file("n.b64", &encoded)]).await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(store.nfse_numbers.lock().unwrap().as_slice(), ["124"]);
    }

    #[test]
    fn nfe_without_issuer_is_rejected() {
        let mut data = crate::fiscal::extract_nfe(NFE_PROC.as_bytes()).unwrap();
        data.issuer.document.clear();
        assert!(matches!(new_nfe_document(&data, String::new()), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn builds_nfse_row_from_extracted_data() {
        let data = extract_nfse(NATIONAL.as_bytes()).unwrap();
        let doc = new_nfse_document(&data, "<xml/>".into()).unwrap();
        assert_eq!(doc.number, "124");
        assert_eq!(doc.provider_cnpj, "11222333000181");
        assert_eq!(doc.municipality.as_deref(), Some("São Paulo"));
        assert_eq!(doc.service_value, rust_decimal::Decimal::from(1000));
        assert_eq!(doc.net_value, rust_decimal::Decimal::from(950));
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_issue_date("2024-03-15T10:30:00-03:00"), expected);
        assert_eq!(parse_issue_date("2024-03-15"), expected);
        assert_eq!(parse_issue_date("15/03/2024"), expected);
        assert_eq!(parse_issue_date("20240315"), expected);
        assert_eq!(parse_issue_date(""), None);
    }
}
