// src/fiscal.rs
//
// Extração de dados de XMLs fiscais (NFe e NFSe) para estruturas planas.

pub mod nfe;
pub mod nfse;
mod xml;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub use nfe::{extract_nfe, NfeData, NfeDuplicate, NfeItem, NfeTotals, NfeTransport};
pub use nfse::{extract_nfse, NfseData, NfseLayout, NfseService, NfseValues};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    #[error("Conteúdo XML vazio")]
    Empty,

    #[error("Conteúdo não é XML nem base64 de um XML")]
    InvalidEncoding,

    #[error("XML malformado: {0}")]
    Malformed(String),

    #[error("Estrutura de XML não reconhecida")]
    UnrecognizedStructure,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub number: String,
    pub complement: String,
    pub district: String,
    pub city: String,
    pub city_code: String,
    pub state: String,
    pub zip_code: String,
}

/// Emitente, destinatário, prestador, tomador ou transportadora.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// CNPJ ou CPF, só dígitos
    pub document: String,
    pub name: String,
    pub trade_name: String,
    pub state_registration: String,
    pub municipal_registration: String,
    pub address: Address,
    pub phone: String,
    pub email: String,
}

/// Normaliza o conteúdo recebido (upload, coluna do banco, campo JSON) em texto XML.
///
/// Aceita XML puro ou XML codificado em base64, em UTF-8 ou ISO-8859-1.
/// Remove BOM e caracteres de controle antes de qualquer análise.
pub fn decode_payload(raw: &[u8]) -> Result<String, XmlError> {
    let text = sanitize(raw);
    if text.is_empty() {
        return Err(XmlError::Empty);
    }
    if text.starts_with('<') {
        return Ok(text);
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| XmlError::InvalidEncoding)?;

    let inner = sanitize(&decoded);
    if inner.starts_with('<') {
        Ok(inner)
    } else {
        Err(XmlError::InvalidEncoding)
    }
}

fn sanitize(raw: &[u8]) -> String {
    let text = match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        // ISO-8859-1: cada byte é o próprio code point
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    };

    text.chars()
        .filter(|&c| c != '\u{feff}' && (!c.is_control() || matches!(c, '\t' | '\n' | '\r')))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_xml_passes_through() {
        let xml = decode_payload(b"  <a>1</a>\n").unwrap();
        assert_eq!(xml, "<a>1</a>");
    }

    #[test]
    fn strips_bom_and_control_chars() {
        let raw = "\u{feff}<a>\u{0001}1\u{0007}</a>";
        assert_eq!(decode_payload(raw.as_bytes()).unwrap(), "<a>1</a>");
    }

    #[test]
    fn decodes_base64_with_line_breaks() {
        let encoded = STANDARD.encode("\u{feff}<NFSe><x>1</x></NFSe>");
        let wrapped = format!("{}\n{}", &encoded[..10], &encoded[10..]);
        assert_eq!(decode_payload(wrapped.as_bytes()).unwrap(), "<NFSe><x>1</x></NFSe>");
    }

    #[test]
    fn decodes_latin1() {
        let raw = b"<a>S\xe3o Paulo</a>";
        assert_eq!(decode_payload(raw).unwrap(), "<a>São Paulo</a>");
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(decode_payload("   \u{feff}".as_bytes()).unwrap_err(), XmlError::Empty);
        assert_eq!(decode_payload(b"not xml at all").unwrap_err(), XmlError::InvalidEncoding);
        let encoded = STANDARD.encode("just text");
        assert_eq!(decode_payload(encoded.as_bytes()).unwrap_err(), XmlError::InvalidEncoding);
    }
}
