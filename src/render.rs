// src/render.rs
//
// DANFE e DANFSe: os dados extraídos viram um `DocumentTemplate` e o mesmo
// renderizador desenha qualquer template numa página A4.

pub mod danfe;
pub mod danfse;
mod pdf;
mod template;

pub use pdf::PdfRenderer;
pub use template::{clip_lines, Cell, DocumentTemplate, Row, Section, LINE_WIDTH_CHARS};

use crate::common::format::{format_cep, format_cnpj_cpf, format_phone};
use crate::fiscal::{Address, Party};

pub(crate) const DISCLAIMER: &str =
    "Representação simplificada gerada a partir do XML. Não substitui o documento fiscal.";

pub(crate) fn or_dash(value: &str) -> String {
    if value.trim().is_empty() { "-".to_string() } else { value.trim().to_string() }
}

/// `Rua X, 10 - Sala 2`
pub(crate) fn street_line(address: &Address) -> String {
    let mut line = address.street.clone();
    if !address.number.is_empty() {
        line.push_str(", ");
        line.push_str(&address.number);
    }
    if !address.complement.is_empty() {
        line.push_str(" - ");
        line.push_str(&address.complement);
    }
    line
}

/// Bloco de emitente/destinatário/prestador/tomador. `registration` escolhe
/// qual inscrição aparece ao lado do documento.
pub(crate) fn party_section(title: &str, party: &Party, registration: Registration) -> Section {
    let (registration_label, registration_value) = match registration {
        Registration::State => ("Inscrição estadual", &party.state_registration),
        Registration::Municipal => ("Inscrição municipal", &party.municipal_registration),
    };

    Section::new(title)
        .row(vec![
            Cell::new("Nome / Razão social", or_dash(&party.name), 6),
            Cell::new("CNPJ/CPF", or_dash(&format_cnpj_cpf(&party.document)), 3),
            Cell::new(registration_label, or_dash(registration_value), 3),
        ])
        .row(vec![
            Cell::new("Endereço", or_dash(&street_line(&party.address)), 6),
            Cell::new("Bairro", or_dash(&party.address.district), 3),
            Cell::new("CEP", or_dash(&format_cep(&party.address.zip_code)), 3),
        ])
        .row(vec![
            Cell::new("Município", or_dash(&party.address.city), 4),
            Cell::new("UF", or_dash(&party.address.state), 1),
            Cell::new("Telefone", or_dash(&format_phone(&party.phone)), 3),
            Cell::new("E-mail", or_dash(&party.email), 4),
        ])
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Registration {
    State,
    Municipal,
}
