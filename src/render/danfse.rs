// src/render/danfse.rs

use super::{
    or_dash, party_section, Cell, DocumentTemplate, Registration, Section, DISCLAIMER, LINE_WIDTH_CHARS,
};
use crate::common::format::{format_currency, format_date_br, format_percent};
use crate::fiscal::{NfseData, NfseLayout};

pub const HEADER: &str = "NFS-e";
pub const PROVIDER: &str = "PRESTADOR DE SERVIÇOS";
pub const TAKER: &str = "TOMADOR DE SERVIÇOS";
pub const SERVICE: &str = "DISCRIMINAÇÃO DOS SERVIÇOS";
pub const VALUES: &str = "VALORES";

const DESCRIPTION_MAX_LINES: usize = 14;

pub fn layout(data: &NfseData) -> DocumentTemplate {
    let subtitle = match data.layout {
        NfseLayout::National => "Documento Auxiliar da NFS-e (padrão nacional)",
        NfseLayout::LegacyNfe => "Documento Auxiliar da NFS-e (modelo NF-e)",
        NfseLayout::Abrasf => "Documento Auxiliar da NFS-e (layout municipal)",
    };

    let header = Section::new(HEADER)
        .row(vec![
            Cell::new("Número", or_dash(&data.number), 2),
            Cell::new("Código de verificação", or_dash(&data.verification_code), 4),
            Cell::new("Data de emissão", or_dash(&format_date_br(&data.issue_date)), 2),
            Cell::new("Competência", or_dash(&format_date_br(&data.competence)), 2),
            Cell::new("Município", or_dash(&data.municipality), 2),
        ]);

    let service = Section::new(SERVICE)
        .row(vec![
            Cell::new("Código do serviço", or_dash(&data.service.service_code), 1),
            Cell::new("Código de tributação municipal", or_dash(&data.service.municipal_tax_code), 1),
            Cell::new("CNAE", or_dash(&data.service.cnae), 1),
        ])
        .row(vec![
            Cell::new("Descrição", or_dash(&data.service.description), 1)
                .clipped(DESCRIPTION_MAX_LINES, LINE_WIDTH_CHARS),
        ]);

    let v = &data.values;
    let values = Section::new(VALUES)
        .row(vec![
            Cell::new("Valor dos serviços", format_currency(v.service_amount), 1),
            Cell::new("Deduções", format_currency(v.deductions), 1),
            Cell::new("Desconto incondicionado", format_currency(v.unconditional_discount), 1),
            Cell::new("Base de cálculo", format_currency(v.calculation_base), 1),
        ])
        .row(vec![
            Cell::new("PIS", format_currency(v.pis), 1),
            Cell::new("COFINS", format_currency(v.cofins), 1),
            Cell::new("INSS", format_currency(v.inss), 1),
            Cell::new("IR", format_currency(v.ir), 1),
            Cell::new("CSLL", format_currency(v.csll), 1),
        ])
        .row(vec![
            Cell::new("Alíquota ISS", format_percent(v.iss_rate), 1),
            Cell::new("Valor do ISS", format_currency(v.iss_amount), 1),
            Cell::new("ISS retido", if v.iss_withheld { "Sim" } else { "Não" }, 1),
            Cell::new("Valor líquido", format_currency(v.net_amount), 1),
        ]);

    let qr_payload = [&data.access_key, &data.verification_code]
        .into_iter()
        .find(|s| !s.is_empty())
        .cloned();

    DocumentTemplate {
        title: "DANFSe".to_string(),
        subtitle: subtitle.to_string(),
        sections: vec![
            header,
            party_section(PROVIDER, &data.provider, Registration::Municipal),
            party_section(TAKER, &data.taker, Registration::Municipal),
            service,
            values,
        ],
        footer: DISCLAIMER.to_string(),
        qr_payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::extract_nfse;
    use crate::fiscal::nfse::tests::{ABRASF_V2, NATIONAL};

    #[test]
    fn boxes_follow_fixed_order() {
        let template = layout(&extract_nfse(NATIONAL.as_bytes()).unwrap());
        let titles: Vec<&str> = template.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec![HEADER, PROVIDER, TAKER, SERVICE, VALUES]);
        assert_eq!(template.title, "DANFSe");
    }

    #[test]
    fn formats_national_values() {
        let template = layout(&extract_nfse(NATIONAL.as_bytes()).unwrap());

        let header = template.section(HEADER).unwrap();
        assert_eq!(header.cell("Número").unwrap().value, "124");
        assert_eq!(header.cell("Competência").unwrap().value, "01/03/2024");
        assert_eq!(header.cell("Data de emissão").unwrap().value, "20/03/2024");

        let provider = template.section(PROVIDER).unwrap();
        assert_eq!(provider.cell("CNPJ/CPF").unwrap().value, "11.222.333/0001-81");
        assert_eq!(provider.cell("CEP").unwrap().value, "01001-000");
        assert_eq!(provider.cell("Telefone").unwrap().value, "(11) 98765-4321");

        let values = template.section(VALUES).unwrap();
        assert_eq!(values.cell("Valor dos serviços").unwrap().value, "R$ 1.000,00");
        assert_eq!(values.cell("Alíquota ISS").unwrap().value, "5,00%");
        assert_eq!(values.cell("ISS retido").unwrap().value, "Sim");
        assert_eq!(values.cell("Valor líquido").unwrap().value, "R$ 950,00");

        assert_eq!(
            template.qr_payload.as_deref(),
            Some("35503082211222333000181000000000000124030000000001")
        );
    }

    #[test]
    fn abrasf_uses_verification_code_for_qr() {
        let template = layout(&extract_nfse(ABRASF_V2.as_bytes()).unwrap());
        assert_eq!(template.qr_payload.as_deref(), Some("AB12-CD34"));
        assert!(template.subtitle.contains("municipal"));
    }

    #[test]
    fn long_description_is_clipped() {
        let mut data = extract_nfse(NATIONAL.as_bytes()).unwrap();
        data.service.description = "serviço prestado conforme contrato ".repeat(200);
        let template = layout(&data);
        let description = template.section(SERVICE).unwrap().cell("Descrição").unwrap();
        assert_eq!(description.value.lines().count(), DESCRIPTION_MAX_LINES);
        assert!(description.value.ends_with('…'));
    }

    #[test]
    fn missing_fields_render_as_dash() {
        let template = layout(&NfseData::default());
        let taker = template.section(TAKER).unwrap();
        assert_eq!(taker.cell("Nome / Razão social").unwrap().value, "-");
        assert_eq!(template.qr_payload, None);
    }
}
