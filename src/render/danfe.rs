// src/render/danfe.rs

use super::{
    or_dash, party_section, Cell, DocumentTemplate, Registration, Row, Section, DISCLAIMER,
    LINE_WIDTH_CHARS,
};
use crate::common::format::{
    format_access_key, format_cnpj_cpf, format_currency, format_date_br, format_number,
};
use crate::fiscal::{NfeData, NfeItem};

pub const HEADER: &str = "IDENTIFICAÇÃO";
pub const ISSUER: &str = "EMITENTE";
pub const RECIPIENT: &str = "DESTINATÁRIO / REMETENTE";
pub const DUPLICATES: &str = "FATURA / DUPLICATAS";
pub const TAXES: &str = "CÁLCULO DO IMPOSTO";
pub const TRANSPORT: &str = "TRANSPORTADOR / VOLUMES TRANSPORTADOS";
pub const PRODUCTS: &str = "DADOS DOS PRODUTOS / SERVIÇOS";
pub const ADDITIONAL: &str = "DADOS ADICIONAIS";

const DUPLICATES_PER_ROW: usize = 4;

// (título, peso) das colunas da tabela de produtos
const PRODUCT_COLUMNS: [(&str, usize); 10] = [
    ("Código", 2),
    ("Descrição", 6),
    ("NCM", 2),
    ("CST", 1),
    ("CFOP", 1),
    ("Un", 1),
    ("Qtd", 2),
    ("V. unit.", 2),
    ("V. total", 2),
    ("V. ICMS", 2),
];

pub fn layout(data: &NfeData, max_items: usize) -> DocumentTemplate {
    let mut sections = vec![
        header(data),
        party_section(ISSUER, &data.issuer, Registration::State),
        party_section(RECIPIENT, &data.recipient, Registration::State),
    ];
    if !data.duplicates.is_empty() {
        sections.push(duplicates(data));
    }
    sections.push(taxes(data));
    sections.push(transport(data));
    sections.push(products(&data.items, max_items));
    sections.push(additional(data));

    DocumentTemplate {
        title: "DANFE".to_string(),
        subtitle: "Documento Auxiliar da Nota Fiscal Eletrônica".to_string(),
        sections,
        footer: DISCLAIMER.to_string(),
        qr_payload: Some(data.access_key.clone()).filter(|k| !k.is_empty()),
    }
}

fn header(data: &NfeData) -> Section {
    let operation = match data.operation_type.as_str() {
        "0" => "0 - Entrada",
        "1" => "1 - Saída",
        _ => "-",
    };
    let protocol = if data.protocol.is_empty() {
        "-".to_string()
    } else {
        format!("{} {}", data.protocol, format_date_br(&data.protocol_date))
            .trim()
            .to_string()
    };

    Section::new(HEADER)
        .row(vec![Cell::new("Chave de acesso", or_dash(&format_access_key(&data.access_key)), 1)])
        .row(vec![
            Cell::new("Número", or_dash(&data.number), 2),
            Cell::new("Série", or_dash(&data.series), 1),
            Cell::new("Operação", operation, 2),
            Cell::new("Data de emissão", or_dash(&format_date_br(&data.issue_date)), 2),
            Cell::new("Data de saída", or_dash(&format_date_br(&data.exit_date)), 2),
        ])
        .row(vec![
            Cell::new("Natureza da operação", or_dash(&data.operation_nature), 3),
            Cell::new("Protocolo de autorização", protocol, 2),
        ])
}

fn duplicates(data: &NfeData) -> Section {
    let mut section = Section::new(DUPLICATES);
    for chunk in data.duplicates.chunks(DUPLICATES_PER_ROW) {
        let mut cells: Vec<Cell> = chunk
            .iter()
            .map(|d| {
                Cell::new(
                    format!("Duplicata {}", or_dash(&d.number)),
                    format!("{} - {}", format_date_br(&d.due_date), format_currency(d.amount)),
                    1,
                )
            })
            .collect();
        // mantém as colunas alinhadas na última linha
        while cells.len() < DUPLICATES_PER_ROW {
            cells.push(Cell::plain("", 1));
        }
        section.push_row(Row::new(cells));
    }
    section
}

fn taxes(data: &NfeData) -> Section {
    let t = &data.totals;
    Section::new(TAXES)
        .row(vec![
            Cell::new("Base de cálculo do ICMS", format_currency(t.icms_base), 1),
            Cell::new("Valor do ICMS", format_currency(t.icms), 1),
            Cell::new("Base de cálculo ICMS ST", format_currency(t.icms_st_base), 1),
            Cell::new("Valor do ICMS ST", format_currency(t.icms_st), 1),
            Cell::new("Valor total dos produtos", format_currency(t.products), 1),
        ])
        .row(vec![
            Cell::new("Valor do frete", format_currency(t.freight), 1),
            Cell::new("Valor do seguro", format_currency(t.insurance), 1),
            Cell::new("Desconto", format_currency(t.discount), 1),
            Cell::new("Outras despesas", format_currency(t.other), 1),
            Cell::new("Valor do IPI", format_currency(t.ipi), 1),
            Cell::new("Valor total da nota", format_currency(t.total), 1),
        ])
}

fn freight_mode(code: &str) -> &'static str {
    match code {
        "0" => "0 - Por conta do emitente",
        "1" => "1 - Por conta do destinatário",
        "2" => "2 - Por conta de terceiros",
        "3" => "3 - Próprio por conta do remetente",
        "4" => "4 - Próprio por conta do destinatário",
        "9" => "9 - Sem frete",
        _ => "-",
    }
}

fn transport(data: &NfeData) -> Section {
    let t = &data.transport;
    Section::new(TRANSPORT)
        .row(vec![
            Cell::new("Razão social", or_dash(&t.carrier.name), 4),
            Cell::new("Frete", freight_mode(&t.freight_mode), 3),
            Cell::new("Placa", or_dash(&t.vehicle_plate), 1),
            Cell::new("UF", or_dash(&t.vehicle_state), 1),
            Cell::new("CNPJ/CPF", or_dash(&format_cnpj_cpf(&t.carrier.document)), 3),
        ])
        .row(vec![
            Cell::new("Quantidade", or_dash(&t.volume_quantity), 1),
            Cell::new("Espécie", or_dash(&t.volume_species), 1),
            Cell::new("Marca", or_dash(&t.volume_brand), 1),
            Cell::new("Peso bruto", or_dash(&t.gross_weight), 1),
            Cell::new("Peso líquido", or_dash(&t.net_weight), 1),
        ])
}

fn products(items: &[NfeItem], max_items: usize) -> Section {
    let total_weight: usize = PRODUCT_COLUMNS.iter().map(|(_, w)| w).sum();
    let description_chars = LINE_WIDTH_CHARS * PRODUCT_COLUMNS[1].1 / total_weight;

    let mut section = Section::new(PRODUCTS);
    section.push_row(Row::header(&PRODUCT_COLUMNS));

    for item in items.iter().take(max_items) {
        let values = [
            item.code.clone(),
            item.description.clone(),
            item.ncm.clone(),
            item.cst.clone(),
            item.cfop.clone(),
            item.unit.clone(),
            format_number(item.quantity, 4),
            format_number(item.unit_price, 2),
            format_number(item.total, 2),
            format_number(item.icms_value, 2),
        ];
        let cells = values
            .into_iter()
            .zip(PRODUCT_COLUMNS)
            .enumerate()
            .map(|(i, (value, (_, weight)))| {
                let cell = Cell::plain(value, weight);
                if i == 1 { cell.clipped(2, description_chars) } else { cell }
            })
            .collect();
        section.push_row(Row::new(cells));
    }

    if items.len() > max_items {
        section.push_row(Row::new(vec![Cell::plain(
            format!("+{} itens", items.len() - max_items),
            1,
        )]));
    }
    section
}

fn additional(data: &NfeData) -> Section {
    Section::new(ADDITIONAL).row(vec![
        Cell::new("Informações complementares", or_dash(&data.additional_info), 2)
            .clipped(6, LINE_WIDTH_CHARS * 2 / 3),
        Cell::new("Reservado ao fisco", or_dash(&data.fisco_info), 1)
            .clipped(6, LINE_WIDTH_CHARS / 3),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::extract_nfe;
    use crate::fiscal::nfe::tests::NFE_PROC;

    fn sample() -> NfeData {
        extract_nfe(NFE_PROC.as_bytes()).unwrap()
    }

    #[test]
    fn header_groups_access_key_and_protocol() {
        let template = layout(&sample(), 25);
        let header = template.section(HEADER).unwrap();
        assert_eq!(
            header.cell("Chave de acesso").unwrap().value,
            "3524 0311 2223 3300 0181 5500 1000 0001 2310 0000 1234"
        );
        assert_eq!(header.cell("Operação").unwrap().value, "1 - Saída");
        assert_eq!(
            header.cell("Protocolo de autorização").unwrap().value,
            "135240000000001 15/03/2024"
        );
        assert_eq!(
            template.qr_payload.as_deref(),
            Some("35240311222333000181550010000001231000001234")
        );
    }

    #[test]
    fn parties_totals_and_duplicates() {
        let template = layout(&sample(), 25);
        let issuer = template.section(ISSUER).unwrap();
        assert_eq!(issuer.cell("CNPJ/CPF").unwrap().value, "11.222.333/0001-81");
        assert_eq!(issuer.cell("Inscrição estadual").unwrap().value, "123456789");
        assert_eq!(issuer.cell("CEP").unwrap().value, "01310-100");

        let taxes = template.section(TAXES).unwrap();
        assert_eq!(taxes.cell("Valor total da nota").unwrap().value, "R$ 30,00");
        assert_eq!(taxes.cell("Valor do ICMS").unwrap().value, "R$ 4,50");

        let dups = template.section(DUPLICATES).unwrap();
        assert_eq!(dups.rows.len(), 1);
        assert_eq!(dups.rows[0].cells.len(), DUPLICATES_PER_ROW);
        assert_eq!(dups.cell("Duplicata 001").unwrap().value, "15/04/2024 - R$ 30,00");

        let transport = template.section(TRANSPORT).unwrap();
        assert_eq!(transport.cell("Frete").unwrap().value, "9 - Sem frete");
    }

    #[test]
    fn product_rows_match_header_columns() {
        let template = layout(&sample(), 25);
        let products = template.section(PRODUCTS).unwrap();
        assert!(products.rows[0].header);
        assert_eq!(products.rows.len(), 3);
        for row in &products.rows {
            assert_eq!(row.weights(), products.rows[0].weights());
        }
        assert_eq!(products.rows[1].cells[1].value, "Parafuso");
        assert_eq!(products.rows[1].cells[6].value, "10,0000");
        assert_eq!(products.rows[2].cells[3].value, "0102");
    }

    #[test]
    fn product_table_is_capped_with_marker() {
        let mut data = sample();
        let item = data.items[0].clone();
        data.items = (0..40).map(|_| item.clone()).collect();

        let template = layout(&data, 25);
        let products = template.section(PRODUCTS).unwrap();
        // cabeçalho + 25 itens + marcador
        assert_eq!(products.rows.len(), 27);
        let marker = products.rows.last().unwrap();
        assert_eq!(marker.cells.len(), 1);
        assert_eq!(marker.cells[0].value, "+15 itens");
    }

    #[test]
    fn duplicates_section_is_omitted_when_empty() {
        let mut data = sample();
        data.duplicates.clear();
        let template = layout(&data, 25);
        assert!(template.section(DUPLICATES).is_none());
        assert!(template.section(PRODUCTS).is_some());
    }
}
