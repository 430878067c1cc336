// src/fiscal/nfe.rs
//
// NFe modelo 55 (nfeProc ou NFe avulsa).

use roxmltree::Node;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::xml::{self, attr, child, children, find, first_decimal, first_element_child, first_text};
use super::{decode_payload, Address, Party, XmlError};
use crate::common::format::only_digits;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfeItem {
    pub number: u32,
    pub code: String,
    pub description: String,
    pub ncm: String,
    pub cst: String,
    pub cfop: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub icms_base: Decimal,
    pub icms_value: Decimal,
    pub icms_rate: Decimal,
    pub ipi_value: Decimal,
    pub ipi_rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfeTotals {
    pub icms_base: Decimal,
    pub icms: Decimal,
    pub icms_st_base: Decimal,
    pub icms_st: Decimal,
    pub products: Decimal,
    pub freight: Decimal,
    pub insurance: Decimal,
    pub discount: Decimal,
    pub other: Decimal,
    pub ipi: Decimal,
    pub pis: Decimal,
    pub cofins: Decimal,
    pub total: Decimal,
    pub approximate_taxes: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfeTransport {
    pub freight_mode: String,
    pub carrier: Party,
    pub vehicle_plate: String,
    pub vehicle_state: String,
    pub volume_quantity: String,
    pub volume_species: String,
    pub volume_brand: String,
    pub gross_weight: String,
    pub net_weight: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfeDuplicate {
    pub number: String,
    pub due_date: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfeData {
    pub access_key: String,
    pub number: String,
    pub series: String,
    pub model: String,
    pub issue_date: String,
    pub exit_date: String,
    pub operation_nature: String,
    /// 0 = entrada, 1 = saída
    pub operation_type: String,
    pub issuer: Party,
    pub recipient: Party,
    pub items: Vec<NfeItem>,
    pub totals: NfeTotals,
    pub transport: NfeTransport,
    pub duplicates: Vec<NfeDuplicate>,
    pub additional_info: String,
    pub fisco_info: String,
    pub protocol: String,
    pub protocol_date: String,
}

pub fn extract_nfe(raw: &[u8]) -> Result<NfeData, XmlError> {
    let text = decode_payload(raw)?;
    let doc = xml::parse(&text)?;
    let inf = find(doc.root_element(), "infNFe").ok_or(XmlError::UnrecognizedStructure)?;
    Ok(from_inf_nfe(doc.root_element(), inf))
}

/// `root` é usado para achar o protocolo (`protNFe`), que fica fora do `infNFe`.
pub(crate) fn from_inf_nfe(root: Node, inf: Node) -> NfeData {
    let ide = child(inf, "ide");
    let ide_scope: Vec<Node> = ide.into_iter().collect();
    let prot = find(root, "infProt");
    let prot_scope: Vec<Node> = prot.into_iter().collect();

    let access_key = attr(inf, "Id")
        .map(|id| only_digits(&id))
        .filter(|k| k.len() == 44)
        .unwrap_or_else(|| only_digits(&first_text(&prot_scope, &["chNFe"])));

    let (additional_info, fisco_info) = match child(inf, "infAdic") {
        Some(adic) => (
            first_text(&[adic], &["infCpl"]),
            first_text(&[adic], &["infAdFisco"]),
        ),
        None => (String::new(), String::new()),
    };

    NfeData {
        access_key,
        number: first_text(&ide_scope, &["nNF"]),
        series: first_text(&ide_scope, &["serie"]),
        model: first_text(&ide_scope, &["mod"]),
        issue_date: first_text(&ide_scope, &["dhEmi", "dEmi"]),
        exit_date: first_text(&ide_scope, &["dhSaiEnt", "dSaiEnt"]),
        operation_nature: first_text(&ide_scope, &["natOp"]),
        operation_type: first_text(&ide_scope, &["tpNF"]),
        issuer: child(inf, "emit").map(|n| party(n, "enderEmit")).unwrap_or_default(),
        recipient: child(inf, "dest").map(|n| party(n, "enderDest")).unwrap_or_default(),
        items: children(inf, "det").enumerate().map(|(i, det)| item(det, i)).collect(),
        totals: child(inf, "total")
            .and_then(|t| child(t, "ICMSTot"))
            .map(totals)
            .unwrap_or_default(),
        transport: child(inf, "transp").map(transport).unwrap_or_default(),
        duplicates: child(inf, "cobr").map(duplicates).unwrap_or_default(),
        additional_info,
        fisco_info,
        protocol: first_text(&prot_scope, &["nProt"]),
        protocol_date: first_text(&prot_scope, &["dhRecbto"]),
    }
}

pub(crate) fn party(node: Node, address_tag: &str) -> Party {
    let scope = [node];
    let address = child(node, address_tag)
        .map(|addr| {
            let s = [addr];
            Address {
                street: first_text(&s, &["xLgr"]),
                number: first_text(&s, &["nro"]),
                complement: first_text(&s, &["xCpl"]),
                district: first_text(&s, &["xBairro"]),
                city: first_text(&s, &["xMun"]),
                city_code: first_text(&s, &["cMun"]),
                state: first_text(&s, &["UF"]),
                zip_code: first_text(&s, &["CEP"]),
            }
        })
        .unwrap_or_default();

    let phone = child(node, address_tag)
        .map(|addr| first_text(&[addr], &["fone"]))
        .unwrap_or_default();

    Party {
        document: first_text(&scope, &["CNPJ", "CPF", "idEstrangeiro"]),
        name: first_text(&scope, &["xNome"]),
        trade_name: first_text(&scope, &["xFant"]),
        state_registration: first_text(&scope, &["IE"]),
        municipal_registration: first_text(&scope, &["IM"]),
        address,
        phone,
        email: first_text(&scope, &["email"]),
    }
}

fn item(det: Node, index: usize) -> NfeItem {
    let prod: Vec<Node> = child(det, "prod").into_iter().collect();
    let imposto = child(det, "imposto");

    // ICMS00, ICMS20, ICMSSN102... o grupo filho varia com a tributação
    let icms: Vec<Node> = imposto
        .and_then(|i| child(i, "ICMS"))
        .and_then(first_element_child)
        .into_iter()
        .collect();
    let ipi: Vec<Node> = imposto
        .and_then(|i| child(i, "IPI"))
        .and_then(|ipi| child(ipi, "IPITrib"))
        .into_iter()
        .collect();

    let origin = first_text(&icms, &["orig"]);
    let cst = first_text(&icms, &["CST", "CSOSN"]);

    NfeItem {
        number: attr(det, "nItem")
            .and_then(|n| n.parse().ok())
            .unwrap_or(index as u32 + 1),
        code: first_text(&prod, &["cProd"]),
        description: first_text(&prod, &["xProd"]),
        ncm: first_text(&prod, &["NCM"]),
        cst: format!("{origin}{cst}"),
        cfop: first_text(&prod, &["CFOP"]),
        unit: first_text(&prod, &["uCom", "uTrib"]),
        quantity: first_decimal(&prod, &["qCom", "qTrib"]),
        unit_price: first_decimal(&prod, &["vUnCom", "vUnTrib"]),
        total: first_decimal(&prod, &["vProd"]),
        icms_base: first_decimal(&icms, &["vBC"]),
        icms_value: first_decimal(&icms, &["vICMS"]),
        icms_rate: first_decimal(&icms, &["pICMS"]),
        ipi_value: first_decimal(&ipi, &["vIPI"]),
        ipi_rate: first_decimal(&ipi, &["pIPI"]),
    }
}

fn totals(node: Node) -> NfeTotals {
    let s = [node];
    NfeTotals {
        icms_base: first_decimal(&s, &["vBC"]),
        icms: first_decimal(&s, &["vICMS"]),
        icms_st_base: first_decimal(&s, &["vBCST"]),
        icms_st: first_decimal(&s, &["vST"]),
        products: first_decimal(&s, &["vProd"]),
        freight: first_decimal(&s, &["vFrete"]),
        insurance: first_decimal(&s, &["vSeg"]),
        discount: first_decimal(&s, &["vDesc"]),
        other: first_decimal(&s, &["vOutro"]),
        ipi: first_decimal(&s, &["vIPI"]),
        pis: first_decimal(&s, &["vPIS"]),
        cofins: first_decimal(&s, &["vCOFINS"]),
        total: first_decimal(&s, &["vNF"]),
        approximate_taxes: first_decimal(&s, &["vTotTrib"]),
    }
}

fn transport(node: Node) -> NfeTransport {
    let s = [node];
    let carrier = child(node, "transporta")
        .map(|t| {
            let ts = [t];
            Party {
                document: first_text(&ts, &["CNPJ", "CPF"]),
                name: first_text(&ts, &["xNome"]),
                state_registration: first_text(&ts, &["IE"]),
                address: Address {
                    street: first_text(&ts, &["xEnder"]),
                    city: first_text(&ts, &["xMun"]),
                    state: first_text(&ts, &["UF"]),
                    ..Default::default()
                },
                ..Default::default()
            }
        })
        .unwrap_or_default();
    let vehicle: Vec<Node> = child(node, "veicTransp").into_iter().collect();
    let volume: Vec<Node> = child(node, "vol").into_iter().collect();

    NfeTransport {
        freight_mode: first_text(&s, &["modFrete"]),
        carrier,
        vehicle_plate: first_text(&vehicle, &["placa"]),
        vehicle_state: first_text(&vehicle, &["UF"]),
        volume_quantity: first_text(&volume, &["qVol"]),
        volume_species: first_text(&volume, &["esp"]),
        volume_brand: first_text(&volume, &["marca"]),
        gross_weight: first_text(&volume, &["pesoB"]),
        net_weight: first_text(&volume, &["pesoL"]),
    }
}

fn duplicates(cobr: Node) -> Vec<NfeDuplicate> {
    children(cobr, "dup")
        .map(|dup| {
            let s = [dup];
            NfeDuplicate {
                number: first_text(&s, &["nDup"]),
                due_date: first_text(&s, &["dVenc"]),
                amount: first_decimal(&s, &["vDup"]),
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::str::FromStr;

    pub(crate) const NFE_PROC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<nfeProc xmlns="http://www.portalfiscal.inf.br/nfe" versao="4.00">
  <NFe>
    <infNFe Id="NFe35240311222333000181550010000001231000001234" versao="4.00">
      <ide><mod>55</mod><serie>1</serie><nNF>123</nNF><natOp>VENDA DE MERCADORIA</natOp>
        <dhEmi>2024-03-15T10:30:00-03:00</dhEmi><tpNF>1</tpNF></ide>
      <emit><CNPJ>11222333000181</CNPJ><xNome>Fornecedor Exemplo LTDA</xNome><xFant>Exemplo</xFant>
        <enderEmit><xLgr>Rua A</xLgr><nro>100</nro><xBairro>Centro</xBairro><cMun>3550308</cMun>
          <xMun>São Paulo</xMun><UF>SP</UF><CEP>01310100</CEP><fone>1133334444</fone></enderEmit>
        <IE>123456789</IE></emit>
      <dest><CNPJ>44555666000199</CNPJ><xNome>Cliente Destino SA</xNome>
        <enderDest><xLgr>Av B</xLgr><nro>2</nro><xMun>Campinas</xMun><UF>SP</UF></enderDest></dest>
      <det nItem="1">
        <prod><cProd>P-01</cProd><xProd>Parafuso</xProd><NCM>73181500</NCM><CFOP>5102</CFOP>
          <uCom>UN</uCom><qCom>10.0000</qCom><vUnCom>2.5000</vUnCom><vProd>25.00</vProd></prod>
        <imposto><ICMS><ICMS00><orig>0</orig><CST>00</CST><vBC>25.00</vBC><pICMS>18.00</pICMS><vICMS>4.50</vICMS></ICMS00></ICMS></imposto>
      </det>
      <det nItem="2">
        <prod><cProd>P-02</cProd><xProd>Porca</xProd><CFOP>5102</CFOP><uCom>UN</uCom>
          <qCom>5</qCom><vUnCom>1</vUnCom><vProd>5.00</vProd></prod>
        <imposto><ICMS><ICMSSN102><orig>0</orig><CSOSN>102</CSOSN></ICMSSN102></ICMS></imposto>
      </det>
      <total><ICMSTot><vBC>25.00</vBC><vICMS>4.50</vICMS><vProd>30.00</vProd><vFrete>0.00</vFrete><vNF>30.00</vNF></ICMSTot></total>
      <transp><modFrete>9</modFrete></transp>
      <cobr><dup><nDup>001</nDup><dVenc>2024-04-15</dVenc><vDup>30.00</vDup></dup></cobr>
      <infAdic><infCpl>Pedido 987</infCpl></infAdic>
    </infNFe>
  </NFe>
  <protNFe><infProt><chNFe>35240311222333000181550010000001231000001234</chNFe>
    <dhRecbto>2024-03-15T10:31:00-03:00</dhRecbto><nProt>135240000000001</nProt></infProt></protNFe>
</nfeProc>"#;

    #[test]
    fn extracts_nfe_proc() {
        let data = extract_nfe(NFE_PROC.as_bytes()).unwrap();
        assert_eq!(data.access_key, "35240311222333000181550010000001231000001234");
        assert_eq!(data.number, "123");
        assert_eq!(data.issue_date, "2024-03-15T10:30:00-03:00");
        assert_eq!(data.issuer.document, "11222333000181");
        assert_eq!(data.issuer.address.city, "São Paulo");
        assert_eq!(data.issuer.phone, "1133334444");
        assert_eq!(data.recipient.name, "Cliente Destino SA");
        assert_eq!(data.items.len(), 2);
        assert_eq!(data.items[0].cst, "000");
        assert_eq!(data.items[1].cst, "0102");
        assert_eq!(data.items[0].icms_value, Decimal::from_str("4.50").unwrap());
        assert_eq!(data.totals.total, Decimal::from_str("30").unwrap());
        assert_eq!(data.duplicates.len(), 1);
        assert_eq!(data.protocol, "135240000000001");
        assert_eq!(data.additional_info, "Pedido 987");
    }

    #[test]
    fn access_key_falls_back_to_protocol() {
        let xml = NFE_PROC.replace(
            r#"Id="NFe35240311222333000181550010000001231000001234""#,
            r#"Id="NFe123""#,
        );
        let data = extract_nfe(xml.as_bytes()).unwrap();
        assert_eq!(data.access_key, "35240311222333000181550010000001231000001234");
    }

    #[test]
    fn extraction_is_idempotent() {
        let a = extract_nfe(NFE_PROC.as_bytes()).unwrap();
        let b = extract_nfe(NFE_PROC.as_bytes()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_root_is_rejected() {
        let err = extract_nfe(b"<foo><bar/></foo>").unwrap_err();
        assert_eq!(err, XmlError::UnrecognizedStructure);
    }
}
