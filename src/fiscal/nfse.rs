// src/fiscal/nfse.rs
//
// NFSe recebida. Três famílias de layout convivem nos arquivos que chegam:
// padrão nacional (`NFSe/infNFSe`), NFSe no formato de NFe (`infNFe` com
// `ISSQNtot`) e os layouts municipais ABRASF (`CompNfse/Nfse/InfNfse`).
// A ordem de tentativa é fixa e segue essa mesma sequência.

use roxmltree::Node;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::xml::{self, attr, child, children, find, first_decimal, first_text};
use super::{decode_payload, nfe, Address, Party, XmlError};
use crate::common::format::only_digits;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum NfseLayout {
    #[default]
    National,
    LegacyNfe,
    Abrasf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfseService {
    pub description: String,
    /// Item da lista de serviços (LC 116) ou código de tributação nacional
    pub service_code: String,
    pub municipal_tax_code: String,
    pub cnae: String,
    pub location_city_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfseValues {
    pub service_amount: Decimal,
    pub deductions: Decimal,
    pub unconditional_discount: Decimal,
    pub calculation_base: Decimal,
    pub pis: Decimal,
    pub cofins: Decimal,
    pub inss: Decimal,
    pub ir: Decimal,
    pub csll: Decimal,
    pub iss_rate: Decimal,
    pub iss_amount: Decimal,
    pub iss_withheld: bool,
    pub net_amount: Decimal,
}

impl NfseValues {
    fn federal_withholdings(&self) -> Decimal {
        self.pis + self.cofins + self.inss + self.ir + self.csll
    }

    /// Valor líquido informado ou, na falta dele, calculado.
    fn fill_net_amount(&mut self) {
        if self.net_amount.is_zero() && !self.service_amount.is_zero() {
            let mut net = self.service_amount - self.unconditional_discount - self.federal_withholdings();
            if self.iss_withheld {
                net -= self.iss_amount;
            }
            self.net_amount = net;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NfseData {
    pub layout: NfseLayout,
    pub number: String,
    pub verification_code: String,
    pub access_key: String,
    pub issue_date: String,
    pub competence: String,
    pub municipality: String,
    pub provider: Party,
    pub taker: Party,
    pub service: NfseService,
    pub values: NfseValues,
}

pub fn extract_nfse(raw: &[u8]) -> Result<NfseData, XmlError> {
    let text = decode_payload(raw)?;
    let doc = xml::parse(&text)?;
    let root = doc.root_element();

    let mut data = if let Some(inf) = national_anchor(root) {
        national(inf)
    } else if let Some(inf) = find(root, "infNFe") {
        legacy_nfe(root, inf)
    } else if let Some(inf) = find(root, "InfNfse") {
        abrasf(inf)
    } else {
        return Err(XmlError::UnrecognizedStructure);
    };

    data.values.fill_net_amount();
    Ok(data)
}

// O padrão nacional usa exatamente `NFSe/infNFSe`; sem isso `InfNfse` (ABRASF)
// casaria aqui por causa da comparação sem caixa.
fn national_anchor<'a, 'i>(root: Node<'a, 'i>) -> Option<Node<'a, 'i>> {
    root.descendants().find(|n| {
        n.is_element()
            && n.tag_name().name() == "infNFSe"
            && n.parent_element().is_some_and(|p| p.tag_name().name() == "NFSe")
    })
}

// --- Padrão nacional -------------------------------------------------------

fn national(inf: Node) -> NfseData {
    let dps = xml::at(inf, "DPS/infDPS");
    let dps_scope: Vec<Node> = dps.into_iter().collect();
    let inf_scope = [inf];

    let provider = child(inf, "emit")
        .map(national_party)
        .or_else(|| dps.and_then(|d| child(d, "prest")).map(national_party))
        .unwrap_or_default();
    let taker = dps
        .and_then(|d| child(d, "toma"))
        .map(national_party)
        .unwrap_or_default();

    let serv: Vec<Node> = dps.and_then(|d| child(d, "serv")).into_iter().collect();
    let dps_values: Vec<Node> = dps.and_then(|d| child(d, "valores")).into_iter().collect();
    let trib_mun: Vec<Node> = dps_values
        .first()
        .and_then(|v| xml::at(*v, "trib/tribMun"))
        .into_iter()
        .collect();
    let trib_fed: Vec<Node> = dps_values
        .first()
        .and_then(|v| xml::at(*v, "trib/tribFed"))
        .into_iter()
        .collect();
    let nfse_values: Vec<Node> = child(inf, "valores").into_iter().collect();

    let access_key = attr(inf, "Id").map(|id| only_digits(&id)).unwrap_or_default();

    let values = NfseValues {
        service_amount: first_decimal(&dps_values, &["vServPrest/vServ", "vServ"]),
        deductions: first_decimal(&dps_values, &["vDedRed/vDR"]),
        unconditional_discount: first_decimal(&dps_values, &["vDescCondIncond/vDescIncond"]),
        calculation_base: first_decimal(&nfse_values, &["vBC"]),
        pis: first_decimal(&trib_fed, &["piscofins/vPis"]),
        cofins: first_decimal(&trib_fed, &["piscofins/vCofins"]),
        inss: first_decimal(&trib_fed, &["vRetCP"]),
        ir: first_decimal(&trib_fed, &["vRetIRRF"]),
        csll: first_decimal(&trib_fed, &["vRetCSLL"]),
        iss_rate: {
            let rate = first_decimal(&nfse_values, &["pAliqAplic"]);
            if rate.is_zero() { first_decimal(&trib_mun, &["pAliq"]) } else { rate }
        },
        iss_amount: first_decimal(&nfse_values, &["vISSQN"]),
        // tpRetISSQN: 1 = não retido, 2 = retido pelo tomador, 3 = retido pelo intermediário
        iss_withheld: matches!(first_text(&trib_mun, &["tpRetISSQN"]).as_str(), "2" | "3"),
        net_amount: first_decimal(&nfse_values, &["vLiq"]),
    };

    NfseData {
        layout: NfseLayout::National,
        number: first_text(&inf_scope, &["nNFSe", "nDFSe"]),
        verification_code: access_key.clone(),
        access_key,
        issue_date: first_text(&dps_scope, &["dhEmi"]),
        competence: first_text(&dps_scope, &["dCompet"]),
        municipality: first_text(&inf_scope, &["xLocPrestacao", "xLocEmi"]),
        provider,
        taker,
        service: NfseService {
            description: first_text(&serv, &["cServ/xDescServ"]),
            service_code: first_text(&serv, &["cServ/cTribNac"]),
            municipal_tax_code: first_text(&serv, &["cServ/cTribMun"]),
            cnae: first_text(&serv, &["cServ/cNBS"]),
            location_city_code: first_text(&serv, &["locPrest/cLocPrestacao"]),
        },
        values,
    }
}

fn national_party(node: Node) -> Party {
    let scope = [node];
    let address = child(node, "enderNac")
        .or_else(|| child(node, "end"))
        .map(|addr| {
            let s = [addr];
            Address {
                street: first_text(&s, &["xLgr"]),
                number: first_text(&s, &["nro"]),
                complement: first_text(&s, &["xCpl"]),
                district: first_text(&s, &["xBairro"]),
                city: first_text(&s, &["xMun"]),
                city_code: first_text(&s, &["cMun", "endNac/cMun"]),
                state: first_text(&s, &["UF"]),
                zip_code: first_text(&s, &["CEP", "endNac/CEP"]),
            }
        })
        .unwrap_or_default();

    Party {
        document: first_text(&scope, &["CNPJ", "CPF", "NIF"]),
        name: first_text(&scope, &["xNome"]),
        trade_name: first_text(&scope, &["xFant"]),
        state_registration: String::new(),
        municipal_registration: first_text(&scope, &["IM"]),
        address,
        phone: first_text(&scope, &["fone"]),
        email: first_text(&scope, &["email"]),
    }
}

// --- NFSe no formato NFe ---------------------------------------------------

fn legacy_nfe(root: Node, inf: Node) -> NfseData {
    let goods = nfe::from_inf_nfe(root, inf);
    let ide: Vec<Node> = child(inf, "ide").into_iter().collect();
    let issqn_tot: Vec<Node> = xml::at(inf, "total/ISSQNtot").into_iter().collect();
    let ret_trib: Vec<Node> = xml::at(inf, "total/retTrib").into_iter().collect();
    let icms_tot: Vec<Node> = xml::at(inf, "total/ICMSTot").into_iter().collect();
    let first_issqn: Vec<Node> = children(inf, "det")
        .filter_map(|det| xml::at(det, "imposto/ISSQN"))
        .take(1)
        .collect();

    let description = children(inf, "det")
        .filter_map(|det| xml::text_at(det, "prod/xProd"))
        .collect::<Vec<_>>()
        .join("; ");

    let values = NfseValues {
        service_amount: first_decimal(&issqn_tot, &["vServ"]),
        deductions: first_decimal(&issqn_tot, &["vDeducao"]),
        unconditional_discount: first_decimal(&issqn_tot, &["vDescIncond"]),
        calculation_base: first_decimal(&issqn_tot, &["vBC"]),
        pis: first_decimal(&ret_trib, &["vRetPIS"]),
        cofins: first_decimal(&ret_trib, &["vRetCOFINS"]),
        inss: first_decimal(&ret_trib, &["vRetPrev"]),
        ir: first_decimal(&ret_trib, &["vIRRF"]),
        csll: first_decimal(&ret_trib, &["vRetCSLL"]),
        iss_rate: first_decimal(&first_issqn, &["vAliq"]),
        iss_amount: first_decimal(&issqn_tot, &["vISS"]),
        iss_withheld: !first_decimal(&issqn_tot, &["vISSRet"]).is_zero(),
        net_amount: first_decimal(&icms_tot, &["vNF"]),
    };

    NfseData {
        layout: NfseLayout::LegacyNfe,
        number: goods.number,
        verification_code: goods.protocol.clone(),
        access_key: goods.access_key,
        issue_date: goods.issue_date,
        competence: first_text(&issqn_tot, &["dCompet"]),
        municipality: {
            let city = goods.issuer.address.city.clone();
            if city.is_empty() { first_text(&ide, &["cMunFG"]) } else { city }
        },
        provider: goods.issuer,
        taker: goods.recipient,
        service: NfseService {
            description,
            service_code: first_text(&first_issqn, &["cListServ"]),
            municipal_tax_code: first_text(&first_issqn, &["cServico"]),
            cnae: String::new(),
            location_city_code: first_text(&first_issqn, &["cMunFG"]),
        },
        values,
    }
}

// --- ABRASF (layouts municipais) -------------------------------------------

fn abrasf(inf: Node) -> NfseData {
    // v2.x guarda os dados da declaração num grupo à parte; v1 deixa tudo no InfNfse
    let decl = xml::at(inf, "DeclaracaoPrestacaoServico/InfDeclaracaoPrestacaoServico");
    let scopes: Vec<Node> = decl.into_iter().chain(std::iter::once(inf)).collect();

    // Em v2 o prestador da declaração só tem CNPJ e IM; nome e endereço ficam no InfNfse
    let provider = merged_party(&scopes, &["Prestador", "PrestadorServico"]);
    let taker = merged_party(&scopes, &["TomadorServico", "Tomador"]);

    let servico: Vec<Node> = scopes.iter().filter_map(|s| child(*s, "Servico")).collect();
    let valores: Vec<Node> = servico.iter().filter_map(|s| child(*s, "Valores")).collect();
    let valores_nfse: Vec<Node> = child(inf, "ValoresNfse").into_iter().collect();
    let all_values: Vec<Node> = valores_nfse.iter().chain(valores.iter()).copied().collect();

    let iss_withheld_flag = first_text(&valores, &["IssRetido"]);
    let iss_withheld_flag = if iss_withheld_flag.is_empty() {
        first_text(&servico, &["IssRetido"])
    } else {
        iss_withheld_flag
    };

    let values = NfseValues {
        service_amount: first_decimal(&valores, &["ValorServicos"]),
        deductions: first_decimal(&valores, &["ValorDeducoes"]),
        unconditional_discount: first_decimal(&valores, &["DescontoIncondicionado"]),
        calculation_base: first_decimal(&all_values, &["BaseCalculo"]),
        pis: first_decimal(&valores, &["ValorPis"]),
        cofins: first_decimal(&valores, &["ValorCofins"]),
        inss: first_decimal(&valores, &["ValorInss"]),
        ir: first_decimal(&valores, &["ValorIr"]),
        csll: first_decimal(&valores, &["ValorCsll"]),
        iss_rate: normalize_rate(first_decimal(&all_values, &["Aliquota"])),
        iss_amount: first_decimal(&all_values, &["ValorIss", "ValorIssRetido"]),
        // ABRASF: 1 = sim, 2 = não
        iss_withheld: iss_withheld_flag == "1",
        net_amount: first_decimal(&all_values, &["ValorLiquidoNfse"]),
    };

    let inf_scope = [inf];
    let orgao: Vec<Node> = child(inf, "OrgaoGerador").into_iter().collect();

    NfseData {
        layout: NfseLayout::Abrasf,
        number: first_text(&inf_scope, &["Numero"]),
        verification_code: first_text(&inf_scope, &["CodigoVerificacao"]),
        access_key: String::new(),
        issue_date: first_text(&inf_scope, &["DataEmissao"]),
        competence: first_text(&scopes, &["Competencia"]),
        municipality: {
            let city = first_text(&orgao, &["CodigoMunicipio"]);
            if city.is_empty() { first_text(&servico, &["CodigoMunicipio", "MunicipioIncidencia"]) } else { city }
        },
        provider,
        taker,
        service: NfseService {
            description: first_text(&servico, &["Discriminacao"]),
            service_code: first_text(&servico, &["ItemListaServico"]),
            municipal_tax_code: first_text(&servico, &["CodigoTributacaoMunicipio"]),
            cnae: first_text(&servico, &["CodigoCnae"]),
            location_city_code: first_text(&servico, &["CodigoMunicipio"]),
        },
        values,
    }
}

fn merged_party(scopes: &[Node], tags: &[&str]) -> Party {
    let mut merged = Party::default();
    for scope in scopes {
        for tag in tags {
            if let Some(node) = child(*scope, tag) {
                fill_missing(&mut merged, abrasf_party(node));
            }
        }
    }
    merged
}

fn fill_missing(into: &mut Party, other: Party) {
    fn take(slot: &mut String, value: String) {
        if slot.is_empty() {
            *slot = value;
        }
    }
    take(&mut into.document, other.document);
    take(&mut into.name, other.name);
    take(&mut into.trade_name, other.trade_name);
    take(&mut into.municipal_registration, other.municipal_registration);
    take(&mut into.phone, other.phone);
    take(&mut into.email, other.email);
    if into.address == Address::default() {
        into.address = other.address;
    }
}

fn abrasf_party(node: Node) -> Party {
    let scope = [node];
    let address: Vec<Node> = child(node, "Endereco").into_iter().collect();
    let contact: Vec<Node> = child(node, "Contato").into_iter().collect();

    let document = first_text(
        &scope,
        &[
            "IdentificacaoPrestador/CpfCnpj/Cnpj",
            "IdentificacaoPrestador/CpfCnpj/Cpf",
            "IdentificacaoPrestador/Cnpj",
            "IdentificacaoTomador/CpfCnpj/Cnpj",
            "IdentificacaoTomador/CpfCnpj/Cpf",
            "CpfCnpj/Cnpj",
            "CpfCnpj/Cpf",
            "Cnpj",
        ],
    );

    Party {
        document,
        name: first_text(&scope, &["RazaoSocial", "NomeFantasia"]),
        trade_name: first_text(&scope, &["NomeFantasia"]),
        state_registration: String::new(),
        municipal_registration: first_text(
            &scope,
            &[
                "IdentificacaoPrestador/InscricaoMunicipal",
                "IdentificacaoTomador/InscricaoMunicipal",
                "InscricaoMunicipal",
            ],
        ),
        address: Address {
            // o logradouro vem num <Endereco> dentro de <Endereco>
            street: first_text(&address, &["Endereco", "Logradouro"]),
            number: first_text(&address, &["Numero"]),
            complement: first_text(&address, &["Complemento"]),
            district: first_text(&address, &["Bairro"]),
            city: first_text(&address, &["Municipio", "CodigoMunicipio"]),
            city_code: first_text(&address, &["CodigoMunicipio"]),
            state: first_text(&address, &["Uf", "Estado"]),
            zip_code: first_text(&address, &["Cep"]),
        },
        phone: first_text(&contact, &["Telefone"]),
        email: first_text(&contact, &["Email"]),
    }
}

/// Alguns municípios mandam a alíquota como fração (0.05) em vez de percentual (5).
fn normalize_rate(rate: Decimal) -> Decimal {
    if !rate.is_zero() && rate < Decimal::ONE {
        rate * Decimal::ONE_HUNDRED
    } else {
        rate
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    pub(crate) const NATIONAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NFSe xmlns="http://www.sped.fazenda.gov.br/nfse" versao="1.00">
  <infNFSe Id="NFS35503082211222333000181000000000000124030000000001">
    <xLocEmi>São Paulo</xLocEmi><xLocPrestacao>São Paulo</xLocPrestacao>
    <nNFSe>124</nNFSe>
    <emit><CNPJ>11222333000181</CNPJ><IM>1234567</IM><xNome>Prestadora de Serviços LTDA</xNome>
      <enderNac><xLgr>Rua das Flores</xLgr><nro>10</nro><xBairro>Centro</xBairro><cMun>3550308</cMun><UF>SP</UF><CEP>01001000</CEP></enderNac>
      <fone>11987654321</fone><email>contato@prestadora.com.br</email></emit>
    <valores><vBC>1000.00</vBC><pAliqAplic>5.00</pAliqAplic><vISSQN>50.00</vISSQN><vLiq>950.00</vLiq></valores>
    <DPS versao="1.00"><infDPS Id="DPS1">
      <dhEmi>2024-03-20T09:00:00-03:00</dhEmi><dCompet>2024-03-01</dCompet>
      <toma><CNPJ>44555666000199</CNPJ><xNome>Tomadora SA</xNome>
        <end><endNac><cMun>3509502</cMun><CEP>13010000</CEP></endNac><xLgr>Av Brasil</xLgr><nro>500</nro><xBairro>Jardim</xBairro></end></toma>
      <serv><locPrest><cLocPrestacao>3550308</cLocPrestacao></locPrest>
        <cServ><cTribNac>010101</cTribNac><xDescServ>Consultoria em tecnologia da informação</xDescServ></cServ></serv>
      <valores><vServPrest><vServ>1000.00</vServ></vServPrest>
        <trib><tribMun><tribISSQN>1</tribISSQN><tpRetISSQN>2</tpRetISSQN></tribMun></trib></valores>
    </infDPS></DPS>
  </infNFSe>
</NFSe>"#;

    pub(crate) const ABRASF_V2: &str = r#"<ConsultarNfseResposta xmlns="http://www.abrasf.org.br/nfse.xsd">
  <ListaNfse><CompNfse><Nfse versao="2.02"><InfNfse Id="n1">
    <Numero>2024000077</Numero><CodigoVerificacao>AB12-CD34</CodigoVerificacao>
    <DataEmissao>2024-02-10T14:00:00</DataEmissao>
    <ValoresNfse><BaseCalculo>2000.00</BaseCalculo><Aliquota>2.00</Aliquota><ValorIss>40.00</ValorIss><ValorLiquidoNfse>1960.00</ValorLiquidoNfse></ValoresNfse>
    <PrestadorServico><RazaoSocial>Manutenção Predial ME</RazaoSocial>
      <Endereco><Endereco>Rua Sete</Endereco><Numero>7</Numero><Bairro>Vila Nova</Bairro><CodigoMunicipio>4106902</CodigoMunicipio><Uf>PR</Uf><Cep>80000000</Cep></Endereco>
      <Contato><Telefone>4133221100</Telefone></Contato></PrestadorServico>
    <OrgaoGerador><CodigoMunicipio>4106902</CodigoMunicipio><Uf>PR</Uf></OrgaoGerador>
    <DeclaracaoPrestacaoServico><InfDeclaracaoPrestacaoServico>
      <Competencia>2024-02-01</Competencia>
      <Servico><Valores><ValorServicos>2000.00</ValorServicos><ValorPis>0</ValorPis><ValorIss>40.00</ValorIss><Aliquota>2.00</Aliquota></Valores>
        <IssRetido>2</IssRetido><ItemListaServico>07.10</ItemListaServico>
        <Discriminacao>Manutenção preventiva do elevador</Discriminacao><CodigoMunicipio>4106902</CodigoMunicipio></Servico>
      <Prestador><CpfCnpj><Cnpj>55666777000122</Cnpj></CpfCnpj><InscricaoMunicipal>998877</InscricaoMunicipal></Prestador>
      <TomadorServico><IdentificacaoTomador><CpfCnpj><Cnpj>44555666000199</Cnpj></CpfCnpj></IdentificacaoTomador>
        <RazaoSocial>Tomadora SA</RazaoSocial></TomadorServico>
    </InfDeclaracaoPrestacaoServico></DeclaracaoPrestacaoServico>
  </InfNfse></Nfse></CompNfse></ListaNfse>
</ConsultarNfseResposta>"#;

    const ABRASF_V1: &str = r#"<CompNfse><Nfse><InfNfse>
    <Numero>15</Numero><CodigoVerificacao>XYZ</CodigoVerificacao><DataEmissao>2023-11-05T08:00:00</DataEmissao>
    <Competencia>2023-11-01</Competencia>
    <Servico><Valores><ValorServicos>500,00</ValorServicos><ValorIr>7,50</ValorIr><IssRetido>1</IssRetido>
      <ValorIss>25,00</ValorIss><Aliquota>0.05</Aliquota></Valores>
      <ItemListaServico>1.05</ItemListaServico><Discriminacao>Licença de software</Discriminacao></Servico>
    <PrestadorServico><IdentificacaoPrestador><Cnpj>11222333000181</Cnpj><InscricaoMunicipal>42</InscricaoMunicipal></IdentificacaoPrestador>
      <RazaoSocial>Software House LTDA</RazaoSocial></PrestadorServico>
    <TomadorServico><IdentificacaoTomador><CpfCnpj><Cpf>12345678909</Cpf></CpfCnpj></IdentificacaoTomador><RazaoSocial>Fulano</RazaoSocial></TomadorServico>
  </InfNfse></Nfse></CompNfse>"#;

    const LEGACY_NFE: &str = r#"<nfeProc><NFe><infNFe Id="NFe35240311222333000181550010000009991000009990">
      <ide><nNF>999</nNF><dhEmi>2024-01-10T10:00:00-03:00</dhEmi><cMunFG>3550308</cMunFG></ide>
      <emit><CNPJ>11222333000181</CNPJ><xNome>Serviços Gerais LTDA</xNome><IM>555</IM></emit>
      <dest><CNPJ>44555666000199</CNPJ><xNome>Tomadora SA</xNome></dest>
      <det nItem="1"><prod><xProd>Instalação</xProd></prod><imposto><ISSQN><vAliq>3.00</vAliq><cListServ>14.06</cListServ></ISSQN></imposto></det>
      <det nItem="2"><prod><xProd>Configuração</xProd></prod></det>
      <total><ISSQNtot><vServ>300.00</vServ><vBC>300.00</vBC><vISS>9.00</vISS></ISSQNtot>
        <retTrib><vIRRF>4.50</vIRRF></retTrib></total>
    </infNFe></NFe></nfeProc>"#;

    #[test]
    fn extracts_national_layout() {
        let data = extract_nfse(NATIONAL.as_bytes()).unwrap();
        assert_eq!(data.layout, NfseLayout::National);
        assert_eq!(data.number, "124");
        assert_eq!(data.access_key, "35503082211222333000181000000000000124030000000001");
        assert_eq!(data.competence, "2024-03-01");
        assert_eq!(data.municipality, "São Paulo");
        assert_eq!(data.provider.document, "11222333000181");
        assert_eq!(data.provider.municipal_registration, "1234567");
        assert_eq!(data.provider.address.zip_code, "01001000");
        assert_eq!(data.taker.name, "Tomadora SA");
        assert_eq!(data.taker.address.city_code, "3509502");
        assert_eq!(data.taker.address.street, "Av Brasil");
        assert_eq!(data.service.service_code, "010101");
        assert_eq!(data.values.service_amount, dec("1000"));
        assert_eq!(data.values.iss_rate, dec("5"));
        assert_eq!(data.values.iss_amount, dec("50"));
        assert!(data.values.iss_withheld);
        assert_eq!(data.values.net_amount, dec("950"));
    }

    #[test]
    fn extracts_abrasf_v2_nested_in_response() {
        let data = extract_nfse(ABRASF_V2.as_bytes()).unwrap();
        assert_eq!(data.layout, NfseLayout::Abrasf);
        assert_eq!(data.number, "2024000077");
        assert_eq!(data.verification_code, "AB12-CD34");
        assert_eq!(data.competence, "2024-02-01");
        // CNPJ da declaração, nome do InfNfse
        assert_eq!(data.provider.document, "55666777000122");
        assert_eq!(data.provider.name, "Manutenção Predial ME");
        assert_eq!(data.provider.municipal_registration, "998877");
        assert_eq!(data.provider.address.street, "Rua Sete");
        assert_eq!(data.taker.document, "44555666000199");
        assert_eq!(data.service.service_code, "07.10");
        assert_eq!(data.values.service_amount, dec("2000"));
        assert_eq!(data.values.iss_amount, dec("40"));
        assert!(!data.values.iss_withheld);
        assert_eq!(data.values.net_amount, dec("1960"));
        assert_eq!(data.municipality, "4106902");
    }

    #[test]
    fn extracts_abrasf_v1_and_computes_net_amount() {
        let data = extract_nfse(ABRASF_V1.as_bytes()).unwrap();
        assert_eq!(data.layout, NfseLayout::Abrasf);
        assert_eq!(data.provider.document, "11222333000181");
        assert_eq!(data.taker.document, "12345678909");
        assert_eq!(data.values.iss_rate, dec("5"));
        assert!(data.values.iss_withheld);
        // 500 - 7,50 de IR - 25 de ISS retido
        assert_eq!(data.values.net_amount, dec("467.50"));
    }

    #[test]
    fn extracts_legacy_nfe_shaped_nfse() {
        let data = extract_nfse(LEGACY_NFE.as_bytes()).unwrap();
        assert_eq!(data.layout, NfseLayout::LegacyNfe);
        assert_eq!(data.number, "999");
        assert_eq!(data.provider.name, "Serviços Gerais LTDA");
        assert_eq!(data.service.description, "Instalação; Configuração");
        assert_eq!(data.service.service_code, "14.06");
        assert_eq!(data.values.iss_amount, dec("9"));
        assert_eq!(data.values.net_amount, dec("295.50"));
        assert_eq!(data.municipality, "3550308");
    }

    #[test]
    fn accepts_base64_payload() {
        let encoded = STANDARD.encode(NATIONAL);
        let from_b64 = extract_nfse(encoded.as_bytes()).unwrap();
        let from_xml = extract_nfse(NATIONAL.as_bytes()).unwrap();
        assert_eq!(from_b64, from_xml);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let data = extract_nfse(b"<NFSe><infNFSe><nNFSe>1</nNFSe></infNFSe></NFSe>").unwrap();
        assert_eq!(data.number, "1");
        assert_eq!(data.provider.name, "");
        assert_eq!(data.values.service_amount, Decimal::ZERO);
        assert_eq!(data.values.net_amount, Decimal::ZERO);
    }

    #[test]
    fn national_takes_priority_over_embedded_shapes() {
        let xml = NATIONAL.replace("<nNFSe>124</nNFSe>", "<nNFSe>124</nNFSe><InfNfse><Numero>9</Numero></InfNfse>");
        let data = extract_nfse(xml.as_bytes()).unwrap();
        assert_eq!(data.layout, NfseLayout::National);
        assert_eq!(data.number, "124");
    }

    #[test]
    fn unrecognized_structure_is_an_error() {
        assert_eq!(
            extract_nfse(b"<Pedido><Numero>1</Numero></Pedido>").unwrap_err(),
            XmlError::UnrecognizedStructure
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        for sample in [NATIONAL, ABRASF_V2, ABRASF_V1, LEGACY_NFE] {
            assert_eq!(
                extract_nfse(sample.as_bytes()).unwrap(),
                extract_nfse(sample.as_bytes()).unwrap()
            );
        }
    }
}
