// src/fiscal/xml.rs
//
// Navegação por nome local (sem namespace, sem diferenciar maiúsculas) sobre a
// árvore do roxmltree. Os layouts municipais variam a caixa das tags
// (`InfNfse`, `infNfse`), então a comparação é sempre case-insensitive.

use std::str::FromStr;

use roxmltree::{Document, Node};
use rust_decimal::Decimal;

use super::XmlError;

pub(crate) fn parse(text: &str) -> Result<Document<'_>, XmlError> {
    Document::parse(text).map_err(|e| XmlError::Malformed(e.to_string()))
}

pub(crate) fn is_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name().eq_ignore_ascii_case(name)
}

pub(crate) fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| is_named(n, name))
}

pub(crate) fn children<'a, 'i>(node: Node<'a, 'i>, name: &str) -> impl Iterator<Item = Node<'a, 'i>> {
    node.children().filter(move |n| is_named(n, name))
}

pub(crate) fn first_element_child<'a, 'i>(node: Node<'a, 'i>) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.is_element())
}

/// Segue um caminho `a/b/c` a partir de `node`.
pub(crate) fn at<'a, 'i>(node: Node<'a, 'i>, path: &str) -> Option<Node<'a, 'i>> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(node, |current, segment| child(current, segment))
}

/// Primeiro descendente (incluindo o próprio nó) com o nome dado.
pub(crate) fn find<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.descendants().find(|n| is_named(n, name))
}

pub(crate) fn text(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn text_at(node: Node, path: &str) -> Option<String> {
    at(node, path).and_then(text)
}

pub(crate) fn attr(node: Node, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Cadeia de fallback: o primeiro caminho que tiver valor em algum escopo vence.
/// Campo ausente vira string vazia.
pub(crate) fn first_text(scopes: &[Node], paths: &[&str]) -> String {
    for path in paths {
        for scope in scopes {
            if let Some(value) = text_at(*scope, path) {
                return value;
            }
        }
    }
    String::new()
}

pub(crate) fn first_decimal(scopes: &[Node], paths: &[&str]) -> Decimal {
    parse_decimal(&first_text(scopes, paths))
}

/// `1500.00`, `1.500,00`, `1500,5` e `1,500.00` são aceitos; o resto vira zero.
/// O separador decimal é o que aparece por último.
pub(crate) fn parse_decimal(raw: &str) -> Decimal {
    let raw = raw.trim();
    if raw.is_empty() {
        return Decimal::ZERO;
    }
    let normalized = match (raw.rfind(','), raw.rfind('.')) {
        (Some(comma), Some(dot)) if dot > comma => raw.replace(',', ""),
        (Some(_), _) => raw.replace('.', "").replace(',', "."),
        _ => raw.to_string(),
    };
    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<Root xmlns="http://example.com/ns">
        <InfNfse><Numero> 42 </Numero><Valores><ValorIss>1.234,56</ValorIss></Valores></InfNfse>
        <Item n="1"/><Item n="2"/>
    </Root>"#;

    #[test]
    fn navigates_ignoring_case_and_namespace() {
        let doc = parse(SAMPLE).unwrap();
        let root = doc.root_element();
        assert_eq!(text_at(root, "infnfse/NUMERO").as_deref(), Some("42"));
        assert!(find(root, "valoriss").is_some());
        assert_eq!(children(root, "item").count(), 2);
        assert_eq!(attr(child(root, "Item").unwrap(), "n").as_deref(), Some("1"));
    }

    #[test]
    fn fallback_chain_takes_first_present_path() {
        let doc = parse(SAMPLE).unwrap();
        let root = doc.root_element();
        assert_eq!(first_text(&[root], &["Missing/Path", "InfNfse/Numero"]), "42");
        assert_eq!(first_text(&[root], &["Nope"]), "");
        assert_eq!(
            first_decimal(&[root], &["InfNfse/Valores/ValorIss"]),
            Decimal::from_str("1234.56").unwrap()
        );
    }

    #[test]
    fn parses_decimal_variants() {
        assert_eq!(parse_decimal("1500.00"), Decimal::from_str("1500.00").unwrap());
        assert_eq!(parse_decimal("1500,5"), Decimal::from_str("1500.5").unwrap());
        assert_eq!(parse_decimal("1.500,00"), Decimal::from_str("1500.00").unwrap());
        assert_eq!(parse_decimal("1,234.56"), Decimal::from_str("1234.56").unwrap());
        assert_eq!(parse_decimal("12,345,678.9"), Decimal::from_str("12345678.9").unwrap());
        assert_eq!(parse_decimal("abc"), Decimal::ZERO);
        assert_eq!(parse_decimal(""), Decimal::ZERO);
    }

    #[test]
    fn malformed_xml_is_reported() {
        assert!(matches!(parse("<a><b></a>"), Err(XmlError::Malformed(_))));
    }
}
