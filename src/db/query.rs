// src/db/query.rs
//
// Pedaços de SQL compartilhados pelas listagens. Todo valor vindo do cliente
// entra como parâmetro (`push_bind`); só nomes de coluna fixos viram texto.

use sqlx::{Postgres, QueryBuilder};

use crate::common::pagination::Page;

/// Termo de busca pronto para `ILIKE`, com `%`, `_` e `\` escapados.
/// Termo vazio (ou só espaços) não filtra nada.
pub(crate) fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    Some(escaped)
}

/// ` AND (a ILIKE $1 OR b ILIKE $2 ...)`
pub(crate) fn push_search(qb: &mut QueryBuilder<'_, Postgres>, columns: &[&str], term: Option<&str>) {
    let Some(pattern) = like_pattern(term) else {
        return;
    };
    if columns.is_empty() {
        return;
    }

    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column).push(" ILIKE ").push_bind(pattern.clone());
    }
    qb.push(")");
}

pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Page) {
    qb.push(" LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(like_pattern(Some(" abc ")).as_deref(), Some("%abc%"));
        assert_eq!(like_pattern(Some("100%_a\\b")).as_deref(), Some("%100\\%\\_a\\\\b%"));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }

    #[test]
    fn search_binds_one_parameter_per_column() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t WHERE 1=1");
        push_search(&mut qb, &["name", "cnpj"], Some("acme'; DROP TABLE t;--"));
        assert_eq!(qb.sql(), "SELECT * FROM t WHERE 1=1 AND (name ILIKE $1 OR cnpj ILIKE $2)");
    }

    #[test]
    fn empty_search_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t WHERE 1=1");
        push_search(&mut qb, &["name"], Some(""));
        assert_eq!(qb.sql(), "SELECT * FROM t WHERE 1=1");
    }

    #[test]
    fn page_is_bound() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        push_page(&mut qb, Page::new(Some(3), Some(10)));
        assert_eq!(qb.sql(), "SELECT * FROM t LIMIT $1 OFFSET $2");
    }
}
