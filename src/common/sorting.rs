// src/common/sorting.rs

use sqlx::{Postgres, QueryBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn parse(raw: Option<&str>, default: SortDirection) -> SortDirection {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            _ => default,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Colunas ordenáveis de uma entidade. Só nomes estáticos chegam ao SQL:
/// qualquer `sortBy` fora da lista cai na coluna padrão.
pub trait SortField: Copy {
    const DEFAULT: Self;
    const DEFAULT_DIRECTION: SortDirection;

    fn parse(raw: &str) -> Option<Self>;
    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: SortField> Sort<F> {
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let field = sort_by.and_then(|raw| F::parse(raw.trim())).unwrap_or(F::DEFAULT);
        Self {
            field,
            direction: SortDirection::parse(sort_order, F::DEFAULT_DIRECTION),
        }
    }

    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" ORDER BY ")
            .push(self.field.column())
            .push(" ")
            .push(self.direction.as_sql())
            // desempate estável para a paginação por offset
            .push(", id ASC");
    }
}

/// Gera um enum de colunas ordenáveis a partir de pares `nomeApi => coluna_sql`.
macro_rules! sort_fields {
    (
        $name:ident, default = $default:ident, direction = $dir:ident,
        { $($variant:ident => $api:literal : $column:literal),+ $(,)? }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $crate::common::sorting::SortField for $name {
            const DEFAULT: Self = $name::$default;
            const DEFAULT_DIRECTION: $crate::common::sorting::SortDirection =
                $crate::common::sorting::SortDirection::$dir;

            // `$api | $column` repete o padrão quando os nomes coincidem
            #[allow(unreachable_patterns)]
            fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($api | $column => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn column(self) -> &'static str {
                match self {
                    $($name::$variant => $column,)+
                }
            }
        }
    };
}

pub(crate) use sort_fields;

#[cfg(test)]
mod tests {
    use super::*;

    sort_fields!(TestSort, default = CreatedAt, direction = Desc, {
        Name => "name": "name",
        CreatedAt => "createdAt": "created_at",
    });

    fn sql_for(sort_by: Option<&str>, sort_order: Option<&str>) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        Sort::<TestSort>::from_params(sort_by, sort_order).push_order_by(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn accepts_api_and_column_names() {
        assert_eq!(sql_for(Some("name"), Some("asc")), "SELECT * FROM t ORDER BY name ASC, id ASC");
        assert_eq!(
            sql_for(Some("created_at"), Some("DESC")),
            "SELECT * FROM t ORDER BY created_at DESC, id ASC"
        );
    }

    #[test]
    fn unknown_values_fall_back_to_default() {
        let default_sql = sql_for(None, None);
        assert_eq!(sql_for(Some("name; DROP TABLE users;--"), None), default_sql);
        assert_eq!(sql_for(Some("createdAt"), Some("sideways")), default_sql);
        assert_eq!(sql_for(Some("(SELECT 1)"), Some("desc; --")), default_sql);
    }
}
