//! Query text helpers shared by the SQL and CQL providers.

use std::borrow::Cow;

/// Row count used by `sample` when the caller does not pass one.
pub const DEFAULT_SAMPLE_LIMIT: u64 = 5;

/// Append a `limit` clause to `query` unless it already mentions one.
///
/// The check is textual: any case-insensitive occurrence of `limit` in the
/// query, including inside a string literal or an identifier, suppresses
/// the clause. When a clause is appended, newlines become spaces and
/// trailing semicolons are dropped first.
pub fn apply_limit(query: &str, limit: Option<u64>) -> Cow<'_, str> {
    match limit {
        Some(n) if !query.to_lowercase().contains("limit") => {
            let flat = query.replace('\n', " ");
            let body = flat.trim().trim_end_matches(';').trim_end();
            Cow::Owned(format!("{body} limit {n};"))
        }
        _ => Cow::Borrowed(query),
    }
}

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn escape_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote an identifier only if it is not a plain lower-case name.
///
/// Both PostgreSQL and CQL fold unquoted identifiers to lower case, so
/// anything with upper-case letters or punctuation must be quoted to keep
/// its spelling.
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(escape_identifier(name))
    }
}

/// `select *` over one table with a row limit.
pub fn sample_query(table: &str, limit: u64) -> String {
    format!("select * from {} limit {limit}", quote_identifier(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_limit_appends() {
        assert_eq!(
            apply_limit("select *\nfrom users;", Some(10)),
            "select * from users limit 10;"
        );
        assert_eq!(apply_limit("  select 1  ", Some(3)), "select 1 limit 3;");
    }

    #[test]
    fn test_apply_limit_keeps_existing_clause() {
        let query = "SELECT * FROM users LIMIT 5";
        assert!(matches!(apply_limit(query, Some(10)), Cow::Borrowed(q) if q == query));
    }

    #[test]
    fn test_apply_limit_without_limit_is_untouched() {
        let query = "select *\nfrom users;";
        assert_eq!(apply_limit(query, None), query);
    }

    // Known limitation: the check is not SQL-aware, so the word inside a
    // literal is enough to skip the clause.
    #[test]
    fn test_apply_limit_fooled_by_literal() {
        let query = "select * from notes where body = 'no limit here'";
        assert_eq!(apply_limit(query, Some(10)), query);

        let query = "select speed_limit from roads";
        assert_eq!(apply_limit(query, Some(10)), query);
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "users");
        assert_eq!(quote_identifier("order_items2"), "order_items2");
        assert_eq!(quote_identifier("Users"), "\"Users\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
        assert_eq!(quote_identifier("1st"), "\"1st\"");
    }

    #[test]
    fn test_sample_query() {
        assert_eq!(
            sample_query("users", DEFAULT_SAMPLE_LIMIT),
            "select * from users limit 5"
        );
    }
}
