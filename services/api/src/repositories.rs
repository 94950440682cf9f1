//! Repositories for database operations

use sqlx::{PgConnection, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::{AuthorSummary, Target};

pub mod city;
pub mod event;
pub mod message;
pub mod venue;
pub mod vote;

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Trimmed filter value, `None` when blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Author projection from the `author_name`/`author_email` join columns
pub fn author_from_row(row: &PgRow, author_id: Uuid) -> Result<Option<AuthorSummary>, sqlx::Error> {
    let name: Option<String> = row.try_get("author_name")?;
    let email: Option<String> = row.try_get("author_email")?;

    Ok(name.zip(email).map(|(name, email)| AuthorSummary {
        id: author_id,
        name,
        email,
    }))
}

/// Author of a target, or `None` when the target does not exist
///
/// With `lock` set the target row is locked until the transaction ends.
pub async fn target_author(
    conn: &mut PgConnection,
    target: Target,
    lock: bool,
) -> Result<Option<Uuid>, sqlx::Error> {
    let sql = format!(
        "SELECT author_id FROM {} WHERE id = $1{}",
        target.kind.table(),
        if lock { " FOR UPDATE" } else { "" }
    );

    sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(target.id)
        .fetch_optional(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jazz"), "%jazz%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some("  ".to_string())), None);
        assert_eq!(non_blank(&Some(" Казань ".to_string())), Some("Казань"));
    }
}
