//! SQL identifiers that come from configuration.
//!
//! Table and column names cannot be bound as parameters, so every name that
//! ends up in a statement is checked against `[A-Za-z_][A-Za-z0-9_]*` and
//! emitted double-quoted.

use std::fmt;

use crate::errors::StoreError;

/// One validated identifier (column, table or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlIdent(String);

impl SqlIdent {
    pub fn new(raw: impl Into<String>) -> Result<Self, StoreError> {
        let raw = raw.into();
        if is_plain_ident(&raw) {
            Ok(Self(raw))
        } else {
            Err(StoreError::InvalidIdentifier(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted form for use in SQL text.
    pub fn quoted(&self) -> String {
        quote_ident(&self.0)
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Table reference, optionally schema-qualified (`bills` or `public.bills`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    schema: Option<SqlIdent>,
    table: SqlIdent,
}

impl QualifiedName {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let raw = raw.trim();
        match raw.split_once('.') {
            Some((schema, table)) => Ok(Self {
                schema: Some(SqlIdent::new(schema).map_err(|_| invalid(raw))?),
                table: SqlIdent::new(table).map_err(|_| invalid(raw))?,
            }),
            None => Ok(Self {
                schema: None,
                table: SqlIdent::new(raw)?,
            }),
        }
    }

    pub fn table(&self) -> &SqlIdent {
        &self.table
    }

    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema.quoted(), self.table.quoted()),
            None => self.table.quoted(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

fn invalid(raw: &str) -> StoreError {
    StoreError::InvalidIdentifier(raw.to_string())
}

fn is_plain_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quotes a Postgres identifier, escaping embedded quotes.
fn quote_ident(input: &str) -> String {
    format!("\"{}\"", input.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        for ok in ["bills", "_tmp", "bills_inserted_date", "T2"] {
            assert_eq!(SqlIdent::new(ok).unwrap().as_str(), ok);
        }
    }

    #[test]
    fn rejects_anything_that_could_change_the_statement() {
        for bad in [
            "",
            "2bills",
            "bills; DROP TABLE bills",
            "bills--",
            "bi\"lls",
            "date > '2020-01-01' OR 1=1",
            "naïve",
        ] {
            assert!(SqlIdent::new(bad).is_err(), "{bad:?} accepted");
        }
        assert!(SqlIdent::new("a".repeat(64)).is_err());
    }

    #[test]
    fn qualified_names_are_quoted_per_part() {
        assert_eq!(QualifiedName::parse("bills").unwrap().quoted(), "\"bills\"");
        let q = QualifiedName::parse("public.bill_embeddings").unwrap();
        assert_eq!(q.quoted(), "\"public\".\"bill_embeddings\"");
        assert_eq!(q.to_string(), "public.bill_embeddings");
        assert_eq!(q.table().as_str(), "bill_embeddings");
    }

    #[test]
    fn qualified_name_rejects_extra_parts() {
        assert!(QualifiedName::parse("a.b.c").is_err());
        assert!(QualifiedName::parse(".bills").is_err());
        assert!(matches!(
            QualifiedName::parse("a.b.c"),
            Err(StoreError::InvalidIdentifier(raw)) if raw == "a.b.c"
        ));
    }
}
