//! The tiny filter language behind `!hq`.
//!
//! A query is a conjunction of `field op value` clauses joined by `and` (or
//! `&&`): `type == System.String`, `size > 1024 and type ~ ^System\.`. The
//! query text arrives pre-tokenized on whitespace, so values never contain
//! spaces; regexes cover the cases where that matters.

use crate::error::SessionError;
use crate::target::HeapObject;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cmp {
    fn from_token(token: &str) -> Option<Cmp> {
        match token {
            "==" => Some(Cmp::Eq),
            "!=" => Some(Cmp::Ne),
            "<" => Some(Cmp::Lt),
            "<=" => Some(Cmp::Le),
            ">" => Some(Cmp::Gt),
            ">=" => Some(Cmp::Ge),
            _ => None,
        }
    }

    fn holds(self, left: u64, right: u64) -> bool {
        match self {
            Cmp::Eq => left == right,
            Cmp::Ne => left != right,
            Cmp::Lt => left < right,
            Cmp::Le => left <= right,
            Cmp::Gt => left > right,
            Cmp::Ge => left >= right,
        }
    }
}

#[derive(Debug)]
enum Clause {
    TypeEquals(String),
    TypeNotEquals(String),
    TypeMatches(Regex),
    Size(Cmp, u64),
    Address(Cmp, u64),
}

impl Clause {
    fn matches(&self, object: &HeapObject) -> bool {
        match self {
            Clause::TypeEquals(name) => object.type_name == *name,
            Clause::TypeNotEquals(name) => object.type_name != *name,
            Clause::TypeMatches(pattern) => pattern.is_match(&object.type_name),
            Clause::Size(cmp, value) => cmp.holds(object.size, *value),
            Clause::Address(cmp, value) => cmp.holds(object.address, *value),
        }
    }
}

/// A parsed heap query. An empty query matches every object.
#[derive(Debug)]
pub(crate) struct Query {
    clauses: Vec<Clause>,
}

impl Query {
    pub fn parse(tokens: &[String]) -> Result<Query, SessionError> {
        let mut clauses = Vec::new();
        let mut rest = tokens;
        while !rest.is_empty() {
            if rest.len() < 3 {
                return Err(SessionError::InvalidArgument(format!(
                    "incomplete query clause `{}`; expected <field> <op> <value>",
                    rest.join(" ")
                )));
            }
            clauses.push(parse_clause(&rest[0], &rest[1], &rest[2])?);
            rest = &rest[3..];
            match rest.first().map(String::as_str) {
                Some("and") | Some("&&") => rest = &rest[1..],
                Some(other) => {
                    return Err(SessionError::InvalidArgument(format!(
                        "expected `and` between clauses, found `{other}`"
                    )));
                }
                None => break,
            }
        }
        Ok(Query { clauses })
    }

    pub fn matches(&self, object: &HeapObject) -> bool {
        self.clauses.iter().all(|clause| clause.matches(object))
    }
}

fn parse_clause(field: &str, op: &str, value: &str) -> Result<Clause, SessionError> {
    match field {
        "type" => match op {
            "==" => Ok(Clause::TypeEquals(value.to_string())),
            "!=" => Ok(Clause::TypeNotEquals(value.to_string())),
            "~" => {
                let pattern = Regex::new(value).map_err(|err| {
                    SessionError::InvalidArgument(format!("bad type pattern `{value}`: {err}"))
                })?;
                Ok(Clause::TypeMatches(pattern))
            }
            _ => Err(SessionError::InvalidArgument(format!(
                "`type` supports ==, != and ~, not `{op}`"
            ))),
        },
        "size" | "address" => {
            let cmp = Cmp::from_token(op).ok_or_else(|| {
                SessionError::InvalidArgument(format!("unknown comparison `{op}`"))
            })?;
            let number = parse_number(value)?;
            Ok(if field == "size" {
                Clause::Size(cmp, number)
            } else {
                Clause::Address(cmp, number)
            })
        }
        _ => Err(SessionError::InvalidArgument(format!(
            "unknown query field `{field}`; expected type, size or address"
        ))),
    }
}

/// Numbers are decimal by default; a `0x` prefix switches to hex, which is the
/// usual way addresses are typed.
fn parse_number(value: &str) -> Result<u64, SessionError> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| SessionError::InvalidArgument(format!("`{value}` is not a number")))
}

/// Replace tokens naming a pending define with the define's body, one pass.
/// Define bodies are not re-expanded, so defines cannot recurse.
pub(crate) fn expand_defines(tokens: &[String], defines: &[(String, String)]) -> Vec<String> {
    let mut expanded = Vec::with_capacity(tokens.len());
    for token in tokens {
        match defines.iter().find(|(name, _)| name == token) {
            Some((_, body)) => expanded.extend(body.split_whitespace().map(str::to_string)),
            None => expanded.push(token.clone()),
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn object(type_name: &str, size: u64, address: u64) -> HeapObject {
        HeapObject {
            address,
            type_name: type_name.to_string(),
            size,
            references: vec![],
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = Query::parse(&[]).unwrap();
        assert!(query.matches(&object("Foo", 1, 0x10)));
    }

    #[test]
    fn test_type_equality() {
        let query = Query::parse(&tokens("type == Foo")).unwrap();
        assert!(query.matches(&object("Foo", 1, 0x10)));
        assert!(!query.matches(&object("Bar", 1, 0x10)));
    }

    #[test]
    fn test_conjunction_of_size_and_type_pattern() {
        let query = Query::parse(&tokens(r"size > 100 and type ~ ^System\.")).unwrap();
        assert!(query.matches(&object("System.Byte[]", 1024, 0x10)));
        assert!(!query.matches(&object("System.String", 24, 0x10)));
        assert!(!query.matches(&object("Foo", 1024, 0x10)));
    }

    #[test]
    fn test_address_accepts_hex_values() {
        let query = Query::parse(&tokens("address == 0x2000")).unwrap();
        assert!(query.matches(&object("Foo", 1, 0x2000)));
        assert!(!query.matches(&object("Foo", 1, 0x2001)));
    }

    #[test]
    fn test_double_ampersand_joins_clauses_too() {
        let query = Query::parse(&tokens("size >= 16 && size <= 32")).unwrap();
        assert!(query.matches(&object("Foo", 16, 0)));
        assert!(!query.matches(&object("Foo", 33, 0)));
    }

    #[test]
    fn test_malformed_queries_are_invalid_arguments() {
        assert!(Query::parse(&tokens("type ==")).is_err());
        assert!(Query::parse(&tokens("type >> Foo")).is_err());
        assert!(Query::parse(&tokens("size > banana")).is_err());
        assert!(Query::parse(&tokens("color == red")).is_err());
        assert!(Query::parse(&tokens("type == Foo size > 1")).is_err());
        assert!(Query::parse(&tokens(r"type ~ [unclosed")).is_err());
    }

    #[test]
    fn test_defines_substitute_token_wise() {
        let defines = vec![("big".to_string(), "size > 512".to_string())];
        let expanded = expand_defines(&tokens("big and type == Foo"), &defines);
        assert_eq!(expanded, tokens("size > 512 and type == Foo"));
    }

    #[test]
    fn test_unknown_tokens_pass_through_defines_unchanged() {
        let expanded = expand_defines(&tokens("type == big"), &[]);
        assert_eq!(expanded, tokens("type == big"));
    }
}
