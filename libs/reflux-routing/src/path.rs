use crate::error::PathError;

/// One parsed fragment of a field path: a named field, optionally with a
/// fixed index into a repeated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFragment {
    pub name: String,
    pub index: Option<usize>,
}

impl PathFragment {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }
}

/// Parse a path expression of the form `$.field1.field2[3].field3`.
///
/// The `$` prefix denotes the root message. Each fragment is `.` followed
/// by an identifier, optionally followed by `[n]` with a non-negative
/// integer index. Anything else is malformed.
pub fn parse(path: &str) -> Result<Vec<PathFragment>, PathError> {
    let mut rest = path
        .strip_prefix('$')
        .ok_or_else(|| malformed(path, "must start with '$'"))?;
    if rest.is_empty() {
        return Err(malformed(path, "expected at least one '.field' fragment"));
    }

    let mut fragments = Vec::new();
    while !rest.is_empty() {
        rest = rest
            .strip_prefix('.')
            .ok_or_else(|| malformed(path, "expected '.'"))?;

        let ident_len = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(char::len_utf8)
            .sum::<usize>();
        if ident_len == 0 {
            return Err(malformed(path, "empty field name"));
        }
        let (name, tail) = rest.split_at(ident_len);
        rest = tail;

        let mut index = None;
        if let Some(tail) = rest.strip_prefix('[') {
            let close = tail
                .find(']')
                .ok_or_else(|| malformed(path, "unterminated index"))?;
            let digits = &tail[..close];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed(path, "index must be a non-negative integer"));
            }
            let parsed = digits
                .parse::<usize>()
                .map_err(|_| malformed(path, "index does not fit in usize"))?;
            index = Some(parsed);
            rest = &tail[close + 1..];
        }

        fragments.push(PathFragment {
            name: name.to_string(),
            index,
        });
    }

    Ok(fragments)
}

fn malformed(path: &str, reason: &str) -> PathError {
    PathError::Malformed {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_usage() {
        let fragments = parse("$.foo.bar.baz").unwrap();

        assert_eq!(
            fragments,
            vec![
                PathFragment::named("foo"),
                PathFragment::named("bar"),
                PathFragment::named("baz"),
            ]
        );
    }

    #[test]
    fn repeated_field() {
        let fragments = parse("$.foo[1].bar[7]").unwrap();

        assert_eq!(
            fragments,
            vec![
                PathFragment::indexed("foo", 1),
                PathFragment::indexed("bar", 7),
            ]
        );
    }

    #[test]
    fn fragment_count_matches_dot_fragments() {
        let fragments = parse("$.a.b[2].c").unwrap();
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[1].index, Some(2));
    }

    #[test]
    fn no_prefix() {
        assert!(matches!(parse("foo"), Err(PathError::Malformed { .. })));
    }

    #[test]
    fn bare_root() {
        assert!(matches!(parse("$"), Err(PathError::Malformed { .. })));
    }

    #[test]
    fn bad_index() {
        assert!(matches!(parse("$.foo[-1]"), Err(PathError::Malformed { .. })));
    }

    #[test]
    fn bad_syntax_with_indexing() {
        assert!(matches!(parse("$.foo[[1]"), Err(PathError::Malformed { .. })));
    }

    #[test]
    fn bad_syntax_with_multiple_dots() {
        assert!(matches!(
            parse("$..foo..bar"),
            Err(PathError::Malformed { .. })
        ));
    }

    #[test]
    fn unterminated_index() {
        assert!(matches!(parse("$.foo[3"), Err(PathError::Malformed { .. })));
    }

    #[test]
    fn empty_index() {
        assert!(matches!(parse("$.foo[]"), Err(PathError::Malformed { .. })));
    }
}
