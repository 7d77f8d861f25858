use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, MessageDescriptor, Value};

use crate::error::{FieldAccessError, PathError};
use crate::path::{self, PathFragment};

/// One resolved step: a field descriptor plus an optional repeated index.
#[derive(Debug, Clone)]
struct PathStep {
    field: FieldDescriptor,
    index: Option<usize>,
}

/// A field path compiled against a concrete message schema.
///
/// Compilation resolves every fragment to a field descriptor up front;
/// evaluation is a pure, read-only walk over a message instance. An index
/// beyond the actual length of a repeated field is *not* a compile error —
/// length is data-dependent, so it surfaces lazily as a
/// [`FieldAccessError`] at evaluation time.
#[derive(Debug, Clone)]
pub struct CompiledPath {
    steps: Vec<PathStep>,
}

impl CompiledPath {
    pub fn compile(root: &MessageDescriptor, path_str: &str) -> Result<Self, PathError> {
        let fragments = path::parse(path_str)?;
        let last = fragments.len() - 1;

        let mut steps = Vec::with_capacity(fragments.len());
        let mut current = root.clone();
        for (pos, fragment) in fragments.into_iter().enumerate() {
            let PathFragment { name, index } = fragment;

            let field = current.get_field_by_name(&name).ok_or_else(|| {
                PathError::UnknownField {
                    field: name.clone(),
                    message_type: current.full_name().to_string(),
                }
            })?;
            if index.is_some() && !field.is_list() {
                return Err(PathError::NotRepeated { field: name });
            }

            if pos != last {
                if field.is_list() && index.is_none() {
                    return Err(PathError::UnindexedRepeated { field: name });
                }
                current = match field.kind() {
                    Kind::Message(next) => next,
                    _ => return Err(PathError::NotAMessage { field: name }),
                };
            }

            steps.push(PathStep { field, index });
        }

        Ok(Self { steps })
    }

    /// Number of resolved fragments.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Name of the field the path terminates in.
    pub fn terminal_field(&self) -> &str {
        self.steps.last().map(|s| s.field.name()).unwrap_or("$")
    }

    /// Evaluate against a message instance. Read-only; the terminal value
    /// is returned by value.
    pub fn evaluate(&self, message: &DynamicMessage) -> Result<Value, FieldAccessError> {
        let Some((last, inner)) = self.steps.split_last() else {
            return Err(FieldAccessError::Shape { field: "$".into() });
        };

        if inner.is_empty() {
            return step_value(message, last);
        }

        let mut current = message.clone();
        for step in inner {
            current = match step_value(&current, step)? {
                Value::Message(next) => next,
                _ => {
                    return Err(FieldAccessError::Shape {
                        field: step.field.name().to_string(),
                    });
                }
            };
        }
        step_value(&current, last)
    }
}

fn step_value(message: &DynamicMessage, step: &PathStep) -> Result<Value, FieldAccessError> {
    let value = message.get_field(&step.field).into_owned();
    let Some(index) = step.index else {
        return Ok(value);
    };
    match value {
        Value::List(items) => {
            let len = items.len();
            items
                .into_iter()
                .nth(index)
                .ok_or_else(|| FieldAccessError::IndexOutOfRange {
                    field: step.field.name().to_string(),
                    index,
                    len,
                })
        }
        _ => Err(FieldAccessError::Shape {
            field: step.field.name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn nested_traversal() {
        let pool = fixtures::pool();
        let root = pool.get_message_by_name("fixture.Root").unwrap();

        let compiled = CompiledPath::compile(&root, "$.foo.bar.baz").unwrap();
        assert_eq!(compiled.len(), 3);
        assert_eq!(compiled.terminal_field(), "baz");

        let message = fixtures::nested_root(&pool, "x");
        assert_eq!(
            compiled.evaluate(&message).unwrap(),
            Value::String("x".to_string())
        );
    }

    #[test]
    fn repeated_index_out_of_range_is_a_runtime_error() {
        let pool = fixtures::pool();
        let batch = pool.get_message_by_name("fixture.Batch").unwrap();

        // Out-of-range indices compile fine; length is data-dependent.
        let compiled = CompiledPath::compile(&batch, "$.foo[1].bar[7]").unwrap();
        assert_eq!(compiled.len(), 2);

        let message = fixtures::batch_with_one_entry(&pool);
        assert_eq!(
            compiled.evaluate(&message),
            Err(FieldAccessError::IndexOutOfRange {
                field: "foo".to_string(),
                index: 1,
                len: 1,
            })
        );
    }

    #[test]
    fn unknown_field_is_a_compile_error() {
        let pool = fixtures::pool();
        let root = pool.get_message_by_name("fixture.Root").unwrap();

        assert_eq!(
            CompiledPath::compile(&root, "$.nope").unwrap_err(),
            PathError::UnknownField {
                field: "nope".to_string(),
                message_type: "fixture.Root".to_string(),
            }
        );
    }

    #[test]
    fn indexing_a_singular_field_is_a_compile_error() {
        let pool = fixtures::pool();
        let root = pool.get_message_by_name("fixture.Root").unwrap();

        assert_eq!(
            CompiledPath::compile(&root, "$.foo[0].bar").unwrap_err(),
            PathError::NotRepeated {
                field: "foo".to_string(),
            }
        );
    }

    #[test]
    fn traversing_a_scalar_is_a_compile_error() {
        let pool = fixtures::pool();
        let simple = pool.get_message_by_name("fixture.Simple").unwrap();

        assert_eq!(
            CompiledPath::compile(&simple, "$.name.inner").unwrap_err(),
            PathError::NotAMessage {
                field: "name".to_string(),
            }
        );
    }

    #[test]
    fn traversing_a_repeated_field_requires_an_index() {
        let pool = fixtures::pool();
        let batch = pool.get_message_by_name("fixture.Batch").unwrap();

        assert_eq!(
            CompiledPath::compile(&batch, "$.foo.bar[0]").unwrap_err(),
            PathError::UnindexedRepeated {
                field: "foo".to_string(),
            }
        );
    }
}
