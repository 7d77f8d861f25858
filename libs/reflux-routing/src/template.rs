use prost_reflect::{DynamicMessage, MessageDescriptor, Value};

use crate::compile::CompiledPath;
use crate::error::{FieldAccessError, TemplateError};

/// Raw template piece: literal text, or the path inside a `{{...}}`
/// placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateFragment {
    Static(String),
    Dynamic(String),
}

/// Split a template like `ns/{{$.tenant}}/{{$.name}}` into fragments.
/// Concatenation order is evaluation order.
pub fn parse(template: &str) -> Result<Vec<TemplateFragment>, TemplateError> {
    let mut fragments = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            fragments.push(TemplateFragment::Static(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| TemplateError::Malformed {
            template: template.to_string(),
            reason: "unterminated '{{'".to_string(),
        })?;
        fragments.push(TemplateFragment::Dynamic(after[..end].trim().to_string()));
        rest = &after[end + 2..];
    }
    if !rest.is_empty() {
        fragments.push(TemplateFragment::Static(rest.to_string()));
    }

    Ok(fragments)
}

enum FragmentEvaluator {
    Static(String),
    Dynamic(CompiledPath),
}

/// Renders an address template against message instances.
///
/// A compiled evaluator is reusable across many messages: descriptor
/// resolution happens once at compile time and the scratch buffer is
/// reused between evaluations. No other state persists across calls.
pub struct TemplateEvaluator {
    fragments: Vec<FragmentEvaluator>,
    scratch: String,
}

impl TemplateEvaluator {
    pub fn compile(
        descriptor: &MessageDescriptor,
        template: &str,
    ) -> Result<Self, TemplateError> {
        let mut fragments = Vec::new();
        for fragment in parse(template)? {
            fragments.push(match fragment {
                TemplateFragment::Static(text) => FragmentEvaluator::Static(text),
                TemplateFragment::Dynamic(path) => {
                    FragmentEvaluator::Dynamic(CompiledPath::compile(descriptor, &path)?)
                }
            });
        }
        Ok(Self {
            fragments,
            scratch: String::new(),
        })
    }

    /// Evaluate every fragment in order and concatenate the results.
    ///
    /// Any field access error aborts the evaluation for this message; no
    /// partial string is produced.
    pub fn evaluate(&mut self, message: &DynamicMessage) -> Result<String, FieldAccessError> {
        self.scratch.clear();
        for fragment in &self.fragments {
            match fragment {
                FragmentEvaluator::Static(text) => self.scratch.push_str(text),
                FragmentEvaluator::Dynamic(path) => {
                    let value = path.evaluate(message)?;
                    render_value(&mut self.scratch, &value, path.terminal_field())?;
                }
            }
        }
        Ok(self.scratch.clone())
    }
}

/// Append a scalar value using its default textual formatting. Strings
/// render verbatim; composite values are not renderable.
fn render_value(out: &mut String, value: &Value, field: &str) -> Result<(), FieldAccessError> {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        Value::I32(v) => out.push_str(&v.to_string()),
        Value::I64(v) => out.push_str(&v.to_string()),
        Value::U32(v) => out.push_str(&v.to_string()),
        Value::U64(v) => out.push_str(&v.to_string()),
        Value::F32(v) => out.push_str(&v.to_string()),
        Value::F64(v) => out.push_str(&v.to_string()),
        Value::EnumNumber(v) => out.push_str(&v.to_string()),
        Value::Bytes(_) | Value::Message(_) | Value::List(_) | Value::Map(_) => {
            return Err(FieldAccessError::NotScalar {
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn static_and_dynamic_fragments_interleave() {
        let fragments = parse("ns.{{$.name}}/type-{{$.name}}/{{$.name}}").unwrap();
        assert_eq!(
            fragments,
            vec![
                TemplateFragment::Static("ns.".to_string()),
                TemplateFragment::Dynamic("$.name".to_string()),
                TemplateFragment::Static("/type-".to_string()),
                TemplateFragment::Dynamic("$.name".to_string()),
                TemplateFragment::Static("/".to_string()),
                TemplateFragment::Dynamic("$.name".to_string()),
            ]
        );
    }

    #[test]
    fn repeated_placeholder_substitution() {
        let pool = fixtures::pool();
        let simple = pool.get_message_by_name("fixture.Simple").unwrap();
        let mut evaluator =
            TemplateEvaluator::compile(&simple, "ns.{{$.name}}/type-{{$.name}}/{{$.name}}")
                .unwrap();

        let message = fixtures::simple(&pool, "bob");
        assert_eq!(evaluator.evaluate(&message).unwrap(), "ns.bob/type-bob/bob");
    }

    #[test]
    fn evaluator_is_reusable() {
        let pool = fixtures::pool();
        let simple = pool.get_message_by_name("fixture.Simple").unwrap();
        let mut evaluator = TemplateEvaluator::compile(&simple, "id-{{$.name}}").unwrap();

        assert_eq!(
            evaluator.evaluate(&fixtures::simple(&pool, "a")).unwrap(),
            "id-a"
        );
        assert_eq!(
            evaluator.evaluate(&fixtures::simple(&pool, "b")).unwrap(),
            "id-b"
        );
    }

    #[test]
    fn numbers_render_with_default_formatting() {
        let pool = fixtures::pool();
        let metrics = pool.get_message_by_name("fixture.Metrics").unwrap();
        let mut evaluator =
            TemplateEvaluator::compile(&metrics, "{{$.count}}:{{$.ratio}}:{{$.live}}").unwrap();

        let message = fixtures::metrics(&pool, 7, 2.5, true);
        assert_eq!(evaluator.evaluate(&message).unwrap(), "7:2.5:true");
    }

    #[test]
    fn unterminated_placeholder_is_malformed() {
        let pool = fixtures::pool();
        let simple = pool.get_message_by_name("fixture.Simple").unwrap();

        assert!(matches!(
            TemplateEvaluator::compile(&simple, "x/{{$.name"),
            Err(TemplateError::Malformed { .. })
        ));
    }

    #[test]
    fn access_error_aborts_the_whole_evaluation() {
        let pool = fixtures::pool();
        let batch = pool.get_message_by_name("fixture.Batch").unwrap();
        let mut evaluator =
            TemplateEvaluator::compile(&batch, "pre/{{$.foo[3].bar[0]}}").unwrap();

        let message = fixtures::batch_with_one_entry(&pool);
        assert!(evaluator.evaluate(&message).is_err());
    }
}
