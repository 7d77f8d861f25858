use prost_reflect::{DynamicMessage, MessageDescriptor};
use reflux_api::address::Address;

use crate::error::{ResolveError, TemplateError};
use crate::template::TemplateEvaluator;

/// Computes a destination [`Address`] from message content.
///
/// The template renders to `namespace/name/id`. The rendered string is
/// split from the right, so namespaces may themselves contain slashes:
/// `a/b/c/greeter/{{$.name}}` resolves to namespace `a/b/c`, name
/// `greeter`, id from the message.
pub struct AddressResolver {
    evaluator: TemplateEvaluator,
}

impl AddressResolver {
    pub fn from_template(
        descriptor: &MessageDescriptor,
        template: &str,
    ) -> Result<Self, TemplateError> {
        // The two separators must be present in the template text itself;
        // placeholder output is not allowed to supply them.
        if template.matches('/').count() < 2 {
            return Err(TemplateError::Malformed {
                template: template.to_string(),
                reason: "expected 'namespace/name/id' shape".to_string(),
            });
        }
        Ok(Self {
            evaluator: TemplateEvaluator::compile(descriptor, template)?,
        })
    }

    pub fn evaluate(&mut self, message: &DynamicMessage) -> Result<Address, ResolveError> {
        let rendered = self.evaluator.evaluate(message)?;

        let mut parts = rendered.rsplitn(3, '/');
        let id = parts.next().unwrap_or_default().to_string();
        let name = parts.next().unwrap_or_default().to_string();
        let namespace = parts.next().unwrap_or_default().to_string();

        if namespace.is_empty() || name.is_empty() || id.is_empty() {
            return Err(ResolveError::AddressShape { rendered });
        }
        Ok(Address::new(namespace, name, id))
    }
}
