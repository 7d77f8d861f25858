use std::fmt;

/// Logical destination of a record: `(namespace, name, id)`.
///
/// Equality is structural. The triple doubles as the partition key source —
/// all records for one address are processed by the same worker, and the
/// feedback state for that address lives next to its forward state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Address {
    pub namespace: String,
    pub name: String,
    pub id: String,
}

impl Address {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            id: id.into(),
        }
    }

    /// The destination kind, ignoring the instance id.
    pub fn kind(&self) -> FunctionKind {
        FunctionKind {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
        }
    }

    /// Deterministic partition key: `namespace/name/id`.
    ///
    /// Stable for the lifetime of the address. The derivation is part of
    /// the recovery contract — spilled feedback epochs are scoped by it.
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey(format!("{}/{}/{}", self.namespace, self.name, self.id))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.name, self.id)
    }
}

/// A destination type without the instance id: `(namespace, name)`.
///
/// Used to key handler instances and multiplexed state sub-keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FunctionKind {
    pub namespace: String,
    pub name: String,
}

impl FunctionKind {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Key of the unit of keyed parallelism.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PartitionKey(pub String);

impl PartitionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
