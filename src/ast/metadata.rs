use serde::{Deserialize, Serialize};

/// Namespace of the canonical function library.
pub const CANONICAL_NAMESPACE: &str = "Edm";

/// Primitive type classification of a property, constant or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Binary,
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    DateTime,
    DateTimeOffset,
    Time,
    Guid,
}

impl PrimitiveKind {
    /// Integral kinds are eligible for `last_insert_id()` style key retrieval.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::SByte
                | PrimitiveKind::Int16
                | PrimitiveKind::Int32
                | PrimitiveKind::Int64
        )
    }

    /// Kinds rendered inline as numeric literals instead of bound parameters.
    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                PrimitiveKind::Single | PrimitiveKind::Double | PrimitiveKind::Decimal
            )
    }
}

/// How the server populates a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StoreGenerated {
    #[default]
    None,
    Identity,
    Computed,
}

/// A scalar property of an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub kind: PrimitiveKind,
    #[serde(default)]
    pub store_generated: StoreGenerated,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
            store_generated: StoreGenerated::None,
            nullable: true,
        }
    }

    pub fn generated(mut self, store_generated: StoreGenerated) -> Self {
        self.store_generated = store_generated;
        self
    }

    pub fn is_server_generated(&self) -> bool {
        self.store_generated != StoreGenerated::None
    }
}

/// Element type of an entity set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    pub properties: Vec<Property>,
    /// Names of the key members, in key order.
    #[serde(default)]
    pub keys: Vec<String>,
}

impl EntityType {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn key_properties(&self) -> impl Iterator<Item = &Property> {
        self.keys.iter().filter_map(|k| self.property(k))
    }
}

/// A storage-side entity set (table, view, or defining query).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySet {
    pub name: String,
    /// Name of the owning entity container, the fallback schema.
    pub container: String,
    /// `Schema` annotation.
    #[serde(default)]
    pub schema: Option<String>,
    /// `Table` annotation.
    #[serde(default)]
    pub table: Option<String>,
    /// `DefiningQuery` annotation: raw SQL standing in for the table.
    #[serde(default)]
    pub defining_query: Option<String>,
    /// Set by the store schema generator for database views.
    #[serde(default)]
    pub is_view: bool,
    pub element: EntityType,
}

impl EntitySet {
    /// Physical table name: the `Table` annotation or the set name.
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }
}

/// A canonical or store function referenced by a function call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMeta {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    /// `StoreFunctionNameAttribute`.
    #[serde(default)]
    pub store_name: Option<String>,
    /// `BuiltInAttribute`: rendered unquoted when set.
    #[serde(default)]
    pub built_in: bool,
    /// `NiladicFunctionAttribute`: rendered without parentheses.
    #[serde(default)]
    pub niladic: bool,
    /// `CommandTextAttribute`.
    #[serde(default)]
    pub command_text: Option<String>,
}

impl FunctionMeta {
    pub fn canonical(name: impl Into<String>) -> Self {
        Self::store(CANONICAL_NAMESPACE, name)
    }

    pub fn store(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            schema: None,
            store_name: None,
            built_in: false,
            niladic: false,
            command_text: None,
        }
    }

    pub fn is_canonical(&self) -> bool {
        self.namespace.is_empty() || self.namespace == CANONICAL_NAMESPACE
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Physical name: `StoreFunctionNameAttribute`, falling back to the logical name.
    pub fn physical_name(&self) -> &str {
        match self.store_name.as_deref() {
            Some(n) if !n.is_empty() => n,
            _ => &self.name,
        }
    }
}
