/// Warehouse column types used by record schemas.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ColumnType {
    String,
    Boolean,
    Integer,
    BigNumeric,
    Timestamp,
}

/// One `name:TYPE` entry of a schema string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, ColumnType::String)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub const fn big_numeric(name: &'static str) -> Self {
        Self::new(name, ColumnType::BigNumeric)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }
}

/// Concatenate lineage layers, base layer first, into a flat column list.
pub fn flatten(layers: &[&[Column]]) -> Vec<Column> {
    layers.iter().flat_map(|layer| layer.iter().copied()).collect()
}

/// Render lineage layers as a comma-separated `name:TYPE` schema string.
pub fn compose(layers: &[&[Column]]) -> String {
    flatten(layers)
        .iter()
        .map(|c| format!("{}:{}", c.name, c.ty))
        .collect::<Vec<_>>()
        .join(",")
}
