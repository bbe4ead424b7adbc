//! Column type mapping
//!
//! Translates a declared column type into its FlatBuffers schema type, its
//! Rust type for generated code, and (for the graph target) its GraphQL
//! type. Widths are never guessed: `int` and `uint` are rejected with the
//! two concrete widths the user should pick from.

use std::str::FromStr;

use crate::error::CodegenError;

/// The fixed set of column types a tables file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
}

impl SemanticType {
    /// Every supported type, in declaration order.
    pub const ALL: [SemanticType; 12] = [
        SemanticType::Bool,
        SemanticType::Int8,
        SemanticType::Int16,
        SemanticType::Int32,
        SemanticType::Int64,
        SemanticType::UInt8,
        SemanticType::UInt16,
        SemanticType::UInt32,
        SemanticType::UInt64,
        SemanticType::Float32,
        SemanticType::Float64,
        SemanticType::String,
    ];

    /// Canonical name as written in tables files.
    pub fn name(self) -> &'static str {
        match self {
            SemanticType::Bool => "bool",
            SemanticType::Int8 => "int8",
            SemanticType::Int16 => "int16",
            SemanticType::Int32 => "int32",
            SemanticType::Int64 => "int64",
            SemanticType::UInt8 => "uint8",
            SemanticType::UInt16 => "uint16",
            SemanticType::UInt32 => "uint32",
            SemanticType::UInt64 => "uint64",
            SemanticType::Float32 => "float32",
            SemanticType::Float64 => "float64",
            SemanticType::String => "string",
        }
    }

    /// FlatBuffers schema type name.
    pub fn flatbuffers_type(self) -> &'static str {
        match self {
            SemanticType::Bool => "bool",
            SemanticType::Int8 => "byte",
            SemanticType::Int16 => "short",
            SemanticType::Int32 => "int",
            SemanticType::Int64 => "long",
            SemanticType::UInt8 => "ubyte",
            SemanticType::UInt16 => "ushort",
            SemanticType::UInt32 => "uint",
            SemanticType::UInt64 => "ulong",
            SemanticType::Float32 => "float",
            SemanticType::Float64 => "double",
            SemanticType::String => "string",
        }
    }

    /// Owned Rust type used in generated row structs.
    pub fn rust_type(self) -> &'static str {
        match self {
            SemanticType::Bool => "bool",
            SemanticType::Int8 => "i8",
            SemanticType::Int16 => "i16",
            SemanticType::Int32 => "i32",
            SemanticType::Int64 => "i64",
            SemanticType::UInt8 => "u8",
            SemanticType::UInt16 => "u16",
            SemanticType::UInt32 => "u32",
            SemanticType::UInt64 => "u64",
            SemanticType::Float32 => "f32",
            SemanticType::Float64 => "f64",
            SemanticType::String => "String",
        }
    }

    /// GraphQL scalar, where one exists.
    pub fn graphql_type(self) -> Option<&'static str> {
        match self {
            SemanticType::String => Some("String"),
            SemanticType::Bool => Some("Boolean"),
            SemanticType::Int32 => Some("Int"),
            SemanticType::Float64 => Some("Float"),
            _ => None,
        }
    }

    /// Fixed-width value (bool included) rather than variable-length.
    pub fn is_scalar(self) -> bool {
        !matches!(self, SemanticType::String)
    }

    pub fn is_float(self) -> bool {
        matches!(self, SemanticType::Float32 | SemanticType::Float64)
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SemanticType {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "byte" {
            return Ok(SemanticType::UInt8);
        }
        SemanticType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| unsupported(s, "FlatBuffers"))
    }
}

/// Map a declared column type to its FlatBuffers schema type.
pub fn map_type(type_name: &str) -> Result<&'static str, CodegenError> {
    type_name.parse::<SemanticType>().map(SemanticType::flatbuffers_type)
}

/// Map a declared column type to its GraphQL type.
pub fn map_graphql_type(type_name: &str) -> Result<&'static str, CodegenError> {
    let ty: SemanticType = type_name.parse()?;
    ty.graphql_type()
        .ok_or_else(|| unsupported(type_name, "GraphQL"))
}

/// `true` for fixed-width types, including `bool`. Unknown types are not scalar.
pub fn is_scalar(type_name: &str) -> bool {
    type_name
        .parse::<SemanticType>()
        .map(SemanticType::is_scalar)
        .unwrap_or(false)
}

pub(crate) fn unsupported(type_name: &str, target: &'static str) -> CodegenError {
    let advice = match type_name {
        "int" => "width is architecture-dependent: use int32 or int64".to_string(),
        "uint" => "width is architecture-dependent: use uint32 or uint64".to_string(),
        _ if target == "GraphQL" => "GraphQL supports string, bool, int32 and float64".to_string(),
        _ => {
            let names: Vec<&str> = SemanticType::ALL.iter().map(|t| t.name()).collect();
            format!("supported types: {}", names.join(", "))
        }
    };
    CodegenError::UnsupportedType {
        type_name: type_name.to_string(),
        target,
        advice,
    }
}
