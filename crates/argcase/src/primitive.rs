//! Scalar parsers keyed by Rust type name.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::value::Value;

pub type ParseFn = fn(&str) -> Result<Value, String>;
pub type UnparseFn = fn(&Value) -> String;

/// Parse/unparse pair for one scalar type.
#[derive(Debug, Clone, Copy)]
pub struct Primitive {
    pub type_name: &'static str,
    /// Placeholder shown in usage text, e.g. `int`.
    pub label: &'static str,
    pub parse: ParseFn,
    pub unparse: UnparseFn,
}

impl Primitive {
    pub fn new(type_name: &'static str, label: &'static str, parse: ParseFn) -> Self {
        Self {
            type_name,
            label,
            parse,
            unparse: unparse_display,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrimitiveRegistry {
    entries: IndexMap<&'static str, Primitive>,
}

static STANDARD: LazyLock<PrimitiveRegistry> = LazyLock::new(PrimitiveRegistry::with_standard);

impl PrimitiveRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Process-wide registry holding every built-in scalar.
    pub fn standard() -> &'static PrimitiveRegistry {
        &STANDARD
    }

    /// An owned copy of the built-in registry, for callers that extend it.
    pub fn with_standard() -> Self {
        let mut registry = Self::empty();
        for primitive in [
            Primitive::new("bool", "bool", parse_bool),
            Primitive::new("i8", "int", parse_signed::<i8>),
            Primitive::new("i16", "int", parse_signed::<i16>),
            Primitive::new("i32", "int", parse_signed::<i32>),
            Primitive::new("i64", "int", parse_signed::<i64>),
            Primitive::new("isize", "int", parse_signed::<isize>),
            Primitive::new("u8", "uint", parse_unsigned::<u8>),
            Primitive::new("u16", "uint", parse_unsigned::<u16>),
            Primitive::new("u32", "uint", parse_unsigned::<u32>),
            Primitive::new("u64", "uint", parse_unsigned::<u64>),
            Primitive::new("usize", "uint", parse_unsigned::<usize>),
            Primitive::new("f32", "float", parse_f32),
            Primitive::new("f64", "float", parse_f64),
            Primitive::new("char", "char", parse_char),
            Primitive::new("String", "string", parse_string),
            Primitive::new("PathBuf", "path", parse_path),
        ] {
            registry.register(primitive);
        }
        registry
    }

    pub fn register(&mut self, primitive: Primitive) {
        self.entries.insert(primitive.type_name, primitive);
    }

    pub fn without(mut self, type_name: &str) -> Self {
        self.entries.shift_remove(type_name);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&Primitive> {
        self.entries.get(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

fn unparse_display(value: &Value) -> String {
    value.to_string()
}

fn parse_bool(raw: &str) -> Result<Value, String> {
    raw.parse::<bool>().map(Value::Bool).map_err(|e| e.to_string())
}

fn parse_signed<T>(raw: &str) -> Result<Value, String>
where
    T: FromStr,
    T::Err: fmt::Display,
    i64: TryFrom<T>,
{
    let parsed = raw.parse::<T>().map_err(|e| e.to_string())?;
    i64::try_from(parsed)
        .map(Value::Int)
        .map_err(|_| format!("{raw} is out of range"))
}

fn parse_unsigned<T>(raw: &str) -> Result<Value, String>
where
    T: FromStr,
    T::Err: fmt::Display,
    u64: TryFrom<T>,
{
    let parsed = raw.parse::<T>().map_err(|e| e.to_string())?;
    u64::try_from(parsed)
        .map(Value::UInt)
        .map_err(|_| format!("{raw} is out of range"))
}

fn parse_f32(raw: &str) -> Result<Value, String> {
    raw.parse::<f32>()
        .map(|v| Value::Float(f64::from(v)))
        .map_err(|e| e.to_string())
}

fn parse_f64(raw: &str) -> Result<Value, String> {
    raw.parse::<f64>().map(Value::Float).map_err(|e| e.to_string())
}

fn parse_char(raw: &str) -> Result<Value, String> {
    raw.parse::<char>().map(Value::Char).map_err(|e| e.to_string())
}

fn parse_string(raw: &str) -> Result<Value, String> {
    Ok(Value::Str(raw.to_string()))
}

fn parse_path(raw: &str) -> Result<Value, String> {
    if raw.is_empty() {
        return Err("path must not be empty".to_string());
    }
    Ok(Value::Path(PathBuf::from(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(type_name: &str, raw: &str) -> Result<Value, String> {
        let primitive = PrimitiveRegistry::standard()
            .get(type_name)
            .unwrap_or_else(|| panic!("missing primitive {type_name}"));
        (primitive.parse)(raw)
    }

    #[test]
    fn integers_respect_declared_width() {
        assert_eq!(parse("u8", "255"), Ok(Value::UInt(255)));
        assert!(parse("u8", "300").is_err());
        assert!(parse("u32", "-1").is_err());
        assert_eq!(parse("i8", "-128"), Ok(Value::Int(-128)));
        assert_eq!(parse("i64", "42"), Ok(Value::Int(42)));
    }

    #[test]
    fn scalars_unparse_to_their_input() {
        let registry = PrimitiveRegistry::standard();
        for (type_name, raw) in [
            ("bool", "true"),
            ("i32", "-7"),
            ("usize", "12"),
            ("f64", "1.5"),
            ("char", "x"),
            ("String", "hello world"),
            ("PathBuf", "dir/file.txt"),
        ] {
            let primitive = registry.get(type_name).unwrap();
            let value = (primitive.parse)(raw).unwrap();
            assert_eq!((primitive.unparse)(&value), raw, "type {type_name}");
        }
    }

    #[test]
    fn labels_and_removal() {
        let registry = PrimitiveRegistry::with_standard().without("PathBuf");
        assert_eq!(registry.get("i16").map(|p| p.label), Some("int"));
        assert_eq!(registry.get("String").map(|p| p.label), Some("string"));
        assert!(registry.get("PathBuf").is_none());
        assert!(registry.type_names().all(|name| name != "PathBuf"));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(parse("bool", "yes").is_err());
        assert!(parse("char", "ab").is_err());
        assert!(parse("f32", "one").is_err());
        assert!(parse("PathBuf", "").is_err());
    }
}
