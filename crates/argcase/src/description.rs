//! Description model consumed by the schema compiler.
//!
//! A description type is a closed set of cases. Implementations of
//! [`ArgCases`] are normally generated by `#[derive(ArgCases)]`, but the
//! builder methods on [`Description`] and [`CaseDescriptor`] make
//! hand-written implementations straightforward.

use std::any::TypeId;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Reflector for a case-based description type.
pub trait ArgCases: Sized + 'static {
    /// Cases in declaration order.
    fn describe() -> Description;

    /// Build a value of case `case` from its field values.
    fn construct(case: usize, fields: Vec<Value>) -> Option<Self>;

    /// Inverse of [`ArgCases::construct`].
    fn deconstruct(&self) -> (usize, Vec<Value>);
}

/// A Rust type usable as a case field.
pub trait ArgField: Sized {
    fn field_type() -> FieldType;
    fn from_value(value: Value) -> Option<Self>;
    fn to_value(&self) -> Value;
}

/// Prefix used when deriving a command-line name from a case identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CliPrefix {
    None,
    Dash,
    #[default]
    DoubleDash,
}

impl CliPrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Dash => "-",
            Self::DoubleDash => "--",
        }
    }
}

/// How a single-field payload is supplied on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Assignment {
    /// `--name value`
    #[default]
    Spaced,
    /// `--name=value`
    Equals,
    /// either form
    EqualsOrSpaced,
}

/// Behavioral annotations of a case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseAttributes {
    pub cli_name: Option<String>,
    pub alt_cli_names: Vec<String>,
    pub no_cli: bool,
    pub no_app_settings: bool,
    pub app_settings_key: Option<String>,
    pub mandatory: bool,
    pub gather_all_sources: bool,
    pub rest: bool,
    pub first: bool,
    pub hidden: bool,
    pub print_labels: bool,
    pub csv: bool,
    pub assignment: Assignment,
    /// Payload is supplied positionally, without a switch.
    pub main_command: bool,
    pub prefix: Option<CliPrefix>,
}

/// Reference to a nested description type.
#[derive(Debug, Clone, Copy)]
pub struct NestedDescriptor {
    pub type_id: TypeId,
    pub describe: fn() -> Description,
}

impl NestedDescriptor {
    pub fn of<T: ArgCases>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            describe: T::describe,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FieldType {
    /// Resolved through the primitive registry by type name.
    Scalar { type_name: &'static str },
    /// Verbatim tokens of a rest case.
    Remainder,
    /// A sub-command.
    Nested(NestedDescriptor),
}

impl FieldType {
    pub fn scalar(type_name: &'static str) -> Self {
        Self::Scalar { type_name }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar { type_name } => type_name,
            Self::Remainder => "Vec<String>",
            Self::Nested(_) => "ParseResults",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: FieldType,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn of<F: ArgField>(name: impl Into<String>) -> Self {
        Self::new(name, F::field_type())
    }
}

#[derive(Debug, Clone)]
pub struct CaseDescriptor {
    pub identifier: String,
    pub usage: String,
    pub fields: Vec<FieldDescriptor>,
    pub attributes: CaseAttributes,
}

impl CaseDescriptor {
    pub fn new(identifier: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            usage: usage.into(),
            fields: Vec::new(),
            attributes: CaseAttributes::default(),
        }
    }

    /// Append a field of Rust type `F`.
    pub fn field<F: ArgField>(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldDescriptor::of::<F>(name));
        self
    }

    /// Append a field with an explicit field type.
    pub fn field_of(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDescriptor::new(name, ty));
        self
    }

    pub fn attributes(mut self, attributes: CaseAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKind {
    Cases,
    /// Anything the compiler cannot enumerate cases for.
    Other,
}

#[derive(Debug, Clone)]
pub struct Description {
    pub type_name: String,
    pub type_id: TypeId,
    pub kind: DescriptionKind,
    pub generic: bool,
    pub prefix: CliPrefix,
    pub help_flags: Option<Vec<String>>,
    pub help_description: Option<String>,
    pub cases: Vec<CaseDescriptor>,
}

impl Description {
    pub fn new<T: 'static>(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            type_id: TypeId::of::<T>(),
            kind: DescriptionKind::Cases,
            generic: false,
            prefix: CliPrefix::default(),
            help_flags: None,
            help_description: None,
            cases: Vec::new(),
        }
    }

    /// A description of a type that is not case-based.
    pub fn opaque<T: 'static>(type_name: impl Into<String>) -> Self {
        Self {
            kind: DescriptionKind::Other,
            ..Self::new::<T>(type_name)
        }
    }

    pub fn generic(mut self, generic: bool) -> Self {
        self.generic = generic;
        self
    }

    pub fn prefix(mut self, prefix: CliPrefix) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn help_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.help_flags = Some(flags.into_iter().map(Into::into).collect());
        self
    }

    pub fn help_description(mut self, description: impl Into<String>) -> Self {
        self.help_description = Some(description.into());
        self
    }

    pub fn case(mut self, case: CaseDescriptor) -> Self {
        self.cases.push(case);
        self
    }
}

macro_rules! signed_field {
    ($($ty:ty),*) => {$(
        impl ArgField for $ty {
            fn field_type() -> FieldType {
                FieldType::scalar(stringify!($ty))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::Int(v) => <$ty>::try_from(v).ok(),
                    _ => None,
                }
            }

            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($ty:ty),*) => {$(
        impl ArgField for $ty {
            fn field_type() -> FieldType {
                FieldType::scalar(stringify!($ty))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::UInt(v) => <$ty>::try_from(v).ok(),
                    _ => None,
                }
            }

            fn to_value(&self) -> Value {
                Value::UInt(*self as u64)
            }
        }
    )*};
}

signed_field!(i8, i16, i32, i64, isize);
unsigned_field!(u8, u16, u32, u64, usize);

impl ArgField for bool {
    fn field_type() -> FieldType {
        FieldType::scalar("bool")
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ArgField for f32 {
    fn field_type() -> FieldType {
        FieldType::scalar("f32")
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v as f32),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ArgField for f64 {
    fn field_type() -> FieldType {
        FieldType::scalar("f64")
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ArgField for char {
    fn field_type() -> FieldType {
        FieldType::scalar("char")
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Char(v) => Some(v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Char(*self)
    }
}

impl ArgField for String {
    fn field_type() -> FieldType {
        FieldType::scalar("String")
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ArgField for PathBuf {
    fn field_type() -> FieldType {
        FieldType::scalar("PathBuf")
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Path(v) => Some(v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Path(self.clone())
    }
}

/// Payload of a rest case.
impl ArgField for Vec<String> {
    fn field_type() -> FieldType {
        FieldType::Remainder
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Tokens(v) => Some(v),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        Value::Tokens(self.clone())
    }
}
