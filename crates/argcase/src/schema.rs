//! Schema compiler.
//!
//! A description is compiled into an [`ArgumentSchema`]: an arena of
//! [`SchemaNode`]s where node `0` is the root and every sub-command owns one
//! child node. Children refer back to their parent by node index only.
//!
//! Compilation runs in two phases. Case entries of every node (including
//! nested ones) are resolved first; once the root help spec is known, each
//! node is conflict-checked and indexed. The schema is only handed out after
//! both phases succeed.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::conflict;
use crate::description::{
    ArgCases, Assignment, CaseAttributes, CaseDescriptor, CliPrefix, Description,
    DescriptionKind, FieldType,
};
use crate::error::{IdentifierKind, SchemaError};
use crate::grouped::GroupedSwitches;
use crate::primitive::{Primitive, PrimitiveRegistry};

pub type NodeId = usize;

pub const DEFAULT_HELP_FLAGS: [&str; 2] = ["--help", "-h"];
pub const DEFAULT_HELP_DESCRIPTION: &str = "display this list of options.";

static SCHEMAS: LazyLock<RwLock<HashMap<TypeId, Arc<ArgumentSchema>>>> =
    LazyLock::new(Default::default);

/// Reserved help flags, shared by every node of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpSpec {
    pub flags: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone)]
pub enum FieldParser {
    Primitive(Primitive),
    Remainder,
    Nested(NodeId),
}

#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub name: String,
    pub parser: FieldParser,
}

impl FieldEntry {
    pub fn label(&self) -> &'static str {
        match &self.parser {
            FieldParser::Primitive(p) => p.label,
            FieldParser::Remainder => "string",
            FieldParser::Nested(_) => "options",
        }
    }
}

/// A compiled case.
#[derive(Debug, Clone)]
pub struct CaseEntry {
    /// Declaration index; the case tag handed to the reflector.
    pub index: usize,
    pub identifier: String,
    pub usage: String,
    pub default_name: Option<String>,
    /// Every command-line alias, the default name first.
    pub cli_names: Vec<String>,
    pub app_settings_key: Option<String>,
    pub fields: Vec<FieldEntry>,
    pub nested: Option<NodeId>,
    pub attributes: CaseAttributes,
}

impl CaseEntry {
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn is_rest(&self) -> bool {
        self.attributes.rest
    }

    pub fn is_main_command(&self) -> bool {
        self.attributes.main_command
    }

    pub fn alt_names(&self) -> &[String] {
        self.cli_names.get(1..).unwrap_or_default()
    }

    /// Name used in messages and usage text.
    pub fn display_name(&self) -> String {
        if self.is_main_command() {
            return format!("<{}>", identifier_words(&self.identifier).join("-"));
        }
        self.default_name
            .clone()
            .or_else(|| self.app_settings_key.clone())
            .unwrap_or_else(|| self.identifier.clone())
    }
}

#[derive(Debug)]
pub struct SchemaNode {
    type_name: String,
    type_id: TypeId,
    cases: Vec<CaseEntry>,
    cli_index: IndexMap<String, usize>,
    key_index: IndexMap<String, usize>,
    grouped: Option<GroupedSwitches>,
    main_command: Option<usize>,
    /// Parent node and the case of the parent that leads here.
    parent: Option<(NodeId, usize)>,
}

/// A compiled, immutable description.
#[derive(Debug)]
pub struct ArgumentSchema {
    nodes: Vec<SchemaNode>,
    help: HelpSpec,
}

impl ArgumentSchema {
    /// Compile `T` against the standard registry, once per process.
    pub fn of<T: ArgCases>() -> Result<Arc<Self>, SchemaError> {
        let key = TypeId::of::<T>();
        let cached = SCHEMAS
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(schema) = cached {
            tracing::debug!(type_name = schema.root().type_name(), "schema cache hit");
            return Ok(schema);
        }

        let schema = Arc::new(Self::compile(T::describe(), PrimitiveRegistry::standard())?);
        let mut cache = SCHEMAS.write().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(key).or_insert(schema).clone())
    }

    /// Compile a description without caching.
    pub fn compile(
        description: Description,
        registry: &PrimitiveRegistry,
    ) -> Result<Self, SchemaError> {
        tracing::debug!(
            type_name = %description.type_name,
            cases = description.cases.len(),
            "compiling argument schema"
        );
        let help = resolve_help(&description)?;
        let mut compiler = Compiler {
            registry,
            pending: Vec::new(),
        };
        compiler.compile_node(description, &mut Vec::new(), None)?;

        let mut nodes = Vec::with_capacity(compiler.pending.len());
        for node in compiler.pending {
            // Every reserved slot is filled before compile_node returns.
            let Some(node) = node else {
                continue;
            };
            nodes.push(node.finish(&help)?);
        }
        Ok(Self { nodes, help })
    }

    pub fn root(&self) -> SchemaRef<'_> {
        SchemaRef {
            schema: self,
            id: 0,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<SchemaRef<'_>> {
        (id < self.nodes.len()).then_some(SchemaRef { schema: self, id })
    }

    pub fn help(&self) -> &HelpSpec {
        &self.help
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Borrowed view of one schema node.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRef<'a> {
    schema: &'a ArgumentSchema,
    id: NodeId,
}

impl<'a> SchemaRef<'a> {
    fn node(&self) -> &'a SchemaNode {
        &self.schema.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn schema(&self) -> &'a ArgumentSchema {
        self.schema
    }

    pub fn type_name(&self) -> &'a str {
        &self.node().type_name
    }

    pub fn type_id(&self) -> TypeId {
        self.node().type_id
    }

    pub fn help(&self) -> &'a HelpSpec {
        &self.schema.help
    }

    pub fn cases(&self) -> &'a [CaseEntry] {
        &self.node().cases
    }

    pub fn case(&self, index: usize) -> Option<&'a CaseEntry> {
        self.node().cases.get(index)
    }

    pub fn by_cli_name(&self, name: &str) -> Option<&'a CaseEntry> {
        let node = self.node();
        node.cli_index.get(name).map(|&i| &node.cases[i])
    }

    pub fn by_key(&self, key: &str) -> Option<&'a CaseEntry> {
        let node = self.node();
        node.key_index.get(key).map(|&i| &node.cases[i])
    }

    pub fn cli_names(&self) -> impl Iterator<Item = &'a str> {
        self.node().cli_index.keys().map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.node().key_index.keys().map(String::as_str)
    }

    pub fn grouped(&self) -> Option<&'a GroupedSwitches> {
        self.node().grouped.as_ref()
    }

    pub fn main_command(&self) -> Option<&'a CaseEntry> {
        let node = self.node();
        node.main_command.map(|i| &node.cases[i])
    }

    /// The parent node and the case that leads to this node.
    pub fn parent(&self) -> Option<(SchemaRef<'a>, &'a CaseEntry)> {
        let (id, case) = self.node().parent?;
        let parent = SchemaRef {
            schema: self.schema,
            id,
        };
        Some((parent, parent.case(case)?))
    }

    pub fn child(&self, case: &CaseEntry) -> Option<SchemaRef<'a>> {
        self.schema.node(case.nested?)
    }

    pub fn is_root(&self) -> bool {
        self.id == 0
    }
}

struct PendingNode {
    type_name: String,
    type_id: TypeId,
    cases: Vec<CaseEntry>,
    main_command: Option<usize>,
    parent: Option<(NodeId, usize)>,
}

impl PendingNode {
    fn finish(self, help: &HelpSpec) -> Result<SchemaNode, SchemaError> {
        conflict::check(&self.type_name, &self.cases, help)?;

        let mut cli_index = IndexMap::new();
        let mut key_index = IndexMap::new();
        for case in &self.cases {
            for name in &case.cli_names {
                cli_index.insert(name.clone(), case.index);
            }
            if let Some(key) = &case.app_settings_key {
                key_index.insert(key.clone(), case.index);
            }
        }
        let grouped = GroupedSwitches::build(&self.cases);

        Ok(SchemaNode {
            type_name: self.type_name,
            type_id: self.type_id,
            cases: self.cases,
            cli_index,
            key_index,
            grouped,
            main_command: self.main_command,
            parent: self.parent,
        })
    }
}

struct Compiler<'r> {
    registry: &'r PrimitiveRegistry,
    pending: Vec<Option<PendingNode>>,
}

impl Compiler<'_> {
    fn compile_node(
        &mut self,
        description: Description,
        ancestors: &mut Vec<(TypeId, String)>,
        parent: Option<(NodeId, usize)>,
    ) -> Result<NodeId, SchemaError> {
        let type_name = description.type_name.clone();
        if description.kind != DescriptionKind::Cases {
            return Err(SchemaError::NotCaseBased { type_name });
        }
        if description.generic {
            return Err(SchemaError::GenericDescription { type_name });
        }
        if ancestors.iter().any(|(id, _)| *id == description.type_id) {
            let chain = ancestors
                .iter()
                .map(|(_, name)| name.as_str())
                .chain([type_name.as_str()])
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(SchemaError::RecursiveDescription { type_name, chain });
        }

        let id = self.pending.len();
        self.pending.push(None);
        ancestors.push((description.type_id, type_name.clone()));

        let mut cases = Vec::with_capacity(description.cases.len());
        let mut main_command: Option<usize> = None;
        for (index, case) in description.cases.into_iter().enumerate() {
            let entry = self.compile_case(&type_name, description.prefix, id, index, case, ancestors)?;
            if entry.is_main_command() {
                if main_command.is_some() {
                    return Err(incompatible(
                        &type_name,
                        &entry.identifier,
                        "only one main command is allowed per description",
                    ));
                }
                main_command = Some(index);
            }
            cases.push(entry);
        }
        ancestors.pop();

        self.pending[id] = Some(PendingNode {
            type_name,
            type_id: description.type_id,
            cases,
            main_command,
            parent,
        });
        Ok(id)
    }

    fn compile_case(
        &mut self,
        type_name: &str,
        default_prefix: CliPrefix,
        node: NodeId,
        index: usize,
        case: CaseDescriptor,
        ancestors: &mut Vec<(TypeId, String)>,
    ) -> Result<CaseEntry, SchemaError> {
        let CaseDescriptor {
            identifier,
            usage,
            fields: descriptors,
            attributes,
        } = case;
        let words = identifier_words(&identifier);

        let mut cli_names = Vec::new();
        if !attributes.no_cli && !attributes.main_command {
            let prefix = attributes.prefix.unwrap_or(default_prefix);
            let primary = attributes
                .cli_name
                .clone()
                .unwrap_or_else(|| format!("{}{}", prefix.as_str(), words.join("-")));
            cli_names.push(primary);
            for alt in &attributes.alt_cli_names {
                if !cli_names.contains(alt) {
                    cli_names.push(alt.clone());
                }
            }
            if let Some(bad) = cli_names.iter().find(|name| !is_valid_identifier(name)) {
                return Err(SchemaError::InvalidIdentifier {
                    type_name: type_name.to_string(),
                    case: identifier.clone(),
                    kind: IdentifierKind::CommandLine,
                    identifier: bad.clone(),
                });
            }
        }

        let is_nested = matches!(descriptors.as_slice(), [d] if matches!(d.ty, FieldType::Nested(_)));
        let app_settings_key = if attributes.no_app_settings || is_nested {
            None
        } else {
            match &attributes.app_settings_key {
                Some(key) if !is_valid_key(key) => {
                    return Err(SchemaError::InvalidIdentifier {
                        type_name: type_name.to_string(),
                        case: identifier.clone(),
                        kind: IdentifierKind::AppSettings,
                        identifier: key.clone(),
                    });
                }
                Some(key) => Some(key.clone()),
                None => Some(words.join(" ")),
            }
        };

        let mut fields = Vec::with_capacity(descriptors.len());
        let mut nested = None;
        if is_nested {
            if let Some(FieldType::Nested(descriptor)) = descriptors.first().map(|d| &d.ty) {
                tracing::debug!(case = %identifier, "compiling sub-command schema");
                let child = self.compile_node((descriptor.describe)(), ancestors, Some((node, index)))?;
                nested = Some(child);
                fields.push(FieldEntry {
                    name: descriptors[0].name.clone(),
                    parser: FieldParser::Nested(child),
                });
            }
        } else {
            for descriptor in &descriptors {
                let parser = match &descriptor.ty {
                    FieldType::Scalar { type_name: scalar } => match self.registry.get(scalar) {
                        Some(primitive) => FieldParser::Primitive(*primitive),
                        None => {
                            return Err(unsupported(type_name, &identifier, &descriptor.name, scalar));
                        }
                    },
                    FieldType::Remainder => FieldParser::Remainder,
                    FieldType::Nested(_) => {
                        return Err(unsupported(
                            type_name,
                            &identifier,
                            &descriptor.name,
                            descriptor.ty.type_name(),
                        ));
                    }
                };
                fields.push(FieldEntry {
                    name: descriptor.name.clone(),
                    parser,
                });
            }
        }

        validate_annotations(type_name, &identifier, &attributes, &fields, is_nested)?;

        if cli_names.is_empty() && app_settings_key.is_none() && !attributes.main_command {
            return Err(SchemaError::NoParseSource {
                type_name: type_name.to_string(),
                case: identifier,
            });
        }

        Ok(CaseEntry {
            index,
            identifier,
            usage,
            default_name: cli_names.first().cloned(),
            cli_names,
            app_settings_key,
            fields,
            nested,
            attributes,
        })
    }
}

fn validate_annotations(
    type_name: &str,
    case: &str,
    attributes: &CaseAttributes,
    fields: &[FieldEntry],
    is_nested: bool,
) -> Result<(), SchemaError> {
    let arity = fields.len();
    let remainder = fields
        .iter()
        .any(|f| matches!(f.parser, FieldParser::Remainder));

    if attributes.assignment != Assignment::Spaced {
        if is_nested {
            return Err(incompatible(type_name, case, "a sub-command cannot use equals assignment"));
        }
        if attributes.rest {
            return Err(incompatible(type_name, case, "equals assignment cannot be combined with rest"));
        }
        if arity != 1 {
            return Err(incompatible(type_name, case, "equals assignment requires exactly one field"));
        }
    }
    if attributes.csv && (arity != 1 || remainder || is_nested) {
        return Err(incompatible(type_name, case, "CSV requires exactly one scalar field"));
    }
    if attributes.rest && !(arity == 1 && remainder) {
        return Err(incompatible(type_name, case, "rest requires a single Vec<String> field"));
    }
    if remainder && !attributes.rest {
        return Err(incompatible(type_name, case, "a Vec<String> field requires the rest annotation"));
    }
    if attributes.main_command && (arity == 0 || is_nested) {
        return Err(incompatible(type_name, case, "a main command needs at least one scalar field"));
    }
    Ok(())
}

fn resolve_help(description: &Description) -> Result<HelpSpec, SchemaError> {
    let flags: Vec<String> = match &description.help_flags {
        Some(flags) => flags.clone(),
        None => DEFAULT_HELP_FLAGS.iter().map(|s| s.to_string()).collect(),
    };
    if let Some(bad) = flags.iter().find(|flag| !is_valid_identifier(flag)) {
        return Err(SchemaError::InvalidIdentifier {
            type_name: description.type_name.clone(),
            case: "help".to_string(),
            kind: IdentifierKind::CommandLine,
            identifier: bad.clone(),
        });
    }
    let description_text = description
        .help_description
        .clone()
        .unwrap_or_else(|| DEFAULT_HELP_DESCRIPTION.to_string());
    Ok(HelpSpec {
        flags,
        description: description_text,
    })
}

fn incompatible(type_name: &str, case: &str, reason: &str) -> SchemaError {
    SchemaError::IncompatibleAnnotations {
        type_name: type_name.to_string(),
        case: case.to_string(),
        reason: reason.to_string(),
    }
}

fn unsupported(type_name: &str, case: &str, field: &str, field_type: &str) -> SchemaError {
    SchemaError::UnsupportedFieldType {
        type_name: type_name.to_string(),
        case: case.to_string(),
        field: field.to_string(),
        field_type: field_type.to_string(),
    }
}

fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Split `LogLevel` / `Log_Level` / `log_level` into `["log", "level"]`.
pub fn identifier_words(identifier: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in identifier.chars() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
