//! Block definitions: fields, inputs, shape and localized strings.
//!
//! A [`BlockDefinition`] is only obtainable through [`BlockDefinitionBuilder`]
//! or validated deserialization, so every instance upholds:
//!
//! - the block type is non-empty;
//! - a display name exists for [`LocaleCode::DEFAULT`];
//! - board compatibility is non-empty (guaranteed by [`BoardCompatibility`]);
//! - enum/dropdown fields list their options and default to one of them;
//! - field and input names are unique within the block.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::EnumString;

use crate::board::{BoardCompatibility, BoardId};
use crate::category::Category;
use crate::error::TypeError;
use crate::locale::LocaleCode;

/// Semantic type of an editable field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FieldType {
    String,
    Number,
    /// Closed set of values chosen by the block author.
    Enum,
    /// Closed set of values shown as a dropdown menu.
    Dropdown,
}

impl FieldType {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Enum => "enum",
            FieldType::Dropdown => "dropdown",
        }
    }

    /// Whether the field only accepts listed options.
    pub fn is_closed(&self) -> bool {
        matches!(self, FieldType::Enum | FieldType::Dropdown)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type carried by a value connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ValueType {
    Number,
    String,
    Boolean,
    Array,
    Any,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Any => "any",
        }
    }

    /// Whether a block producing `self` may plug into a socket checking `socket`.
    pub fn fits(&self, socket: ValueType) -> bool {
        *self == socket || *self == ValueType::Any || socket == ValueType::Any
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an input socket holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Value socket that needs a nested block.
    Block,
    /// Value socket pre-filled with a replaceable shadow literal.
    Literal,
    /// Statement stack (e.g. the body of a loop).
    Statement,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Block => "block",
            InputKind::Literal => "literal",
            InputKind::Statement => "statement",
        }
    }
}

/// How a block connects to its neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockShape {
    /// Placed directly on the workspace, no previous/next/output connection.
    TopLevel,
    /// Previous and next connections.
    Statement,
    /// Output connection producing a value.
    Value(ValueType),
}

impl BlockShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockShape::TopLevel => "top_level",
            BlockShape::Statement => "statement",
            BlockShape::Value(_) => "value",
        }
    }

    pub fn output(&self) -> Option<ValueType> {
        match self {
            BlockShape::Value(t) => Some(*t),
            _ => None,
        }
    }
}

/// An editable field on a block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub default: Value,
    /// Allowed values for enum/dropdown fields, empty otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl BlockField {
    pub fn text(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::String,
            default: Value::String(default.into()),
            options: Vec::new(),
        }
    }

    pub fn number(name: impl Into<String>, default: impl Into<serde_json::Number>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Number,
            default: Value::Number(default.into()),
            options: Vec::new(),
        }
    }

    /// Dropdown defaulting to its first option.
    pub fn dropdown(name: impl Into<String>, options: &[&str]) -> Self {
        Self::closed(FieldType::Dropdown, name, options)
    }

    /// Enum defaulting to its first option.
    pub fn enumeration(name: impl Into<String>, options: &[&str]) -> Self {
        Self::closed(FieldType::Enum, name, options)
    }

    fn closed(field_type: FieldType, name: impl Into<String>, options: &[&str]) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: options
                .first()
                .map(|o| Value::String(o.to_string()))
                .unwrap_or(Value::Null),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// Override the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    fn validate(&self, block: &str) -> Result<(), TypeError> {
        let invalid = |reason: &str| TypeError::InvalidField {
            block: block.to_string(),
            field: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        match self.field_type {
            FieldType::String if !self.default.is_string() => {
                Err(invalid("string field needs a string default"))
            }
            FieldType::Number if !self.default.is_number() => {
                Err(invalid("number field needs a numeric default"))
            }
            FieldType::Enum | FieldType::Dropdown => {
                if self.options.is_empty() {
                    return Err(invalid("options must not be empty"));
                }
                match self.default.as_str() {
                    Some(d) if self.options.iter().any(|o| o == d) => Ok(()),
                    _ => Err(invalid("default must be one of the options")),
                }
            }
            _ => Ok(()),
        }
    }
}

/// An input socket on a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInput {
    pub name: String,
    /// Expected value type. Statement inputs use `any`.
    #[serde(default = "default_check")]
    pub check: ValueType,
    pub kind: InputKind,
}

fn default_check() -> ValueType {
    ValueType::Any
}

impl BlockInput {
    pub fn new(name: impl Into<String>, check: ValueType, kind: InputKind) -> Self {
        Self {
            name: name.into(),
            check,
            kind,
        }
    }

    pub fn statement(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Any, InputKind::Statement)
    }

    /// Whether leaving the socket empty makes the block incomplete.
    pub fn is_required(&self) -> bool {
        self.kind == InputKind::Block
    }
}

/// One block type in the dictionary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlockDefinitionData")]
pub struct BlockDefinition {
    #[serde(rename = "type")]
    block_type: String,
    category: Category,
    shape: BlockShape,
    fields: Vec<BlockField>,
    inputs: Vec<BlockInput>,
    boards: BoardCompatibility,
    names: BTreeMap<LocaleCode, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    descriptions: BTreeMap<LocaleCode, String>,
}

impl BlockDefinition {
    pub fn builder(block_type: impl Into<String>, category: Category) -> BlockDefinitionBuilder {
        BlockDefinitionBuilder::new(block_type, category)
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn shape(&self) -> BlockShape {
        self.shape
    }

    pub fn fields(&self) -> &[BlockField] {
        &self.fields
    }

    pub fn inputs(&self) -> &[BlockInput] {
        &self.inputs
    }

    pub fn boards(&self) -> &BoardCompatibility {
        &self.boards
    }

    pub fn field(&self, name: &str) -> Option<&BlockField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn input(&self, name: &str) -> Option<&BlockInput> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn supports_board(&self, board: BoardId) -> bool {
        self.boards.supports(board)
    }

    /// Display name in `locale`, or the default-locale name.
    pub fn display_name(&self, locale: LocaleCode) -> &str {
        self.names
            .get(&locale)
            .or_else(|| self.names.get(&LocaleCode::DEFAULT))
            .map(String::as_str)
            // The builder guarantees a default name; the type id is a last resort.
            .unwrap_or(&self.block_type)
    }

    /// Tooltip in `locale`, or the default-locale tooltip.
    pub fn description(&self, locale: LocaleCode) -> Option<&str> {
        self.descriptions
            .get(&locale)
            .or_else(|| self.descriptions.get(&LocaleCode::DEFAULT))
            .map(String::as_str)
    }

    /// Whether a name is authored for `locale` (no fallback).
    pub fn has_translation(&self, locale: LocaleCode) -> bool {
        self.names.contains_key(&locale)
    }
}

/// Builder for [`BlockDefinition`]; `build` checks the invariants.
///
/// ```
/// use blockdex_types::{BlockDefinition, BlockField, BoardCompatibility, BoardId, Category, LocaleCode};
///
/// let def = BlockDefinition::builder("wifi_connect", Category::Network)
///     .field(BlockField::text("SSID", "my-network"))
///     .boards(BoardCompatibility::only([BoardId::Esp32, BoardId::SuperMini]).unwrap())
///     .name(LocaleCode::En, "WiFi Connect")
///     .build()
///     .unwrap();
/// assert_eq!(def.display_name(LocaleCode::Ja), "WiFi Connect");
/// ```
pub struct BlockDefinitionBuilder {
    def: BlockDefinition,
}

impl BlockDefinitionBuilder {
    pub fn new(block_type: impl Into<String>, category: Category) -> Self {
        Self {
            def: BlockDefinition {
                block_type: block_type.into(),
                category,
                shape: BlockShape::Statement,
                fields: Vec::new(),
                inputs: Vec::new(),
                boards: BoardCompatibility::All,
                names: BTreeMap::new(),
                descriptions: BTreeMap::new(),
            },
        }
    }

    pub fn shape(mut self, shape: BlockShape) -> Self {
        self.def.shape = shape;
        self
    }

    pub fn field(mut self, field: BlockField) -> Self {
        self.def.fields.push(field);
        self
    }

    pub fn input(mut self, input: BlockInput) -> Self {
        self.def.inputs.push(input);
        self
    }

    pub fn boards(mut self, boards: BoardCompatibility) -> Self {
        self.def.boards = boards;
        self
    }

    pub fn name(mut self, locale: LocaleCode, name: impl Into<String>) -> Self {
        self.def.names.insert(locale, name.into());
        self
    }

    pub fn description(mut self, locale: LocaleCode, text: impl Into<String>) -> Self {
        self.def.descriptions.insert(locale, text.into());
        self
    }

    pub fn build(self) -> Result<BlockDefinition, TypeError> {
        let def = self.def;

        if def.block_type.trim().is_empty() {
            return Err(TypeError::EmptyBlockType);
        }
        match def.names.get(&LocaleCode::DEFAULT) {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(TypeError::MissingDefaultName(def.block_type)),
        }

        let mut seen = HashSet::new();
        for field in &def.fields {
            field.validate(&def.block_type)?;
            if !seen.insert(field.name.as_str()) {
                return Err(TypeError::DuplicateMember {
                    block: def.block_type.clone(),
                    name: field.name.clone(),
                });
            }
        }
        for input in &def.inputs {
            if !seen.insert(input.name.as_str()) {
                return Err(TypeError::DuplicateMember {
                    block: def.block_type.clone(),
                    name: input.name.clone(),
                });
            }
        }

        Ok(def)
    }
}

/// Wire form of a definition, validated into [`BlockDefinition`].
///
/// Locale keys are plain strings here so an unlisted locale in catalog data
/// is reported instead of silently dropped.
#[derive(Deserialize)]
struct BlockDefinitionData {
    #[serde(rename = "type")]
    block_type: String,
    category: Category,
    #[serde(default = "default_shape")]
    shape: BlockShape,
    #[serde(default)]
    fields: Vec<BlockField>,
    #[serde(default)]
    inputs: Vec<BlockInput>,
    #[serde(default)]
    boards: BoardCompatibility,
    names: BTreeMap<String, String>,
    #[serde(default)]
    descriptions: BTreeMap<String, String>,
}

fn default_shape() -> BlockShape {
    BlockShape::Statement
}

impl TryFrom<BlockDefinitionData> for BlockDefinition {
    type Error = TypeError;

    fn try_from(data: BlockDefinitionData) -> Result<Self, Self::Error> {
        let mut builder = BlockDefinitionBuilder::new(data.block_type, data.category)
            .shape(data.shape)
            .boards(data.boards);
        for field in data.fields {
            builder = builder.field(field);
        }
        for input in data.inputs {
            builder = builder.input(input);
        }
        for (tag, name) in data.names {
            let locale = LocaleCode::from_str(&tag).ok_or(TypeError::UnknownLocale(tag))?;
            builder = builder.name(locale, name);
        }
        for (tag, text) in data.descriptions {
            let locale = LocaleCode::from_str(&tag).ok_or(TypeError::UnknownLocale(tag))?;
            builder = builder.description(locale, text);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wifi_connect() -> BlockDefinition {
        BlockDefinition::builder("wifi_connect", Category::Network)
            .field(BlockField::text("SSID", "my-network"))
            .field(BlockField::text("PASSWORD", ""))
            .boards(BoardCompatibility::only([BoardId::Esp32, BoardId::SuperMini]).unwrap())
            .name(LocaleCode::En, "WiFi Connect")
            .name(LocaleCode::ZhHant, "連接 WiFi")
            .description(LocaleCode::En, "Connect to a WiFi network.")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let def = wifi_connect();
        assert_eq!(def.block_type(), "wifi_connect");
        assert_eq!(def.category(), Category::Network);
        assert_eq!(def.shape(), BlockShape::Statement);
        assert_eq!(def.fields().len(), 2);
        assert!(def.inputs().is_empty());
    }

    #[test]
    fn test_display_name_falls_back_to_default_locale() {
        let def = wifi_connect();
        assert_eq!(def.display_name(LocaleCode::ZhHant), "連接 WiFi");
        assert_eq!(def.display_name(LocaleCode::Ko), "WiFi Connect");
        assert!(!def.has_translation(LocaleCode::Ko));
        assert_eq!(def.description(LocaleCode::Fr), Some("Connect to a WiFi network."));
    }

    #[test]
    fn test_missing_default_name_rejected() {
        let err = BlockDefinition::builder("orphan", Category::Logic)
            .name(LocaleCode::Ja, "孤児")
            .build()
            .unwrap_err();
        assert_eq!(err, TypeError::MissingDefaultName("orphan".into()));
    }

    #[test]
    fn test_empty_type_rejected() {
        let err = BlockDefinition::builder("  ", Category::Logic)
            .name(LocaleCode::En, "Nothing")
            .build()
            .unwrap_err();
        assert_eq!(err, TypeError::EmptyBlockType);
    }

    #[test]
    fn test_dropdown_default_must_be_option() {
        let err = BlockDefinition::builder("pin_mode", Category::Arduino)
            .field(BlockField::dropdown("MODE", &["INPUT", "OUTPUT"]).with_default("ANALOG"))
            .name(LocaleCode::En, "Pin Mode")
            .build()
            .unwrap_err();
        assert!(matches!(err, TypeError::InvalidField { ref field, .. } if field == "MODE"));

        let err = BlockDefinition::builder("pin_mode", Category::Arduino)
            .field(BlockField::dropdown("MODE", &[]))
            .name(LocaleCode::En, "Pin Mode")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("options must not be empty"));
    }

    #[test]
    fn test_number_field_needs_number_default() {
        let err = BlockDefinition::builder("delay", Category::Arduino)
            .field(BlockField::number("MS", 1000).with_default("soon"))
            .name(LocaleCode::En, "Delay")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("numeric default"));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let err = BlockDefinition::builder("dup", Category::Math)
            .field(BlockField::number("A", 0))
            .input(BlockInput::new("A", ValueType::Number, InputKind::Literal))
            .name(LocaleCode::En, "Dup")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TypeError::DuplicateMember {
                block: "dup".into(),
                name: "A".into()
            }
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let json = serde_json::json!({
            "type": "servo_move",
            "category": "motors",
            "shape": "statement",
            "fields": [{"name": "PIN", "type": "number", "default": 9}],
            "inputs": [{"name": "ANGLE", "check": "number", "kind": "literal"}],
            "boards": "all",
            "names": {"en": "Servo Move", "zh-TW": "伺服馬達轉動"}
        });
        let def: BlockDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(def.display_name(LocaleCode::ZhHant), "伺服馬達轉動");
        assert_eq!(def.input("ANGLE").map(|i| i.kind), Some(InputKind::Literal));

        let missing_name = serde_json::json!({
            "type": "x", "category": "logic", "names": {"ja": "エックス"}
        });
        assert!(serde_json::from_value::<BlockDefinition>(missing_name).is_err());

        let bad_locale = serde_json::json!({
            "type": "x", "category": "logic", "names": {"en": "X", "klingon": "X"}
        });
        assert!(serde_json::from_value::<BlockDefinition>(bad_locale).is_err());
    }

    #[test]
    fn test_value_shape_serde() {
        let shape: BlockShape = serde_json::from_value(serde_json::json!({"value": "number"})).unwrap();
        assert_eq!(shape, BlockShape::Value(ValueType::Number));
        assert_eq!(shape.output(), Some(ValueType::Number));
        let shape: BlockShape = serde_json::from_value(serde_json::json!("top_level")).unwrap();
        assert_eq!(shape, BlockShape::TopLevel);
    }

    #[test]
    fn test_value_type_fits() {
        assert!(ValueType::Number.fits(ValueType::Number));
        assert!(ValueType::Number.fits(ValueType::Any));
        assert!(ValueType::Any.fits(ValueType::Boolean));
        assert!(!ValueType::String.fits(ValueType::Number));
    }
}
