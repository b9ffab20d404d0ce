//! Usage rendering: what a block needs, what it looks like in Blockly JSON,
//! and where it goes.
//!
//! All output is deterministic. Templates carry no ids or coordinates and
//! serialize with sorted keys, so identical definitions give identical JSON.

use serde::Serialize;
use serde_json::{Map, Value, json};

use blockdex_types::{
    BlockContext, BlockDefinition, BlockField, BlockShape, BoardCompatibility, Category, InputKind,
    LocaleCode, ValueType,
};

use crate::dictionary::BlockDictionary;
use crate::error::{EngineError, EngineResult};

/// Block that every sketch is built around.
pub const SETUP_LOOP_BLOCK: &str = "arduino_setup_loop";

/// Result of [`format_block_usage`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UsageDescription {
    Available(BlockUsage),
    Unavailable { reason: String },
}

impl UsageDescription {
    pub fn is_available(&self) -> bool {
        matches!(self, UsageDescription::Available(_))
    }
}

/// Everything an agent needs to place one block.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockUsage {
    #[serde(rename = "type")]
    pub block_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: Category,
    pub category_name: String,
    pub shape: &'static str,
    /// Value type produced by value blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<ValueType>,
    pub boards: BoardCompatibility,
    pub fields: Vec<BlockField>,
    pub inputs: Vec<InputUsage>,
    /// Blockly JSON ready to insert.
    pub example: Value,
    pub insertion_guide: String,
    /// Set when the context board cannot run this block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InputUsage {
    pub name: String,
    pub check: ValueType,
    pub kind: InputKind,
    pub required: bool,
}

/// One line of a category listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UsageSummary {
    #[serde(rename = "type")]
    pub block_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub shape: &'static str,
    pub boards: BoardCompatibility,
}

impl UsageSummary {
    pub fn new(def: &BlockDefinition, locale: LocaleCode) -> Self {
        Self {
            block_type: def.block_type().to_string(),
            name: def.display_name(locale).to_string(),
            description: def.description(locale).map(str::to_string),
            shape: def.shape().as_str(),
            boards: def.boards().clone(),
        }
    }
}

/// Describe a block, or report that there is nothing to describe.
pub fn format_block_usage(
    def: Option<&BlockDefinition>,
    locale: LocaleCode,
    context: Option<&BlockContext>,
) -> UsageDescription {
    let Some(def) = def else {
        return UsageDescription::Unavailable {
            reason: "block definition not found".to_string(),
        };
    };

    let board_note = context
        .and_then(|ctx| ctx.board)
        .filter(|&board| !def.supports_board(board))
        .map(|board| {
            format!(
                "{} is not available on {} (supported: {})",
                def.block_type(),
                board.info().name,
                def.boards().label()
            )
        });

    UsageDescription::Available(BlockUsage {
        block_type: def.block_type().to_string(),
        name: def.display_name(locale).to_string(),
        description: def.description(locale).map(str::to_string),
        category: def.category(),
        category_name: def.category().display_name(locale).to_string(),
        shape: def.shape().as_str(),
        output: def.shape().output(),
        boards: def.boards().clone(),
        fields: def.fields().to_vec(),
        inputs: def
            .inputs()
            .iter()
            .map(|input| InputUsage {
                name: input.name.clone(),
                check: input.check,
                kind: input.kind,
                required: input.is_required(),
            })
            .collect(),
        example: generate_block_json_template(def),
        insertion_guide: generate_insertion_guide(def, context),
        board_note,
    })
}

/// Summaries of every block in `category`, in declaration order.
///
/// An unknown category is `NotFound`; a known category with no blocks gives
/// an empty list.
pub fn format_category_blocks(
    dictionary: &BlockDictionary,
    category: &str,
    locale: LocaleCode,
) -> EngineResult<Vec<UsageSummary>> {
    let parsed = Category::from_str(category.trim())
        .ok_or_else(|| EngineError::category_not_found(category.trim()))?;
    Ok(dictionary
        .blocks_in_category(parsed)
        .map(|def| UsageSummary::new(def, locale))
        .collect())
}

/// Blockly serialization of a fresh instance of `def`.
///
/// Fields carry their defaults; literal inputs get a shadow block; block and
/// statement inputs are left empty.
pub fn generate_block_json_template(def: &BlockDefinition) -> Value {
    let mut template = Map::new();
    template.insert("type".into(), Value::String(def.block_type().to_string()));

    if !def.fields().is_empty() {
        let fields: Map<String, Value> = def
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect();
        template.insert("fields".into(), Value::Object(fields));
    }

    let inputs: Map<String, Value> = def
        .inputs()
        .iter()
        .filter(|input| input.kind == InputKind::Literal)
        .filter_map(|input| {
            shadow_for(input.check).map(|shadow| (input.name.clone(), json!({ "shadow": shadow })))
        })
        .collect();
    if !inputs.is_empty() {
        template.insert("inputs".into(), Value::Object(inputs));
    }

    Value::Object(template)
}

/// Default shadow literal for a socket type. Lists have none.
fn shadow_for(check: ValueType) -> Option<Value> {
    match check {
        ValueType::Number => Some(json!({ "type": "math_number", "fields": { "NUM": 0 } })),
        ValueType::String | ValueType::Any => {
            Some(json!({ "type": "text", "fields": { "TEXT": "" } }))
        }
        ValueType::Boolean => Some(json!({ "type": "logic_boolean", "fields": { "BOOL": "TRUE" } })),
        ValueType::Array => None,
    }
}

/// Advice on where `def` goes and what it still needs.
///
/// Uses the block shape, its inputs, and, when given, the board and a
/// workspace summary. Purely advisory.
pub fn generate_insertion_guide(def: &BlockDefinition, context: Option<&BlockContext>) -> String {
    let block_type = def.block_type();
    let mut lines = Vec::new();

    lines.push(match def.shape() {
        BlockShape::TopLevel => {
            format!("Place {block_type} directly on the workspace; it cannot be nested.")
        }
        BlockShape::Statement => format!(
            "Stack {block_type} inside a statement input (such as LOOP of {SETUP_LOOP_BLOCK}) \
             or chain it after another statement block."
        ),
        BlockShape::Value(output) => format!(
            "{block_type} produces a {output} value; plug it into an input that accepts {output} or any."
        ),
    });

    let required: Vec<&str> = def
        .inputs()
        .iter()
        .filter(|i| i.is_required())
        .map(|i| i.name.as_str())
        .collect();
    if !required.is_empty() {
        lines.push(format!("Required inputs: {}.", required.join(", ")));
    }

    let bodies: Vec<&str> = def
        .inputs()
        .iter()
        .filter(|i| i.kind == InputKind::Statement)
        .map(|i| i.name.as_str())
        .collect();
    if !bodies.is_empty() {
        lines.push(format!("Put the blocks to run inside: {}.", bodies.join(", ")));
    }

    if let Some(ctx) = context {
        if let Some(board) = ctx.board {
            let info = board.info();
            if !def.supports_board(board) {
                lines.push(format!(
                    "Warning: {block_type} is not available on {}; supported boards: {}.",
                    info.name,
                    def.boards().label()
                ));
            } else if is_hardware(def.category()) {
                lines.push(format!("{}: {}", info.name, info.notes));
            }
        }

        if let Some(workspace) = &ctx.workspace {
            let has_setup_loop = workspace.contains(SETUP_LOOP_BLOCK);
            if block_type == SETUP_LOOP_BLOCK {
                if has_setup_loop {
                    lines.push(format!(
                        "The workspace already has {SETUP_LOOP_BLOCK}; a sketch needs exactly one."
                    ));
                }
            } else if def.shape() != BlockShape::TopLevel && !has_setup_loop {
                lines.push(format!(
                    "The workspace has no {SETUP_LOOP_BLOCK} yet; add it first, then place this block under SETUP or LOOP."
                ));
            }
        }
    }

    lines.join("\n")
}

fn is_hardware(category: Category) -> bool {
    matches!(
        category,
        Category::Arduino | Category::Sensors | Category::Motors | Category::Network | Category::Vision
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockdex_types::{BoardId, WorkspaceSummary};

    fn dict() -> BlockDictionary {
        BlockDictionary::builtin().unwrap()
    }

    fn workspace_with(types: &[&str]) -> WorkspaceSummary {
        let mut ws = WorkspaceSummary::default();
        for t in types {
            *ws.block_counts.entry(t.to_string()).or_default() += 1;
            ws.total_blocks += 1;
        }
        ws
    }

    #[test]
    fn test_unavailable_when_missing() {
        let usage = format_block_usage(None, LocaleCode::En, None);
        assert!(!usage.is_available());
        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert!(json["reason"].is_string());
    }

    #[test]
    fn test_available_usage() {
        let dict = dict();
        let def = dict.get_block_by_type("servo_move").unwrap();
        let UsageDescription::Available(usage) = format_block_usage(Some(def), LocaleCode::ZhHant, None)
        else {
            panic!("expected available");
        };
        assert_eq!(usage.name, "伺服馬達轉動角度");
        assert_eq!(usage.shape, "statement");
        assert_eq!(usage.fields[0].name, "PIN");
        assert_eq!(usage.inputs[0].name, "ANGLE");
        assert!(!usage.inputs[0].required);
        assert!(usage.board_note.is_none());

        let json = serde_json::to_value(UsageDescription::Available(usage)).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["type"], "servo_move");
        assert_eq!(json["category"], "motors");
    }

    #[test]
    fn test_board_note_for_incompatible_board() {
        let dict = dict();
        let def = dict.get_block_by_type("wifi_connect").unwrap();
        let ctx = BlockContext::for_board(BoardId::Uno);
        let UsageDescription::Available(usage) = format_block_usage(Some(def), LocaleCode::En, Some(&ctx))
        else {
            panic!("expected available");
        };
        let note = usage.board_note.unwrap();
        assert!(note.contains("Arduino Uno"));
        assert!(note.contains("esp32, supermini"));
    }

    #[test]
    fn test_category_blocks() {
        let dict = dict();
        let blocks = format_category_blocks(&dict, "Network", LocaleCode::En).unwrap();
        assert_eq!(blocks[0].block_type, "wifi_connect");
        assert_eq!(blocks[0].name, "WiFi Connect");
        assert!(blocks.iter().all(|b| !b.boards.supports(BoardId::Uno)));

        assert_eq!(
            format_category_blocks(&dict, "robots", LocaleCode::En).unwrap_err(),
            EngineError::category_not_found("robots")
        );
    }

    #[test]
    fn test_template_shape() {
        let dict = dict();
        let def = dict.get_block_by_type("math_arithmetic").unwrap();
        let template = generate_block_json_template(def);
        assert_eq!(
            template,
            json!({
                "type": "math_arithmetic",
                "fields": { "OP": "ADD" },
                "inputs": {
                    "A": { "shadow": { "type": "math_number", "fields": { "NUM": 0 } } },
                    "B": { "shadow": { "type": "math_number", "fields": { "NUM": 0 } } }
                }
            })
        );
    }

    #[test]
    fn test_template_omits_block_and_statement_inputs() {
        let dict = dict();
        let template = generate_block_json_template(dict.get_block_by_type("controls_if").unwrap());
        assert_eq!(template, json!({ "type": "controls_if" }));

        let template = generate_block_json_template(dict.get_block_by_type("arduino_millis").unwrap());
        assert_eq!(template, json!({ "type": "arduino_millis" }));
    }

    #[test]
    fn test_template_is_deterministic() {
        let dict = dict();
        for def in dict.iter() {
            let a = serde_json::to_string(&generate_block_json_template(def)).unwrap();
            let b = serde_json::to_string(&generate_block_json_template(def)).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_guide_mentions_shape_and_required_inputs() {
        let dict = dict();
        let guide = generate_insertion_guide(dict.get_block_by_type("logic_compare").unwrap(), None);
        assert!(guide.contains("produces a boolean value"));
        assert!(guide.contains("Required inputs: A, B."));

        let guide = generate_insertion_guide(dict.get_block_by_type("arduino_setup_loop").unwrap(), None);
        assert!(guide.contains("directly on the workspace"));
        assert!(guide.contains("SETUP, LOOP"));
    }

    #[test]
    fn test_guide_uses_board_and_workspace() {
        let dict = dict();
        let touch = dict.get_block_by_type("sensor_touch").unwrap();

        let ctx = BlockContext::for_board(BoardId::SuperMini);
        let guide = generate_insertion_guide(touch, Some(&ctx));
        assert!(guide.contains("Warning: sensor_touch is not available on ESP32-C3 SuperMini"));

        let ctx = BlockContext::for_board(BoardId::Esp32).with_workspace(workspace_with(&["controls_if"]));
        let guide = generate_insertion_guide(touch, Some(&ctx));
        assert!(guide.contains("ADC2 pins"));
        assert!(guide.contains("has no arduino_setup_loop yet"));

        let ctx = BlockContext::default().with_workspace(workspace_with(&[SETUP_LOOP_BLOCK]));
        let guide = generate_insertion_guide(dict.get_block_by_type(SETUP_LOOP_BLOCK).unwrap(), Some(&ctx));
        assert!(guide.contains("needs exactly one"));
        let guide = generate_insertion_guide(touch, Some(&ctx));
        assert!(!guide.contains("has no arduino_setup_loop"));
    }
}
