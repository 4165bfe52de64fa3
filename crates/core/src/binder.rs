//! Positional argument binding.
//!
//! The oracle names a tool and hands over an ordered list of raw strings
//! (`FUNCTION_CALL: add|5|3`). [`ArgumentBinder`] walks the tool's resolved
//! schema depth-first, in declared field order, consuming parameters from the
//! left:
//!
//! - objects consume nothing themselves; their fields do
//! - scalars consume exactly one parameter and coerce it
//! - arrays either unpack a single packed value (`"[1,2,3]"`, `"1,2,3"`) when
//!   it is the only parameter left, or greedily absorb every remaining one
//!
//! Running out of parameters for a scalar is an error. Parameters left over
//! once every field is bound are dropped.

use crate::error::BindError;
use crate::schema::{ScalarKind, SchemaNode, ToolSchema};
use serde_json::{Map, Number, Value};

/// Structured arguments produced from one set of raw parameters.
///
/// Always mirrors the shape of the schema it was bound against.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArguments(Value);

impl BoundArguments {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Binds raw positional parameters against a [`ToolSchema`].
pub struct ArgumentBinder<'a> {
    schema: &'a ToolSchema,
}

impl<'a> ArgumentBinder<'a> {
    pub fn new(schema: &'a ToolSchema) -> Self {
        Self { schema }
    }

    /// Bind `raw_params` into a structured payload.
    pub fn bind(&self, raw_params: &[String]) -> Result<BoundArguments, BindError> {
        let mut cursor = Cursor {
            params: raw_params,
            pos: 0,
        };
        let value = self.bind_node(self.schema.root(), "arguments", &mut cursor)?;

        let leftover = cursor.remaining().len();
        if leftover > 0 {
            tracing::debug!(leftover, "Discarding surplus tool parameters");
        }

        Ok(BoundArguments(value))
    }

    fn bind_node(
        &self,
        node: &SchemaNode,
        field: &str,
        cursor: &mut Cursor<'_>,
    ) -> Result<Value, BindError> {
        match self.schema.resolve(node)? {
            SchemaNode::Object(fields) => {
                let mut map = Map::new();
                for (name, child) in fields {
                    let value = self.bind_node(child, name, cursor)?;
                    map.insert(name.clone(), value);
                }
                Ok(Value::Object(map))
            }
            SchemaNode::Array(element) => {
                let kind = self.schema.element_kind(element, field)?;
                self.bind_array(kind, field, cursor)
            }
            leaf => {
                // resolve() never returns a Reference, so every other node is a scalar.
                let kind = leaf.scalar_kind().unwrap_or(ScalarKind::String);
                let raw = cursor.next().ok_or_else(|| BindError::MissingArgument {
                    field: field.to_string(),
                    expected: kind,
                })?;
                coerce(raw, kind, field)
            }
        }
    }

    fn bind_array(
        &self,
        kind: ScalarKind,
        field: &str,
        cursor: &mut Cursor<'_>,
    ) -> Result<Value, BindError> {
        let remaining = cursor.remaining();

        if let [packed] = remaining
            && (packed.contains(',') || packed.starts_with('['))
        {
            let inner = unbracket(packed);
            let items = inner
                .split(',')
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(|piece| coerce(piece, kind, field))
                .collect::<Result<Vec<_>, _>>()?;
            cursor.consume_all();
            return Ok(Value::Array(items));
        }

        let items = remaining
            .iter()
            .map(|raw| coerce(raw, kind, field))
            .collect::<Result<Vec<_>, _>>()?;
        cursor.consume_all();
        Ok(Value::Array(items))
    }
}

struct Cursor<'p> {
    params: &'p [String],
    pos: usize,
}

impl<'p> Cursor<'p> {
    fn next(&mut self) -> Option<&'p str> {
        let param = self.params.get(self.pos)?;
        self.pos += 1;
        Some(param.as_str())
    }

    fn remaining(&self) -> &'p [String] {
        &self.params[self.pos.min(self.params.len())..]
    }

    fn consume_all(&mut self) {
        self.pos = self.params.len();
    }
}

/// Strip one surrounding `[` `]` pair, if both are present.
fn unbracket(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed)
}

fn coerce(raw: &str, kind: ScalarKind, field: &str) -> Result<Value, BindError> {
    let mismatch = || BindError::TypeCoercion {
        field: field.to_string(),
        expected: kind,
        value: raw.to_string(),
    };

    match kind {
        ScalarKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| mismatch()),
        ScalarKind::Number => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(mismatch),
        ScalarKind::String => Ok(Value::String(raw.to_string())),
    }
}
