//! `unit_conversion` tool — length and weight.
//!
//! Each unit has a factor relative to its dimension's base unit (米, 千克);
//! a conversion goes through the base unit, so any pair within one dimension
//! works.

use addy_domain::{Entities, ExecutionResult, Intent, Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde_json::json;

use super::calculator::format_number;

/// Canonical tool name.
pub const UNIT_CONVERSION: &str = "unit_conversion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Weight,
}

/// (unit, dimension, factor to base unit)
const UNITS: &[(&str, Dimension, f64)] = &[
    ("毫米", Dimension::Length, 0.001),
    ("厘米", Dimension::Length, 0.01),
    ("分米", Dimension::Length, 0.1),
    ("米", Dimension::Length, 1.0),
    ("千米", Dimension::Length, 1000.0),
    ("英寸", Dimension::Length, 0.0254),
    ("英尺", Dimension::Length, 0.3048),
    ("码", Dimension::Length, 0.9144),
    ("英里", Dimension::Length, 1609.344),
    ("毫克", Dimension::Weight, 0.000_001),
    ("克", Dimension::Weight, 0.001),
    ("千克", Dimension::Weight, 1.0),
    ("吨", Dimension::Weight, 1000.0),
    ("斤", Dimension::Weight, 0.5),
    ("磅", Dimension::Weight, 0.453_592),
    ("盎司", Dimension::Weight, 0.028_349_5),
];

const ALIASES: &[(&str, &str)] = &[
    ("公里", "千米"),
    ("公斤", "千克"),
    ("mm", "毫米"),
    ("cm", "厘米"),
    ("m", "米"),
    ("km", "千米"),
    ("inch", "英寸"),
    ("ft", "英尺"),
    ("mile", "英里"),
    ("mg", "毫克"),
    ("g", "克"),
    ("kg", "千克"),
    ("lb", "磅"),
    ("oz", "盎司"),
];

/// Canonical unit name for a spoken or abbreviated one.
pub fn canonical_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == unit)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(unit)
}

fn lookup(unit: &str) -> Option<(Dimension, f64)> {
    UNITS
        .iter()
        .find(|(name, _, _)| *name == unit)
        .map(|(_, dim, factor)| (*dim, *factor))
}

/// Convert `value` between two units of the same dimension.
pub fn convert(value: f64, from: &str, to: &str) -> Option<f64> {
    let (from_dim, from_factor) = lookup(&canonical_unit(from))?;
    let (to_dim, to_factor) = lookup(&canonical_unit(to))?;
    (from_dim == to_dim).then(|| value * from_factor / to_factor)
}

pub struct UnitConversionTool {
    descriptor: ToolDescriptor,
}

impl UnitConversionTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(UNIT_CONVERSION, "单位换算: 长度、重量")
                .with_intent(Intent::ConvertUnit),
        }
    }
}

impl Default for UnitConversionTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for UnitConversionTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        if intent != Intent::ConvertUnit {
            return Ok(ExecutionResult::rejected(format!("不支持的操作: {}", intent)));
        }
        let missing = entities.missing(&["value", "from_unit", "to_unit"]);
        if !missing.is_empty() {
            return Ok(ExecutionResult::missing_parameters(&missing));
        }
        let Some(value) = entities.number("value") else {
            return Ok(ExecutionResult::rejected("输入的值无效，请输入数字。"));
        };
        let from = canonical_unit(&entities.text("from_unit").unwrap_or_default());
        let to = canonical_unit(&entities.text("to_unit").unwrap_or_default());

        Ok(match convert(value, &from, &to) {
            Some(result) => ExecutionResult::success(format!(
                "{} {} 等于 {:.2} {}",
                format_number(value),
                from,
                result,
                to
            ))
            .with_data(json!({ "value": value, "from": from, "to": to, "result": result })),
            None => ExecutionResult::rejected(format!(
                "抱歉，不支持从 {} 到 {} 的转换。",
                from, to
            )),
        })
    }
}
