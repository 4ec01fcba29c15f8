//! Numeric inputs with units
//!
//! `network_speed` accepts plain Mbps integers or a number with an M, G or
//! T suffix. The `unit_input` family pairs a number control with a unit
//! select and exports the value converted to the base unit.

use super::{Input, InputBehavior, InputCx, base, loosely_equal, rc, value_text};
use crate::EditResult;
use serde_json::Value;
use std::rc::Rc;
use tc_core::{ClsError, Registry};
use tc_dom::{DomTree, El, NodeId};

/// Unit select of a unit input
#[derive(Debug, Clone)]
pub struct UnitState {
    pub(crate) select: NodeId,
    pub(crate) original_unit: String,
}

/// Leading integer of a string, the way `parseInt` reads it
fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && matches!(c, '-' | '+'))))
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

fn is_numeric(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.parse::<f64>().is_ok_and(f64::is_finite)
}

fn number(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

/// Mbps integer as `10M`, `1.5G` or `2T`
pub fn pretty_speed(value: &Value) -> String {
    let Some(v) = parse_int(&value_text(value)) else {
        return String::new();
    };
    let v = v as f64;
    if v >= 1_000_000.0 {
        format!("{}T", v / 1_000_000.0)
    } else if v >= 1000.0 {
        format!("{}G", v / 1000.0)
    } else {
        format!("{}M", v)
    }
}

/// `10G` -> 10000, `1.5t` -> 1500000 (Mbps)
fn reverse_pretty_speed(value: &str) -> Option<i64> {
    let mut chars = value.trim().chars();
    let factor = match chars.next_back()?.to_ascii_lowercase() {
        'm' => 1.0,
        'g' => 1000.0,
        't' => 1_000_000.0,
        _ => return None,
    };
    let num: f64 = chars.as_str().trim().parse().ok()?;
    Some((num * factor).round() as i64)
}

struct NetworkSpeed {
    base: Rc<dyn InputBehavior>,
}

impl NetworkSpeed {
    fn convert(raw: &str) -> Value {
        if is_numeric(raw) {
            return raw.trim().parse::<f64>().map_or(Value::Null, number);
        }
        reverse_pretty_speed(raw).map_or(Value::Null, Value::from)
    }
}

impl InputBehavior for NetworkSpeed {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn apply(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: &Value) -> EditResult<()> {
        let speed = match value {
            Value::Number(_) => value.clone(),
            _ => Self::convert(&value_text(&inp.get(cx.dom))),
        };
        cx.dom.set_text(inp.source, &pretty_speed(&speed))?;
        cx.dom.set_attr(inp.source, "data-edit-value", &value_text(&speed))?;
        Ok(())
    }

    fn export(&self, dom: &DomTree, inp: &Input) -> Value {
        Self::convert(&value_text(&inp.get(dom)))
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        let value = cx.dom.value(inp.element).trim();
        if value.is_empty() && cx.dom.attr(inp.source, "data-edit-required") != Some("yes") {
            return Ok(true);
        }
        Ok(is_numeric(value) || reverse_pretty_speed(value).is_some())
    }

    fn validation_message(&self) -> &'static str {
        "Needs to be an integer or a speed ending in M, G, or T"
    }
}

/// Unit family description
struct Units {
    name: &'static str,
    units: &'static [&'static str],
    selected: &'static str,
    /// Value in the base unit
    convert: fn(&str, &str) -> Value,
    /// Pick the unit from the magnitude when set without one
    auto_unit: bool,
}

static UNIT: Units = Units {
    name: "unit",
    units: &["unit"],
    selected: "unit",
    convert: |value, _| Value::String(value.to_string()),
    auto_unit: false,
};

static TRAFFIC_CAPACITY: Units = Units {
    name: "traffic_capacity",
    units: &["Mbps", "Gbps", "Tbps"],
    selected: "Gbps",
    convert: |value, unit| {
        let Ok(v) = value.trim().parse::<f64>() else {
            return Value::Null;
        };
        let factor = match unit {
            "Mbps" => 1.0,
            "Gbps" => 1000.0,
            "Tbps" => 1_000_000.0,
            _ => return Value::Null,
        };
        Value::from((v * factor).trunc() as i64)
    },
    auto_unit: true,
};

static SPATIAL_DISTANCE: Units = Units {
    name: "spatial_distance",
    units: &["km", "miles"],
    selected: "km",
    convert: |value, unit| {
        let Ok(v) = value.trim().parse::<f64>() else {
            return Value::Null;
        };
        let km = if unit == "km" { v } else { v / 0.621371 };
        Value::from(km.trunc() as i64)
    },
    auto_unit: false,
};

struct UnitInput {
    base: Rc<dyn InputBehavior>,
    units: &'static Units,
}

impl UnitInput {
    fn select(inp: &Input) -> Option<NodeId> {
        inp.unit.as_ref().map(|u| u.select)
    }

    fn unit(dom: &DomTree, inp: &Input) -> String {
        Self::select(inp)
            .map(|s| dom.value(s).to_string())
            .unwrap_or_default()
    }

    fn pick_unit(dom: &mut DomTree, inp: &Input, unit: &str) -> EditResult<()> {
        if let Some(select) = Self::select(inp) {
            dom.set_value(select, unit)?;
        }
        Ok(())
    }

    fn set_value(&self, dom: &mut DomTree, inp: &Input, value: &str) -> EditResult<()> {
        if !self.units.auto_unit {
            dom.set_value(inp.element, value)?;
            return Ok(());
        }
        let mut shown = value.to_string();
        if let Ok(v) = value.trim().parse::<f64>() {
            if v >= 1_000_000.0 {
                shown = (v / 1_000_000.0).to_string();
                Self::pick_unit(dom, inp, "Tbps")?;
            } else if v >= 1000.0 {
                shown = (v / 1000.0).to_string();
                Self::pick_unit(dom, inp, "Gbps")?;
            } else if v != 0.0 {
                Self::pick_unit(dom, inp, "Mbps")?;
            }
        }
        dom.set_value(inp.element, &shown)?;
        Ok(())
    }
}

/// Split `10 Gbps` into value and unit
fn split_unit(value: &str) -> Option<(&str, &str)> {
    let prefix = value.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == ' ');
    let suffix = &value[prefix.len()..];
    let unit = suffix.strip_prefix(' ').unwrap_or(suffix);
    if unit.trim().is_empty() {
        return None;
    }
    Some((prefix, unit))
}

impl InputBehavior for UnitInput {
    fn parent(&self) -> Option<&dyn InputBehavior> {
        Some(&*self.base)
    }

    fn make(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<NodeId> {
        let input = cx.dom.build(El::new("input").attr("type", "text").class("unit"));
        let mut select = El::new("select").attr("name", self.units.name).attr("id", self.units.name);
        for unit in self.units.units {
            select = select.child(El::new("option").value(unit).text(unit).selected(*unit == self.units.selected));
        }
        let select = cx.dom.build(select);
        inp.unit = Some(UnitState {
            select,
            original_unit: self.units.selected.to_string(),
        });
        Ok(input)
    }

    fn set(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: Option<&str>) -> EditResult<()> {
        let value = match value {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => cx.dom.text_content(inp.source).trim().to_string(),
        };
        match split_unit(&value) {
            Some((number, unit)) => {
                cx.dom.set_value(inp.element, number)?;
                Self::pick_unit(cx.dom, inp, unit)?;
            }
            None => self.set_value(cx.dom, inp, &value)?,
        }
        let unit = Self::unit(cx.dom, inp);
        if let Some(state) = inp.unit.as_mut() {
            state.original_unit = unit;
            if cx.dom.parent(inp.element).is_some() {
                cx.dom.insert_after(inp.element, state.select)?;
            }
        }
        Ok(())
    }

    fn changed(&self, dom: &DomTree, inp: &Input) -> bool {
        let unit_changed = inp.unit.as_ref().is_some_and(|u| Self::unit(dom, inp) != u.original_unit);
        unit_changed || !loosely_equal(&inp.original_value, &inp.get(dom))
    }

    fn export(&self, dom: &DomTree, inp: &Input) -> Value {
        let value = value_text(&inp.get(dom));
        if value.is_empty() {
            return Value::Null;
        }
        (self.units.convert)(&value, &Self::unit(dom, inp))
    }

    fn validate(&self, cx: &mut InputCx<'_>, inp: &mut Input) -> EditResult<bool> {
        let value = cx.dom.value(inp.element);
        Ok(value.is_empty() || is_numeric(value))
    }

    fn formatted(&self, dom: &DomTree, inp: &Input) -> String {
        format!("{}{}", value_text(&inp.get(dom)), Self::unit(dom, inp))
    }

    fn apply(&self, cx: &mut InputCx<'_>, inp: &mut Input, value: &Value) -> EditResult<()> {
        let text = value_text(value);
        cx.dom.set_text(inp.source, &text)?;
        cx.dom.set_attr(inp.source, "data-edit-value", &text)?;
        Ok(())
    }

    fn reset(&self, cx: &mut InputCx<'_>, inp: &mut Input, reset_value: bool) -> EditResult<()> {
        base::reset(cx, inp, reset_value)?;
        Self::pick_unit(cx.dom, inp, self.units.selected)
    }
}

pub(super) fn register(reg: &mut Registry<dyn InputBehavior>) -> Result<(), ClsError> {
    reg.extend("network_speed", "string", |base| rc(NetworkSpeed { base }))?;
    reg.extend("unit_input", "string", |base| rc(UnitInput { base, units: &UNIT }))?;
    reg.extend("traffic_capacity", "unit_input", |base| {
        rc(UnitInput {
            base,
            units: &TRAFFIC_CAPACITY,
        })
    })?;
    reg.extend("spatial_distance", "unit_input", |base| {
        rc(UnitInput {
            base,
            units: &SPATIAL_DISTANCE,
        })
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pretty_speed() {
        assert_eq!(pretty_speed(&json!(100)), "100M");
        assert_eq!(pretty_speed(&json!(10000)), "10G");
        assert_eq!(pretty_speed(&json!(1500)), "1.5G");
        assert_eq!(pretty_speed(&json!("2000000")), "2T");
        assert_eq!(pretty_speed(&json!(null)), "");
    }

    #[test]
    fn test_reverse_pretty_speed() {
        assert_eq!(reverse_pretty_speed("10G"), Some(10000));
        assert_eq!(reverse_pretty_speed("1.5t"), Some(1_500_000));
        assert_eq!(reverse_pretty_speed("100m"), Some(100));
        assert_eq!(reverse_pretty_speed("10X"), None);
        assert_eq!(reverse_pretty_speed(""), None);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42abc"), Some(42));
        assert_eq!(parse_int(" -7"), Some(-7));
        assert_eq!(parse_int("abc"), None);
    }

    #[test]
    fn test_split_unit() {
        assert_eq!(split_unit("10 Gbps"), Some(("10", "Gbps")));
        assert_eq!(split_unit("25km"), Some(("25", "km")));
        assert_eq!(split_unit("10"), None);
    }

    #[test]
    fn test_convert() {
        assert_eq!((TRAFFIC_CAPACITY.convert)("10", "Gbps"), json!(10000));
        assert_eq!((TRAFFIC_CAPACITY.convert)("10.5", "Mbps"), json!(10));
        assert_eq!((SPATIAL_DISTANCE.convert)("10", "miles"), json!(16));
        assert_eq!((SPATIAL_DISTANCE.convert)("10", "km"), json!(10));
    }
}
