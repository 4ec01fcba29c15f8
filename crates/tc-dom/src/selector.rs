//! Element Selectors
//!
//! A small subset of CSS selectors: comma separated compound selectors made
//! of a tag (or `*`), `#id`, `.class`, `[attr]` and `[attr="value"]`.
//! Combinators are not supported; tree relationships are expressed through
//! `DomTree` traversal instead.

use crate::{DomError, DomResult, ElementData};

/// Parsed selector group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, elem: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if !elem.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.attrs.get("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| elem.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match value {
            None => elem.attrs.has(name),
            Some(v) => elem.attrs.get(name) == Some(v.as_str()),
        })
    }
}

impl Selector {
    /// Parse a selector string
    pub fn parse(s: &str) -> DomResult<Self> {
        let mut alternatives = Vec::new();
        for part in split_top_level(s) {
            let part = part.trim();
            if part.is_empty() {
                return Err(DomError::InvalidSelector(s.to_string()));
            }
            alternatives.push(parse_compound(part).ok_or_else(|| DomError::InvalidSelector(s.to_string()))?);
        }
        if alternatives.is_empty() {
            return Err(DomError::InvalidSelector(s.to_string()));
        }
        Ok(Self { alternatives })
    }

    /// Selector matching elements that carry `name`
    pub fn has_attr(name: &str) -> Self {
        Self {
            alternatives: vec![Compound {
                attrs: vec![(name.to_string(), None)],
                ..Default::default()
            }],
        }
    }

    /// Selector matching elements whose attribute `name` equals `value`
    pub fn attr_eq(name: &str, value: &str) -> Self {
        Self {
            alternatives: vec![Compound {
                attrs: vec![(name.to_string(), Some(value.to_string()))],
                ..Default::default()
            }],
        }
    }

    /// Check if element data matches
    pub fn matches(&self, elem: &ElementData) -> bool {
        self.alternatives.iter().any(|c| c.matches(elem))
    }
}

/// Split on commas that are not inside `[...]`
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' | '\'' if quote == Some(c) => quote = None,
            '"' | '\'' if quote.is_none() => quote = Some(c),
            '[' if quote.is_none() => depth += 1,
            ']' if quote.is_none() => depth = depth.saturating_sub(1),
            ',' if quote.is_none() && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_compound(s: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;

    let ident = |chars: &[char], mut i: usize| -> (String, usize) {
        let mut out = String::new();
        while i < chars.len() && (chars[i].is_alphanumeric() || matches!(chars[i], '-' | '_')) {
            out.push(chars[i]);
            i += 1;
        }
        (out, i)
    };

    if i < chars.len() && chars[i] == '*' {
        i += 1;
    } else if i < chars.len() && chars[i].is_alphabetic() {
        let (tag, next) = ident(&chars, i);
        compound.tag = Some(tag.to_ascii_lowercase());
        i = next;
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                let (id, next) = ident(&chars, i + 1);
                if id.is_empty() {
                    return None;
                }
                compound.id = Some(id);
                i = next;
            }
            '.' => {
                let (class, next) = ident(&chars, i + 1);
                if class.is_empty() {
                    return None;
                }
                compound.classes.push(class);
                i = next;
            }
            '[' => {
                let close = chars[i..].iter().position(|&c| c == ']')? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                let (name, value) = match inner.split_once('=') {
                    Some((n, v)) => {
                        let v = v.trim().trim_matches(|c| c == '"' || c == '\'');
                        (n.trim().to_string(), Some(v.to_string()))
                    }
                    None => (inner.trim().to_string(), None),
                };
                if name.is_empty() {
                    return None;
                }
                compound.attrs.push((name, value));
                i = close + 1;
            }
            _ => return None,
        }
    }
    Some(compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(tag: &str, attrs: &[(&str, &str)], classes: &[&str]) -> ElementData {
        let mut e = ElementData::new(tag);
        for (k, v) in attrs {
            e.attrs.set(k, v);
        }
        for c in classes {
            e.add_class(c);
        }
        e
    }

    #[test]
    fn test_parse_compound() {
        let sel = Selector::parse("div.editable.popin[data-edit-name=\"asn\"]").unwrap();
        assert!(sel.matches(&elem("div", &[("data-edit-name", "asn")], &["editable", "popin"])));
        assert!(!sel.matches(&elem("div", &[("data-edit-name", "asn")], &["editable"])));
        assert!(!sel.matches(&elem("span", &[("data-edit-name", "asn")], &["editable", "popin"])));
    }

    #[test]
    fn test_group_and_id() {
        let sel = Selector::parse("[data-edit-target], [data-edit-component]").unwrap();
        assert!(sel.matches(&elem("div", &[("data-edit-component", "list")], &[])));
        assert!(!sel.matches(&elem("div", &[], &[])));

        let id = Selector::parse("#net-form").unwrap();
        assert!(id.matches(&elem("form", &[("id", "net-form")], &[])));
    }

    #[test]
    fn test_invalid() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div > span").is_err());
        assert!(Selector::parse("a,,b").is_err());
    }
}
