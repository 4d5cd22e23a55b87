//! Parsed conditional rules: the conditions pulled out of `@media` preludes
//! and the append-only store of rule bodies they point into.

use crate::query::MediaQueryList;
use std::fmt;

/// Unit a width bound was authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Em,
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthUnit::Px => f.write_str("px"),
            LengthUnit::Em => f.write_str("em"),
        }
    }
}

/// A `min-width` / `max-width` value as written, e.g. `600px` or `40em`.
///
/// No unit conversion happens: the value is compared against the viewport
/// width in pixels as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthBound {
    pub value: f64,
    pub unit: LengthUnit,
}

impl WidthBound {
    pub fn px(value: f64) -> Self {
        WidthBound {
            value,
            unit: LengthUnit::Px,
        }
    }

    pub fn em(value: f64) -> Self {
        WidthBound {
            value,
            unit: LengthUnit::Em,
        }
    }
}

impl fmt::Display for WidthBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

/// One comma-separated entry of a media query list.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCondition {
    /// Lower-cased device class, `"all"` when none is given.
    pub media_type: String,
    /// True when a `min-width` or `max-width` bound was recognized.
    pub has_constraint: bool,
    pub min_width: Option<WidthBound>,
    pub max_width: Option<WidthBound>,
}

impl MediaCondition {
    /// The condition that always holds.
    pub fn all() -> Self {
        MediaCondition {
            media_type: "all".to_string(),
            has_constraint: false,
            min_width: None,
            max_width: None,
        }
    }

    /// Whether the condition holds at `width`. Both bounds are inclusive.
    pub fn is_active(&self, width: f64) -> bool {
        if !self.has_constraint {
            return true;
        }
        let above_min = self.min_width.map_or(true, |min| width >= min.value);
        let below_max = self.max_width.map_or(true, |max| width <= max.value);
        above_min && below_max
    }
}

/// Body of a conditional block: CSS text, or a live query standing in for one.
#[derive(Debug, Clone)]
pub enum RuleBody {
    Css(String),
    Query(MediaQueryList),
}

impl RuleBody {
    pub fn as_css(&self) -> Option<&str> {
        match self {
            RuleBody::Css(css) => Some(css),
            RuleBody::Query(_) => None,
        }
    }

    pub fn as_query(&self) -> Option<&MediaQueryList> {
        match self {
            RuleBody::Query(query) => Some(query),
            RuleBody::Css(_) => None,
        }
    }
}

/// A condition bound to the rule body it guards.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDescriptor {
    pub condition: MediaCondition,
    /// Index into the [`RuleStore`]; always refers to an existing entry.
    pub rule_index: usize,
}

/// Append-only list of rule bodies, addressed by position.
#[derive(Debug, Default)]
pub struct RuleStore {
    bodies: Vec<RuleBody>,
    descriptors: Vec<RuleDescriptor>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a body and returns its index.
    pub fn push_body(&mut self, body: RuleBody) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Registers a condition against an already pushed body.
    ///
    /// Returns `None` when `rule_index` does not name a stored body.
    pub fn push_descriptor(
        &mut self,
        condition: MediaCondition,
        rule_index: usize,
    ) -> Option<&RuleDescriptor> {
        if rule_index >= self.bodies.len() {
            return None;
        }
        self.descriptors.push(RuleDescriptor {
            condition,
            rule_index,
        });
        self.descriptors.last()
    }

    pub fn body(&self, index: usize) -> Option<&RuleBody> {
        self.bodies.get(index)
    }

    pub fn descriptors(&self) -> &[RuleDescriptor] {
        &self.descriptors
    }

    /// Live queries in registration order.
    pub fn queries(&self) -> impl Iterator<Item = &MediaQueryList> {
        self.bodies.iter().filter_map(RuleBody::as_query)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
