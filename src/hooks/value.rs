//! Values passed through hook dispatch.

use std::rc::Rc;

use crate::domain::ContentItem;
use crate::loops::LoopSnapshot;

/// A positional hook argument, or a filter's running value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HookValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    Item(Rc<ContentItem>),
    Loop(LoopSnapshot),
}

impl HookValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Json(v) => v.as_bool(),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&Rc<ContentItem>> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_loop(&self) -> Option<&LoopSnapshot> {
        match self {
            Self::Loop(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

impl From<bool> for HookValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for HookValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for HookValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for HookValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for HookValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<serde_json::Value> for HookValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Rc<ContentItem>> for HookValue {
    fn from(v: Rc<ContentItem>) -> Self {
        Self::Item(v)
    }
}

impl From<LoopSnapshot> for HookValue {
    fn from(v: LoopSnapshot) -> Self {
        Self::Loop(v)
    }
}
