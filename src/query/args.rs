//! Raw argument coercion.
//!
//! Templates hand queries a loose key/value bag. Both this runtime's key
//! names and the legacy template API's are accepted (`page_size` or
//! `posts_per_page`, `slug` or `name`, ...). Values may be strings or
//! native JSON types. Unknown keys are ignored; values that cannot be read
//! are an `InvalidCriteria` error.

use log::debug;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::domain::{
    AttributeFilter, AuthorFilter, CompareOp, OrderDirection, OrderField, PageSize, QueryCriteria, StatusFilter,
    TypeFilter,
};
use crate::error::{Error, Result};

impl QueryCriteria {
    /// Coerce a raw argument bag into criteria.
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        let mut criteria = QueryCriteria::new();
        let mut order_field = None;
        let mut order_direction = None;
        let mut meta_key = None;
        let mut meta_value = None;
        let mut meta_compare = None;
        let mut no_paging = false;

        for (key, value) in args {
            match key.as_str() {
                "type" | "post_type" => criteria = criteria.with_types(type_filter(value)),
                "status" | "post_status" => {
                    let status = text(key, value)?;
                    let status = StatusFilter::parse(&status).ok_or_else(|| invalid(key, &status))?;
                    criteria = criteria.with_status(status);
                }
                "author" => criteria = criteria.with_author(AuthorFilter::Id(unsigned(key, value)?)),
                "author_name" => criteria = criteria.with_author(AuthorFilter::Name(text(key, value)?)),
                "search" | "s" => criteria = criteria.with_search(text(key, value)?),
                "orderby" | "order_by" => {
                    let field = text(key, value)?;
                    order_field = Some(OrderField::parse(&field).ok_or_else(|| invalid(key, &field))?);
                }
                "order" => {
                    let dir = text(key, value)?;
                    order_direction = Some(OrderDirection::parse(&dir).ok_or_else(|| invalid(key, &dir))?);
                }
                "page_size" | "posts_per_page" | "per_page" => {
                    criteria = criteria.with_per_page(integer(key, value)?)?;
                }
                "nopaging" => no_paging = boolean(key, value)?,
                "page" | "paged" => {
                    let page = unsigned(key, value)?;
                    criteria = criteria.with_page(u32::try_from(page).map_err(|_| invalid(key, &page.to_string()))?);
                }
                "offset" => criteria = criteria.with_offset(unsigned(key, value)?),
                "id" | "p" | "page_id" => criteria = criteria.with_id(unsigned(key, value)?),
                "slug" | "name" | "pagename" => criteria = criteria.with_slug(text(key, value)?),
                "constraints" | "meta_query" => {
                    for constraint in constraints(key, value)? {
                        criteria = criteria.with_constraint(constraint);
                    }
                }
                "meta_key" => meta_key = Some(text(key, value)?),
                "meta_value" => meta_value = Some(value.clone()),
                "meta_compare" => {
                    let op = text(key, value)?;
                    meta_compare = Some(CompareOp::parse(&op).ok_or_else(|| invalid(key, &op))?);
                }
                other => debug!("Ignoring unknown query argument '{}'", other),
            }
        }

        // Overrides any page size key
        if no_paging {
            criteria = criteria.with_page_size(PageSize::Unbounded);
        }

        if order_field.is_some() || order_direction.is_some() {
            let defaults = crate::config::QueryConfig::default();
            criteria = criteria.with_ordering(
                order_field.unwrap_or(defaults.default_order_by),
                order_direction.unwrap_or(defaults.default_order),
            );
        }

        if let Some(key) = meta_key {
            let op = meta_compare.unwrap_or(match meta_value {
                Some(_) => CompareOp::Eq,
                None => CompareOp::Exists,
            });
            criteria = criteria.with_constraint(AttributeFilter::new(key, op, meta_value.unwrap_or(Value::Null)));
        }

        Ok(criteria)
    }

    /// Coerce a `key=value&key=value` query string into criteria.
    ///
    /// Repeated keys become arrays, so `type=a&type=b` selects both types.
    pub fn from_query_string(query: &str) -> Result<Self> {
        let mut args = Map::new();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = Value::String(value.into_owned());
            match args.get_mut(key.as_ref()) {
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    args.insert(key.into_owned(), value);
                }
            }
        }
        Self::from_args(&args)
    }
}

fn invalid(key: &str, value: &str) -> Error {
    Error::InvalidCriteria(format!("unsupported value '{}' for '{}'", value, key))
}

fn text(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(invalid(key, &other.to_string())),
    }
}

fn integer(key: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| invalid(key, &n.to_string())),
        Value::String(s) => s.trim().parse().map_err(|_| invalid(key, s)),
        other => Err(invalid(key, &other.to_string())),
    }
}

fn unsigned(key: &str, value: &Value) -> Result<u64> {
    let n = integer(key, value)?;
    u64::try_from(n).map_err(|_| invalid(key, &n.to_string()))
}

fn boolean(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(invalid(key, s)),
        },
        other => Err(invalid(key, &other.to_string())),
    }
}

fn type_filter(value: &Value) -> TypeFilter {
    match value {
        Value::Array(values) => TypeFilter::from_names(values.iter().filter_map(Value::as_str)),
        Value::String(s) => TypeFilter::from_names(s.split(',')),
        _ => TypeFilter::Any,
    }
}

fn constraints(key: &str, value: &Value) -> Result<Vec<AttributeFilter>> {
    let Value::Array(entries) = value else {
        return Err(invalid(key, &value.to_string()));
    };

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        // The legacy form allows a "relation" string alongside the clauses
        let Value::Object(clause) = entry else {
            continue;
        };
        let name = clause
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(key, &entry.to_string()))?;
        let op = match clause.get("compare").or_else(|| clause.get("op")) {
            Some(op) => {
                let op = text(key, op)?;
                CompareOp::parse(&op).ok_or_else(|| invalid(key, &op))?
            }
            None if clause.contains_key("value") => CompareOp::Eq,
            None => CompareOp::Exists,
        };
        let value = clause.get("value").cloned().unwrap_or(Value::Null);
        out.push(AttributeFilter::new(name, op, value));
    }
    Ok(out)
}
