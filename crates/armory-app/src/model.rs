// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::RowId;

pub const DEFAULT_DATA_FIELD: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(*value),
            Value::Number(number) => match number.as_i64() {
                Some(value) => Self::Integer(value),
                None => number.as_f64().map_or(Self::Null, Self::Decimal),
            },
            Value::String(value) => Self::Text(value.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Decimal(value) => format!("{value}"),
            Self::Bool(true) => "yes".to_owned(),
            Self::Bool(false) => "no".to_owned(),
            Self::Null => String::new(),
        }
    }

    /// Integer view of the cell. Text cells holding a plain number count too,
    /// since the listings are not consistent about quoting numbers.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(left), Self::Integer(right)) => left.cmp(right),
            (Self::Decimal(left), Self::Decimal(right)) => left.total_cmp(right),
            (Self::Integer(left), Self::Decimal(right)) => (*left as f64).total_cmp(right),
            (Self::Decimal(left), Self::Integer(right)) => left.total_cmp(&(*right as f64)),
            (Self::Bool(left), Self::Bool(right)) => left.cmp(right),
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Null, _) => Ordering::Less,
            (_, Self::Null) => Ordering::Greater,
            _ => self
                .display()
                .to_ascii_lowercase()
                .cmp(&other.display().to_ascii_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    pub cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.get(key)
    }

    pub fn display(&self, key: &str) -> String {
        self.get(key).map(CellValue::display).unwrap_or_default()
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(CellValue::as_integer)
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.cells
            .values()
            .any(|cell| cell.display().to_lowercase().contains(&query))
    }
}

/// Result of loading a listing. A load the server answered by redirecting
/// elsewhere (typically back to the login page) carries the final path.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    Rows(Vec<Row>),
    Redirect(String),
}

/// Decodes a listing body into rows. The body is either a bare array or an
/// object whose `data_field` holds the array.
pub fn rows_from_json(body: &Value, data_field: &str, identity_field: &str) -> Result<Vec<Row>> {
    let elements = match body {
        Value::Array(elements) => elements,
        Value::Object(map) => map
            .get(data_field)
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("listing object has no {data_field:?} array"))?,
        other => bail!("listing body must be an array, got {}", json_kind(other)),
    };

    let mut seen = BTreeSet::new();
    let mut rows = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let object = element
            .as_object()
            .with_context(|| format!("listing row {index} is {}", json_kind(element)))?;

        let id = match object.get(identity_field) {
            Some(Value::String(value)) if !value.is_empty() => RowId::new(value.clone()),
            Some(Value::Number(value)) => RowId::new(value.to_string()),
            _ => RowId::positional(index),
        };
        if !seen.insert(id.clone()) {
            bail!("duplicate {identity_field} {id} in listing");
        }

        let cells = object
            .iter()
            .map(|(key, value)| (key.clone(), CellValue::from_json(value)))
            .collect();
        rows.push(Row { id, cells });
    }
    Ok(rows)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Extracts the total from an inventory count display such as `"3 / 10"`.
pub fn parse_count_total(display: &str) -> Result<i64> {
    let (_, total) = display
        .split_once(" / ")
        .ok_or_else(|| anyhow!("count {display:?} is not in `current / total` form"))?;
    total
        .trim()
        .parse()
        .with_context(|| format!("count total {total:?} is not a whole number"))
}
