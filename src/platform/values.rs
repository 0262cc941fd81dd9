//! Conversion of tokio-postgres rows into JSON values for query results.
//!
//! Columns whose type has a binary decoder here go through [`row_to_json`].
//! Statements returning any other type (interval, inet, bytea, money,
//! ranges, composites...) are run over the simple query protocol instead and
//! rendered from the server's text output with [`text_to_json`].

use postgres_types::{FromSql, Kind, Type};
use serde_json::{Map, Number, Value};
use std::error::Error;
use tokio_postgres::{Row, SimpleQueryRow};
use uuid::Uuid;

/// Convert every column of `row` into an ordered JSON object.
///
/// A value that fails to decode is an error, never `null`.
pub fn row_to_json(row: &Row) -> Result<Map<String, Value>, tokio_postgres::Error> {
    let mut map = Map::new();

    for (i, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), column_to_json(row, i)?);
    }

    Ok(map)
}

/// Whether [`row_to_json`] can decode values of this type
pub fn is_binary_decodable(ty: &Type) -> bool {
    match ty.kind() {
        Kind::Array(element) => is_scalar_decodable(element),
        _ => is_scalar_decodable(ty),
    }
}

fn is_scalar_decodable(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::BOOL
            | Type::INT2
            | Type::INT4
            | Type::INT8
            | Type::OID
            | Type::FLOAT4
            | Type::FLOAT8
            | Type::NUMERIC
            | Type::UUID
            | Type::JSON
            | Type::JSONB
            | Type::TIMESTAMPTZ
            | Type::TIMESTAMP
            | Type::DATE
            | Type::TIME
    ) || PgText::accepts(ty)
}

fn column_to_json(row: &Row, idx: usize) -> Result<Value, tokio_postgres::Error> {
    let ty = row.columns()[idx].type_();

    match ty.kind() {
        Kind::Array(element) => array_to_json(row, idx, element),
        _ => scalar_to_json(row, idx, ty),
    }
}

fn scalar_to_json(row: &Row, idx: usize, ty: &Type) -> Result<Value, tokio_postgres::Error> {
    Ok(match *ty {
        Type::BOOL => nullable(row.try_get::<_, Option<bool>>(idx)?, Value::from),
        Type::INT2 => nullable(row.try_get::<_, Option<i16>>(idx)?, Value::from),
        Type::INT4 => nullable(row.try_get::<_, Option<i32>>(idx)?, Value::from),
        Type::INT8 => nullable(row.try_get::<_, Option<i64>>(idx)?, Value::from),
        Type::OID => nullable(row.try_get::<_, Option<u32>>(idx)?, Value::from),
        Type::FLOAT4 => nullable(row.try_get::<_, Option<f32>>(idx)?, |v| float_json(v as f64)),
        Type::FLOAT8 => nullable(row.try_get::<_, Option<f64>>(idx)?, float_json),
        Type::NUMERIC => nullable(row.try_get::<_, Option<NumericText>>(idx)?, |n| Value::String(n.0)),
        Type::UUID => nullable(row.try_get::<_, Option<Uuid>>(idx)?, |u| Value::String(u.to_string())),
        Type::JSON | Type::JSONB => row.try_get::<_, Option<Value>>(idx)?.unwrap_or(Value::Null),
        Type::TIMESTAMPTZ => nullable(
            row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?,
            |ts| Value::String(ts.to_rfc3339()),
        ),
        Type::TIMESTAMP => nullable(
            row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?,
            |ts| Value::String(ts.to_string()),
        ),
        Type::DATE => nullable(row.try_get::<_, Option<chrono::NaiveDate>>(idx)?, |d| {
            Value::String(d.to_string())
        }),
        Type::TIME => nullable(row.try_get::<_, Option<chrono::NaiveTime>>(idx)?, |t| {
            Value::String(t.to_string())
        }),
        _ => nullable(row.try_get::<_, Option<PgText>>(idx)?, |t| Value::String(t.0)),
    })
}

/// One-dimensional arrays; elements keep their scalar rendering
fn array_to_json(row: &Row, idx: usize, element: &Type) -> Result<Value, tokio_postgres::Error> {
    match *element {
        Type::BOOL => array::<bool>(row, idx, Value::from),
        Type::INT2 => array::<i16>(row, idx, Value::from),
        Type::INT4 => array::<i32>(row, idx, Value::from),
        Type::INT8 => array::<i64>(row, idx, Value::from),
        Type::OID => array::<u32>(row, idx, Value::from),
        Type::FLOAT4 => array::<f32>(row, idx, |v| float_json(v as f64)),
        Type::FLOAT8 => array::<f64>(row, idx, float_json),
        Type::NUMERIC => array::<NumericText>(row, idx, |n| Value::String(n.0)),
        Type::UUID => array::<Uuid>(row, idx, |u| Value::String(u.to_string())),
        Type::JSON | Type::JSONB => array::<Value>(row, idx, |v| v),
        Type::TIMESTAMPTZ => array::<chrono::DateTime<chrono::Utc>>(row, idx, |ts| {
            Value::String(ts.to_rfc3339())
        }),
        Type::TIMESTAMP => {
            array::<chrono::NaiveDateTime>(row, idx, |ts| Value::String(ts.to_string()))
        }
        Type::DATE => array::<chrono::NaiveDate>(row, idx, |d| Value::String(d.to_string())),
        Type::TIME => array::<chrono::NaiveTime>(row, idx, |t| Value::String(t.to_string())),
        _ => array::<PgText>(row, idx, |t| Value::String(t.0)),
    }
}

fn array<'a, T>(row: &'a Row, idx: usize, render: impl Fn(T) -> Value) -> Result<Value, tokio_postgres::Error>
where
    T: FromSql<'a>,
{
    let items: Option<Vec<Option<T>>> = row.try_get(idx)?;
    Ok(nullable(items, |items| {
        Value::Array(
            items
                .into_iter()
                .map(|item| nullable(item, &render))
                .collect(),
        )
    }))
}

fn nullable<T>(value: Option<T>, render: impl Fn(T) -> Value) -> Value {
    value.map(render).unwrap_or(Value::Null)
}

/// Non-finite floats keep the server's spelling instead of becoming `null`
fn float_json(v: f64) -> Value {
    match Number::from_f64(v) {
        Some(n) => Value::Number(n),
        None if v.is_nan() => Value::String("NaN".to_string()),
        None if v > 0.0 => Value::String("Infinity".to_string()),
        None => Value::String("-Infinity".to_string()),
    }
}

/// Render one value from the simple query protocol using the column type
/// reported when the statement was prepared.
pub fn text_to_json(ty: &Type, text: Option<&str>) -> Value {
    let Some(text) = text else {
        return Value::Null;
    };

    match *ty {
        Type::BOOL => match text {
            "t" => Value::Bool(true),
            "f" => Value::Bool(false),
            other => Value::String(other.to_string()),
        },
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        Type::FLOAT4 | Type::FLOAT8 => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        Type::JSON | Type::JSONB => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
        _ => Value::String(text.to_string()),
    }
}

/// Convert a simple query protocol row using the prepared column types
pub fn simple_row_to_json(
    row: &SimpleQueryRow,
    fields: &[String],
    types: &[Type],
) -> Result<Map<String, Value>, tokio_postgres::Error> {
    let mut map = Map::new();

    for (i, (name, ty)) in fields.iter().zip(types).enumerate() {
        map.insert(name.clone(), text_to_json(ty, row.try_get(i)?));
    }

    Ok(map)
}

/// Text-like values, including user-defined enums whose binary form is
/// their label
struct PgText(String);

impl<'a> FromSql<'a> for PgText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(PgText(std::str::from_utf8(raw)?.to_string()))
    }

    fn accepts(ty: &Type) -> bool {
        <String as FromSql>::accepts(ty) || matches!(ty.kind(), Kind::Enum(_))
    }
}

/// NUMERIC rendered as its exact decimal text
struct NumericText(String);

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        decode_numeric(raw).map(NumericText)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Decode the binary NUMERIC wire format: a header of
/// (ndigits, weight, sign, dscale) followed by base-10000 digit groups.
fn decode_numeric(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    if raw.len() < 8 {
        return Err("numeric value too short".into());
    }

    let read_u16 = |pos: usize| u16::from_be_bytes([raw[pos], raw[pos + 1]]);

    let ndigits = read_u16(0) as usize;
    let weight = read_u16(2) as i16 as i32;
    let sign = read_u16(4);
    let dscale = read_u16(6) as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    if raw.len() < 8 + ndigits * 2 {
        return Err("numeric value truncated".into());
    }

    let digits: Vec<u16> = (0..ndigits).map(|i| read_u16(8 + i * 2)).collect();
    let digit_at = |i: i32| -> u16 {
        if i < 0 {
            0
        } else {
            digits.get(i as usize).copied().unwrap_or(0)
        }
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }

    if weight >= 0 {
        for i in 0..=weight {
            if i == 0 {
                text.push_str(&digit_at(i).to_string());
            } else {
                text.push_str(&format!("{:04}", digit_at(i)));
            }
        }
    } else {
        text.push('0');
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit_at(i)));
            i += 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }

    Ok(text)
}
