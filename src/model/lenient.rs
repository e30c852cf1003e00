//! Tolerant deserializers for spreadsheet-sourced values.
//!
//! Sheet cells come back as numbers, numeric strings or empty strings
//! depending on how they were entered. These helpers accept all of them.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A string that may have been stored as a number.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(opt_string(deserializer)?.unwrap_or_default())
}

pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    None | Some(Value::Null) => None,
    Some(Value::String(s)) => Some(s),
    Some(Value::Number(n)) => Some(n.to_string()),
    Some(Value::Bool(b)) => Some(b.to_string()),
    Some(other) => {
      return Err(serde::de::Error::custom(format!(
        "expected a string, got {}",
        other
      )))
    }
  })
}

/// A number that may have been stored as text. Blank cells read as zero.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  match value {
    None | Some(Value::Null) => Ok(0.0),
    Some(Value::Number(n)) => n
      .as_f64()
      .ok_or_else(|| serde::de::Error::custom("number out of range")),
    Some(Value::String(s)) => {
      let trimmed = s.trim();
      if trimmed.is_empty() {
        return Ok(0.0);
      }
      trimmed
        .replace(',', "")
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("`{}` is not a number", s)))
    }
    Some(other) => Err(serde::de::Error::custom(format!(
      "expected a number, got {}",
      other
    ))),
  }
}

/// A calendar date, either `YYYY-MM-DD` or a full timestamp whose date
/// part is used. Blank cells read as `None`.
pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
  D: Deserializer<'de>,
{
  let Some(raw) = opt_string(deserializer)? else {
    return Ok(None);
  };
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Ok(None);
  }

  let date_part = trimmed.get(..10).unwrap_or(trimmed);
  NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
    .map(Some)
    .map_err(|_| serde::de::Error::custom(format!("`{}` is not a date", raw)))
}
