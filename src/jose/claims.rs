//! Read-only claim map with typed accessors.

// self
use crate::_prelude::*;

/// Claims carried by a token or a JSON response body.
///
/// Accessors are lenient in the ways providers are: numeric dates may arrive as strings,
/// booleans as `"true"`/`"false"`, and list-valued claims (`aud`, `amr`) as a single
/// string.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);
impl Claims {
	/// Empty claims.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a copy with `name` set to `value`.
	pub fn with(&self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		let mut map = self.0.clone();

		map.insert(name.into(), value.into());

		Self(map)
	}

	/// Raw claim value.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name).filter(|value| !value.is_null())
	}

	/// Returns true when the claim is present and not `null`.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// String claim.
	pub fn str(&self, name: &str) -> Option<&str> {
		self.get(name)?.as_str()
	}

	/// Integer claim; numeric strings and floats are accepted.
	pub fn i64(&self, name: &str) -> Option<i64> {
		match self.get(name)? {
			Value::Number(number) =>
				number.as_i64().or_else(|| number.as_f64().map(|value| value as i64)),
			Value::String(value) => value.trim().parse().ok(),
			_ => None,
		}
	}

	/// Boolean claim; `"true"`/`"false"` strings are accepted.
	pub fn bool(&self, name: &str) -> Option<bool> {
		match self.get(name)? {
			Value::Bool(value) => Some(*value),
			Value::String(value) => value.parse().ok(),
			_ => None,
		}
	}

	/// List-of-strings claim; a single string yields a one-element list.
	pub fn strings(&self, name: &str) -> Option<Vec<&str>> {
		match self.get(name)? {
			Value::String(value) => Some(vec![value.as_str()]),
			Value::Array(values) => Some(values.iter().filter_map(Value::as_str).collect()),
			_ => None,
		}
	}

	/// NumericDate claim (seconds since the UNIX epoch).
	pub fn time(&self, name: &str) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.i64(name)?).ok()
	}

	/// Audience values (`aud`), empty when absent.
	pub fn audience(&self) -> Vec<&str> {
		self.strings("aud").unwrap_or_default()
	}

	/// Returns true when the NumericDate claim `name` lies at or before `now`.
	pub fn is_past(&self, name: &str, now: OffsetDateTime) -> Option<bool> {
		Some(self.i64(name)? <= now.unix_timestamp())
	}

	/// Number of claims.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when no claims are present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over claim names and values.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.0.iter()
	}

	/// Borrows the underlying map.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	/// Consumes the claims and returns the underlying map.
	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}
}
impl From<Map<String, Value>> for Claims {
	fn from(value: Map<String, Value>) -> Self {
		Self(value)
	}
}
impl FromIterator<(String, Value)> for Claims {
	fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}
