//! Insertion-ordered request parameters with copy-on-write updates.

// crates.io
use url::form_urlencoded;
// self
use crate::_prelude::*;

/// Ordered parameter map attached to an endpoint.
///
/// Every mutator returns a new map; replacing a key keeps its original position so the
/// serialized query or form body stays stable across transformers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params(Vec<(String, String)>);
impl Params {
	/// Empty parameters.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses an `application/x-www-form-urlencoded` string (query or body).
	pub fn from_urlencoded(input: &str) -> Self {
		form_urlencoded::parse(input.trim_start_matches('?').as_bytes())
			.fold(Self::new(), |params, (key, value)| params.set(key, value))
	}

	/// Value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
	}

	/// Returns true when `key` is present.
	pub fn contains(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Returns a copy with `key` set to `value`.
	pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let (key, value) = (key.into(), value.into());
		let mut next = self.0.clone();

		match next.iter_mut().find(|(name, _)| *name == key) {
			Some(slot) => slot.1 = value,
			None => next.push((key, value)),
		}

		Self(next)
	}

	/// Returns a copy with `key` set only when it is absent.
	pub fn set_if_absent(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let key = key.into();

		if self.contains(&key) { self.clone() } else { self.set(key, value) }
	}

	/// Returns a copy with every pair in `pairs` applied through [`set`](Self::set).
	pub fn merge<I, K, V>(&self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		pairs.into_iter().fold(self.clone(), |params, (key, value)| params.set(key, value))
	}

	/// Returns a copy without `key`.
	pub fn without(&self, key: &str) -> Self {
		Self(self.0.iter().filter(|(name, _)| name != key).cloned().collect())
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over `(key, value)` pairs in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	/// Serializes as `application/x-www-form-urlencoded`.
	pub fn to_urlencoded(&self) -> String {
		form_urlencoded::Serializer::new(String::new()).extend_pairs(self.iter()).finish()
	}

	/// Converts into a JSON object of string values, for session storage.
	pub fn to_map(&self) -> Map<String, Value> {
		self.iter().map(|(key, value)| (key.to_owned(), Value::String(value.to_owned()))).collect()
	}
}
impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self::new().merge(iter)
	}
}
impl<'a> IntoIterator for &'a Params {
	type IntoIter = std::iter::Map<
		std::slice::Iter<'a, (String, String)>,
		fn(&'a (String, String)) -> (&'a str, &'a str),
	>;
	type Item = (&'a str, &'a str);

	fn into_iter(self) -> Self::IntoIter {
		fn split(pair: &(String, String)) -> (&str, &str) {
			(pair.0.as_str(), pair.1.as_str())
		}

		self.0.iter().map(split)
	}
}
