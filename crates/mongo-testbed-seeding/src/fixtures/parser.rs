//! Fixture parsing.
//!
//! A fixture is a JSON array of JSON objects. Each object becomes one BSON
//! document, with key order preserved and string `_id` values rewritten to
//! object identifiers.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde_json::Value;

use super::ObjectIdPolicy;
use crate::error::{SeedingError, SeedingResult};

/// Key holding a document's primary key.
pub const ID_KEY: &str = "_id";

/// Parser turning fixture text into BSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureParser {
	policy: ObjectIdPolicy,
}

impl FixtureParser {
	/// Creates a parser that rewrites top-level `_id` strings only.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the `_id` rewrite policy.
	pub fn with_policy(mut self, policy: ObjectIdPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Returns the `_id` rewrite policy.
	pub fn policy(&self) -> ObjectIdPolicy {
		self.policy
	}

	/// Parses fixture text into documents, in array order.
	///
	/// # Errors
	///
	/// - [`SeedingError::JsonError`] if the text is not JSON
	/// - [`SeedingError::MalformedFixture`] if the top level is not an array
	///   or an element is not an object
	/// - [`SeedingError::InvalidObjectId`] if an `_id` string is not a valid
	///   24-hex-character identifier
	pub fn parse_str(&self, content: &str) -> SeedingResult<Vec<Document>> {
		let value: Value = serde_json::from_str(content)?;

		let Value::Array(items) = value else {
			return Err(SeedingError::MalformedFixture(format!(
				"expected a JSON array at the top level, found {}",
				json_kind(&value)
			)));
		};

		let mut documents = Vec::with_capacity(items.len());
		for (index, item) in items.into_iter().enumerate() {
			let Value::Object(map) = item else {
				return Err(SeedingError::MalformedFixture(format!(
					"element {} is {}, expected an object",
					index,
					json_kind(&item)
				)));
			};

			let mut document = object_to_document(map);
			self.rewrite_ids(&mut document, index)?;
			documents.push(document);
		}

		Ok(documents)
	}

	fn rewrite_ids(&self, document: &mut Document, index: usize) -> SeedingResult<()> {
		rewrite_id(document, index)?;

		if self.policy == ObjectIdPolicy::Recursive {
			for (key, value) in document.iter_mut() {
				if key != ID_KEY {
					rewrite_nested(value, index)?;
				}
			}
		}

		Ok(())
	}
}

/// Replaces a string `_id` with its object identifier, in place.
fn rewrite_id(document: &mut Document, index: usize) -> SeedingResult<()> {
	let Some(Bson::String(hex)) = document.get(ID_KEY) else {
		return Ok(());
	};

	let oid = ObjectId::parse_str(hex).map_err(|e| SeedingError::InvalidObjectId {
		index,
		value: hex.clone(),
		reason: e.to_string(),
	})?;
	document.insert(ID_KEY, oid);
	Ok(())
}

fn rewrite_nested(value: &mut Bson, index: usize) -> SeedingResult<()> {
	match value {
		Bson::Document(document) => {
			rewrite_id(document, index)?;
			for (key, nested) in document.iter_mut() {
				if key != ID_KEY {
					rewrite_nested(nested, index)?;
				}
			}
		}
		Bson::Array(items) => {
			for item in items.iter_mut() {
				rewrite_nested(item, index)?;
			}
		}
		_ => {}
	}
	Ok(())
}

fn object_to_document(map: serde_json::Map<String, Value>) -> Document {
	let mut document = Document::new();
	for (key, value) in map {
		document.insert(key, json_to_bson(value));
	}
	document
}

/// Converts a JSON value into BSON.
///
/// Integers that fit in 32 bits become `Int32`, larger ones `Int64`;
/// unsigned values beyond `i64::MAX` and all fractional numbers become `Double`.
pub fn json_to_bson(value: Value) -> Bson {
	match value {
		Value::Null => Bson::Null,
		Value::Bool(b) => Bson::Boolean(b),
		Value::Number(n) => {
			if let Some(i) = n.as_i64() {
				match i32::try_from(i) {
					Ok(small) => Bson::Int32(small),
					Err(_) => Bson::Int64(i),
				}
			} else {
				Bson::Double(n.as_f64().unwrap_or(f64::NAN))
			}
		}
		Value::String(s) => Bson::String(s),
		Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
		Value::Object(map) => Bson::Document(object_to_document(map)),
	}
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
