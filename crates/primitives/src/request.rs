use std::fmt;

use serde::{Deserialize, Serialize};

use crate::widget::Geometry;

/// A create or update request as received from a client.
///
/// Every field is optional at the decoding layer so that a missing value is
/// reported by [`WidgetRequest::validate`] alongside the other field errors
/// instead of failing deserialization outright.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetRequest {
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub x: Option<i32>,
	pub y: Option<i32>,
	/// Requested stacking position; `None` places the widget in front of all others.
	pub z: Option<i32>,
}

/// A request that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidRequest {
	pub geometry: Geometry,
	pub z: Option<i32>,
}

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	pub field: String,
	pub message: String,
}

impl FieldError {
	fn new(field: &str, message: &str) -> Self {
		Self {
			field: field.to_string(),
			message: message.to_string(),
		}
	}
}

/// All field errors found in one request, in field declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
	pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Validation error")?;
		for (i, err) in self.errors.iter().enumerate() {
			let sep = if i == 0 { ": " } else { ", " };
			write!(f, "{sep}{} {}", err.field, err.message)?;
		}
		Ok(())
	}
}

impl std::error::Error for ValidationErrors {}

impl WidgetRequest {
	/// Creates a request with every geometry field set.
	pub fn new(x: i32, y: i32, width: i32, height: i32, z: Option<i32>) -> Self {
		Self {
			width: Some(width),
			height: Some(height),
			x: Some(x),
			y: Some(y),
			z,
		}
	}

	/// Checks required fields and positive dimensions.
	pub fn validate(&self) -> Result<ValidRequest, ValidationErrors> {
		let mut errors = Vec::new();

		let width = positive(&mut errors, "width", self.width, "Width must be positive");
		let height = positive(&mut errors, "height", self.height, "Height must be positive");
		let x = required(&mut errors, "x", self.x);
		let y = required(&mut errors, "y", self.y);

		match (width, height, x, y) {
			(Some(width), Some(height), Some(x), Some(y)) if errors.is_empty() => Ok(ValidRequest {
				geometry: Geometry {
					x,
					y,
					width,
					height,
				},
				z: self.z,
			}),
			_ => Err(ValidationErrors { errors }),
		}
	}
}

fn required(errors: &mut Vec<FieldError>, field: &str, value: Option<i32>) -> Option<i32> {
	if value.is_none() {
		errors.push(FieldError::new(field, "must not be null"));
	}
	value
}

fn positive(
	errors: &mut Vec<FieldError>,
	field: &str,
	value: Option<i32>,
	message: &str,
) -> Option<i32> {
	let value = required(errors, field, value)?;
	if value < 1 {
		errors.push(FieldError::new(field, message));
		return None;
	}
	Some(value)
}
