use serde_json::{Value, json};

use crate::{Filter, FilterBase, FilterError, FilterOption, FilterState};

/// A filter offering rating-based selection, e.g. "3 stars and up".
///
/// At most one option is active at a time; its id is stored as a string in
/// the filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingFilter {
	base: FilterBase,
	pub label: String,
	pub on_icon: String,
	pub off_icon: String,
	options: Vec<FilterOption>,
}

impl RatingFilter {
	#[must_use]
	pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			base: FilterBase::new(id, "rating"),
			label: label.into(),
			on_icon: String::new(),
			off_icon: String::new(),
			options: Vec::new(),
		}
	}

	#[must_use]
	pub fn base(&self) -> &FilterBase {
		&self.base
	}

	pub fn base_mut(&mut self) -> &mut FilterBase {
		&mut self.base
	}

	/// Declare a new option.
	pub fn add_option(
		&mut self,
		id: impl Into<String>,
		label: impl Into<String>,
	) -> Result<(), FilterError> {
		let id = id.into();
		if self.is_valid_option(&id) {
			return Err(FilterError::DuplicateOption {
				filter: self.base.id.clone(),
				option: id,
			});
		}
		self.options.push(FilterOption {
			id,
			label: label.into(),
		});
		Ok(())
	}

	#[must_use]
	pub fn options(&self) -> &[FilterOption] {
		&self.options
	}

	fn is_valid_option(&self, option_id: &str) -> bool {
		self.options.iter().any(|option| option.id == option_id)
	}

	/// The active option id, if the state holds one in the expected form.
	#[must_use]
	pub fn active_rating<'s>(&self, state: &'s FilterState) -> Option<&'s str> {
		state.get(&self.base.id).and_then(Value::as_str)
	}

	/// Activate or deactivate `option_id` in `state`.
	///
	/// State in an unexpected shape is treated as empty. Deactivating an
	/// option that is not the active one leaves the state untouched.
	pub fn update_state(
		&self,
		state: &mut FilterState,
		option_id: &str,
		active: bool,
	) -> Result<(), FilterError> {
		if !self.is_valid_option(option_id) {
			return Err(FilterError::InvalidOption {
				filter: self.base.id.clone(),
				option: option_id.to_string(),
			});
		}

		let selected = self.active_rating(state) == Some(option_id);
		if active {
			state.insert(self.base.id.clone(), Value::String(option_id.to_string()));
		} else if selected {
			state.remove(&self.base.id);
		}
		Ok(())
	}
}

impl Filter for RatingFilter {
	fn id(&self) -> &str {
		&self.base.id
	}

	fn serialize_filter(&self) -> Value {
		let mut value = self.base.serialize_base();
		value.insert("label".into(), json!(self.label));
		value.insert("on_icon".into(), json!(self.on_icon));
		value.insert("off_icon".into(), json!(self.off_icon));
		value.insert("options".into(), json!(self.options));
		Value::Object(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stars() -> RatingFilter {
		let mut filter = RatingFilter::new("rating", "Rating");
		filter.add_option("1", "1+").unwrap();
		filter.add_option("3", "3+").unwrap();
		filter
	}

	#[test]
	fn activating_an_option_records_it() {
		let filter = stars();
		let mut state = FilterState::new();
		filter.update_state(&mut state, "3", true).unwrap();
		assert_eq!(filter.active_rating(&state), Some("3"));

		filter.update_state(&mut state, "1", true).unwrap();
		assert_eq!(filter.active_rating(&state), Some("1"));
	}

	#[test]
	fn deactivating_only_clears_the_active_option() {
		let filter = stars();
		let mut state = FilterState::new();
		filter.update_state(&mut state, "3", true).unwrap();

		filter.update_state(&mut state, "1", false).unwrap();
		assert_eq!(filter.active_rating(&state), Some("3"));

		filter.update_state(&mut state, "3", false).unwrap();
		assert!(state.is_empty());
	}

	#[test]
	fn unexpected_state_shape_is_treated_as_empty() {
		let filter = stars();
		let mut state = FilterState::new();
		state.insert("rating", json!(["bogus"]));
		assert_eq!(filter.active_rating(&state), None);

		filter.update_state(&mut state, "1", false).unwrap();
		assert_eq!(state.get("rating"), Some(&json!(["bogus"])));
	}

	#[test]
	fn unknown_options_are_rejected() {
		let filter = stars();
		let mut state = FilterState::new();
		let err = filter.update_state(&mut state, "5", true).unwrap_err();
		assert_eq!(
			err,
			FilterError::InvalidOption {
				filter: "rating".into(),
				option: "5".into(),
			}
		);
		assert!(state.is_empty());
	}

	#[test]
	fn duplicate_options_are_rejected() {
		let mut filter = stars();
		assert!(filter.add_option("1", "again").is_err());
		assert_eq!(filter.options().len(), 2);
	}

	#[test]
	fn serialized_filter_carries_options_and_type() {
		let filter = stars();
		let value = filter.serialize_filter();
		assert_eq!(value["filter_type"], "rating");
		assert_eq!(value["id"], "rating");
		assert_eq!(value["label"], "Rating");
		assert_eq!(value["options"][1]["id"], "3");
		assert_eq!(value["display_hints"], 0);
	}
}
