use thiserror::Error;

/// Errors raised while manipulating filter state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
	/// The option is not declared on the filter.
	#[error("invalid option id '{option}' for filter '{filter}'")]
	InvalidOption { filter: String, option: String },

	/// An option with the same identifier was already added.
	#[error("option id '{option}' is already declared on filter '{filter}'")]
	DuplicateOption { filter: String, option: String },
}
