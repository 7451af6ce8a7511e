/// Knobs for a single `Compilation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	/// Write `# ...` comments describing each semantic action into the body
	pub annotate: bool,
	/// Keep left scopes around for inspection instead of dropping them
	pub retain_retired_scopes: bool,
}
impl Default for Options {
	fn default() -> Self {
		Self {
			annotate: false,
			retain_retired_scopes: true,
		}
	}
}
impl Options {
	/// Annotates the output whenever debug logging is on.
	pub fn from_log_level() -> Self {
		Self {
			annotate: log::log_enabled!(log::Level::Debug),
			..Self::default()
		}
	}
}
