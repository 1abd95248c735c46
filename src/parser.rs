pub const COMMENT_MARKER: &str = "--";

/// Strips blank and comment lines from a seed file, keeping the rest in order.
///
/// Only whole-line comments are recognised. Inline comments and multi-line
/// statements pass through untouched.
pub fn parse(content: &str) -> String {
	content
		.split('\n')
		.filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
		.collect::<Vec<_>>()
		.join("\n")
}
