//! String formatting utilities for log output.

/// Truncates an identifier for display.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

/// Formats an amount in đồng with dot thousands separators, e.g. `700.000 ₫`.
pub fn format_vnd(amount: u64) -> String {
	let digits = amount.to_string();
	let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
	for (i, ch) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			out.push('.');
		}
		out.push(ch);
	}
	out.push_str(" ₫");
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("abc"), "abc");
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(truncate_id("123456789"), "12345678..");
	}

	#[test]
	fn test_format_vnd() {
		assert_eq!(format_vnd(0), "0 ₫");
		assert_eq!(format_vnd(1_000), "1.000 ₫");
		assert_eq!(format_vnd(700_000), "700.000 ₫");
		assert_eq!(format_vnd(50_000_000), "50.000.000 ₫");
	}
}
