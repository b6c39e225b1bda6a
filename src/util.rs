//! Small utility helpers used across modules.

/// Split a comma-separated input into trimmed, non-empty entries, in order.
/// Duplicates are passed through as typed.
pub fn split_csv(input: &str) -> Vec<String> {
  input
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

/// URL slug from a title: lowercase ASCII alphanumerics, with every other run
/// of characters collapsed to a single `-`.
pub fn slugify(title: &str) -> String {
  let mut out = String::with_capacity(title.len());
  let mut pending_dash = false;
  for ch in title.chars() {
    if ch.is_ascii_alphanumeric() {
      if pending_dash && !out.is_empty() {
        out.push('-');
      }
      pending_dash = false;
      out.push(ch.to_ascii_lowercase());
    } else {
      pending_dash = true;
    }
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
