//! Notes study mode helpers.

/// Case-insensitive substring filter that keeps note order.
///
/// The term is matched as typed, surrounding spaces included; an empty term
/// returns every note.
pub fn filter_notes<'a>(notes: &'a [String], term: &str) -> Vec<&'a str> {
    let needle = term.to_lowercase();
    notes
        .iter()
        .map(String::as_str)
        .filter(|note| needle.is_empty() || note.to_lowercase().contains(&needle))
        .collect()
}
