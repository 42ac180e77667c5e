//! Various string and character tools.

/// Additional character classes.
pub trait CharClassExt {
    /// Returns whether the octet is stripped from the ends of a chunk-size line.
    ///
    /// `Space Tab LF VT FF CR`
    fn is_strippable(&self) -> bool;
}

impl CharClassExt for u8 {
    fn is_strippable(&self) -> bool {
        b" \t\n\x0b\x0c\r".contains(self)
    }
}

/// Returns the slice without leading and trailing strippable octets.
pub fn trim(input: &[u8]) -> &[u8] {
    let start = input
        .iter()
        .position(|byte| !byte.is_strippable())
        .unwrap_or(input.len());
    let end = input
        .iter()
        .rposition(|byte| !byte.is_strippable())
        .map(|index| index + 1)
        .unwrap_or(start);

    &input[start..end]
}
