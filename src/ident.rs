/// Maps a display name onto a bare Ruby identifier fragment.
///
/// ASCII letters, digits and `_` are kept; every other ASCII character becomes `_`.
/// Non-ASCII characters (including full-width punctuation) are kept unchanged, so the
/// character count never changes. Reserved words are not checked.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii() {
                c
            } else {
                '_'
            }
        })
        .collect()
}
