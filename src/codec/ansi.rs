const ESC: char = '\u{1b}';

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StripState {
    Normal,
    InEscape,
}

/// Removes `ESC ... m` runs from `s`.
///
/// This is a simplified CSI stripper: once inside an escape run, the first `m`
/// ends it, whatever the characters in between were. An `m` outside an escape
/// run is ordinary text.
pub fn strip_ansi_escapes(s: &str) -> String {
    let mut state = StripState::Normal;
    let mut stripped = String::with_capacity(s.len());

    for c in s.chars() {
        state = match (state, c) {
            (_, ESC) => StripState::InEscape,
            (StripState::InEscape, 'm') => StripState::Normal,
            (StripState::InEscape, _) => StripState::InEscape,
            (StripState::Normal, c) => {
                stripped.push(c);
                StripState::Normal
            }
        };
    }

    stripped
}
