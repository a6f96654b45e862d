use once_cell::sync::Lazy;
use regex::Regex;

/// CSI escape sequences: ESC [ parameters intermediates final-byte
static CSI_SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").unwrap());

/// OSC window-title sequences terminated by BEL or ESC-backslash
static OSC_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\]0;[^\x07\x1b]*(?:\x07|\x1b\\)").unwrap());

/// Strip terminal escape sequences and control characters from one line.
///
/// CSI and OSC title sequences are removed whole, then remaining control
/// characters are dropped. A BEL or ESC left behind by a malformed sequence
/// falls to the control filter, which eats the ESC but keeps a trailing
/// backslash. Cleaning an already-clean line is a no-op.
pub fn clean_line(line: &str) -> String {
    let without_csi = CSI_SEQUENCE.replace_all(line, "");
    let without_osc = OSC_TITLE.replace_all(&without_csi, "");

    without_osc
        .chars()
        .filter(|c| !is_stripped_control(*c))
        .collect()
}

/// Control characters removed from cleaned output. Newline survives so the
/// caller can split lines before or after cleaning.
fn is_stripped_control(c: char) -> bool {
    matches!(c,
        '\u{0000}'..='\u{0009}'
        | '\u{000B}'..='\u{001F}'
        | '\u{007F}'..='\u{009F}')
}
