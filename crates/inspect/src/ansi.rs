//! ANSI escape code stripping for human-readable reports.
//!
//! Matching always runs on the raw line (the timing recognizers depend on the
//! colour fragment being present). Stripping only happens when a captured
//! line is rendered back to a person, e.g. in a violation message or CLI
//! output.

use std::borrow::Cow;

/// Strip ANSI escape codes from a line
///
/// Handles:
/// - CSI sequences: `\x1b[...m`
/// - OSC sequences: `\x1b]...` (terminated by BEL or `ESC \`)
/// - Simple Fe sequences: `ESC` + one byte in `0x40..=0x5F`
///
/// Returns `Cow::Borrowed` if no codes were found.
pub fn strip_ansi_codes(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if !bytes.contains(&0x1b) {
        return Cow::Borrowed(input);
    }

    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == 0x1b && i + 1 >= bytes.len() {
            // Lone trailing ESC
            i += 1;
            continue;
        }
        if bytes[i] == 0x1b {
            if bytes[i + 1] == b'[' {
                i += 2;
                while i < bytes.len() {
                    let b = bytes[i];
                    i += 1;
                    if (0x40..=0x7E).contains(&b) {
                        break;
                    }
                }
                continue;
            }

            if bytes[i + 1] == b']' {
                i += 2;
                while i < bytes.len() {
                    if bytes[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if bytes[i] == 0x1b && i + 1 < bytes.len() && bytes[i + 1] == b'\\' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                continue;
            }

            if (0x40..=0x5F).contains(&bytes[i + 1]) {
                i += 2;
                continue;
            }
        }

        output.push(bytes[i]);
        i += 1;
    }

    // Terminators are ASCII, so multi-byte characters are never split.
    match String::from_utf8(output) {
        Ok(s) => Cow::Owned(s),
        Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}
