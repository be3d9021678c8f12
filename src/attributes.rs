//! OS-level file attribute codes
//!
//! The snapshot stores attributes as a short opaque string. On Windows each
//! set flag contributes one letter; other platforms have no equivalent flag
//! word and always yield an empty string.
//!
//! | Letter | Flag |
//! |--------|------|
//! | `R` | read-only |
//! | `H` | hidden |
//! | `S` | system |
//! | `D` | directory |
//! | `A` | archive |
//! | `O` | offline |
//! | `I` | not content indexed |
//! | `P` | pinned |

use std::fs;

/// Attribute bits in output order
#[cfg_attr(not(windows), allow(dead_code))]
const ATTRIBUTE_LETTERS: [(u32, char); 8] = [
    (0x0000_0001, 'R'),
    (0x0000_0002, 'H'),
    (0x0000_0004, 'S'),
    (0x0000_0010, 'D'),
    (0x0000_0020, 'A'),
    (0x0000_1000, 'O'),
    (0x0000_2000, 'I'),
    (0x0008_0000, 'P'),
];

/// Encode a raw attribute word as a letter code
#[cfg_attr(not(windows), allow(dead_code))]
fn encode(bits: u32) -> String {
    ATTRIBUTE_LETTERS
        .iter()
        .filter(|(mask, _)| bits & mask != 0)
        .map(|(_, letter)| *letter)
        .collect()
}

/// Get the attribute code for a file (Windows implementation)
#[cfg(windows)]
pub fn file_attributes(metadata: &fs::Metadata) -> String {
    use std::os::windows::fs::MetadataExt;
    encode(metadata.file_attributes())
}

/// Get the attribute code for a file
#[cfg(not(windows))]
pub fn file_attributes(_metadata: &fs::Metadata) -> String {
    String::new()
}
