// SPDX-License-Identifier: MIT
use crate::error::{DumpError, Result};
use std::fmt;

/// Maximum number of bytes per hex dump row
pub const HEX_DUMP_MAX_CHUNKS: usize = 16;
/// Number of bytes after which the hex field gets an extra separator
const HEX_DUMP_HALF_LINE: usize = 8;
/// Number of spaces between the hex field and the ascii field of a full row
const HEX_DUMP_ASCII_GAP: usize = 2;
/// Default number of hex digits per group
pub const DEFAULT_GROUP_WIDTH: usize = 2;

/// One formatted row of a hex dump.
///
/// The row renders as
/// `00000000: 00 01 02 03 04 05 06 07  08 09 0A 0B 0C 0D 0E 0F  ................`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpLine {
    /// Offset of the first byte within the source
    pub address: u64,
    /// Grouped uppercase hex digits, without trailing padding
    pub hex: String,
    /// Printable characters or dots, one per byte
    pub ascii: String,
    /// Spaces between the hex and the ascii field
    pub padding: usize,
}

impl fmt::Display for DumpLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:08X}: {}{:pad$}{}",
            self.address,
            self.hex,
            "",
            self.ascii,
            pad = self.padding
        )
    }
}

/// Renders chunks of up to 16 bytes as hex dump rows.
#[derive(Clone, Debug)]
pub struct LineFormatter {
    group_width: usize,
    full_width: usize,
}

impl LineFormatter {
    /// Creates a formatter grouping `group_width` hex digits.
    ///
    /// # Error
    ///
    /// A group width of zero is rejected.
    pub fn new(group_width: usize) -> Result<Self> {
        if group_width == 0 {
            return Err(DumpError::InvalidGroupWidth(group_width));
        }

        Ok(Self::with_group_width(group_width))
    }

    fn with_group_width(group_width: usize) -> Self {
        let mut formatter = Self {
            group_width,
            full_width: 0,
        };
        formatter.full_width = formatter.hex_field(&[0; HEX_DUMP_MAX_CHUNKS]).len();

        formatter
    }

    pub fn group_width(&self) -> usize {
        self.group_width
    }

    /// Formats a chunk located at the given address.
    ///
    /// Shorter chunks are padded so the ascii field starts at the same
    /// column as on a full row.
    pub fn format(&self, address: u64, chunk: &[u8]) -> DumpLine {
        let hex = self.hex_field(chunk);
        let padding = HEX_DUMP_ASCII_GAP + self.full_width.saturating_sub(hex.len());

        DumpLine {
            address,
            hex,
            ascii: ascii_field(chunk),
            padding,
        }
    }

    fn hex_field(&self, chunk: &[u8]) -> String {
        let (first, second) = chunk.split_at(chunk.len().min(HEX_DUMP_HALF_LINE));

        let mut field = group_hex(first, self.group_width, " ");
        if !second.is_empty() {
            field.push_str("  ");
            field.push_str(&group_hex(second, self.group_width, " "));
        }

        field
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::with_group_width(DEFAULT_GROUP_WIDTH)
    }
}

/// Printable ASCII characters (0x20 to 0x7E) or a dot for every byte.
fn ascii_field(chunk: &[u8]) -> String {
    chunk
        .iter()
        .map(|&b| {
            if (0x20..=0x7E).contains(&b) {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

fn group_hex(binary: &[u8], group_width: usize, separator: &str) -> String {
    let digits = hex::encode_upper(binary);

    // Hex digits are ASCII, so every index is a char boundary.
    (0..digits.len())
        .step_by(group_width)
        .map(|start| &digits[start..digits.len().min(start + group_width)])
        .collect::<Vec<_>>()
        .join(separator)
}

/// Converts binary data to a hex string like `00 DE AD BE EF`.
///
/// `group_width` is the number of hex digits per group and `separator`
/// is put between the groups.
pub fn dump(binary: &[u8], group_width: usize, separator: &str) -> Result<String> {
    if group_width == 0 {
        return Err(DumpError::InvalidGroupWidth(group_width));
    }

    Ok(group_hex(binary, group_width, separator))
}

/// Converts hex text back to binary data, ignoring whitespace.
///
/// # Error
///
/// Non-hex characters or an odd number of digits yield `InvalidHex`.
pub fn dehex(hex_text: &str) -> Result<Vec<u8>> {
    let digits: String = hex_text.chars().filter(|c| !c.is_whitespace()).collect();

    Ok(hex::decode(digits)?)
}
