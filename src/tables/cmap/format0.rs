// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-0-byte-encoding-table

use crate::buffer::{BufferError, ByteCursor};

use super::{Mapping, collect_mapping};

/// Decodes a byte encoding table: 256 one byte glyph indices, one per code 0..=255
pub(super) fn decode(data: &[u8], offset: usize) -> Result<Mapping, BufferError> {
    let mut cursor = ByteCursor::at(data, offset)?;
    cursor.skip(6)?; // format, length, language
    let glyphs = cursor.read_bytes(256)?;

    Ok(collect_mapping((0u32..).zip(glyphs.iter().map(|&glyph| u16::from(glyph)))))
}
