// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-2-high-byte-mapping-through-table

use crate::buffer::{BufferError, ByteCursor};

use super::{Mapping, collect_mapping};

/// A subheader of a high-byte mapping table
struct SubHeader {
    first_code: u16,
    entry_count: u16,
    id_delta: i16,
    /// Absolute position the glyph array for `first_code` starts at
    glyphs_start: usize,
}

impl SubHeader {
    fn read(data: &[u8], position: usize) -> Result<Self, BufferError> {
        let mut cursor = ByteCursor::at(data, position)?;
        let first_code = cursor.read_u16()?;
        let entry_count = cursor.read_u16()?;
        let id_delta = cursor.read_i16()?;
        // idRangeOffset counts from its own position
        let range_offset_position = cursor.position();
        let id_range_offset = cursor.read_u16()?;

        Ok(Self {
            first_code,
            entry_count,
            id_delta,
            glyphs_start: range_offset_position + usize::from(id_range_offset),
        })
    }

    /// Glyph of the `index`th low byte covered by this subheader
    fn glyph(&self, data: &[u8], index: u16) -> Result<u16, BufferError> {
        let stored = ByteCursor::at(data, self.glyphs_start + 2 * usize::from(index))?.read_u16()?;
        Ok(match stored {
            0 => 0,
            stored => stored.wrapping_add_signed(self.id_delta),
        })
    }
}

/// Decodes a high-byte mapping through table, used by the CJK multi byte encodings.
///
/// High bytes whose subheader key is 0 are complete one byte codes looked up
/// through subheader 0, every other high byte starts a two byte code.
pub(super) fn decode(data: &[u8], offset: usize) -> Result<Mapping, BufferError> {
    let mut cursor = ByteCursor::at(data, offset)?;
    cursor.skip(6)?; // format, length, language

    let keys = (0..256)
        .map(|_| cursor.read_u16())
        .collect::<Result<Vec<_>, _>>()?;
    let subheaders_start = cursor.position();

    let mut pairs = Vec::new();
    for (high, key) in (0u16..).zip(keys) {
        // keys are subheader indices multiplied by 8
        let index = usize::from(key / 8);
        let subheader = SubHeader::read(data, subheaders_start + index * 8)?;

        if index == 0 {
            let Some(entry) = high.checked_sub(subheader.first_code) else {
                continue;
            };
            if entry < subheader.entry_count {
                pairs.push((u32::from(high), subheader.glyph(data, entry)?));
            }
            continue;
        }

        for entry in 0..subheader.entry_count {
            let low = u32::from(subheader.first_code) + u32::from(entry);
            if low > 0xFF {
                break;
            }
            let code = (u32::from(high) << 8) | low;
            pairs.push((code, subheader.glyph(data, entry)?));
        }
    }

    Ok(collect_mapping(pairs))
}
