// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-12-segmented-coverage

use std::ops::RangeInclusive;

use crate::buffer::{BufferError, ByteCursor};

use super::{Coverage, MAX_CODE_POINT, Mapping, collect_mapping};

/// A sequential map group, shared with format 13
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct MapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl MapGroup {
    /// The code points of the group, clamped to the Unicode range.
    /// Inverted groups are empty.
    pub fn code_points(&self) -> RangeInclusive<u32> {
        self.start_char_code..=self.end_char_code.min(MAX_CODE_POINT)
    }
}

/// Reads the header shared by formats 12 and 13 and returns its groups
pub(super) fn read_groups(data: &[u8], offset: usize) -> Result<Vec<MapGroup>, BufferError> {
    let mut cursor = ByteCursor::at(data, offset)?;
    cursor.skip(12)?; // format, reserved, length, language
    let num_groups = cursor.read_u32()?;

    // check the whole array fits before allocating for it
    let groups_len = (num_groups as usize).saturating_mul(12);
    let mut groups = ByteCursor::new(cursor.read_bytes(groups_len)?);

    (0..num_groups)
        .map(|_| {
            Ok::<_, BufferError>(MapGroup {
                start_char_code: groups.read_u32()?,
                end_char_code: groups.read_u32()?,
                start_glyph_id: groups.read_u32()?,
            })
        })
        .collect()
}

/// Decodes a segmented coverage table, each group maps a run of 32 bit
/// code points onto consecutive glyph indices. Overlapping groups don't
/// override the codes of an earlier group.
pub(super) fn decode(data: &[u8], offset: usize) -> Result<Mapping, BufferError> {
    let groups = read_groups(data, offset)?;

    let mut coverage = Coverage::default();
    let mut pairs = Vec::new();
    for group in &groups {
        let codes = group.code_points();
        for free in coverage.claim(*codes.start(), *codes.end()) {
            // glyph indices past 16 bits can't address a glyph, the rest of the group is dropped
            let glyphs = free.map_while(|code| {
                let glyph = group
                    .start_glyph_id
                    .checked_add(code - group.start_char_code)?;
                Some((code, u16::try_from(glyph).ok()?))
            });
            pairs.extend(glyphs);
        }
    }

    Ok(collect_mapping(pairs))
}
