// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-13-many-to-one-range-mappings

use crate::buffer::BufferError;

use super::{Coverage, Mapping, collect_mapping, format12};

/// Decodes a many-to-one range mapping table. The layout is the one of
/// format 12, but every code point of a group maps to the same glyph.
pub(super) fn decode(data: &[u8], offset: usize) -> Result<Mapping, BufferError> {
    let groups = format12::read_groups(data, offset)?;

    let mut coverage = Coverage::default();
    let mut pairs = Vec::new();
    for group in &groups {
        let codes = group.code_points();
        let free = coverage.claim(*codes.start(), *codes.end());
        // a glyph past 16 bits leaves the group's codes unmapped
        if let Ok(glyph) = u16::try_from(group.start_glyph_id) {
            pairs.extend(free.into_iter().flatten().map(|code| (code, glyph)));
        }
    }

    Ok(collect_mapping(pairs))
}
