// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-4-segment-mapping-to-delta-values

use crate::buffer::{BufferError, ByteCursor};

use super::{Coverage, Mapping, collect_mapping};

/// Decodes a segment mapping to delta values table.
///
/// Each segment covers `startCode..=endCode`. With a zero `idRangeOffset` the
/// glyph is `code + idDelta`, otherwise `idRangeOffset` is a byte offset,
/// counted from the `idRangeOffset` entry itself, into the glyph id array.
/// Arithmetic is modulo 65536 in both cases, and a zero read from the glyph
/// id array stays zero. Where segments overlap the earlier one decides.
pub(super) fn decode(data: &[u8], offset: usize) -> Result<Mapping, BufferError> {
    let mut cursor = ByteCursor::at(data, offset)?;
    cursor.skip(6)?; // format, length, language
    let seg_count = usize::from(cursor.read_u16()? / 2);
    cursor.skip(6)?; // searchRange, entrySelector, rangeShift

    let end_codes = read_u16s(&mut cursor, seg_count)?;
    cursor.skip(2)?; // reservedPad
    let start_codes = read_u16s(&mut cursor, seg_count)?;
    let id_deltas = (0..seg_count)
        .map(|_| cursor.read_i16())
        .collect::<Result<Vec<_>, _>>()?;
    let range_offsets_start = cursor.position();
    let range_offsets = read_u16s(&mut cursor, seg_count)?;

    let mut coverage = Coverage::default();
    let mut pairs = Vec::new();
    for segment in 0..seg_count {
        let (start, end) = (start_codes[segment], end_codes[segment]);
        // 0xFFFF closes the last, sentinel, segment
        if end == 0xFFFF || start > end {
            continue;
        }

        let delta = id_deltas[segment];
        let range_offset = usize::from(range_offsets[segment]);

        for codes in coverage.claim(u32::from(start), u32::from(end)) {
            for code in codes {
                // free ranges stay inside start..=end, so the code fits 16 bits
                let code = code as u16;
                let glyph = if range_offset == 0 {
                    code.wrapping_add_signed(delta)
                } else {
                    let address = range_offsets_start
                        + 2 * segment
                        + range_offset
                        + 2 * usize::from(code - start);
                    match ByteCursor::at(data, address)?.read_u16()? {
                        0 => 0,
                        stored => stored.wrapping_add_signed(delta),
                    }
                };
                pairs.push((u32::from(code), glyph));
            }
        }
    }

    Ok(collect_mapping(pairs))
}

fn read_u16s(cursor: &mut ByteCursor<'_>, count: usize) -> Result<Vec<u16>, BufferError> {
    (0..count).map(|_| cursor.read_u16()).collect()
}
