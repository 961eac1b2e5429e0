// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-10-trimmed-array

use crate::buffer::{BufferError, ByteCursor};

use super::{MAX_CODE_POINT, Mapping, collect_mapping};

/// Decodes a trimmed array, the 32 bit counterpart of format 6
pub(super) fn decode(data: &[u8], offset: usize) -> Result<Mapping, BufferError> {
    let mut cursor = ByteCursor::at(data, offset)?;
    cursor.skip(12)?; // format, reserved, length, language
    let start_char_code = cursor.read_u32()?;
    let num_chars = cursor.read_u32()?;

    let glyphs_len = (num_chars as usize).saturating_mul(2);
    let mut glyphs = ByteCursor::new(cursor.read_bytes(glyphs_len)?);
    let glyphs = (0..num_chars)
        .map(|_| glyphs.read_u16())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(collect_mapping((start_char_code..=MAX_CODE_POINT).zip(glyphs)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tables::cmap::tests::{be16, be32};

    fn format10(start: u32, glyphs: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        be16(&mut out, &[10, 0]);
        be32(&mut out, &[20 + 2 * glyphs.len() as u32, 0, start, glyphs.len() as u32]);
        be16(&mut out, glyphs);
        out
    }

    #[test]
    fn maps_from_the_start_code() {
        let mapping = decode(&format10(0x1D400, &[8, 0, 10]), 0).unwrap();
        assert_eq!(mapping, Mapping::from([(0x1D400, 8), (0x1D402, 10)]));
    }

    #[test]
    fn never_passes_the_last_code_point() {
        let mapping = decode(&format10(0x10FFFF, &[1, 2]), 0).unwrap();
        assert_eq!(mapping, Mapping::from([(0x10FFFF, 1)]));
    }

    #[test]
    fn truncated_array_fails() {
        let mut data = format10(0x100, &[1, 2]);
        data.pop();
        assert!(decode(&data, 0).is_err());
    }
}
