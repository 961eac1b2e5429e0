// https://learn.microsoft.com/en-us/typography/opentype/spec/cmap#format-6-trimmed-table-mapping

use crate::buffer::{BufferError, ByteCursor};

use super::{Mapping, collect_mapping};

/// Decodes a trimmed table: a dense run of 16 bit glyph indices starting at `firstCode`
pub(super) fn decode(data: &[u8], offset: usize) -> Result<Mapping, BufferError> {
    let mut cursor = ByteCursor::at(data, offset)?;
    cursor.skip(6)?; // format, length, language
    let first_code = u32::from(cursor.read_u16()?);
    let count = cursor.read_u16()?;

    let glyphs = (0..count)
        .map(|_| cursor.read_u16())
        .collect::<Result<Vec<_>, _>>()?;

    // the table only addresses 16 bit code points
    Ok(collect_mapping((first_code..=0xFFFF).zip(glyphs)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tables::cmap::tests::be16;

    fn format6(first: u16, glyphs: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        be16(&mut out, &[6, 10 + 2 * glyphs.len() as u16, 0, first, glyphs.len() as u16]);
        be16(&mut out, glyphs);
        out
    }

    #[test]
    fn maps_from_the_first_code() {
        let mapping = decode(&format6(0x20, &[1, 0, 3]), 0).unwrap();
        assert_eq!(mapping, Mapping::from([(0x20, 1), (0x22, 3)]));
    }

    #[test]
    fn empty_table() {
        assert!(decode(&format6(0x20, &[]), 0).unwrap().is_empty());
    }

    #[test]
    fn stops_at_the_end_of_the_bmp() {
        let mapping = decode(&format6(0xFFFE, &[1, 2, 3]), 0).unwrap();
        assert_eq!(mapping, Mapping::from([(0xFFFE, 1), (0xFFFF, 2)]));
    }

    #[test]
    fn truncated_glyph_array_fails() {
        let mut data = format6(0x20, &[1, 2, 3]);
        data.truncate(data.len() - 1);
        assert!(decode(&data, 0).is_err());
    }
}
