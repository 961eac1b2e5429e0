use crate::buffer::{BufferError, ByteCursor};

use super::PlatformId;

/// Name identifier of the font family name record
const FAMILY_NAME_ID: u16 = 1;

/// Represents the [name table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6name.html)
#[derive(Debug)]
pub struct Name<'a> {
    /// The name records, in table order
    name_records: Vec<NameRecord>,

    /// The string storage the records point into.
    /// Kept as raw bytes since the encoding depends on each record's platform
    storage: &'a [u8],
}

impl<'a> Name<'a> {
    pub fn from_buffer(buf: &'a [u8]) -> Result<Self, BufferError> {
        let mut cursor = ByteCursor::new(buf);

        // format 1 only appends language tags, which family names don't use
        cursor.skip(2)?;
        let count = cursor.read_u16()?;
        let string_offset = cursor.read_u16()?;

        // a name record is 12 bytes
        let array_buffer = cursor.read_bytes(usize::from(count) * 12)?;
        let name_records = array_buffer
            .chunks(12)
            .map(NameRecord::from_buffer)
            .collect::<Result<Vec<_>, _>>()?;

        let mut storage = ByteCursor::new(buf);
        storage.seek_to(usize::from(string_offset))?;
        let storage = storage.read_bytes(storage.remaining())?;

        Ok(Self {
            name_records,
            storage,
        })
    }

    /// Returns the font family name (name ID 1), preferring the Windows
    /// record over the Unicode and Macintosh ones. Empty or undecodable
    /// records fall through to the next candidate.
    pub fn family_name(&self) -> Option<String> {
        let preference = |record: &&NameRecord| match record.platform_id {
            PlatformId::Microsoft => 0,
            PlatformId::Unicode => 1,
            PlatformId::Macintosh => 2,
            _ => 3,
        };

        let mut candidates = self
            .name_records
            .iter()
            .filter(|record| record.name_id == FAMILY_NAME_ID)
            .collect::<Vec<_>>();
        candidates.sort_by_key(preference);

        candidates
            .into_iter()
            .find_map(|record| self.decode(record).filter(|name| !name.is_empty()))
    }

    fn decode(&self, record: &NameRecord) -> Option<String> {
        let start = usize::from(record.offset);
        let bytes = self
            .storage
            .get(start..start + usize::from(record.length))?;

        match record.platform_id {
            PlatformId::Unicode | PlatformId::Microsoft => {
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                Some(
                    char::decode_utf16(units)
                        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                        .collect(),
                )
            }
            // Mac Roman agrees with Latin-1 on ASCII, which covers family names in practice
            PlatformId::Macintosh => Some(bytes.iter().map(|&b| char::from(b)).collect()),
            _ => None,
        }
    }
}

/// Represents a name record
#[derive(Debug)]
struct NameRecord {
    /// Platform identifier code.
    platform_id: PlatformId,

    /// Name identifier
    name_id: u16,

    /// Name string length in bytes
    length: u16,

    /// Name string offset in bytes from stringOffset
    offset: u16,
}

impl NameRecord {
    fn from_buffer(buf: &[u8]) -> Result<Self, BufferError> {
        let mut cursor = ByteCursor::new(buf);
        let platform_id = PlatformId::from(cursor.read_u16()?);
        // platform specific encoding and language
        cursor.skip(4)?;

        Ok(Self {
            platform_id,
            name_id: cursor.read_u16()?,
            length: cursor.read_u16()?,
            offset: cursor.read_u16()?,
        })
    }
}
