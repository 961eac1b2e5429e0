use std::{
    collections::{BTreeMap, btree_map::Iter},
    fmt,
};

use thiserror::Error;
use tracing::debug;

use crate::{
    buffer::{BufferError, ByteCursor},
    tag::Tag,
};

pub mod cmap;
pub mod name;

/// Errors from reading the sfnt table directory or slicing a table out of the font
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("The required buffer length is {0} bytes, got {1} bytes")]
    InvalidBufferLength(usize, usize),

    #[error("The font has no '{0}' table")]
    MissingTable(Tag),

    #[error("The '{tag}' table ({length} bytes at offset {offset}) lies outside the font data")]
    TableOutOfBounds { tag: Tag, offset: u32, length: u32 },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// The platform identifier shared by the `cmap` and `name` tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformId {
    Unicode,
    Macintosh,
    Reserved,
    Microsoft,
    Custom,
    Unknown(u16),
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unicode => f.write_str("Unicode"),
            Self::Macintosh => f.write_str("Macintosh"),
            Self::Reserved => f.write_str("ISO"),
            Self::Microsoft => f.write_str("Windows"),
            Self::Custom => f.write_str("Custom"),
            Self::Unknown(value) => write!(f, "platform {value}"),
        }
    }
}

impl From<u16> for PlatformId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Reserved,
            3 => Self::Microsoft,
            4 => Self::Custom,
            _ => Self::Unknown(value),
        }
    }
}

/// Anything able to hand out the raw bytes of an sfnt table by tag.
pub trait TableProvider<'a> {
    /// Returns the bytes of the table with the given tag, or `None`
    /// when the font has no such table.
    fn table_data(&self, tag: Tag) -> Option<&'a [u8]>;

    /// Same as [`TableProvider::table_data`] but reports absence as an error.
    fn expect_table(&self, tag: Tag) -> Result<&'a [u8], TableError> {
        self.table_data(tag).ok_or(TableError::MissingTable(tag))
    }
}

/// The 12-byte sfnt header in front of the table records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    scalar_type: u32,
    num_tables: u16,
}

impl OffsetTable {
    /// Reads the header out of exactly 12 bytes
    pub fn from_buffer(buf: &[u8]) -> Result<Self, TableError> {
        if buf.len() != 12 {
            return Err(TableError::InvalidBufferLength(12, buf.len()));
        }

        let mut cursor = ByteCursor::new(buf);
        let scalar_type = cursor.read_u32()?;
        let num_tables = cursor.read_u16()?;
        // searchRange, entrySelector and rangeShift are only binary search hints

        Ok(Self {
            scalar_type,
            num_tables,
        })
    }

    /// The sfnt version, 0x00010000 or 'true' for TrueType outlines, 'OTTO' for CFF
    pub fn scalar_type(&self) -> u32 {
        self.scalar_type
    }

    /// The number of table records following the header
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }
}

/// Represents metadata for a table within the font file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    /// The checksum of the table.
    pub checksum: u32,
    /// The offset of the table, in bytes, from the beginning of the file.
    pub offset: u32,
    /// The length of this table in bytes, without padding.
    pub length: u32,
}

impl TableRecord {
    /// Constructs a tag and its `TableRecord` from a raw byte buffer.
    ///
    /// This method expects a buffer of exactly 16 bytes, all big-endian:
    ///
    /// * Bytes 0-3: Table tag
    /// * Bytes 4-7: Checksum of the table
    /// * Bytes 8-11: Offset of the table from the beginning of the file
    /// * Bytes 12-15: Length of the table in bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use charmap_extract::{tables::TableRecord, tag::Tag};
    ///
    /// let buffer: [u8; 16] = [
    ///     b'c', b'm', b'a', b'p', // Tag
    ///     0x12, 0x34, 0x56, 0x78, // Checksum: 0x12345678
    ///     0x00, 0x01, 0x00, 0x00, // Offset: 0x00010000
    ///     0x00, 0x00, 0x0A, 0x00, // Length: 0x00000A00
    /// ];
    ///
    /// let (tag, record) = TableRecord::from_buffer(&buffer).unwrap();
    /// assert_eq!(tag, Tag::CMAP);
    /// assert_eq!(record.checksum, 0x12345678);
    /// assert_eq!(record.offset, 0x00010000);
    /// assert_eq!(record.length, 0x00000A00);
    ///
    /// let invalid_buffer: [u8; 10] = [0; 10];
    /// assert!(TableRecord::from_buffer(&invalid_buffer).is_err());
    /// ```
    pub fn from_buffer(buf: &[u8]) -> Result<(Tag, Self), TableError> {
        // Each table record should be EXACTLY 16 bytes
        if buf.len() != 16 {
            return Err(TableError::InvalidBufferLength(16, buf.len()));
        }

        let mut cursor = ByteCursor::new(buf);
        let tag = Tag::from_be_bytes(cursor.read_u32()?.to_be_bytes());

        Ok((
            tag,
            Self {
                checksum: cursor.read_u32()?,
                offset: cursor.read_u32()?,
                length: cursor.read_u32()?,
            },
        ))
    }
}

/// Maps every table tag found in the font to where its data lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDirectory {
    pub offset: OffsetTable,
    records: BTreeMap<Tag, TableRecord>,
}

impl TableDirectory {
    /// Reads the offset table and the table records that follow it.
    pub fn from_buffer(data: &[u8]) -> Result<Self, TableError> {
        let mut cursor = ByteCursor::new(data);
        let offset = OffsetTable::from_buffer(cursor.read_bytes(12)?)?;

        // a table record is 16 bytes, the records follow the offset table
        let raw_records = cursor.read_bytes(usize::from(offset.num_tables()) * 16)?;

        let mut records = BTreeMap::new();
        for raw in raw_records.chunks(16) {
            let (tag, record) = TableRecord::from_buffer(raw)?;
            records.insert(tag, record);
        }

        Ok(Self { offset, records })
    }

    pub fn get(&self, tag: Tag) -> Option<&TableRecord> {
        self.records.get(&tag)
    }

    pub fn iter(&self) -> Iter<'_, Tag, TableRecord> {
        self.records.iter()
    }
}

/// A single (non collection) TrueType / OpenType font held in memory
#[derive(Debug, Clone)]
pub struct FontFile<'a> {
    data: &'a [u8],
    directory: TableDirectory,
}

impl<'a> FontFile<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, TableError> {
        let directory = TableDirectory::from_buffer(data)?;
        debug!(
            "sfnt version {:#010x} with {} tables",
            directory.offset.scalar_type(),
            directory.offset.num_tables()
        );

        // reject records pointing outside the file up front so table_data can't fail later
        for (&tag, record) in directory.iter() {
            let end = u64::from(record.offset) + u64::from(record.length);
            if end > data.len() as u64 {
                return Err(TableError::TableOutOfBounds {
                    tag,
                    offset: record.offset,
                    length: record.length,
                });
            }
        }

        Ok(Self { data, directory })
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.directory
    }
}

impl<'a> TableProvider<'a> for FontFile<'a> {
    fn table_data(&self, tag: Tag) -> Option<&'a [u8]> {
        let record = self.directory.get(tag)?;
        let start = record.offset as usize;
        self.data.get(start..start + record.length as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assembles a minimal sfnt file from (tag, table bytes) pairs
    fn build_font(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
        out.extend_from_slice(&[0u8; 6]);

        let mut offset = 12 + 16 * tables.len();
        let mut body = Vec::new();
        for (tag, data) in tables {
            out.extend_from_slice(*tag);
            out.extend_from_slice(&0u32.to_be_bytes());
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            body.extend_from_slice(data);
            // tables are padded to 4 bytes
            while body.len() % 4 != 0 {
                body.push(0);
            }
            offset = 12 + 16 * tables.len() + body.len();
        }
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn locates_tables_by_tag() {
        let font = build_font(&[(b"cmap", vec![1, 2, 3]), (b"name", vec![9; 8])]);
        let file = FontFile::new(&font).unwrap();

        assert_eq!(file.directory().offset.num_tables(), 2);
        assert_eq!(file.directory().offset.scalar_type(), 0x0001_0000);
        assert_eq!(file.table_data(Tag::CMAP), Some(&[1u8, 2, 3][..]));
        assert_eq!(file.table_data(Tag::NAME), Some(&[9u8; 8][..]));
    }

    #[test]
    fn platform_names() {
        let names = [0, 1, 2, 3, 4, 9]
            .map(|id| PlatformId::from(id).to_string());
        assert_eq!(
            names,
            ["Unicode", "Macintosh", "ISO", "Windows", "Custom", "platform 9"]
        );
    }

    #[test]
    fn missing_table_is_none() {
        let font = build_font(&[(b"head", vec![0; 4])]);
        let file = FontFile::new(&font).unwrap();

        assert_eq!(file.table_data(Tag::CMAP), None);
        assert_eq!(
            file.expect_table(Tag::CMAP),
            Err(TableError::MissingTable(Tag::CMAP))
        );
    }

    #[test]
    fn truncated_directory_is_an_error() {
        let mut font = build_font(&[(b"cmap", vec![0; 4])]);
        font.truncate(20);
        assert!(matches!(
            FontFile::new(&font),
            Err(TableError::Buffer(BufferError::BufferUnderrun { .. }))
        ));
    }

    #[test]
    fn table_past_end_of_file_is_rejected() {
        let mut font = build_font(&[(b"cmap", vec![0; 8])]);
        font.truncate(font.len() - 4);
        assert_eq!(
            FontFile::new(&font).unwrap_err(),
            TableError::TableOutOfBounds {
                tag: Tag::CMAP,
                offset: 28,
                length: 8,
            }
        );
    }
}
