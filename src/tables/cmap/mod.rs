//! A representation of the [cmap table](https://learn.microsoft.com/en-us/typography/opentype/spec/cmap)
//! which resolves every code point each subtable encodes into a glyph index.
//!
//! Formats 0, 2, 4, 6, 10, 12 and 13 are decoded, anything else comes back as
//! an empty, labeled [`CharacterMap`] so the remaining subtables still get extracted.

use std::{collections::BTreeMap, fmt, ops::RangeInclusive};

use thiserror::Error;
use tracing::{debug, warn};

use crate::buffer::{BufferError, ByteCursor};

use super::PlatformId;

mod format0;
mod format10;
mod format12;
mod format13;
mod format2;
mod format4;
mod format6;

/// The highest Unicode scalar value, 32 bit formats never expand past it
pub const MAX_CODE_POINT: u32 = 0x10_FFFF;

/// Size of one encoding record in the subtable directory
const ENCODING_RECORD_SIZE: usize = 8;

/// Code point to glyph index pairs of one subtable, ordered by code point
pub type Mapping = BTreeMap<u32, u16>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CmapError {
    /// The subtable count claims more encoding records than the table holds
    #[error("cmap directory claims {count} subtables ({needed} bytes) but only {available} bytes follow the header")]
    MalformedDirectory {
        count: u16,
        needed: usize,
        available: usize,
    },

    /// An encoding record points at or past the end of the table
    #[error("cmap subtable ({platform_id}, {encoding_id}) at offset {offset} lies outside the {len} byte table")]
    SubtableOutOfRange {
        platform_id: u16,
        encoding_id: u16,
        offset: u32,
        len: usize,
    },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// An encoding record of the cmap directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtableDescriptor {
    /// The platform identifier
    pub platform_id: u16,

    /// The platform specific encoding identifier
    pub encoding_id: u16,

    /// The offset of the subtable from the start of the cmap table
    pub offset: u32,
}

/// Reads the cmap header and every encoding record, in directory order.
///
/// Unknown versions are tolerated. A directory whose records don't fit in
/// `data`, or that points a subtable outside of it, is rejected as a whole.
pub fn read_directory(data: &[u8]) -> Result<Vec<SubtableDescriptor>, CmapError> {
    let mut cursor = ByteCursor::new(data);

    let version = cursor.read_u16()?;
    if version != 0 {
        warn!("unexpected cmap version {version}, reading it as version 0");
    }

    let count = cursor.read_u16()?;
    let needed = usize::from(count) * ENCODING_RECORD_SIZE;
    if needed > cursor.remaining() {
        return Err(CmapError::MalformedDirectory {
            count,
            needed,
            available: cursor.remaining(),
        });
    }

    debug!("cmap version {version} with {count} subtables");

    (0..count)
        .map(|_| -> Result<SubtableDescriptor, CmapError> {
            let descriptor = SubtableDescriptor {
                platform_id: cursor.read_u16()?,
                encoding_id: cursor.read_u16()?,
                offset: cursor.read_u32()?,
            };
            if descriptor.offset as usize >= data.len() {
                return Err(CmapError::SubtableOutOfRange {
                    platform_id: descriptor.platform_id,
                    encoding_id: descriptor.encoding_id,
                    offset: descriptor.offset,
                    len: data.len(),
                });
            }
            Ok(descriptor)
        })
        .collect()
}

/// The subtable formats, closed over the ones this crate knows how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtableFormat {
    /// Byte encoding table
    Format0,
    /// High-byte mapping through table
    Format2,
    /// Segment mapping to delta values
    Format4,
    /// Trimmed table mapping
    Format6,
    /// Trimmed array
    Format10,
    /// Segmented coverage
    Format12,
    /// Many-to-one range mappings
    Format13,
    /// Any other format number, e.g. 8 or 14
    Unsupported(u16),
}

impl From<u16> for SubtableFormat {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Format0,
            2 => Self::Format2,
            4 => Self::Format4,
            6 => Self::Format6,
            10 => Self::Format10,
            12 => Self::Format12,
            13 => Self::Format13,
            _ => Self::Unsupported(value),
        }
    }
}

impl SubtableFormat {
    /// The raw format number
    pub fn number(self) -> u16 {
        match self {
            Self::Format0 => 0,
            Self::Format2 => 2,
            Self::Format4 => 4,
            Self::Format6 => 6,
            Self::Format10 => 10,
            Self::Format12 => 12,
            Self::Format13 => 13,
            Self::Unsupported(value) => value,
        }
    }

    /// Decodes the subtable starting at `offset`, whose format field has
    /// already been read as `self`.
    fn decode(self, data: &[u8], offset: usize) -> Result<Mapping, BufferError> {
        match self {
            Self::Format0 => format0::decode(data, offset),
            Self::Format2 => format2::decode(data, offset),
            Self::Format4 => format4::decode(data, offset),
            Self::Format6 => format6::decode(data, offset),
            Self::Format10 => format10::decode(data, offset),
            Self::Format12 => format12::decode(data, offset),
            Self::Format13 => format13::decode(data, offset),
            Self::Unsupported(_) => Ok(Mapping::new()),
        }
    }
}

/// Builds a [`Mapping`] out of raw decoded pairs.
///
/// Every decoder funnels its output through here: pairs resolving to glyph 0
/// (`.notdef`) are dropped rather than stored, and when a code point repeats
/// the first pair wins.
fn collect_mapping(pairs: impl IntoIterator<Item = (u32, u16)>) -> Mapping {
    let mut mapping = Mapping::new();
    for (code_point, glyph) in pairs {
        if glyph == 0 {
            continue;
        }
        mapping.entry(code_point).or_insert(glyph);
    }
    mapping
}

/// The code point ranges already claimed by earlier segments or groups.
///
/// The first segment covering a code point decides its glyph, even when that
/// glyph is 0, so a later overlapping segment only walks the codes nobody
/// claimed yet. This keeps the work per subtable bounded by the size of the
/// code space no matter how many segments overlap.
#[derive(Debug, Default)]
struct Coverage {
    /// Disjoint inclusive ranges, keyed by their first code point
    claimed: BTreeMap<u32, u32>,
}

impl Coverage {
    /// Claims `start..=end` and returns the parts of it that were still free.
    fn claim(&mut self, start: u32, end: u32) -> Vec<RangeInclusive<u32>> {
        if start > end {
            return Vec::new();
        }

        // claimed ranges overlapping or directly adjacent to start..=end
        let mut touching = Vec::new();
        if let Some((&first, &last)) = self.claimed.range(..start).next_back() {
            if last.saturating_add(1) >= start {
                touching.push((first, last));
            }
        }
        touching.extend(
            self.claimed
                .range(start..=end.saturating_add(1))
                .map(|(&first, &last)| (first, last)),
        );

        let mut free = Vec::new();
        let mut next = start;
        let mut exhausted = false;
        for &(first, last) in &touching {
            if !exhausted && first > next {
                free.push(next..=(first - 1).min(end));
            }
            if last >= end {
                exhausted = true;
            } else {
                next = next.max(last + 1);
            }
        }
        if !exhausted && next <= end {
            free.push(next..=end);
        }

        let merged_start = touching.first().map_or(start, |&(first, _)| first.min(start));
        let merged_end = touching.last().map_or(end, |&(_, last)| last.max(end));
        for (first, _) in &touching {
            self.claimed.remove(first);
        }
        self.claimed.insert(merged_start, merged_end);

        free
    }
}

/// What came out of decoding one subtable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtableStatus {
    Decoded,
    Unsupported,
    /// The subtable could not be read, its mapping is empty
    Malformed,
}

/// The character to glyph mapping of a single cmap subtable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterMap {
    /// A label built out of the platform, encoding and format, unique within a [`ParsedCmap`]
    pub name: String,
    pub platform_id: u16,
    pub encoding_id: u16,
    /// `None` when the format field itself could not be read
    pub format: Option<SubtableFormat>,
    pub status: SubtableStatus,
    /// Code point to glyph index, zero glyphs are never stored
    pub mapping: Mapping,
}

impl CharacterMap {
    pub fn platform(&self) -> PlatformId {
        PlatformId::from(self.platform_id)
    }

    /// Looks up the glyph of `code_point`, 0 when unmapped
    pub fn glyph(&self, code_point: u32) -> u16 {
        self.mapping.get(&code_point).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    fn label(
        descriptor: &SubtableDescriptor,
        format: Option<SubtableFormat>,
        status: SubtableStatus,
    ) -> String {
        let mut label = format!(
            "Platform {} Encoding {}",
            descriptor.platform_id, descriptor.encoding_id
        );
        if let Some(format) = format {
            label.push_str(&format!(" Format {}", format.number()));
        }
        match status {
            SubtableStatus::Decoded => {}
            SubtableStatus::Unsupported => label.push_str(" (unsupported)"),
            SubtableStatus::Malformed => label.push_str(" (malformed)"),
        }
        label
    }
}

/// One `U+XXXX<TAB>glyph` line per entry, in code point order
impl fmt::Display for CharacterMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (code_point, glyph) in &self.mapping {
            writeln!(f, "U+{code_point:04X}\t{glyph}")?;
        }
        Ok(())
    }
}

/// Every character map of a cmap table, in directory order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCmap {
    maps: Vec<CharacterMap>,
}

impl ParsedCmap {
    pub fn iter(&self) -> std::slice::Iter<'_, CharacterMap> {
        self.maps.iter()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CharacterMap> {
        self.maps.get(index)
    }

    /// The first map for the given platform and encoding
    pub fn find(&self, platform_id: u16, encoding_id: u16) -> Option<&CharacterMap> {
        self.maps
            .iter()
            .find(|map| map.platform_id == platform_id && map.encoding_id == encoding_id)
    }

    fn push(&mut self, mut map: CharacterMap) {
        // the same platform/encoding/format can repeat in broken fonts, tell them apart by position
        if self.maps.iter().any(|existing| existing.name == map.name) {
            map.name = format!("{} #{}", map.name, self.maps.len());
        }
        self.maps.push(map);
    }
}

impl IntoIterator for ParsedCmap {
    type Item = CharacterMap;

    type IntoIter = std::vec::IntoIter<CharacterMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.maps.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParsedCmap {
    type Item = &'a CharacterMap;

    type IntoIter = std::slice::Iter<'a, CharacterMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.maps.iter()
    }
}

/// Decodes a single subtable, never failing: read errors degrade to an empty map.
fn decode_subtable(data: &[u8], descriptor: &SubtableDescriptor) -> CharacterMap {
    let offset = descriptor.offset as usize;

    let raw_format = ByteCursor::at(data, offset).and_then(|mut cursor| cursor.read_u16());

    let (format, status, mapping) = match raw_format {
        Err(err) => {
            warn!(
                "cmap subtable ({}, {}) at offset {offset} is unreadable: {err}",
                descriptor.platform_id, descriptor.encoding_id
            );
            (None, SubtableStatus::Malformed, Mapping::new())
        }
        Ok(raw) => {
            let format = SubtableFormat::from(raw);
            match format.decode(data, offset) {
                Ok(_) if matches!(format, SubtableFormat::Unsupported(_)) => {
                    warn!(
                        "cmap subtable ({}, {}) uses unsupported format {raw}",
                        descriptor.platform_id, descriptor.encoding_id
                    );
                    (Some(format), SubtableStatus::Unsupported, Mapping::new())
                }
                Ok(mapping) => (Some(format), SubtableStatus::Decoded, mapping),
                Err(err) => {
                    warn!(
                        "cmap subtable ({}, {}) format {raw} is malformed: {err}",
                        descriptor.platform_id, descriptor.encoding_id
                    );
                    (Some(format), SubtableStatus::Malformed, Mapping::new())
                }
            }
        }
    };

    CharacterMap {
        name: CharacterMap::label(descriptor, format, status),
        platform_id: descriptor.platform_id,
        encoding_id: descriptor.encoding_id,
        format,
        status,
        mapping,
    }
}

/// Parses a whole cmap table into one [`CharacterMap`] per subtable.
///
/// Errors in the directory abort the parse; a broken subtable only empties
/// its own map.
///
/// # Examples
///
/// ```
/// use charmap_extract::parse_cmap;
///
/// // version 0, one (3, 1) subtable at offset 12 using format 6
/// let data = [
///     0, 0, 0, 1,
///     0, 3, 0, 1, 0, 0, 0, 12,
///     0, 6, 0, 12, 0, 0, // format, length, language
///     0, 0x41, 0, 1,     // first code 'A', 1 entry
///     0, 36,             // glyph 36
/// ];
///
/// let cmap = parse_cmap(&data).unwrap();
/// let map = cmap.get(0).unwrap();
/// assert_eq!(map.name, "Platform 3 Encoding 1 Format 6");
/// assert_eq!(map.glyph(0x41), 36);
/// ```
pub fn parse_cmap(data: &[u8]) -> Result<ParsedCmap, CmapError> {
    let mut parsed = ParsedCmap::default();

    for descriptor in read_directory(data)? {
        let map = decode_subtable(data, &descriptor);
        debug!("{}: {} mapped code points", map.name, map.len());
        parsed.push(map);
    }

    Ok(parsed)
}
