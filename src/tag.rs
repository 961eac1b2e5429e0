use std::fmt;

use thiserror::Error;

/// Errors produced while converting text into a table tag
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TagError {
    #[error("A table tag must be exactly 4 ASCII characters, got {0:?}")]
    InvalidTag(String),
}

/// A 4 byte table identifier as it appears in the sfnt table directory,
/// e.g. `cmap` or `name`, stored in its packed big-endian form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u32);

impl Tag {
    pub const CMAP: Tag = Tag::from_be_bytes(*b"cmap");
    pub const NAME: Tag = Tag::from_be_bytes(*b"name");

    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    /// Parses a tag from its textual form.
    ///
    /// ```
    /// use charmap_extract::tag::Tag;
    ///
    /// assert_eq!(Tag::new("cmap").unwrap(), Tag::CMAP);
    /// assert!(Tag::new("cmap2").is_err());
    /// ```
    pub fn new(tag: &str) -> Result<Self, TagError> {
        Self::try_from(tag.as_bytes()).map_err(|_| TagError::InvalidTag(tag.to_owned()))
    }

    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl TryFrom<&[u8]> for Tag {
    type Error = TagError;

    fn try_from(value: &[u8]) -> Result<Self, TagError> {
        let bytes: [u8; 4] = value
            .try_into()
            .map_err(|_| TagError::InvalidTag(String::from_utf8_lossy(value).into_owned()))?;

        if !bytes.is_ascii() {
            return Err(TagError::InvalidTag(
                String::from_utf8_lossy(&bytes).into_owned(),
            ));
        }

        Ok(Self::from_be_bytes(bytes))
    }
}

impl From<Tag> for u32 {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.to_be_bytes() {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

/// Packs a 4 character table name into the 32 bit integer the table
/// directory stores, `(b0 << 24) | (b1 << 16) | (b2 << 8) | b3`.
pub fn tag_to_int(tag: &str) -> Result<u32, TagError> {
    Tag::new(tag).map(u32::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_cmap_big_endian() {
        assert_eq!(tag_to_int("cmap"), Ok(0x636D_6170));
        assert_eq!(tag_to_int("cmap"), Ok(u32::from_be_bytes([0x63, 0x6D, 0x61, 0x70])));
        assert_eq!(u32::from(Tag::CMAP), 0x636D_6170);
    }

    #[test]
    fn spaces_are_valid_tag_bytes() {
        assert_eq!(tag_to_int("cvt "), Ok(0x6376_7420));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(tag_to_int("cma"), Err(TagError::InvalidTag("cma".into())));
        assert_eq!(tag_to_int("cmaps"), Err(TagError::InvalidTag("cmaps".into())));
        assert!(tag_to_int("").is_err());
    }

    #[test]
    fn rejects_non_ascii() {
        // "cmé" is 4 bytes in UTF-8 but not ASCII
        assert!(tag_to_int("cmé").is_err());
        assert!(Tag::try_from(&[0x63, 0x6D, 0x61, 0xF0][..]).is_err());
    }

    #[test]
    fn displays_as_text() {
        assert_eq!(Tag::NAME.to_string(), "name");
        assert_eq!(Tag::new("OS/2").unwrap().to_string(), "OS/2");
    }
}
