use tables::{TableError, TableProvider, cmap::CmapError, name::Name};
use tag::{Tag, TagError};
use thiserror::Error;
use tracing::warn;

pub mod buffer;
pub mod tables;
pub mod tag;

pub use tables::cmap::{CharacterMap, ParsedCmap, parse_cmap};
pub use tables::{FontFile, TableDirectory};
pub use tag::tag_to_int;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CharmapError {
    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Cmap(#[from] CmapError),
}

/// Fetches a table by its textual tag, e.g. `"cmap"`.
pub fn table_by_name<'a>(
    font: &impl TableProvider<'a>,
    name: &str,
) -> Result<&'a [u8], CharmapError> {
    Ok(font.expect_table(Tag::new(name)?)?)
}

/// Looks up the font's `cmap` table and parses every subtable of it.
pub fn read_character_maps<'a>(font: &impl TableProvider<'a>) -> Result<ParsedCmap, CharmapError> {
    let cmap = table_by_name(font, "cmap")?;
    Ok(parse_cmap(cmap)?)
}

/// The family name from the font's `name` table, if it has a readable one.
pub fn family_name<'a>(font: &impl TableProvider<'a>) -> Option<String> {
    let data = font.table_data(Tag::NAME)?;
    match Name::from_buffer(data) {
        Ok(name) => name.family_name(),
        Err(err) => {
            warn!("unreadable name table: {err}");
            None
        }
    }
}
