//! charmap - dump the character to glyph mappings of TrueType / OpenType fonts
//!
//! Every subtable of a font's cmap table becomes one text dump, named
//! `charmap_(<family>)_<label>.txt`, with one `U+XXXX<TAB>glyph` line per mapping.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

use charmap_extract::{CharmapError, FontFile, family_name, read_character_maps};
use clap::Parser;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "charmap")]
#[command(about = "Dump the character maps of OpenType fonts", long_about = None)]
struct Args {
    /// Font files to read
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// More font files to read
    #[arg(short = 'f', long = "input-files", num_args = 1..)]
    input_files: Vec<PathBuf>,

    /// Read every font in this directory
    #[arg(short = 'd', long)]
    input_directory: Option<PathBuf>,

    /// File extensions treated as fonts inside the input directory
    #[arg(short = 'e', long = "extension", default_value = "ttf")]
    extensions: Vec<String>,

    /// Write one file per character map here instead of printing to stdout
    #[arg(short = 'o', long)]
    output_directory: Option<PathBuf>,

    /// Don't report fonts that failed to parse
    #[arg(long)]
    quiet: bool,

    /// Use debug logging level
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum DumpError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Charmap(#[from] CharmapError),
}

impl From<charmap_extract::tables::TableError> for DumpError {
    fn from(err: charmap_extract::tables::TableError) -> Self {
        Self::Charmap(err.into())
    }
}

/// One character map rendered as text
struct Dump {
    file_name: String,
    /// Shown next to the file name when dumping to stdout
    header: String,
    contents: String,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let paths = match collect_paths(&args) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error reading input directory: {e}");
            process::exit(1);
        }
    };

    if let Some(dir) = &args.output_directory {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("Error creating {dir:?}: {e}");
            process::exit(1);
        }
    }

    // fonts are independent of each other, parse them in parallel and write in input order
    let results = paths
        .par_iter()
        .map(|path| (path, dump_font(path)))
        .collect::<Vec<_>>();

    let mut failed = false;
    for (path, result) in results {
        let written =
            result.and_then(|dumps| write_dumps(&dumps, args.output_directory.as_deref()));
        if let Err(e) = written {
            failed = true;
            if !args.quiet {
                error!("{path:?}: {e}");
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

fn collect_paths(args: &Args) -> io::Result<Vec<PathBuf>> {
    let mut paths = args.files.clone();
    paths.extend(args.input_files.iter().cloned());

    if let Some(dir) = &args.input_directory {
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_extension(&path, &args.extensions) {
                found.push(path);
            }
        }
        found.sort();
        paths.extend(found);
    }

    Ok(paths)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
}

fn dump_font(path: &Path) -> Result<Vec<Dump>, DumpError> {
    let data = fs::read(path)?;
    let font = FontFile::new(&data)?;
    let maps = read_character_maps(&font)?;

    let family = family_name(&font)
        .or_else(|| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_default();
    debug!("{path:?}: family {family:?}, {} character maps", maps.len());

    Ok(maps
        .iter()
        .map(|map| Dump {
            file_name: sanitize(&format!("charmap_({family})_{}.txt", map.name)),
            header: format!("{} platform, {} entries", map.platform(), map.len()),
            contents: map.to_string(),
        })
        .collect())
}

/// Keeps a generated name from escaping the output directory
fn sanitize(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

fn write_dumps(dumps: &[Dump], output_directory: Option<&Path>) -> Result<(), DumpError> {
    match output_directory {
        Some(dir) => {
            for dump in dumps {
                fs::write(dir.join(&dump.file_name), &dump.contents)?;
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            for dump in dumps {
                writeln!(stdout, "# {} ({})", dump.file_name, dump.header)?;
                stdout.write_all(dump.contents.as_bytes())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_ignores_case() {
        let wanted = vec!["ttf".to_string(), "otf".to_string()];
        assert!(has_extension(Path::new("fonts/Roboto.TTF"), &wanted));
        assert!(has_extension(Path::new("a.otf"), &wanted));
        assert!(!has_extension(Path::new("a.woff2"), &wanted));
        assert!(!has_extension(Path::new("ttf"), &wanted));
    }

    #[test]
    fn sanitize_strips_separators() {
        assert_eq!(
            sanitize("charmap_(A/B)_Platform 3 Encoding 1 Format 4.txt"),
            "charmap_(A_B)_Platform 3 Encoding 1 Format 4.txt"
        );
    }

    #[test]
    fn dumps_are_named_after_the_file_and_platform() {
        // sfnt with a single cmap table holding one (3, 1) format 6 subtable
        let mut font = Vec::new();
        font.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        font.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 0]);
        font.extend_from_slice(b"cmap");
        for value in [0u32, 28, 24] {
            font.extend_from_slice(&value.to_be_bytes());
        }
        for value in [0u16, 1, 3, 1, 0, 12, 6, 12, 0, 0x41, 1, 36] {
            font.extend_from_slice(&value.to_be_bytes());
        }

        let path = std::env::temp_dir().join(format!("charmap-cli-{}.ttf", process::id()));
        fs::write(&path, &font).unwrap();
        let dumps = dump_font(&path);
        fs::remove_file(&path).unwrap();

        let dumps = dumps.unwrap();
        assert_eq!(dumps.len(), 1);
        assert_eq!(
            dumps[0].file_name,
            format!(
                "charmap_({})_Platform 3 Encoding 1 Format 6.txt",
                path.file_stem().unwrap().to_string_lossy()
            )
        );
        assert_eq!(dumps[0].header, "Windows platform, 1 entries");
        assert_eq!(dumps[0].contents, "U+0041\t36\n");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            dump_font(Path::new("/definitely/not/here.ttf")),
            Err(DumpError::Io(_))
        ));
    }
}
