//! EPUB assembly: staging tree, OPS content, zip packaging.
//!
//! The staging tree `<output>.epub.d` is created fresh per run, populated
//! by the XSLT transform (an `OEBPS/` subtree with a `content.opf`
//! manifest), enriched with the resources the manifest references, and
//! finally packaged into the `.epub` archive.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{self, EPUBCHECK};
use crate::resources::copy_resources;
use crate::scan;
use crate::shell::Shell;

const MIMETYPE: &str = "application/epub+zip";

/// Build an EPUB archive for `config` and return its path.
pub fn build_epub(config: &Config, shell: &Shell) -> Result<PathBuf> {
    let docbook_file = pipeline::to_docbook(config, shell)?;
    let xsl = pipeline::xsl_file(config)?;
    let epub_file = config.dst_path(".epub");
    let build_dir = config.dst_path(".epub.d");

    shell.rmtree(&build_dir)?;
    shell.makedirs(&build_dir)?;
    pipeline::exec_xsltproc(config, shell, &xsl, &docbook_file, &build_dir, &[])?;

    let ops_dir = build_dir.join("OEBPS");
    if !shell.dry_run {
        // Take resource references from the OPF manifest rather than the
        // generated HTML; the stylesheets' content-derived resource lists
        // can be incomplete.
        let opf = ops_dir.join("content.opf");
        let resources = scan::find_resources(&[opf], "item", "href")?;
        copy_resources(
            &[],
            config.src_dir(),
            &ops_dir,
            &resources,
            &config.resource_dirs,
            shell,
        )?;
    }

    package(&epub_file, &build_dir, shell)?;
    info!("created epub: {}", config.basename(".epub"));

    if !config.keep_artifacts {
        shell.rmtree(&build_dir)?;
    }
    if config.epubcheck {
        // Runs against the finished archive, so staging cleanup above
        // cannot race the checker's read.
        let args = vec![epub_file.to_string_lossy().into_owned()];
        shell.run(EPUBCHECK, &args, None)?;
    }
    Ok(epub_file)
}

/// Package a staging tree as an EPUB archive.
///
/// The first entry is `mimetype`, stored without compression and
/// containing exactly `application/epub+zip`; readers identify the
/// container by those bytes without inflating anything. Every other file
/// in the tree is added with deflate compression, in directory-walk
/// order. The archive is finalized before this returns.
pub fn package(epub_file: &Path, build_dir: &Path, shell: &Shell) -> Result<()> {
    // The mimetype file also lives in the staging tree so a kept tree is
    // a complete, re-packageable image of the archive.
    shell.write(&build_dir.join("mimetype"), MIMETYPE.as_bytes())?;
    info!("archiving: mimetype");
    if shell.dry_run {
        return Ok(());
    }

    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut zip = ZipWriter::new(fs::File::create(epub_file)?);
    zip.start_file("mimetype", stored)?;
    zip.write_all(MIMETYPE.as_bytes())?;

    for entry in WalkDir::new(build_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(build_dir) else {
            continue;
        };
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if name == "mimetype" {
            continue;
        }
        info!("archiving: {name}");
        zip.start_file(&name, deflated)?;
        let mut file = fs::File::open(entry.path())?;
        io::copy(&mut file, &mut zip)?;
    }
    zip.finish()?;
    Ok(())
}
