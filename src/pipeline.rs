//! Format pipeline dispatch.
//!
//! Each output format maps to an ordered sequence of external tool
//! invocations. Every format except raw DocBook starts by producing the
//! DocBook intermediate; the HTML-family formats then feed their output
//! through the resource copier. Dispatch is an exhaustive match over
//! [`Format`], so an unhandled format is a compile error.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{Config, Format};
use crate::epub;
use crate::error::{Error, Result};
use crate::resources::copy_resources;
use crate::shell::{Shell, find_executable};

// External executables. Full path names can be substituted when not in the
// system PATH.
pub const ASCIIDOC: &str = "asciidoc";
pub const XSLTPROC: &str = "xsltproc";
pub const DBLATEX: &str = "dblatex";
pub const FOP: &str = "fop";
pub const W3M: &str = "w3m";
pub const LYNX: &str = "lynx";
pub const XMLLINT: &str = "xmllint";
pub const EPUBCHECK: &str = "epubcheck";

/// Global AsciiDoc configuration file directory.
const CONF_DIR: &str = "/etc/asciidoc";

/// Run the conversion pipeline for the configured format and return the
/// primary output artifact path.
///
/// The DocBook intermediate is removed at the end unless artifacts are
/// kept or DocBook itself is the requested output.
pub fn run(config: &Config) -> Result<PathBuf> {
    let shell = Shell::new(config.dry_run, config.verbose > 0);
    let artifact = match config.format {
        Format::Docbook => to_docbook(config, &shell)?,
        Format::Xhtml => to_xhtml(config, &shell)?,
        Format::Manpage => to_manpage(config, &shell)?,
        Format::Chunked | Format::Htmlhelp => to_chunked(config, &shell)?,
        Format::Pdf => to_pdf(config, &shell)?,
        Format::Dvi | Format::Ps | Format::Tex => exec_dblatex(config, &shell)?,
        Format::Text => to_text(config, &shell)?,
        Format::Epub => epub::build_epub(config, &shell)?,
    };
    if !config.keep_artifacts && config.format != Format::Docbook {
        shell.rm(&config.dst_path(".xml"))?;
    }
    Ok(artifact)
}

/// Convert the source document to DocBook XML in the destination
/// directory, validating the result with xmllint unless disabled.
///
/// With `--skip-asciidoc` the previously generated DocBook file must
/// already exist.
pub(crate) fn to_docbook(config: &Config, shell: &Shell) -> Result<PathBuf> {
    let docbook_file = config.dst_path(".xml");
    if config.skip_asciidoc {
        if !docbook_file.is_file() {
            return Err(Error::MissingFile(docbook_file));
        }
        return Ok(docbook_file);
    }
    let mut args = vec!["--backend".to_string(), "docbook".to_string()];
    args.extend(config.asciidoc_args());
    args.push("--out-file".to_string());
    args.push(path_arg(&docbook_file));
    args.push(path_arg(&config.input_file));
    shell.run(ASCIIDOC, &args, None)?;

    if !config.no_xmllint {
        let args = vec![
            "--nonet".to_string(),
            "--noout".to_string(),
            "--valid".to_string(),
            path_arg(&docbook_file),
        ];
        shell.run(XMLLINT, &args, None)?;
    }
    Ok(docbook_file)
}

fn to_xhtml(config: &Config, shell: &Shell) -> Result<PathBuf> {
    let docbook_file = to_docbook(config, shell)?;
    let xhtml_file = config.dst_path(".html");
    let extra = vec!["--output".to_string(), path_arg(&xhtml_file)];
    exec_xsltproc(
        config,
        shell,
        &xsl_file(config)?,
        &docbook_file,
        &config.destination_dir,
        &extra,
    )?;
    if !shell.dry_run {
        copy_resources(
            std::slice::from_ref(&xhtml_file),
            config.src_dir(),
            &config.destination_dir,
            &[],
            &config.resource_dirs,
            shell,
        )?;
    }
    Ok(xhtml_file)
}

fn to_manpage(config: &Config, shell: &Shell) -> Result<PathBuf> {
    let docbook_file = to_docbook(config, shell)?;
    // The manpages stylesheet derives the output file name from the
    // document content, so the artifact is the destination directory.
    exec_xsltproc(
        config,
        shell,
        &xsl_file(config)?,
        &docbook_file,
        &config.destination_dir,
        &[],
    )?;
    Ok(config.destination_dir.clone())
}

fn to_chunked(config: &Config, shell: &Shell) -> Result<PathBuf> {
    let docbook_file = to_docbook(config, shell)?;
    let ext = match config.format {
        Format::Htmlhelp => ".htmlhelp",
        _ => ".chunked",
    };
    let dst_dir = config.dst_path(ext);

    let mut extra = Vec::new();
    if config.format == Format::Htmlhelp {
        for (param, help_ext) in [
            ("htmlhelp.chm", ".chm"),
            ("htmlhelp.hhc", ".hhc"),
            ("htmlhelp.hhp", ".hhp"),
        ] {
            extra.push("--stringparam".to_string());
            extra.push(param.to_string());
            extra.push(config.basename(help_ext));
        }
    }
    extra.push("--stringparam".to_string());
    extra.push("base.dir".to_string());
    extra.push(format!("{}/", config.basename(ext)));

    // Always start from a clean output directory; stale chunks from a
    // previous run must not survive.
    shell.rmtree(&dst_dir)?;
    shell.makedirs(&dst_dir)?;
    exec_xsltproc(
        config,
        shell,
        &xsl_file(config)?,
        &docbook_file,
        &config.destination_dir,
        &extra,
    )?;
    if !shell.dry_run {
        let html_files = find_html_files(&dst_dir);
        copy_resources(
            &html_files,
            config.src_dir(),
            &dst_dir,
            &[],
            &config.resource_dirs,
            shell,
        )?;
    }
    Ok(dst_dir)
}

fn to_pdf(config: &Config, shell: &Shell) -> Result<PathBuf> {
    if config.fop {
        exec_fop(config, shell)
    } else {
        exec_dblatex(config, shell)
    }
}

fn exec_fop(config: &Config, shell: &Shell) -> Result<PathBuf> {
    let docbook_file = to_docbook(config, shell)?;
    let xsl = conf_file("docbook-xsl/fo.xsl")?;
    let fo_file = config.dst_path(".fo");
    let pdf_file = config.dst_path(".pdf");
    let extra = vec!["--output".to_string(), path_arg(&fo_file)];
    exec_xsltproc(
        config,
        shell,
        &xsl,
        &docbook_file,
        &config.destination_dir,
        &extra,
    )?;
    let mut args = config.fop_opts.clone();
    args.push("-fo".to_string());
    args.push(path_arg(&fo_file));
    args.push("-pdf".to_string());
    args.push(path_arg(&pdf_file));
    shell.run(FOP, &args, None)?;
    if !config.keep_artifacts {
        shell.rm(&fo_file)?;
    }
    Ok(pdf_file)
}

fn exec_dblatex(config: &Config, shell: &Shell) -> Result<PathBuf> {
    let docbook_file = to_docbook(config, shell)?;
    let xsl = conf_file("dblatex/asciidoc-dblatex.xsl")?;
    let sty = conf_file("dblatex/asciidoc-dblatex.sty")?;
    let mut args = config.dblatex_args();
    args.push("-t".to_string());
    args.push(config.format.as_str().to_string());
    args.push("-p".to_string());
    args.push(path_arg(&xsl));
    args.push("-s".to_string());
    args.push(path_arg(&sty));
    args.push(path_arg(&docbook_file));
    // dblatex writes its output into the working directory.
    shell.run(DBLATEX, &args, Some(&config.destination_dir))?;
    Ok(config.dst_path(&format!(".{}", config.format.as_str())))
}

fn to_text(config: &Config, shell: &Shell) -> Result<PathBuf> {
    let text_file = config.dst_path(".text");
    let html_file = config.dst_path(".text.html");
    if config.lynx {
        let conf = conf_file("text.conf")?;
        let mut args = config.asciidoc_args();
        args.push("--conf-file".to_string());
        args.push(path_arg(&conf));
        args.push("-b".to_string());
        args.push("html4".to_string());
        args.push("-o".to_string());
        args.push(path_arg(&html_file));
        args.push(path_arg(&config.input_file));
        shell.run(ASCIIDOC, &args, None)?;
        let args = vec!["-dump".to_string(), path_arg(&html_file)];
        shell.run_to_file(LYNX, &args, &text_file)?;
    } else {
        let docbook_file = to_docbook(config, shell)?;
        let extra = vec!["--output".to_string(), path_arg(&html_file)];
        exec_xsltproc(
            config,
            shell,
            &xsl_file(config)?,
            &docbook_file,
            &config.destination_dir,
            &extra,
        )?;
        let args = vec![
            "-cols".to_string(),
            "70".to_string(),
            "-dump".to_string(),
            "-T".to_string(),
            "text/html".to_string(),
            "-no-graph".to_string(),
            path_arg(&html_file),
        ];
        shell.run_to_file(W3M, &args, &text_file)?;
    }
    if !config.keep_artifacts {
        shell.rm(&html_file)?;
    }
    Ok(text_file)
}

/// Run xsltproc with the child's working directory set to `dst_dir`, so
/// stylesheets that emit directory-relative output land in the right
/// place. The parent process working directory is untouched.
pub(crate) fn exec_xsltproc(
    config: &Config,
    shell: &Shell,
    xsl_file: &Path,
    xml_file: &Path,
    dst_dir: &Path,
    extra: &[String],
) -> Result<()> {
    let mut args = config.xsltproc_args();
    args.extend_from_slice(extra);
    args.push(path_arg(xsl_file));
    args.push(path_arg(xml_file));
    shell.run(XSLTPROC, &args, Some(dst_dir))
}

/// Resolve an AsciiDoc configuration file: first next to the asciidoc
/// executable, then in the global configuration directory.
pub(crate) fn conf_file(name: &str) -> Result<PathBuf> {
    let asciidoc =
        find_executable(ASCIIDOC).ok_or_else(|| Error::ToolNotFound(ASCIIDOC.to_string()))?;
    let local = asciidoc
        .parent()
        .unwrap_or_else(|| Path::new("/"))
        .join(name);
    if local.is_file() {
        return Ok(local);
    }
    let global = Path::new(CONF_DIR).join(name);
    if global.is_file() {
        Ok(global)
    } else {
        Err(Error::MissingConfFile(global))
    }
}

/// The DocBook XSL stylesheet for the configured format.
pub(crate) fn xsl_file(config: &Config) -> Result<PathBuf> {
    conf_file(&format!("docbook-xsl/{}.xsl", config.format.as_str()))
}

fn find_html_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "html")
        })
        .map(|e| e.into_path())
        .collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
