//! Command-line surface and validated run configuration.
//!
//! [`Cli`] is the raw clap-parsed surface; [`Config`] is the validated,
//! immutable form the pipelines run against. Validation happens exactly
//! once, before any pipeline step, and every field is explicitly
//! initialized — there is no ambient default fallback.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};

use crate::error::{Error, Result};

/// Output formats, each backed by a conversion pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Chunked,
    Docbook,
    Dvi,
    Epub,
    Htmlhelp,
    Manpage,
    Pdf,
    Ps,
    Tex,
    Text,
    Xhtml,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Chunked => "chunked",
            Format::Docbook => "docbook",
            Format::Dvi => "dvi",
            Format::Epub => "epub",
            Format::Htmlhelp => "htmlhelp",
            Format::Manpage => "manpage",
            Format::Pdf => "pdf",
            Format::Ps => "ps",
            Format::Tex => "tex",
            Format::Text => "text",
            Format::Xhtml => "xhtml",
        }
    }
}

/// AsciiDoc document type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Doctype {
    Article,
    Book,
    Manpage,
}

impl Doctype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Doctype::Article => "article",
            Doctype::Book => "book",
            Doctype::Manpage => "manpage",
        }
    }
}

/// Command-line options.
#[derive(Parser, Debug)]
#[command(name = "docpipe")]
#[command(version, about = "Convert AsciiDoc documents to other file formats", long_about = None)]
#[command(after_help = "EXAMPLES:
    docpipe -f xhtml doc.txt          Convert to a single XHTML page
    docpipe -f epub -D out doc.txt    Build out/doc.epub
    docpipe -f pdf --fop doc.txt      Generate PDF with FOP instead of dblatex")]
pub struct Cli {
    /// AsciiDoc source file
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Format,

    /// Output directory (defaults to FILE's directory)
    #[arg(short = 'D', long, value_name = "PATH")]
    pub destination_dir: Option<PathBuf>,

    /// Document type
    #[arg(short, long, value_enum)]
    pub doctype: Option<Doctype>,

    /// Directory containing images and stylesheets
    #[arg(short = 'r', long = "resource-dir", value_name = "PATH")]
    pub resource_dirs: Vec<PathBuf>,

    /// Set an asciidoc attribute value
    #[arg(short = 'a', long = "attribute", value_name = "ATTRIBUTE")]
    pub attributes: Vec<String>,

    /// Do not delete temporary build files
    #[arg(short, long)]
    pub keep_artifacts: bool,

    /// Do not check asciidoc output with xmllint
    #[arg(short = 'L', long)]
    pub no_xmllint: bool,

    /// Skip asciidoc execution (a previously generated DocBook file must exist)
    #[arg(short, long)]
    pub skip_asciidoc: bool,

    /// Target HTML CSS stylesheet file name
    #[arg(long, value_name = "STYLESHEET")]
    pub stylesheet: Option<String>,

    /// Use admonition, callout and navigation icons
    #[arg(long)]
    pub icons: bool,

    /// Admonition and navigation icon directory
    #[arg(long, value_name = "PATH")]
    pub icons_dir: Option<PathBuf>,

    /// Use lynx to generate text files
    #[arg(long)]
    pub lynx: bool,

    /// Check EPUB output with epubcheck
    #[arg(long)]
    pub epubcheck: bool,

    /// Use FOP to generate PDF files
    #[arg(long)]
    pub fop: bool,

    /// Just print the commands that would have been executed
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Increase verbosity
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Additional asciidoc options
    #[arg(long, value_name = "OPTS")]
    pub asciidoc_opts: Option<String>,

    /// Additional xsltproc options
    #[arg(long, value_name = "OPTS")]
    pub xsltproc_opts: Option<String>,

    /// Additional dblatex options
    #[arg(long, value_name = "OPTS")]
    pub dblatex_opts: Option<String>,

    /// Additional FOP options
    #[arg(long, value_name = "OPTS")]
    pub fop_opts: Option<String>,
}

/// Validated, immutable configuration for one conversion run.
#[derive(Debug)]
pub struct Config {
    pub input_file: PathBuf,
    pub format: Format,
    pub destination_dir: PathBuf,
    pub doctype: Doctype,
    pub resource_dirs: Vec<PathBuf>,
    pub attributes: Vec<String>,
    pub asciidoc_opts: Vec<String>,
    pub xsltproc_opts: Vec<String>,
    pub dblatex_opts: Vec<String>,
    pub fop_opts: Vec<String>,
    pub stylesheet: Option<String>,
    pub icons: bool,
    pub icons_dir: Option<PathBuf>,
    pub keep_artifacts: bool,
    pub no_xmllint: bool,
    pub skip_asciidoc: bool,
    pub lynx: bool,
    pub epubcheck: bool,
    pub fop: bool,
    pub dry_run: bool,
    pub verbose: u8,
}

impl Config {
    /// Validate command-line options and resolve defaults.
    ///
    /// Fails before any pipeline step runs: the source file must exist, an
    /// explicitly given destination directory must exist, and every
    /// resource directory must exist.
    pub fn new(cli: &Cli) -> Result<Config> {
        if !cli.input.is_file() {
            return Err(Error::MissingFile(cli.input.clone()));
        }
        let input_file = std::path::absolute(&cli.input)?;

        let destination_dir = match &cli.destination_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(Error::MissingDirectory(dir.clone()));
                }
                std::path::absolute(dir)?
            }
            None => input_file
                .parent()
                .unwrap_or_else(|| Path::new("/"))
                .to_path_buf(),
        };

        for dir in &cli.resource_dirs {
            if !dir.is_dir() {
                return Err(Error::MissingDirectory(dir.clone()));
            }
        }

        let doctype = cli.doctype.unwrap_or(match cli.format {
            Format::Manpage => Doctype::Manpage,
            _ => Doctype::Article,
        });

        Ok(Config {
            input_file,
            format: cli.format,
            destination_dir,
            doctype,
            resource_dirs: cli.resource_dirs.clone(),
            attributes: cli.attributes.clone(),
            asciidoc_opts: split_opts(cli.asciidoc_opts.as_deref()),
            xsltproc_opts: split_opts(cli.xsltproc_opts.as_deref()),
            dblatex_opts: split_opts(cli.dblatex_opts.as_deref()),
            fop_opts: split_opts(cli.fop_opts.as_deref()),
            stylesheet: cli.stylesheet.clone(),
            icons: cli.icons,
            icons_dir: cli.icons_dir.clone(),
            keep_artifacts: cli.keep_artifacts,
            no_xmllint: cli.no_xmllint,
            skip_asciidoc: cli.skip_asciidoc,
            lynx: cli.lynx,
            epubcheck: cli.epubcheck,
            fop: cli.fop,
            dry_run: cli.dry_run,
            verbose: cli.verbose,
        })
    }

    /// Directory containing the source document.
    pub fn src_dir(&self) -> &Path {
        self.input_file.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Base name of the source file with `ext` appended (`ext` includes the
    /// leading dot).
    pub fn basename(&self, ext: &str) -> String {
        let stem = self
            .input_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{stem}{ext}")
    }

    /// Path of the output file or directory named after the source file but
    /// with extension `ext`, in the destination directory.
    pub fn dst_path(&self, ext: &str) -> PathBuf {
        self.destination_dir.join(self.basename(ext))
    }

    /// Argument vector passed to every asciidoc invocation.
    pub fn asciidoc_args(&self) -> Vec<String> {
        let mut args = self.asciidoc_opts.clone();
        args.push("--doctype".to_string());
        args.push(self.doctype.as_str().to_string());
        for attr in &self.attributes {
            args.push("--attribute".to_string());
            args.push(attr.clone());
        }
        if self.verbose > 0 {
            args.push("--verbose".to_string());
        }
        args
    }

    /// Argument vector passed to every xsltproc invocation: user options,
    /// `--nonet`, and stringparams derived from the icon and stylesheet
    /// options.
    pub fn xsltproc_args(&self) -> Vec<String> {
        let mut args = self.xsltproc_opts.clone();
        args.push("--nonet".to_string());

        let mut params: Vec<(String, String)> = Vec::new();
        if self.icons || self.icons_dir.is_some() {
            params.push(("callout.graphics".into(), "1".into()));
            params.push(("navig.graphics".into(), "0".into()));
            params.push(("admon.textlabel".into(), "0".into()));
            params.push(("admon.graphics".into(), "1".into()));
            if let Some(dir) = &self.icons_dir {
                let dir = dir.display();
                params.push(("admon.graphics.path".into(), format!("{dir}/")));
                params.push(("callout.graphics.path".into(), format!("{dir}/callouts/")));
                params.push(("navig.graphics.path".into(), format!("{dir}/")));
            }
        } else {
            params.push(("callout.graphics".into(), "0".into()));
            params.push(("navig.graphics".into(), "0".into()));
            params.push(("admon.textlabel".into(), "1".into()));
            params.push(("admon.graphics".into(), "0".into()));
        }
        if let Some(stylesheet) = &self.stylesheet {
            params.push(("html.stylesheet".into(), stylesheet.clone()));
        }

        for (name, value) in params {
            args.push("--stringparam".to_string());
            args.push(name);
            args.push(value);
        }
        args
    }

    /// Argument vector prefix for dblatex invocations.
    pub fn dblatex_args(&self) -> Vec<String> {
        let mut args = self.dblatex_opts.clone();
        if self.verbose > 0 {
            args.push("-V".to_string());
        }
        args
    }
}

fn split_opts(opts: Option<&str>) -> Vec<String> {
    opts.map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}
