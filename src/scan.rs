//! Resource scanning: extract local URI references from generated markup.
//!
//! Conversion pipelines need to know which images and stylesheets a
//! generated HTML file (or an EPUB package manifest) refers to, so they can
//! be copied next to the output. Only same-machine references are of
//! interest; `http://...` and friends are left alone.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use percent_encoding::percent_decode_str;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::Result;

/// Attribute name (lowercased) to value mapping for one element.
pub type AttrMap = HashMap<String, String>;

/// Search `files` for local URIs in `attribute` values of `tag` elements.
///
/// Handles both open (`<img ...>`) and self-closing (`<img .../>`) forms.
/// Non-local URIs are skipped. Returns a deduplicated, lexicographically
/// sorted list. Unreadable or unparseable markup is a fatal error.
pub fn find_resources<P: AsRef<Path>>(
    files: &[P],
    tag: &str,
    attribute: &str,
) -> Result<Vec<String>> {
    find_resources_with(files, tag, attribute, |_| true)
}

/// Like [`find_resources`], keeping only elements whose attribute map
/// satisfies `filter`.
pub fn find_resources_with<P: AsRef<Path>>(
    files: &[P],
    tag: &str,
    attribute: &str,
    filter: impl Fn(&AttrMap) -> bool,
) -> Result<Vec<String>> {
    let mut found = BTreeSet::new();
    for file in files {
        let content = fs::read_to_string(file)?;
        scan_markup(&content, tag, attribute, &filter, &mut found)?;
    }
    Ok(found.into_iter().collect())
}

fn scan_markup(
    content: &str,
    tag: &str,
    attribute: &str,
    filter: &dyn Fn(&AttrMap) -> bool,
    found: &mut BTreeSet<String>,
) -> Result<()> {
    let mut reader = Reader::from_str(content);
    // Generated HTML is not always well-formed XML; don't insist on
    // matching end tags.
    reader.config_mut().check_end_names = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                if e.name().local_name().as_ref().eq_ignore_ascii_case(tag.as_bytes()) {
                    let attrs = attr_map(&e);
                    if filter(&attrs)
                        && let Some(value) = attrs.get(attribute)
                        && let Some(path) = local_ref(value)
                    {
                        found.insert(path);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

fn attr_map(e: &BytesStart) -> AttrMap {
    let mut attrs = AttrMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_ascii_lowercase();
        let raw = String::from_utf8_lossy(&attr.value);
        // Entity references in HTML attributes are not always the XML five;
        // fall back to the raw text rather than failing.
        let value = match unescape(&raw) {
            Ok(v) => v.into_owned(),
            Err(_) => raw.to_string(),
        };
        attrs.insert(key, value);
    }
    attrs
}

/// Classify a URI, returning its percent-decoded path component when it is
/// a same-machine reference: no scheme (or `file`), no network location,
/// non-empty path. Query strings and fragments are stripped.
fn local_ref(value: &str) -> Option<String> {
    let mut rest = value;
    if let Some(i) = rest.find('#') {
        rest = &rest[..i];
    }
    if let Some(i) = rest.find('?') {
        rest = &rest[..i];
    }
    if let Some(i) = rest.find(':') {
        let scheme = &rest[..i];
        if is_scheme(scheme) {
            if !scheme.eq_ignore_ascii_case("file") {
                return None;
            }
            rest = &rest[i + 1..];
        }
    }
    if let Some(authority) = rest.strip_prefix("//") {
        // `file://host/...` points at another machine; `file:///...` has an
        // empty authority and is local.
        if !authority.starts_with('/') && !authority.is_empty() {
            return None;
        }
        rest = authority;
    }
    if rest.is_empty() {
        return None;
    }
    Some(percent_decode_str(rest).decode_utf8_lossy().into_owned())
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
