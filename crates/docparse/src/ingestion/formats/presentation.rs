//! PowerPoint decoding
//!
//! `.pptx` files are read straight from the zip container. Legacy binary
//! `.ppt` files are first converted with LibreOffice when it is installed.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::ingestion::content::{ParsedContent, Section};
use crate::ingestion::registry::DocumentFormat;

const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// LibreOffice binaries, in lookup order
const LIBREOFFICE_BINARIES: &[&str] = &["soffice", "libreoffice"];

pub fn decode(path: &Path) -> Result<ParsedContent> {
    let file = File::open(path)?;

    match zip::ZipArchive::new(file) {
        Ok(archive) => decode_archive(archive),
        Err(zip_err) if is_legacy_ppt(path) => {
            tracing::debug!("{} is not a zip container ({}), converting", path.display(), zip_err);
            let converted_dir = conversion_dir(path)?;
            let converted = convert_with_libreoffice(path, converted_dir.path())?;
            let archive = zip::ZipArchive::new(File::open(&converted)?)
                .map_err(|e| Error::file_parse("presentation", e))?;
            decode_archive(archive)
        }
        Err(zip_err) => Err(Error::file_parse("presentation", zip_err)),
    }
}

/// Conversion output lives next to the staged input, inside the scratch dir
fn conversion_dir(input: &Path) -> std::io::Result<tempfile::TempDir> {
    match input.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => tempfile::tempdir_in(parent),
        None => tempfile::tempdir(),
    }
}

fn is_legacy_ppt(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ppt"))
}

fn decode_archive<R: Read + Seek>(mut archive: zip::ZipArchive<R>) -> Result<ParsedContent> {
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(SLIDE_PREFIX) && name.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();

    if slide_names.is_empty() {
        return Err(Error::file_parse(
            "presentation",
            "no slides found in archive",
        ));
    }

    slide_names.sort_by_key(|name| slide_number(name));

    let mut content = ParsedContent::new(DocumentFormat::Presentation);
    content.total_pages = Some(slide_names.len() as u32);

    for (index, slide_name) in slide_names.iter().enumerate() {
        let mut xml = String::new();
        archive
            .by_name(slide_name)
            .map_err(|e| Error::file_parse("presentation", e))?
            .read_to_string(&mut xml)?;

        let page = index as u32 + 1;
        content.push_section(
            Section::labeled(slide_text(&xml), format!("slide {}", page)).with_page(page),
        );
    }

    Ok(content)
}

/// `ppt/slides/slide12.xml` -> 12
fn slide_number(name: &str) -> u32 {
    name.trim_start_matches(SLIDE_PREFIX)
        .trim_end_matches(".xml")
        .parse::<u32>()
        .unwrap_or(0)
}

/// Text of every `<a:t>` run, one line per `<a:p>` paragraph
fn slide_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut lines: Vec<String> = Vec::new();
    let mut current_line = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(e)) if in_text => {
                if let Ok(text) = e.unescape() {
                    if !current_line.is_empty() {
                        current_line.push(' ');
                    }
                    current_line.push_str(text.trim());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if !current_line.trim().is_empty() {
                        lines.push(std::mem::take(&mut current_line));
                    }
                    current_line.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Stopping at malformed slide XML: {}", e);
                break;
            }
            _ => {}
        }
    }

    if !current_line.trim().is_empty() {
        lines.push(current_line);
    }

    lines.join("\n")
}

/// Convert a legacy `.ppt` into `.pptx` inside `out_dir`
fn convert_with_libreoffice(input: &Path, out_dir: &Path) -> Result<PathBuf> {
    let mut last_error = None;

    for binary in LIBREOFFICE_BINARIES {
        let output = Command::new(binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pptx")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "presentation".to_string());
                let converted = out_dir.join(format!("{}.pptx", stem));
                if converted.exists() {
                    return Ok(converted);
                }
                return Err(Error::file_parse(
                    "PPT",
                    "LibreOffice reported success but produced no .pptx",
                ));
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(Error::file_parse(
                    "PPT",
                    format!("LibreOffice conversion failed: {}", stderr.trim()),
                ));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(Error::file_parse(
        "PPT",
        format!(
            "legacy .ppt files need LibreOffice for conversion ({})",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const SLIDE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree><p:sp><p:txBody>
    <a:p><a:r><a:t>Quarterly</a:t></a:r><a:r><a:t>Results</a:t></a:r></a:p>
    <a:p><a:r><a:t>Revenue &amp; growth</a:t></a:r></a:p>
  </p:txBody></p:sp></p:spTree></p:cSld>
</p:sld>"#;

    fn write_pptx(slides: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new().suffix(".pptx").tempfile().unwrap();
        let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
        for (name, xml) in slides {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        file
    }

    #[test]
    fn test_slide_text() {
        assert_eq!(slide_text(SLIDE_XML), "Quarterly Results\nRevenue & growth");
    }

    #[test]
    fn test_conversion_dir_is_next_to_input() {
        let scratch = tempfile::tempdir().unwrap();
        let input = scratch.path().join("deck.ppt");

        let converted = conversion_dir(&input).unwrap();
        assert_eq!(converted.path().parent(), Some(scratch.path()));
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("ppt/slides/slide12.xml"), 12);
        assert_eq!(slide_number("ppt/slides/slideX.xml"), 0);
    }

    #[test]
    fn test_decode_orders_slides_numerically() {
        let second = SLIDE_XML.replace("Quarterly", "Second");
        let tenth = SLIDE_XML.replace("Quarterly", "Tenth");
        let file = write_pptx(&[
            ("ppt/slides/slide10.xml", tenth.as_str()),
            ("ppt/slides/slide2.xml", second.as_str()),
            ("ppt/slides/slide1.xml", SLIDE_XML),
        ]);

        let content = decode(file.path()).unwrap();
        assert_eq!(content.total_pages, Some(3));
        assert!(content.sections[0].text.starts_with("Quarterly"));
        assert!(content.sections[1].text.starts_with("Second"));
        assert!(content.sections[2].text.starts_with("Tenth"));
        assert_eq!(content.sections[2].label.as_deref(), Some("slide 3"));
    }

    #[test]
    fn test_archive_without_slides() {
        let file = write_pptx(&[("docProps/app.xml", "<Properties/>")]);
        let err = decode(file.path()).unwrap_err();
        assert!(err.to_string().contains("no slides found"));
    }

    #[test]
    fn test_non_zip_pptx_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".pptx").tempfile().unwrap();
        file.write_all(b"plain bytes").unwrap();
        let err = decode(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse presentation"));
    }
}
