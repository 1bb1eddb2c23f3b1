//! Minimal xlsx writer for test fixtures

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_DOC_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

/// One fixture cell
#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

pub fn t(value: &str) -> Cell {
    Cell::Text(value.to_string())
}

pub fn n(value: f64) -> Cell {
    Cell::Number(value)
}

/// Header row used by the provider sheets in these tests
pub fn provider_headers() -> Vec<Cell> {
    [
        "Organisation Code",
        "Treatment Function",
        "Period Ending",
        "Median Wait (weeks)",
        "% waiting over 18 weeks",
        "% > 52 weeks",
    ]
    .iter()
    .map(|h| t(h))
    .collect()
}

/// Write a workbook whose sheets appear in the given order
pub fn write_xlsx(path: &Path, sheets: &[(&str, Vec<Vec<Cell>>)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let mut put = |name: &str, body: String| {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    };

    let overrides: String = (1..=sheets.len())
        .map(|i| {
            format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="{}"/>"#,
                i, CT_WORKSHEET
            )
        })
        .collect();
    put(
        "[Content_Types].xml",
        format!(
            concat!(
                "{}<Types xmlns=\"{}\">",
                "<Default Extension=\"rels\" ContentType=\"{}\"/>",
                "<Default Extension=\"xml\" ContentType=\"application/xml\"/>",
                "<Override PartName=\"/xl/workbook.xml\" ContentType=\"{}\"/>",
                "{}</Types>"
            ),
            XML_DECL, NS_CONTENT_TYPES, CT_RELS, CT_WORKBOOK, overrides
        ),
    );

    put(
        "_rels/.rels",
        format!(
            concat!(
                "{}<Relationships xmlns=\"{}\">",
                "<Relationship Id=\"rId1\" Type=\"{}/officeDocument\" Target=\"xl/workbook.xml\"/>",
                "</Relationships>"
            ),
            XML_DECL, NS_PACKAGE_RELS, NS_DOC_RELS
        ),
    );

    let sheet_entries: String = sheets
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(name),
                i + 1,
                i + 1
            )
        })
        .collect();
    put(
        "xl/workbook.xml",
        format!(
            concat!(
                "{}<workbook xmlns=\"{}\" xmlns:r=\"{}\">",
                "<sheets>{}</sheets></workbook>"
            ),
            XML_DECL, NS_MAIN, NS_DOC_RELS, sheet_entries
        ),
    );

    let relationships: String = (1..=sheets.len())
        .map(|i| {
            format!(
                concat!(
                    "<Relationship Id=\"rId{i}\" Type=\"{}/worksheet\" ",
                    "Target=\"worksheets/sheet{i}.xml\"/>"
                ),
                NS_DOC_RELS,
                i = i
            )
        })
        .collect();
    put(
        "xl/_rels/workbook.xml.rels",
        format!(
            "{}<Relationships xmlns=\"{}\">{}</Relationships>",
            XML_DECL, NS_PACKAGE_RELS, relationships
        ),
    );

    for (i, (_, rows)) in sheets.iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(rows));
    }

    zip.finish().unwrap();
}

fn sheet_xml(rows: &[Vec<Cell>]) -> String {
    let mut body = String::new();
    for (r, row) in rows.iter().enumerate() {
        let row_ref = r + 1;
        body.push_str(&format!(r#"<row r="{row_ref}">"#));
        for (c, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_name(c), row_ref);
            match cell {
                Cell::Text(value) => body.push_str(&format!(
                    r#"<c r="{cell_ref}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(value)
                )),
                Cell::Number(value) => {
                    body.push_str(&format!(r#"<c r="{cell_ref}"><v>{value}</v></c>"#))
                }
                Cell::Blank => {}
            }
        }
        body.push_str("</row>");
    }

    format!(
        "{}<worksheet xmlns=\"{}\"><sheetData>{}</sheetData></worksheet>",
        XML_DECL, NS_MAIN, body
    )
}

fn column_name(mut idx: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    name
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
