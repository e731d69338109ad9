#![allow(dead_code)]

use std::io::{Cursor, Read};

/// Read one part of an .xlsx package as text.
pub fn read_part(xlsx: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(xlsx)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut text = String::new();
    part.read_to_string(&mut text).unwrap();
    text
}

pub fn part_names(xlsx: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(xlsx)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// The `s` attribute of a cell in sheet XML, if it has one.
pub fn style_of(sheet_xml: &str, cell_ref: &str) -> Option<u32> {
    let open = format!("<c r=\"{}\"", cell_ref);
    let start = sheet_xml.find(&open)? + open.len();
    let rest = &sheet_xml[start..];
    let tag_end = rest.find('>')?;
    let tag = &rest[..tag_end];
    let s = tag.find(" s=\"")? + 4;
    let len = tag[s..].find('"')?;
    tag[s..s + len].parse().ok()
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
