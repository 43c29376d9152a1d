//! Builders for the synthetic documents used by the integration tests.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SECTOR_SIZE: usize = 512;
const ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / 128;
const FAT_ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / 4;
const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
const FAT_SECTOR: u32 = 0xFFFF_FFFD;
const FREE: u32 = 0xFFFF_FFFF;

pub fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

fn put_u16(buffer: &mut [u8], offset: usize, value: u16) {
    buffer[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buffer: &mut [u8], offset: usize, value: u32) {
    buffer[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn directory_entry(name: &str, kind: u8, start: u32, size: u32) -> [u8; 128] {
    let mut entry = [0u8; 128];
    let encoded = utf16(name);
    entry[..encoded.len()].copy_from_slice(&encoded);
    put_u16(&mut entry, 64, (encoded.len() + 2) as u16);
    entry[66] = kind;
    put_u32(&mut entry, 68, FREE);
    put_u32(&mut entry, 72, FREE);
    put_u32(&mut entry, 76, FREE);
    put_u32(&mut entry, 116, start);
    put_u32(&mut entry, 120, size);
    entry
}

fn link_chain(fat: &mut [u32], start: usize, count: usize) {
    for sector in start..start + count {
        fat[sector] = if sector + 1 == start + count {
            END_OF_CHAIN
        } else {
            (sector + 1) as u32
        };
    }
}

/// A version 3 compound file holding `streams` in regular sectors only.
///
/// Layout: FAT sectors, then the directory, then each stream's chain.
pub fn compound_file(streams: &[(&str, &[u8])]) -> Vec<u8> {
    let directory_sectors = (streams.len() + 1).div_ceil(ENTRIES_PER_SECTOR);
    let stream_sectors: Vec<usize> = streams
        .iter()
        .map(|(_, data)| data.len().div_ceil(SECTOR_SIZE))
        .collect();
    let payload_sectors = directory_sectors + stream_sectors.iter().sum::<usize>();
    let mut fat_sectors = 1;
    while fat_sectors * FAT_ENTRIES_PER_SECTOR < fat_sectors + payload_sectors {
        fat_sectors += 1;
    }
    assert!(fat_sectors <= 109, "fixture too large for header DIFAT");
    let total_sectors = fat_sectors + payload_sectors;

    let mut fat = vec![FREE; fat_sectors * FAT_ENTRIES_PER_SECTOR];
    for entry in fat.iter_mut().take(fat_sectors) {
        *entry = FAT_SECTOR;
    }
    let directory_start = fat_sectors;
    link_chain(&mut fat, directory_start, directory_sectors);

    let mut directory = Vec::new();
    directory.extend(directory_entry("Root Entry", 5, END_OF_CHAIN, 0));
    let mut next_sector = directory_start + directory_sectors;
    for ((name, data), &count) in streams.iter().zip(&stream_sectors) {
        let start = if count == 0 {
            END_OF_CHAIN
        } else {
            next_sector as u32
        };
        directory.extend(directory_entry(name, 2, start, data.len() as u32));
        link_chain(&mut fat, next_sector, count);
        next_sector += count;
    }
    directory.resize(directory_sectors * SECTOR_SIZE, 0);

    let mut header = vec![0u8; SECTOR_SIZE];
    header[..8].copy_from_slice(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);
    put_u16(&mut header, 0x18, 0x003E);
    put_u16(&mut header, 0x1A, 3);
    put_u16(&mut header, 0x1C, 0xFFFE);
    put_u16(&mut header, 0x1E, 9);
    put_u16(&mut header, 0x20, 6);
    put_u32(&mut header, 0x2C, fat_sectors as u32);
    put_u32(&mut header, 0x30, directory_start as u32);
    put_u32(&mut header, 0x38, 4096);
    put_u32(&mut header, 0x3C, END_OF_CHAIN);
    put_u32(&mut header, 0x40, 0);
    put_u32(&mut header, 0x44, END_OF_CHAIN);
    put_u32(&mut header, 0x48, 0);
    for i in 0..109 {
        let value = if i < fat_sectors { i as u32 } else { FREE };
        put_u32(&mut header, 0x4C + i * 4, value);
    }

    let mut file = header;
    for word in &fat {
        file.extend_from_slice(&word.to_le_bytes());
    }
    file.extend(directory);
    for ((_, data), &count) in streams.iter().zip(&stream_sectors) {
        let mut padded = data.to_vec();
        padded.resize(count * SECTOR_SIZE, 0);
        file.extend(padded);
    }
    assert_eq!(file.len(), (total_sectors + 1) * SECTOR_SIZE);
    file
}

/// Word binary document whose piece table points at `text` stored as
/// UTF-16 at offset 1024 of the `WordDocument` stream.
pub fn word_document(text: &str) -> Vec<u8> {
    const TEXT_OFFSET: usize = 1024;
    let encoded = utf16(text);
    let chars = text.encode_utf16().count() as u32;

    let mut word = vec![0u8; TEXT_OFFSET];
    put_u16(&mut word, 0, 0xA5EC);
    put_u16(&mut word, 0x0A, 0x0200 | 0x0004);
    put_u32(&mut word, 0x18, TEXT_OFFSET as u32);
    put_u32(&mut word, 0x1C, (TEXT_OFFSET + encoded.len()) as u32);
    put_u16(&mut word, 32, 14);
    put_u16(&mut word, 62, 22);
    put_u16(&mut word, 152, 93);
    put_u32(&mut word, 154 + 33 * 8, 16);
    put_u32(&mut word, 154 + 33 * 8 + 4, 21);
    word.extend(encoded);

    let mut table = vec![0u8; 16];
    table.push(0x01);
    table.extend(16u32.to_le_bytes());
    table.extend(0u32.to_le_bytes());
    table.extend(chars.to_le_bytes());
    table.extend([0, 0]);
    table.extend((TEXT_OFFSET as u32).to_le_bytes());
    table.extend([0, 0]);

    compound_file(&[("WordDocument", word.as_slice()), ("1Table", table.as_slice())])
}

/// One presentation record: version/instance, type, length, body.
pub fn ppt_record(ver_inst: u16, record_type: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(&ver_inst.to_le_bytes());
    out.extend_from_slice(&record_type.to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    out
}

/// Presentation with one slide per entry, each slide a list of text atoms.
pub fn presentation(slides: &[&[&str]]) -> Vec<u8> {
    let slides: Vec<u8> = slides
        .iter()
        .flat_map(|lines| {
            let atoms: Vec<u8> = lines
                .iter()
                .flat_map(|line| ppt_record(0, 0x0FA0, &utf16(line)))
                .collect();
            ppt_record(0x000F, 0x03EE, &atoms)
        })
        .collect();
    let document = ppt_record(0x000F, 0x03E8, &slides);
    compound_file(&[("PowerPoint Document", document.as_slice())])
}

/// ZIP archive with the given entries, stored in order.
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer
}

pub fn docx(body: &str) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    zip_archive(&[
        ("[Content_Types].xml", "<Types/>"),
        ("word/document.xml", document.as_str()),
    ])
}

pub fn xlsx(shared_strings: &str, sheets: &[&str]) -> Vec<u8> {
    let sheet_parts: Vec<(String, String)> = sheets
        .iter()
        .enumerate()
        .map(|(i, rows)| {
            (
                format!("xl/worksheets/sheet{}.xml", i + 1),
                format!("<worksheet><sheetData>{rows}</sheetData></worksheet>"),
            )
        })
        .collect();
    let shared = format!("<sst>{shared_strings}</sst>");
    let mut entries = vec![
        ("xl/workbook.xml", "<workbook/>"),
        ("xl/sharedStrings.xml", shared.as_str()),
    ];
    entries.extend(
        sheet_parts
            .iter()
            .map(|(name, xml)| (name.as_str(), xml.as_str())),
    );
    zip_archive(&entries)
}

pub fn pptx(slides: &[&str]) -> Vec<u8> {
    let slide_parts: Vec<(String, String)> = slides
        .iter()
        .enumerate()
        .map(|(i, body)| {
            (
                format!("ppt/slides/slide{}.xml", i + 1),
                format!(
                    r#"<p:sld xmlns:a="urn:a" xmlns:p="urn:p"><p:cSld><p:spTree>{body}</p:spTree></p:cSld></p:sld>"#
                ),
            )
        })
        .collect();
    let mut entries = vec![("ppt/presentation.xml", "<p:presentation/>")];
    entries.extend(
        slide_parts
            .iter()
            .map(|(name, xml)| (name.as_str(), xml.as_str())),
    );
    zip_archive(&entries)
}

pub fn odf(mimetype: &str, body: &str) -> Vec<u8> {
    let content = format!(
        "<office:document-content><office:body>{body}</office:body></office:document-content>"
    );
    zip_archive(&[("mimetype", mimetype), ("content.xml", content.as_str())])
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Indirect object, with a stream when `body` is given.
pub fn pdf_object(number: u32, dict: &str, body: Option<&[u8]>) -> Vec<u8> {
    let mut out = format!("{number} 0 obj\n").into_bytes();
    match body {
        Some(body) => {
            out.extend(format!("<< /Length {}{dict} >>\nstream\n", body.len()).bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendstream\n");
        }
        None => out.extend(format!("<<{dict} >>\n").bytes()),
    }
    out.extend_from_slice(b"endobj\n");
    out
}

/// Stream object whose dictionary declares `length` verbatim, right or not.
pub fn pdf_stream_with_length(number: u32, length: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!("{number} 0 obj\n<< /Length {length} >>\nstream\n").into_bytes();
    out.extend_from_slice(body);
    out.extend_from_slice(b"\nendstream\nendobj\n");
    out
}

pub fn pdf(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut file = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    for object in objects {
        file.extend_from_slice(object);
    }
    file.extend_from_slice(b"trailer\n<< /Root 1 0 R >>\n%%EOF\n");
    file
}
