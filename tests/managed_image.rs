//! End-to-end tests over a crafted managed executable.
//!
//! The fixture is a 4096-byte PE32 image with a DOS header, one `.text` section
//! carrying a CLI header, and a minimal metadata directory holding `Module`,
//! `TypeDef`, and `MethodDef` with one row each.

use pescope::metadata::root::{Root, StreamHeader, METADATA_MAGIC};
use pescope::metadata::tables::TableId;
use pescope::metadata::token::Token;
use pescope::metadata::NetDirectory;
use pescope::pe::{DosHeader, Section, SectionFlags, SectionHeader, PE_SIGNATURE};
use pescope::{MappingMode, PeImage, Writer};

const TEXT_RVA: u32 = 0x2000;
const TEXT_RAW: u32 = 0x200;
const META_RVA: u32 = TEXT_RVA + 0x48;

/// Metadata region: root, `#~` with Module/TypeDef/MethodDef, `#Strings`
fn build_metadata() -> Vec<u8> {
    let mut tables = Writer::new();
    tables.write_le::<u32>(0); // reserved
    tables.write_le::<u8>(2); // major version
    tables.write_le::<u8>(0); // minor version
    tables.write_le::<u8>(0); // heap sizes, all narrow
    tables.write_le::<u8>(1); // reserved
    tables.write_le::<u64>(
        (1 << TableId::Module as u8)
            | (1 << TableId::TypeDef as u8)
            | (1 << TableId::MethodDef as u8),
    );
    tables.write_le::<u64>(0); // sorted
    tables.write_le::<u32>(1); // Module rows
    tables.write_le::<u32>(1); // TypeDef rows
    tables.write_le::<u32>(1); // MethodDef rows

    // Module: Generation, Name -> "hello.exe", Mvid, EncId, EncBaseId
    tables.write_le::<u16>(0);
    tables.write_le::<u16>(0x01);
    tables.write_le::<u16>(1);
    tables.write_le::<u16>(0);
    tables.write_le::<u16>(0);

    // TypeDef: Flags, TypeName -> "Program", TypeNamespace, Extends, FieldList, MethodList
    tables.write_le::<u32>(0x0010_0000);
    tables.write_le::<u16>(0x0B);
    tables.write_le::<u16>(0);
    tables.write_le::<u16>(0);
    tables.write_le::<u16>(1);
    tables.write_le::<u16>(1);

    // MethodDef: RVA, ImplFlags, Flags, Name -> "Main", Signature, ParamList
    tables.write_le::<u32>(0x2100);
    tables.write_le::<u16>(0);
    tables.write_le::<u16>(0x0096);
    tables.write_le::<u16>(0x13);
    tables.write_le::<u16>(0x01);
    tables.write_le::<u16>(1);
    let tables_bytes = tables.into_bytes();

    let strings_bytes = b"\0hello.exe\0Program\0Main\0".to_vec();

    // Root: 16 fixed + 12 version ("v4.0.30319\0" padded) + 4, then two headers
    let root_size = 32 + 12 + 20;
    let root = Root {
        signature: METADATA_MAGIC,
        major_version: 1,
        minor_version: 1,
        reserved: 0,
        length: 12,
        version: "v4.0.30319".to_string(),
        flags: 0,
        stream_number: 2,
        stream_headers: vec![
            StreamHeader {
                offset: root_size,
                size: tables_bytes.len() as u32,
                name: "#~".to_string(),
            },
            StreamHeader {
                offset: root_size + tables_bytes.len() as u32,
                size: strings_bytes.len() as u32,
                name: "#Strings".to_string(),
            },
        ],
    };

    let mut writer = Writer::new();
    root.write(&mut writer);
    assert_eq!(writer.pos() as u32, root_size);
    writer.write_bytes(&tables_bytes);
    writer.write_bytes(&strings_bytes);
    writer.into_bytes()
}

/// `.text` payload: CLI header at the section start, metadata right after
fn build_text_section(metadata: &[u8]) -> Vec<u8> {
    let mut writer = Writer::new();

    // COR20 header
    writer.write_le::<u32>(72);
    writer.write_le::<u16>(2); // runtime 2.5
    writer.write_le::<u16>(5);
    writer.write_le::<u32>(META_RVA);
    writer.write_le::<u32>(metadata.len() as u32);
    writer.write_le::<u32>(0x1); // IL_ONLY
    writer.write_le::<u32>(0x0600_0001); // entry point token
    writer.write_zeros(48);
    assert_eq!(writer.pos(), 0x48);

    writer.write_bytes(metadata);
    writer.into_bytes()
}

fn build_image() -> Vec<u8> {
    let metadata = build_metadata();
    let text = build_text_section(&metadata);
    assert!(text.len() <= 0xE00);

    let mut writer = Writer::new();

    DosHeader::minimal().write(&mut writer);
    writer.write_le::<u32>(PE_SIGNATURE);

    // COFF header
    writer.write_le::<u16>(0x014C);
    writer.write_le::<u16>(1);
    writer.write_le::<u32>(0);
    writer.write_le::<u32>(0);
    writer.write_le::<u32>(0);
    writer.write_le::<u16>(224);
    writer.write_le::<u16>(0x0102);

    // Optional header, PE32
    writer.write_le::<u16>(0x010B);
    writer.write_le::<u8>(8);
    writer.write_le::<u8>(0);
    writer.write_le::<u32>(0xE00);
    writer.write_le::<u32>(0);
    writer.write_le::<u32>(0);
    writer.write_le::<u32>(0); // no native entry point
    writer.write_le::<u32>(TEXT_RVA);
    writer.write_le::<u32>(0x4000);
    writer.write_le::<u32>(0x0040_0000);
    writer.write_le::<u32>(0x2000); // section alignment
    writer.write_le::<u32>(0x200); // file alignment
    writer.write_le::<u16>(4);
    writer.write_le::<u16>(0);
    writer.write_le::<u16>(0);
    writer.write_le::<u16>(0);
    writer.write_le::<u16>(4);
    writer.write_le::<u16>(0);
    writer.write_le::<u32>(0);
    writer.write_le::<u32>(0x4000); // size_of_image
    writer.write_le::<u32>(0x200); // size_of_headers
    writer.write_le::<u32>(0);
    writer.write_le::<u16>(3);
    writer.write_le::<u16>(0x8540);
    writer.write_le::<u32>(0x0010_0000);
    writer.write_le::<u32>(0x1000);
    writer.write_le::<u32>(0x0010_0000);
    writer.write_le::<u32>(0x1000);
    writer.write_le::<u32>(0);
    writer.write_le::<u32>(16);
    for slot in 0..16u32 {
        if slot == 14 {
            // CLR runtime header
            writer.write_le::<u32>(TEXT_RVA);
            writer.write_le::<u32>(72);
        } else {
            writer.write_le::<u32>(0);
            writer.write_le::<u32>(0);
        }
    }

    // Section table
    writer.write_bytes(b".text\0\0\0");
    writer.write_le::<u32>(0xE00); // virtual_size covers the raw data
    writer.write_le::<u32>(TEXT_RVA);
    writer.write_le::<u32>(0xE00);
    writer.write_le::<u32>(TEXT_RAW);
    writer.write_le::<u32>(0);
    writer.write_le::<u32>(0);
    writer.write_le::<u16>(0);
    writer.write_le::<u16>(0);
    writer.write_le::<u32>(0x6000_0020);

    writer.align_to(0x200);
    writer.write_bytes(&text);
    writer.write_zeros((TEXT_RAW + 0xE00) as usize - writer.pos());

    let bytes = writer.into_bytes();
    assert_eq!(bytes.len(), 4096);
    bytes
}

#[test]
fn hello_world_managed_executable() {
    let data = build_image();
    let image = PeImage::parse(&data, MappingMode::Unmapped).unwrap();

    assert_eq!(image.sections.len(), 1);
    assert_eq!(image.sections[0].header.name(), ".text");

    let directory = NetDirectory::from_image(&image).unwrap().unwrap();
    assert_eq!(directory.entry_point().value(), 0x0600_0001);
    assert_eq!(directory.entry_point().table(), 0x06);
    assert_eq!(directory.entry_point().row(), 1);

    let tables = directory.tables().unwrap();
    assert_eq!(tables.row_count(TableId::Module), 1);
    assert_eq!(tables.row_count(TableId::TypeDef), 1);
    assert_eq!(tables.row_count(TableId::MethodDef), 1);

    let strings = directory.strings().unwrap();
    let module = tables.row(TableId::Module, 1).unwrap();
    assert_eq!(
        strings.get(module.value("Name").unwrap() as usize).unwrap(),
        "hello.exe"
    );

    let method = tables.row(TableId::MethodDef, 1).unwrap();
    assert_eq!(
        strings.get(method.value("Name").unwrap() as usize).unwrap(),
        "Main"
    );
    assert_eq!(method.value("RVA").unwrap(), 0x2100);
}

#[test]
fn entry_point_resolves_through_the_tables() {
    let data = build_image();
    let image = PeImage::parse(&data, MappingMode::Unmapped).unwrap();
    let directory = NetDirectory::from_image(&image).unwrap().unwrap();

    let resolver = directory.resolver().unwrap();

    let method = resolver
        .resolve(directory.entry_point())
        .unwrap()
        .expect("entry point is non-null");
    assert_eq!(method.table, TableId::MethodDef);
    assert_eq!(method.row, 1);

    // NULL token
    assert!(resolver.resolve(Token::new(0)).unwrap().is_none());

    // Out of range row
    assert!(resolver.resolve(Token::new(0x0600_0002)).is_err());
}

#[test]
fn structural_roundtrip_is_byte_identical() {
    let data = build_image();
    let image = PeImage::parse(&data, MappingMode::Unmapped).unwrap();

    let rebuilt = image.to_bytes().unwrap();
    assert_eq!(rebuilt, data);
}

#[test]
fn adding_a_section_relayouts_the_image() {
    let data = build_image();
    let mut image = PeImage::parse(&data, MappingMode::Unmapped).unwrap();

    let header = SectionHeader::new(
        ".rsrc",
        SectionFlags::CNT_INITIALIZED_DATA | SectionFlags::MEM_READ,
    );
    image.add_section(Section::new(header, vec![0xAB; 0x100]));
    image.update_layout().unwrap();

    let rebuilt = image.to_bytes().unwrap();
    let reparsed = PeImage::parse(&rebuilt, MappingMode::Unmapped).unwrap();

    assert_eq!(reparsed.sections.len(), 2);
    assert_eq!(reparsed.coff.number_of_sections, 2);

    // The metadata survived the rebuild
    let directory = NetDirectory::from_image(&reparsed).unwrap().unwrap();
    assert_eq!(directory.entry_point().value(), 0x0600_0001);
    assert_eq!(
        directory.tables().unwrap().row_count(TableId::MethodDef),
        1
    );

    let rsrc = reparsed.section_by_name(".rsrc").unwrap();
    assert_eq!(rsrc.contents.physical_size(), 0x100);
    assert!(rsrc.header.virtual_address > TEXT_RVA);
}

#[test]
fn mapped_view_exposes_the_same_metadata() {
    let data = build_image();
    let unmapped = PeImage::parse(&data, MappingMode::Unmapped).unwrap();

    // Build the loaded view: headers at 0, .text at its RVA
    let mut mapped = vec![0u8; 0x4000];
    mapped[..0x200].copy_from_slice(&data[..0x200]);
    let text = &data[TEXT_RAW as usize..(TEXT_RAW + 0xE00) as usize];
    mapped[TEXT_RVA as usize..TEXT_RVA as usize + text.len()].copy_from_slice(text);

    let image = PeImage::parse(&mapped, MappingMode::Mapped).unwrap();
    let directory = NetDirectory::from_image(&image).unwrap().unwrap();

    let reference = NetDirectory::from_image(&unmapped).unwrap().unwrap();
    assert_eq!(
        directory.tables().unwrap().row_count(TableId::TypeDef),
        reference.tables().unwrap().row_count(TableId::TypeDef)
    );
    assert_eq!(directory.entry_point(), reference.entry_point());
}
