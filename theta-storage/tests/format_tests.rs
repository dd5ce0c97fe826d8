mod common;

use common::{Monster, Player, Position, catalog};
use pretty_assertions::assert_eq;
use theta_model::{EntityType, ModelError, TypeCatalog, ValueBlob};
use theta_registry::{HandleRegistry, RegistryError, Snapshot};
use theta_storage::{
    FORMAT_VERSION, HEADER_LEN, MAGIC, StorageError, decode_field, decode_graph, encode_field,
    encode_graph,
};
use theta_types::{BlobId, EntityRecord, FieldKind, FieldValue, Handle, RawBlob, TypeTag};

/// One monster (hp 7, kind 2, no target) under handle 0.
fn single_monster() -> Vec<u8> {
    let registry = HandleRegistry::new();
    let m = registry.assign(|h| Monster::new(h, 7)).unwrap().detach();
    registry.get::<Monster>(m).unwrap().write().kind = 2;
    encode_graph(&registry.snapshot(), &catalog()).unwrap()
}

/// Handles 0..2 with 0 freed and a monster at 1.
fn freed_then_monster() -> Vec<u8> {
    let registry = HandleRegistry::new();
    let first = registry.assign(|h| Monster::new(h, 1)).unwrap().detach();
    registry.assign(|h| Monster::new(h, 2)).unwrap().detach();
    registry.free(first).unwrap();
    encode_graph(&registry.snapshot(), &catalog()).unwrap()
}

fn assert_format_error(bytes: &[u8]) -> String {
    match decode_graph(bytes, &catalog()) {
        Err(StorageError::FileFormat(msg)) => msg,
        other => panic!("expected FileFormat, got {other:?}"),
    }
}

// ── Layout ──────────────────────────────────────────────────────

#[test]
fn empty_file_is_just_the_header() {
    let bytes = encode_graph(&Snapshot::default(), &catalog()).unwrap();
    assert_eq!(bytes.len(), HEADER_LEN);
    assert_eq!(
        bytes,
        [
            b'T', b'H', b'T', b'A', // magic
            1, 0, 0, 0, // version
            0, 0, 0, 0, // held
            0, 0, 0, 0, // freed
            0, 0, 0, 0, // next
            0, 0, 0, 0, // checksum
        ]
    );
}

#[test]
fn single_entity_layout_is_exact() {
    let parts: [&[u8]; 10] = [
        &MAGIC,
        &FORMAT_VERSION.to_le_bytes(),
        &1i32.to_le_bytes(),
        &0i32.to_le_bytes(),
        &1u32.to_le_bytes(),
        &0u32.to_le_bytes(),
        // entity header: handle 0, tag 2, 3 fields, flags 0
        &[0, 0, 0, 0, 2, 0, 3, 0],
        // hp: i32 7
        &[FieldKind::CODE_I32, 7, 0, 0, 0],
        // kind: u8 2
        &[FieldKind::CODE_U8, 2],
        // target: null ref
        &[FieldKind::CODE_REF, 0xFF, 0xFF, 0xFF, 0xFF],
    ];
    let expected = parts.concat();
    assert_eq!(single_monster(), expected);
}

#[test]
fn freed_list_precedes_slots() {
    let bytes = freed_then_monster();
    // freed list: [0]
    assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + 4], &[0, 0, 0, 0]);
    // slot 0: freed sentinel
    assert_eq!(
        &bytes[HEADER_LEN + 4..HEADER_LEN + 12],
        &[0, 0, 0, 0, 0xFF, 0xFF, 0, 0]
    );
    // slot 1: monster
    assert_eq!(&bytes[HEADER_LEN + 12..HEADER_LEN + 16], &[1, 0, 0, 0]);
}

#[test]
fn checksum_is_written_zero_and_ignored() {
    let mut bytes = single_monster();
    assert_eq!(&bytes[20..24], &[0, 0, 0, 0]);
    bytes[20..24].copy_from_slice(&0xDEAD_BEEFu32.to_le_bytes());
    assert!(decode_graph(&bytes[..], &catalog()).is_ok());
}

#[test]
fn strings_use_seven_bit_length_prefix() {
    let mut out = Vec::new();
    encode_field(&mut out, &FieldValue::String("x".repeat(200)), &catalog()).unwrap();
    assert_eq!(&out[..3], &[FieldKind::CODE_STRING, 0xC8, 0x01]);
    assert_eq!(out.len(), 3 + 200);
}

#[test]
fn array_descriptors_nest() {
    let value = FieldValue::array(
        FieldKind::array_of(FieldKind::Blob(Position::BLOB_ID)),
        vec![FieldValue::array(
            FieldKind::Blob(Position::BLOB_ID),
            Vec::new(),
        )],
    );
    let mut out = Vec::new();
    encode_field(&mut out, &value, &catalog()).unwrap();
    assert_eq!(
        out,
        [
            FieldKind::CODE_ARRAY,
            FieldKind::CODE_ARRAY,
            FieldKind::CODE_BLOB,
            1,
            0,
            1,
            0,
            0,
            0,
            0,
            0,
            0,
            0,
        ]
    );
}

// ── Header validation ───────────────────────────────────────────

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = single_monster();
    bytes[0] = b'X';
    assert!(assert_format_error(&bytes).contains("magic"));
}

#[test]
fn other_version_is_rejected() {
    let mut bytes = single_monster();
    bytes[4..8].copy_from_slice(&2u32.to_le_bytes());
    assert!(assert_format_error(&bytes).contains("version"));
}

#[test]
fn truncated_header_is_rejected() {
    let bytes = single_monster();
    assert!(assert_format_error(&bytes[..10]).contains("truncated"));
    assert_format_error(&[]);
}

#[test]
fn inconsistent_counts_are_rejected() {
    let mut bytes = single_monster();
    bytes[12..16].copy_from_slice(&1i32.to_le_bytes());
    assert_format_error(&bytes);

    let mut bytes = single_monster();
    bytes[8..12].copy_from_slice(&(-1i32).to_le_bytes());
    assert_format_error(&bytes);
}

// ── Body validation ─────────────────────────────────────────────

#[test]
fn truncated_body_is_rejected() {
    let bytes = single_monster();
    assert!(assert_format_error(&bytes[..bytes.len() - 2]).contains("truncated"));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = single_monster();
    bytes.push(0);
    assert!(assert_format_error(&bytes).contains("trailing"));
}

#[test]
fn slot_handle_must_match_position() {
    let mut bytes = single_monster();
    bytes[HEADER_LEN] = 5;
    assert_format_error(&bytes);
}

#[test]
fn live_slot_in_freed_list_is_rejected() {
    let mut bytes = freed_then_monster();
    bytes[HEADER_LEN] = 1;
    assert_format_error(&bytes);
}

#[test]
fn freed_slot_missing_from_list_is_rejected() {
    let mut bytes = freed_then_monster();
    // Turn live slot 1 into a sentinel: three fields become trailing bytes,
    // but the freed-list check fires first.
    bytes[HEADER_LEN + 16..HEADER_LEN + 20].copy_from_slice(&[0xFF, 0xFF, 0, 0]);
    assert!(assert_format_error(&bytes).contains("freed"));
}

#[test]
fn invalid_bool_is_format_error() {
    assert!(matches!(
        decode_field(&[FieldKind::CODE_BOOL, 2][..], &catalog()),
        Err(StorageError::FileFormat(_))
    ));
}

#[test]
fn invalid_utf8_is_format_error() {
    assert!(matches!(
        decode_field(&[FieldKind::CODE_STRING, 2, 0xC3, 0x28][..], &catalog()),
        Err(StorageError::FileFormat(_))
    ));
}

#[test]
fn negative_array_length_is_format_error() {
    let bytes = [
        FieldKind::CODE_ARRAY,
        FieldKind::CODE_I32,
        0xFF,
        0xFF,
        0xFF,
        0xFF,
    ];
    assert!(matches!(
        decode_field(&bytes[..], &catalog()),
        Err(StorageError::FileFormat(_))
    ));
}

#[test]
fn over_nested_descriptor_is_format_error() {
    let mut bytes = vec![FieldKind::CODE_ARRAY; 9];
    bytes.push(FieldKind::CODE_I32);
    assert!(matches!(
        decode_field(&bytes[..], &catalog()),
        Err(StorageError::FileFormat(_))
    ));
}

// ── Schema errors ───────────────────────────────────────────────

#[test]
fn unknown_type_tag_on_read_is_schema_error() {
    let narrow = TypeCatalog::builder()
        .register_blob::<Position>()
        .unwrap()
        .register::<Player>()
        .unwrap()
        .build()
        .unwrap();
    let err = decode_graph(&single_monster()[..], &narrow).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Schema(ModelError::UnknownTypeTag(tag)) if tag == Monster::TYPE_TAG
    ));
}

#[test]
fn unknown_field_code_is_schema_error() {
    let mut bytes = single_monster();
    bytes[HEADER_LEN + 8] = 99;
    assert!(matches!(
        decode_graph(&bytes[..], &catalog()),
        Err(StorageError::Schema(ModelError::UnknownFieldCode(99)))
    ));
}

#[test]
fn descriptor_differing_from_schema_is_schema_error() {
    let mut bytes = single_monster();
    bytes[HEADER_LEN + 8] = FieldKind::CODE_U32;
    assert!(matches!(
        decode_graph(&bytes[..], &catalog()),
        Err(StorageError::Schema(ModelError::FieldMismatch { position: 0, .. }))
    ));
}

#[test]
fn field_count_differing_from_schema_is_schema_error() {
    let mut bytes = single_monster();
    bytes[HEADER_LEN + 6] = 2;
    assert!(matches!(
        decode_graph(&bytes[..], &catalog()),
        Err(StorageError::Schema(ModelError::FieldCount { .. }))
    ));
}

#[test]
fn unregistered_blob_is_schema_error_and_writes_nothing() {
    let mut out = vec![0xAA];
    let value = FieldValue::Blob(RawBlob::new(BlobId::new(42), vec![0; 4]));
    let err = encode_field(&mut out, &value, &catalog()).unwrap_err();
    assert!(matches!(err, StorageError::Schema(ModelError::UnknownBlob(_))));
    assert_eq!(out, vec![0xAA]);
}

#[test]
fn unregistered_blob_inside_array_writes_nothing() {
    let mut out = Vec::new();
    let value = FieldValue::array(FieldKind::Blob(BlobId::new(42)), Vec::new());
    assert!(matches!(
        encode_field(&mut out, &value, &catalog()),
        Err(StorageError::Schema(_))
    ));
    assert!(out.is_empty());
}

#[test]
fn wrong_blob_size_is_schema_error() {
    let mut out = Vec::new();
    let value = FieldValue::Blob(RawBlob::new(Position::BLOB_ID, vec![0; 3]));
    assert!(matches!(
        encode_field(&mut out, &value, &catalog()),
        Err(StorageError::Schema(ModelError::BlobSize { .. }))
    ));
    assert!(out.is_empty());
}

#[test]
fn heterogeneous_array_is_schema_error() {
    let mut out = Vec::new();
    let value = FieldValue::array(FieldKind::I32, vec![FieldValue::I32(1), FieldValue::U8(2)]);
    assert!(matches!(
        encode_field(&mut out, &value, &catalog()),
        Err(StorageError::Schema(_))
    ));
    assert!(out.is_empty());
}

#[test]
fn unregistered_type_on_save_is_schema_error() {
    let record = EntityRecord::new(Handle::new(0), TypeTag::new(500), Vec::new());
    let snapshot = Snapshot::new(1, Vec::new(), vec![record]);
    assert!(matches!(
        encode_graph(&snapshot, &catalog()),
        Err(StorageError::Schema(ModelError::UnknownTypeTag(_)))
    ));
}

#[test]
fn record_not_matching_schema_is_schema_error_on_save() {
    let record = EntityRecord::new(
        Handle::new(0),
        Monster::TYPE_TAG,
        vec![FieldValue::I32(1), FieldValue::U8(0)],
    );
    let snapshot = Snapshot::new(1, Vec::new(), vec![record]);
    assert!(matches!(
        encode_graph(&snapshot, &catalog()),
        Err(StorageError::Schema(ModelError::FieldCount { .. }))
    ));
}

#[test]
fn inconsistent_snapshot_is_rejected_on_save() {
    let snapshot = Snapshot::new(5, Vec::new(), Vec::new());
    assert!(matches!(
        encode_graph(&snapshot, &catalog()),
        Err(StorageError::Registry(RegistryError::InvalidSnapshot(_)))
    ));
}
