use boxtree::decode::sample_table::GroupDescription;
use boxtree::{decode_tree, BoxFields};

fn plain_box(typ: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&((8 + body.len()) as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(body);
    v
}

fn full_box(typ: &[u8; 4], version: u8, flags: u32, body: &[u8]) -> Vec<u8> {
    let mut payload = ((version as u32) << 24 | (flags & 0x00ff_ffff))
        .to_be_bytes()
        .to_vec();
    payload.extend_from_slice(body);
    plain_box(typ, &payload)
}

#[test]
fn stts_entries() {
    let mut b = Vec::new();
    b.extend_from_slice(&2u32.to_be_bytes());
    for (count, delta) in [(10u32, 512u32), (1, 256)] {
        b.extend_from_slice(&count.to_be_bytes());
        b.extend_from_slice(&delta.to_be_bytes());
    }

    let tree = decode_tree(&full_box(b"stts", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::TimeToSample(t) => {
            assert_eq!(t.entry_count, 2);
            assert_eq!(t.entries[0].sample_count, 10);
            assert_eq!(t.entries[1].sample_delta, 256);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn ctts_offset_sign_depends_on_version() {
    let mut b = Vec::new();
    b.extend_from_slice(&1u32.to_be_bytes());
    b.extend_from_slice(&1u32.to_be_bytes());
    b.extend_from_slice(&(-512i32).to_be_bytes());

    let v1 = decode_tree(&full_box(b"ctts", 1, 0, &b), None).expect("v1");
    let v0 = decode_tree(&full_box(b"ctts", 0, 0, &b), None).expect("v0");
    let (BoxFields::CompositionOffset(c1), BoxFields::CompositionOffset(c0)) =
        (&v1[0].fields, &v0[0].fields)
    else {
        panic!("expected composition offsets");
    };
    assert_eq!(c1.entries[0].sample_offset, -512);
    // the same bit pattern is unsigned in version 0
    assert_eq!(c0.entries[0].sample_offset, (-512i32) as u32 as i64);
}

#[test]
fn stsz_with_common_size_has_no_table() {
    let mut b = Vec::new();
    b.extend_from_slice(&1024u32.to_be_bytes());
    b.extend_from_slice(&30u32.to_be_bytes());

    let tree = decode_tree(&full_box(b"stsz", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleSize(s) => {
            assert_eq!(s.sample_size, 1024);
            assert_eq!(s.sample_count, 30);
            assert!(s.entry_sizes.is_empty());
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn stsz_per_sample_sizes() {
    let mut b = Vec::new();
    b.extend_from_slice(&0u32.to_be_bytes());
    b.extend_from_slice(&3u32.to_be_bytes());
    for s in [5u32, 6, 7] {
        b.extend_from_slice(&s.to_be_bytes());
    }

    let tree = decode_tree(&full_box(b"stsz", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleSize(s) => assert_eq!(s.entry_sizes, vec![5, 6, 7]),
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn stz2_nibble_sizes() {
    let mut b = Vec::new();
    b.extend_from_slice(&[0u8; 3]); // reserved
    b.push(4); // field_size
    b.extend_from_slice(&3u32.to_be_bytes());
    b.extend_from_slice(&[0xab, 0xc0]);

    let tree = decode_tree(&full_box(b"stz2", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::CompactSampleSize(s) => {
            assert_eq!(s.field_size, 4);
            assert_eq!(s.entry_sizes, vec![0xa, 0xb, 0xc]);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn stz2_rejects_odd_field_size() {
    let mut b = Vec::new();
    b.extend_from_slice(&[0u8; 3]);
    b.push(7);
    b.extend_from_slice(&1u32.to_be_bytes());
    b.push(0);

    let err = decode_tree(&full_box(b"stz2", 0, 0, &b), None).expect_err("must fail");
    assert!(err.to_string().contains("stz2"));
}

#[test]
fn chunk_offsets_32_and_64() {
    let mut b32 = Vec::new();
    b32.extend_from_slice(&2u32.to_be_bytes());
    b32.extend_from_slice(&100u32.to_be_bytes());
    b32.extend_from_slice(&200u32.to_be_bytes());

    let mut b64 = Vec::new();
    b64.extend_from_slice(&1u32.to_be_bytes());
    b64.extend_from_slice(&(1u64 << 33).to_be_bytes());

    let stco = decode_tree(&full_box(b"stco", 0, 0, &b32), None).expect("stco");
    let co64 = decode_tree(&full_box(b"co64", 0, 0, &b64), None).expect("co64");
    match (&stco[0].fields, &co64[0].fields) {
        (BoxFields::ChunkOffset(a), BoxFields::ChunkOffset64(b)) => {
            assert_eq!(a.chunk_offsets, vec![100, 200]);
            assert_eq!(b.chunk_offsets, vec![1 << 33]);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn padb_pairs_pack_two_samples_per_byte() {
    let mut b = Vec::new();
    b.extend_from_slice(&3u32.to_be_bytes());
    b.extend_from_slice(&[0x52, 0x30]);

    let tree = decode_tree(&full_box(b"padb", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::PaddingBits(p) => assert_eq!(p.pads, vec![5, 2, 3]),
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn sdtp_bitfields() {
    let b = [0b01_10_11_01u8, 0];
    let tree = decode_tree(&full_box(b"sdtp", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleDependency(s) => {
            assert_eq!(s.entries.len(), 2);
            let e = &s.entries[0];
            assert_eq!(e.is_leading, 1);
            assert_eq!(e.sample_depends_on, 2);
            assert_eq!(e.sample_is_depended_on, 3);
            assert_eq!(e.sample_has_redundancy, 1);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn sbgp_version_one_parameter() {
    let mut b = Vec::new();
    b.extend_from_slice(b"roll");
    b.extend_from_slice(&77u32.to_be_bytes()); // grouping_type_parameter
    b.extend_from_slice(&1u32.to_be_bytes());
    b.extend_from_slice(&30u32.to_be_bytes());
    b.extend_from_slice(&1u32.to_be_bytes());

    let tree = decode_tree(&full_box(b"sbgp", 1, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleToGroup(s) => {
            assert_eq!(s.grouping_type, u32::from_be_bytes(*b"roll"));
            assert_eq!(s.grouping_type_parameter, Some(77));
            assert_eq!(s.entries[0].sample_count, 30);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn sgpd_roll_entries() {
    let mut b = Vec::new();
    b.extend_from_slice(b"roll");
    b.extend_from_slice(&2u32.to_be_bytes()); // default_length
    b.extend_from_slice(&2u32.to_be_bytes()); // entry_count
    b.extend_from_slice(&(-1i16).to_be_bytes());
    b.extend_from_slice(&(-2i16).to_be_bytes());

    let tree = decode_tree(&full_box(b"sgpd", 1, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleGroupDescription(g) => {
            assert_eq!(g.grouping_type, "roll");
            assert_eq!(g.default_length, Some(2));
            assert_eq!(g.entry_count, 2);
            match g.entries[1].description {
                GroupDescription::Roll { roll_distance } => assert_eq!(roll_distance, -2),
                ref other => panic!("unexpected description: {:?}", other),
            }
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn sgpd_unknown_grouping_kept_raw() {
    let mut b = Vec::new();
    b.extend_from_slice(b"tele");
    b.extend_from_slice(&0u32.to_be_bytes()); // per-entry lengths
    b.extend_from_slice(&1u32.to_be_bytes());
    b.extend_from_slice(&3u32.to_be_bytes()); // description_length
    b.extend_from_slice(&[9, 8, 7]);

    let tree = decode_tree(&full_box(b"sgpd", 1, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleGroupDescription(g) => {
            assert_eq!(g.entries[0].description_length, Some(3));
            match &g.entries[0].description {
                GroupDescription::Raw { data } => assert_eq!(data, &vec![9, 8, 7]),
                other => panic!("unexpected description: {:?}", other),
            }
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn sgpd_version_zero_entries_delimited_by_record_size() {
    // No length fields: each record's leading u32 size bounds the entry.
    let mut rec = Vec::new();
    rec.extend_from_slice(&12u32.to_be_bytes());
    rec.extend_from_slice(b"tele");
    rec.extend_from_slice(&[1, 2, 3, 4]);

    let mut b = Vec::new();
    b.extend_from_slice(b"tele");
    b.extend_from_slice(&2u32.to_be_bytes()); // entry_count
    b.extend_from_slice(&rec);
    b.extend_from_slice(&rec);

    let tree = decode_tree(&full_box(b"sgpd", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleGroupDescription(g) => {
            assert_eq!(g.default_length, None);
            assert_eq!(g.entries.len(), 2);
            for entry in &g.entries {
                assert!(entry.description_length.is_none());
                match &entry.description {
                    GroupDescription::Raw { data } => {
                        assert_eq!(data.len(), 12);
                        assert_eq!(&data[4..8], b"tele");
                    }
                    other => panic!("unexpected description: {:?}", other),
                }
            }
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn sgpd_rejects_undersized_record() {
    let mut b = Vec::new();
    b.extend_from_slice(b"tele");
    b.extend_from_slice(&1u32.to_be_bytes()); // entry_count
    b.extend_from_slice(&2u32.to_be_bytes()); // record size below its own field

    let err = decode_tree(&full_box(b"sgpd", 0, 0, &b), None).expect_err("undersized record");
    assert!(err.source.to_string().contains("sgpd"));
}

#[test]
fn subs_nested_subsamples() {
    let mut b = Vec::new();
    b.extend_from_slice(&1u32.to_be_bytes()); // entry_count
    b.extend_from_slice(&4u32.to_be_bytes()); // sample_delta
    b.extend_from_slice(&2u16.to_be_bytes()); // subsample_count
    for size in [600u32, 40] {
        b.extend_from_slice(&size.to_be_bytes());
        b.push(1); // priority
        b.push(0); // discardable
        b.extend_from_slice(&0u32.to_be_bytes());
    }

    let tree = decode_tree(&full_box(b"subs", 1, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SubSampleInformation(s) => {
            let e = &s.entries[0];
            assert_eq!(e.sample_delta, 4);
            assert_eq!(e.subsamples.len(), 2);
            assert_eq!(e.subsamples[0].subsample_size, 600);
            assert_eq!(e.subsamples[1].subsample_size, 40);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn stsd_skips_codec_specific_tail() {
    // one 20-byte entry with 4 opaque trailing bytes
    let mut entry = Vec::new();
    entry.extend_from_slice(&20u32.to_be_bytes());
    entry.extend_from_slice(b"mp4a");
    entry.extend_from_slice(&[0u8; 6]);
    entry.extend_from_slice(&1u16.to_be_bytes());
    entry.extend_from_slice(&[0xff; 4]);

    let mut b = Vec::new();
    b.extend_from_slice(&1u32.to_be_bytes());
    b.extend_from_slice(&entry);

    let tree = decode_tree(&full_box(b"stsd", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleDescription(s) => {
            assert_eq!(s.entry_count, 1);
            assert_eq!(s.entries[0].format, "mp4a");
            assert_eq!(s.entries[0].size, 20);
            assert_eq!(s.entries[0].data_reference_index, 1);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn saiz_sizes_only_without_default() {
    let mut b = Vec::new();
    b.push(0); // default_sample_info_size
    b.extend_from_slice(&3u32.to_be_bytes());
    b.extend_from_slice(&[1, 2, 3]);

    let tree = decode_tree(&full_box(b"saiz", 0, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleAuxInfoSizes(s) => {
            assert!(s.aux_info_type.is_none());
            assert_eq!(s.sample_info_sizes, vec![1, 2, 3]);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn saio_aux_type_gated_by_flag() {
    let mut b = Vec::new();
    b.extend_from_slice(&u32::from_be_bytes(*b"cenc").to_be_bytes());
    b.extend_from_slice(&0u32.to_be_bytes());
    b.extend_from_slice(&1u32.to_be_bytes());
    b.extend_from_slice(&(1u64 << 34).to_be_bytes());

    let tree = decode_tree(&full_box(b"saio", 1, 0x1, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::SampleAuxInfoOffsets(s) => {
            assert_eq!(s.aux_info_type, Some(u32::from_be_bytes(*b"cenc")));
            assert_eq!(s.offsets, vec![1 << 34]);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}
