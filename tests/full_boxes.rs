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

fn mvhd_body_v0() -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(&10u32.to_be_bytes()); // creation
    b.extend_from_slice(&20u32.to_be_bytes()); // modification
    b.extend_from_slice(&90000u32.to_be_bytes()); // timescale
    b.extend_from_slice(&180000u32.to_be_bytes()); // duration
    b.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // rate
    b.extend_from_slice(&0x0100u16.to_be_bytes()); // volume
    b.extend_from_slice(&[0u8; 10]); // reserved
    for i in 0..9i32 {
        b.extend_from_slice(&i.to_be_bytes()); // matrix
    }
    b.extend_from_slice(&[0u8; 24]); // pre_defined
    b.extend_from_slice(&7u32.to_be_bytes()); // next_track_id
    b
}

#[test]
fn mvhd_version_zero() {
    let data = full_box(b"mvhd", 0, 0, &mvhd_body_v0());
    let tree = decode_tree(&data, None).expect("tree");
    let node = &tree[0];
    assert_eq!(node.version, Some(0));
    assert_eq!(node.flags, Some(0));
    match &node.fields {
        BoxFields::MovieHeader(h) => {
            assert_eq!(h.creation_time, 10);
            assert_eq!(h.timescale, 90000);
            assert_eq!(h.duration, 180000);
            assert_eq!(h.rate, 0x0001_0000);
            assert_eq!(h.volume, 0x0100);
            assert_eq!(h.matrix[3], 3);
            assert_eq!(h.next_track_id, 7);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn mvhd_version_one_widens_times() {
    let mut b = Vec::new();
    b.extend_from_slice(&(u32::MAX as u64 + 5).to_be_bytes());
    b.extend_from_slice(&2u64.to_be_bytes());
    b.extend_from_slice(&1000u32.to_be_bytes());
    b.extend_from_slice(&(1u64 << 40).to_be_bytes());
    b.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    b.extend_from_slice(&0u16.to_be_bytes());
    b.extend_from_slice(&[0u8; 10]);
    b.extend_from_slice(&[0u8; 36]);
    b.extend_from_slice(&[0u8; 24]);
    b.extend_from_slice(&2u32.to_be_bytes());

    let data = full_box(b"mvhd", 1, 0, &b);
    let tree = decode_tree(&data, None).expect("tree");
    match &tree[0].fields {
        BoxFields::MovieHeader(h) => {
            assert_eq!(h.creation_time, u32::MAX as u64 + 5);
            assert_eq!(h.duration, 1 << 40);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn unsupported_version_keeps_structure_only() {
    let data = full_box(b"mvhd", 9, 0, &mvhd_body_v0());
    let tree = decode_tree(&data, None).expect("tree");
    let node = &tree[0];
    assert_eq!(node.version, Some(9));
    assert_eq!(node.flags, Some(0));
    assert!(node.fields.is_none());
    assert_eq!(node.size, data.len() as u64);
}

#[test]
fn mdhd_unpacks_language() {
    let mut b = Vec::new();
    b.extend_from_slice(&0u32.to_be_bytes());
    b.extend_from_slice(&0u32.to_be_bytes());
    b.extend_from_slice(&48000u32.to_be_bytes());
    b.extend_from_slice(&96000u32.to_be_bytes());
    // "und" packed as three 5-bit letters
    let lang: u16 = (21 << 10) | (14 << 5) | 4;
    b.extend_from_slice(&lang.to_be_bytes());
    b.extend_from_slice(&0u16.to_be_bytes());

    let data = full_box(b"mdhd", 0, 0, &b);
    let tree = decode_tree(&data, None).expect("tree");
    match &tree[0].fields {
        BoxFields::MediaHeader(h) => {
            assert_eq!(h.timescale, 48000);
            assert_eq!(h.language, "und");
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn elst_version_one_entries() {
    let mut b = Vec::new();
    b.extend_from_slice(&2u32.to_be_bytes());
    for (dur, mt) in [(1000u64, -1i64), (2000, 500)] {
        b.extend_from_slice(&dur.to_be_bytes());
        b.extend_from_slice(&mt.to_be_bytes());
        b.extend_from_slice(&1i16.to_be_bytes());
        b.extend_from_slice(&0i16.to_be_bytes());
    }

    let data = full_box(b"elst", 1, 0, &b);
    let tree = decode_tree(&data, None).expect("tree");
    match &tree[0].fields {
        BoxFields::EditList(e) => {
            assert_eq!(e.entry_count, 2);
            assert_eq!(e.entries[0].media_time, -1);
            assert_eq!(e.entries[1].segment_duration, 2000);
            assert_eq!(e.entries[0].media_rate_integer, 1);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn hdlr_reads_type_and_name() {
    let mut b = Vec::new();
    b.extend_from_slice(&0u32.to_be_bytes()); // pre_defined
    b.extend_from_slice(b"vide");
    b.extend_from_slice(&[0u8; 12]); // reserved
    b.extend_from_slice(b"VideoHandler\0");

    let data = full_box(b"hdlr", 0, 0, &b);
    let tree = decode_tree(&data, None).expect("tree");
    match &tree[0].fields {
        BoxFields::Handler(h) => {
            assert_eq!(h.handler_type, "vide");
            assert_eq!(h.name, "VideoHandler");
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn tkhd_fixed_point_dimensions() {
    let mut b = Vec::new();
    b.extend_from_slice(&0u32.to_be_bytes());
    b.extend_from_slice(&0u32.to_be_bytes());
    b.extend_from_slice(&3u32.to_be_bytes()); // track_id
    b.extend_from_slice(&[0u8; 4]); // reserved
    b.extend_from_slice(&600u32.to_be_bytes()); // duration
    b.extend_from_slice(&[0u8; 8]);
    b.extend_from_slice(&0i16.to_be_bytes()); // layer
    b.extend_from_slice(&1i16.to_be_bytes()); // alternate_group
    b.extend_from_slice(&0u16.to_be_bytes()); // volume
    b.extend_from_slice(&[0u8; 2]);
    b.extend_from_slice(&[0u8; 36]);
    b.extend_from_slice(&(1920u32 << 16).to_be_bytes());
    b.extend_from_slice(&(1080u32 << 16).to_be_bytes());

    let data = full_box(b"tkhd", 0, 0, &b);
    let tree = decode_tree(&data, None).expect("tree");
    match &tree[0].fields {
        BoxFields::TrackHeader(h) => {
            assert_eq!(h.track_id, 3);
            assert_eq!(h.duration, 600);
            assert_eq!(h.alternate_group, 1);
            assert_eq!(h.width >> 16, 1920);
            assert_eq!(h.height >> 16, 1080);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}
