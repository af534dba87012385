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
fn meta_is_a_full_container() {
    let hdlr = {
        let mut b = Vec::new();
        b.extend_from_slice(&0u32.to_be_bytes());
        b.extend_from_slice(b"pict");
        b.extend_from_slice(&[0u8; 12]);
        b.push(0);
        full_box(b"hdlr", 0, 0, &b)
    };
    let meta = full_box(b"meta", 0, 0, &hdlr);

    let tree = decode_tree(&meta, None).expect("tree");
    assert_eq!(tree[0].version, Some(0));
    let hdlr = tree[0].child("hdlr").expect("hdlr");
    match &hdlr.fields {
        BoxFields::Handler(h) => assert_eq!(h.handler_type, "pict"),
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn iloc_field_widths_from_size_nibbles() {
    let mut b = Vec::new();
    b.push(0x44); // offset_size 4, length_size 4
    b.push(0x00); // base_offset_size 0, index_size 0
    b.extend_from_slice(&1u16.to_be_bytes()); // item_count
    b.extend_from_slice(&7u16.to_be_bytes()); // item_id
    b.extend_from_slice(&0x0001u16.to_be_bytes()); // construction_method
    b.extend_from_slice(&0u16.to_be_bytes()); // data_reference_index
    b.extend_from_slice(&1u16.to_be_bytes()); // extent_count
    b.extend_from_slice(&4096u32.to_be_bytes()); // extent_offset
    b.extend_from_slice(&512u32.to_be_bytes()); // extent_length

    let tree = decode_tree(&full_box(b"iloc", 1, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::ItemLocation(l) => {
            assert_eq!(l.offset_size, 4);
            assert_eq!(l.length_size, 4);
            assert_eq!(l.base_offset_size, 0);
            let item = &l.items[0];
            assert_eq!(item.item_id, 7);
            assert_eq!(item.construction_method, Some(1));
            assert_eq!(item.base_offset, 0);
            assert_eq!(item.extents[0].extent_offset, 4096);
            assert_eq!(item.extents[0].extent_length, 512);
            assert!(item.extents[0].extent_index.is_none());
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn iloc_rejects_unknown_width() {
    let mut b = Vec::new();
    b.push(0x34); // offset_size 3 is not a legal width
    b.push(0x00);
    b.extend_from_slice(&1u16.to_be_bytes());
    b.extend_from_slice(&1u16.to_be_bytes());
    b.extend_from_slice(&0u16.to_be_bytes());
    b.extend_from_slice(&1u16.to_be_bytes());
    b.extend_from_slice(&[0u8; 7]);

    assert!(decode_tree(&full_box(b"iloc", 0, 0, &b), None).is_err());
}

#[test]
fn infe_version_two_mime() {
    let mut b = Vec::new();
    b.extend_from_slice(&12u16.to_be_bytes()); // item_id
    b.extend_from_slice(&0u16.to_be_bytes()); // item_protection_index
    b.extend_from_slice(b"mime");
    b.extend_from_slice(b"thumb\0");
    b.extend_from_slice(b"image/jpeg\0");
    b.extend_from_slice(b"\0");

    let tree = decode_tree(&full_box(b"infe", 2, 0, &b), None).expect("tree");
    match &tree[0].fields {
        BoxFields::ItemInfoEntry(e) => {
            assert_eq!(e.item_id, 12);
            assert_eq!(e.item_type.as_deref(), Some("mime"));
            assert_eq!(e.item_name, "thumb");
            assert_eq!(e.content_type.as_deref(), Some("image/jpeg"));
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn iref_version_selects_item_id_width() {
    let mut cdsc16 = Vec::new();
    cdsc16.extend_from_slice(&2u16.to_be_bytes()); // from_item_id
    cdsc16.extend_from_slice(&2u16.to_be_bytes()); // reference_count
    cdsc16.extend_from_slice(&3u16.to_be_bytes());
    cdsc16.extend_from_slice(&4u16.to_be_bytes());
    let iref0 = full_box(b"iref", 0, 0, &plain_box(b"cdsc", &cdsc16));

    let mut cdsc32 = Vec::new();
    cdsc32.extend_from_slice(&2u32.to_be_bytes());
    cdsc32.extend_from_slice(&1u16.to_be_bytes());
    cdsc32.extend_from_slice(&9u32.to_be_bytes());
    let iref1 = full_box(b"iref", 1, 0, &plain_box(b"cdsc", &cdsc32));

    let t0 = decode_tree(&iref0, None).expect("v0");
    let t1 = decode_tree(&iref1, None).expect("v1");
    match &t0[0].child("cdsc").expect("cdsc").fields {
        BoxFields::ItemReference(r) => {
            assert_eq!(r.from_item_id, 2);
            assert_eq!(r.to_item_ids, vec![3, 4]);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
    match &t1[0].child("cdsc").expect("cdsc").fields {
        BoxFields::ItemReference(r) => assert_eq!(r.to_item_ids, vec![9]),
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn reference_codes_outside_iref_are_opaque() {
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    let mut data = plain_box(b"cdsc", &body);
    data.extend_from_slice(&plain_box(b"free", &[]));

    let tree = decode_tree(&data, None).expect("tree");
    assert_eq!(tree.len(), 1);
    assert!(tree[0].typ.is("free"));
}

#[test]
fn pitm_item_id_width() {
    let v0 = full_box(b"pitm", 0, 0, &5u16.to_be_bytes());
    let v1 = full_box(b"pitm", 1, 0, &70000u32.to_be_bytes());

    let t0 = decode_tree(&v0, None).expect("v0");
    let t1 = decode_tree(&v1, None).expect("v1");
    match (&t0[0].fields, &t1[0].fields) {
        (BoxFields::PrimaryItem(a), BoxFields::PrimaryItem(b)) => {
            assert_eq!(a.item_id, 5);
            assert_eq!(b.item_id, 70000);
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}

#[test]
fn dref_truncates_children_to_entry_count() {
    let url = full_box(b"url ", 0, 1, &[]);
    let mut body = Vec::new();
    body.extend_from_slice(&1u32.to_be_bytes()); // entry_count
    body.extend_from_slice(&url);
    body.extend_from_slice(&url);
    let dref = full_box(b"dref", 0, 0, &body);

    let tree = decode_tree(&dref, None).expect("tree");
    match &tree[0].fields {
        BoxFields::DataReference(d) => assert_eq!(d.entry_count, 1),
        other => panic!("unexpected fields: {:?}", other),
    }
    assert_eq!(tree[0].children.len(), 1);
}

#[test]
fn iinf_entry_count_width() {
    let infe = {
        let mut b = Vec::new();
        b.extend_from_slice(&1u16.to_be_bytes());
        b.extend_from_slice(&0u16.to_be_bytes());
        b.extend_from_slice(b"hvc1");
        b.push(0);
        full_box(b"infe", 2, 0, &b)
    };
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&infe);
    let iinf = full_box(b"iinf", 0, 0, &body);

    let tree = decode_tree(&iinf, None).expect("tree");
    match &tree[0].fields {
        BoxFields::ItemInformation(i) => assert_eq!(i.entry_count, 1),
        other => panic!("unexpected fields: {:?}", other),
    }
    assert_eq!(tree[0].children.len(), 1);
}

#[test]
fn protection_scheme_framing() {
    let frma = plain_box(b"frma", b"mp4a");
    let schm = {
        let mut b = Vec::new();
        b.extend_from_slice(b"cenc");
        b.extend_from_slice(&0x0001_0000u32.to_be_bytes());
        full_box(b"schm", 0, 0, &b)
    };
    let mut sinf_body = frma;
    sinf_body.extend_from_slice(&schm);
    let sinf = plain_box(b"sinf", &sinf_body);

    let tree = decode_tree(&sinf, None).expect("tree");
    let sinf = &tree[0];
    match &sinf.child("frma").expect("frma").fields {
        BoxFields::OriginalFormat(f) => assert_eq!(f.data_format, "mp4a"),
        other => panic!("unexpected fields: {:?}", other),
    }
    match &sinf.child("schm").expect("schm").fields {
        BoxFields::SchemeType(s) => {
            assert_eq!(s.scheme_type, "cenc");
            assert_eq!(s.scheme_version, 0x0001_0000);
            assert!(s.scheme_uri.is_none());
        }
        other => panic!("unexpected fields: {:?}", other),
    }
}
