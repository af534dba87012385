use boxtree::{read_box_header, BoxType, Error, FourCC};

#[test]
fn compact_header() {
    let mut v = Vec::new();
    v.extend_from_slice(&24u32.to_be_bytes());
    v.extend_from_slice(b"ftyp");
    v.extend_from_slice(&[0u8; 16]);

    let hdr = read_box_header(&v, 0).expect("header");
    assert_eq!(hdr.offset, 0);
    assert_eq!(hdr.size, 24);
    assert_eq!(hdr.header_len, 8);
    assert_eq!(hdr.typ, BoxType::FourCC(FourCC(*b"ftyp")));
    assert!(hdr.largesize.is_none());
}

#[test]
fn largesize_header() {
    let mut v = Vec::new();
    v.extend_from_slice(&1u32.to_be_bytes());
    v.extend_from_slice(b"mdat");
    v.extend_from_slice(&24u64.to_be_bytes());
    v.extend_from_slice(&[0u8; 8]);

    let hdr = read_box_header(&v, 100).expect("header");
    assert_eq!(hdr.offset, 100);
    assert_eq!(hdr.size, 24);
    assert_eq!(hdr.header_len, 16);
    assert_eq!(hdr.largesize, Some(24));
}

#[test]
fn uuid_header() {
    let ext = *b"0123456789abcdef";
    let mut v = Vec::new();
    v.extend_from_slice(&28u32.to_be_bytes());
    v.extend_from_slice(b"uuid");
    v.extend_from_slice(&ext);
    v.extend_from_slice(&[0u8; 4]);

    let hdr = read_box_header(&v, 0).expect("header");
    assert_eq!(hdr.typ, BoxType::Uuid(ext));
    assert_eq!(hdr.header_len, 24);
    assert_eq!(hdr.size, 28);
}

#[test]
fn size_zero_extends_to_end_of_range() {
    let mut v = Vec::new();
    v.extend_from_slice(&0u32.to_be_bytes());
    v.extend_from_slice(b"mdat");
    v.extend_from_slice(&[0u8; 40]);

    let hdr = read_box_header(&v, 0).expect("header");
    assert_eq!(hdr.size, 48);
    assert!(hdr.largesize.is_none());
}

#[test]
fn truncated_header_is_an_error() {
    let v = [0u8, 0, 0, 16];
    match read_box_header(&v, 7) {
        Err(Error::TruncatedHeader { offset }) => assert_eq!(offset, 7),
        other => panic!("expected TruncatedHeader, got {:?}", other),
    }
}

#[test]
fn largesize_needs_sixteen_bytes() {
    let mut v = Vec::new();
    v.extend_from_slice(&1u32.to_be_bytes());
    v.extend_from_slice(b"mdat");
    v.extend_from_slice(&[0u8; 4]); // half of the largesize field

    assert!(matches!(
        read_box_header(&v, 0),
        Err(Error::TruncatedHeader { .. })
    ));
}

#[test]
fn size_smaller_than_header_is_invalid() {
    let mut v = Vec::new();
    v.extend_from_slice(&4u32.to_be_bytes());
    v.extend_from_slice(b"free");

    assert!(matches!(
        read_box_header(&v, 0),
        Err(Error::InvalidSize { size: 4, .. })
    ));
}
