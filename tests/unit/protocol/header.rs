use super::*;

#[test]
fn payload_is_name_newline_size_then_zeros() {
    let p = header_payload("x", 12800, 16);
    assert_eq!(p.len(), 16);
    assert_eq!(&p[..7], b"x\n12800");
    assert!(p[7..].iter().all(|&b| b == 0));
}

#[test]
fn exact_fit_has_no_padding() {
    let p = header_payload("ab", 7, 4);
    assert_eq!(p, b"ab\n7".to_vec());
    assert!(header_payload_strict("ab", 7, 4).is_ok());
}

#[test]
fn oversized_payload_truncates_to_width() {
    let name = "a".repeat(40);
    let p = header_payload(&name, 123456, 32);
    assert_eq!(p.len(), 32);
    assert_eq!(p, name.as_bytes()[..32].to_vec());

    // Same input, same bytes.
    assert_eq!(p, header_payload(&name, 123456, 32));
}

#[test]
fn strict_rejects_oversized_payload() {
    let name = "a".repeat(40);
    assert!(matches!(
        header_payload_strict(&name, 1, 32),
        Err(BitreelError::Config(_))
    ));
    assert!(build_header(&name, 1, 32, HeaderPolicy::Strict).is_err());
    assert_eq!(
        build_header(&name, 1, 32, HeaderPolicy::Truncate).unwrap().len(),
        32
    );
}

#[test]
fn display_name_uses_final_component() {
    assert_eq!(display_name(Path::new("/tmp/some/file.bin")), "file.bin");
    assert_eq!(display_name(Path::new("file.bin")), "file.bin");
}

#[test]
fn policy_parses_from_snake_case() {
    let p: HeaderPolicy = serde_json::from_str("\"strict\"").unwrap();
    assert_eq!(p, HeaderPolicy::Strict);
    assert_eq!(HeaderPolicy::default(), HeaderPolicy::Truncate);
}
