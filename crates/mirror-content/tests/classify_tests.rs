use mirror_content::{BINARY_SNIFF_LEN, Classification, classify, looks_binary};
use rstest::rstest;

#[rstest]
#[case(b"plain text\n".as_slice())]
#[case("héllo wörld".as_bytes())]
#[case(b"tabs\tand\r\nwindows lines".as_slice())]
#[case(b"\x1b[31mred\x1b[0m".as_slice())]
fn test_text_buffers(#[case] buffer: &[u8]) {
    let classified = classify(buffer);
    assert_eq!(
        classified,
        Classification::Text(String::from_utf8(buffer.to_vec()).unwrap())
    );
}

#[rstest]
#[case(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".as_slice())]
#[case(b"\x01\x02\x03\x04\x05\x06abc".as_slice())]
#[case(&[0xff, 0xd8, 0xff, 0xe0])]
fn test_binary_buffers(#[case] buffer: &[u8]) {
    assert!(classify(buffer).is_binary());
}

#[test]
fn test_sniffed_prefix_is_bounded() {
    let mut buffer = vec![b'a'; BINARY_SNIFF_LEN];
    buffer.extend_from_slice(&[0x01; 50]);

    // control bytes past the sniffed prefix are not inspected by the heuristic
    assert!(!looks_binary(&buffer));
    assert!(!classify(&buffer).is_binary());
}

#[test]
fn test_into_text() {
    assert_eq!(classify(b"abc").into_text().as_deref(), Some("abc"));
    assert_eq!(classify(b"\0").into_text(), None);
}
