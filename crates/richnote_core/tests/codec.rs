use richnote_core::{
    decode, decode_with_default, encode, try_decode, AttributedText, CodecError, Rgba,
    StyleAttributes, StyleRun,
};

#[test]
fn every_attribute_survives_a_round_trip() {
    let base = StyleAttributes::default();
    let content = AttributedText::from_runs(
        "Plain bold 😀 colored",
        vec![
            StyleRun::new(0..6, base),
            StyleRun::new(
                6..10,
                base.with_bold(true).with_italic(true).with_underline(true),
            ),
            StyleRun::new(10..14, base.with_font_size(17.3)),
            StyleRun::new(
                14..21,
                base.with_text_color(Some(Rgba::new(12, 34, 56, 78)))
                    .with_background_color(Some(Rgba::CLEAR)),
            ),
        ],
    )
    .unwrap();

    let bytes = encode(&content).unwrap();
    assert_eq!(decode(&bytes), content);
    assert_eq!(
        try_decode(&bytes, &StyleAttributes::default()).unwrap(),
        content
    );
}

#[test]
fn corrupt_blobs_recover_as_valid_empty_text() {
    for blob in [
        &b"{not json"[..],
        &b"{\"version\":1,\"text\":\"abc\",\"runs\":[{\"len\":5,\"style\":{}}]}"[..],
        &[0xff, 0xfe, 0x00][..],
    ] {
        let decoded = decode(blob);
        assert!(decoded.is_empty());
        decoded.check_invariants().unwrap();
    }
}

#[test]
fn strict_decode_reports_corruption() {
    let err = try_decode(b"{\"version\":1}", &StyleAttributes::default()).unwrap_err();
    assert!(matches!(err, CodecError::Corrupt(_)));
}

#[test]
fn attributeless_envelope_uses_the_default_style() {
    let style = StyleAttributes::default().with_font_size(14.0);

    let envelope = decode_with_default(br#"{"version":1,"text":"hi"}"#, &style);
    assert_eq!(envelope, AttributedText::from_plain_text("hi", style));
    assert_eq!(decode(b""), AttributedText::empty());
}

#[test]
fn non_envelope_utf8_blobs_decode_to_empty_text() {
    let style = StyleAttributes::default();
    for blob in [
        &b"null"[..],
        &b"[1,2]"[..],
        &b"\"x\""[..],
        &b"]}garbage"[..],
        &b"Learning is fun!"[..],
        &b"   "[..],
    ] {
        let decoded = decode_with_default(blob, &style);
        assert!(decoded.is_empty(), "blob {:?} decoded to text", blob);
        decoded.check_invariants().unwrap();
        assert!(matches!(
            try_decode(blob, &style),
            Err(CodecError::Corrupt(_))
        ));
    }
}

#[test]
fn corrupt_error_does_not_echo_blob_text() {
    let err = try_decode(b"\"secret words\"", &StyleAttributes::default()).unwrap_err();
    assert!(!err.to_string().contains("secret"));
}
