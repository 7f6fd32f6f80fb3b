//! End-to-end decision tree tests for the decode-verify-extract pipeline.

mod common;

use aadhaar_kyc::codec::{bytes_to_decimal, decimal_to_bytes};
use aadhaar_kyc::crypto::{verify_detached, PinnedKey, VerificationOutcome};
use aadhaar_kyc::identity::secure::split_signature;
use aadhaar_kyc::qr::RawPayload;
use aadhaar_kyc::{PayloadFormat, Pipeline, Rejection};
use common::*;

/// A valid Secure QR yields verified fields with only the partial identifier.
#[test]
fn test_secure_qr_round_trip() {
    let pipeline = Pipeline::new(Some(pinned_key()));
    let extraction = pipeline.decode_payload(&secure_payload(SECURE_RECORD)).unwrap();

    assert_eq!(extraction.format, PayloadFormat::SecureQr);
    assert!(extraction.is_verified());
    assert_eq!(extraction.fields.name.as_deref(), Some("Asha Rao"));
    assert_eq!(extraction.fields.address_line, "12, Springfield, Xanadu, 000001");
    assert_eq!(extraction.fields.partial_identifier(), Some("9012"));
    assert_eq!(extraction.fields.full_identifier(), None);
}

/// Signing then verifying with the matching key is valid; single bit flips are not.
#[test]
fn test_signature_bit_flips() {
    let key = pinned_key();
    let signed = compress(SECURE_RECORD);
    let signature = sign(&signed);

    assert_eq!(verify_detached(Some(&*key), &signed, &signature), VerificationOutcome::Valid);

    for bit in 0..signed.len() * 8 {
        let mut data = signed.clone();
        data[bit / 8] ^= 1 << (bit % 8);
        assert_eq!(
            verify_detached(Some(&*key), &data, &signature),
            VerificationOutcome::Invalid,
            "data bit {} flipped",
            bit
        );
    }

    for bit in (0..signature.len() * 8).step_by(61) {
        let mut sig = signature.clone();
        sig[bit / 8] ^= 1 << (bit % 8);
        assert_eq!(
            verify_detached(Some(&*key), &signed, &sig),
            VerificationOutcome::Invalid,
            "signature bit {} flipped",
            bit
        );
    }
}

/// A forged payload whose content would parse as legacy XML still ends in
/// a signature rejection.
#[test]
fn test_forged_secure_qr_is_not_laundered() {
    let pipeline = Pipeline::new(Some(pinned_key()));
    let payload = forged_payload(LEGACY_XML);

    let result = pipeline.decode_payload(&payload);
    assert!(matches!(result, Err(Rejection::SignatureInvalid)));
    assert_eq!(result.unwrap_err().status_code(), 422);
}

/// Non-numeric XML goes straight to the legacy decoder.
#[test]
fn test_legacy_xml_payload() {
    let pipeline = Pipeline::new(Some(pinned_key()));
    let extraction = pipeline.decode_payload(&RawPayload::from(LEGACY_XML)).unwrap();

    assert_eq!(extraction.format, PayloadFormat::LegacyXml);
    assert!(!extraction.is_verified());
    assert_eq!(extraction.fields.full_identifier(), Some("123456789012"));
    assert_eq!(extraction.fields.partial_identifier(), None);
    assert_eq!(extraction.fields.address_line, "12, Springfield, Xanadu, 000001");
}

/// Legacy identifiers must be exactly 12 digits even when the XML is fine.
#[test]
fn test_legacy_identifier_validation() {
    let pipeline = Pipeline::new(None);

    for uid in ["12345678901", "ABCDEFGHIJKL", "1234 5678 9012"] {
        let xml = LEGACY_XML.replace("123456789012", uid);
        let result = pipeline.decode_payload(&RawPayload::new(xml));
        assert!(
            matches!(result, Err(Rejection::IdentifierFormatInvalid)),
            "uid {:?} should be rejected",
            uid
        );
    }
}

/// Without a pinned key a valid Secure QR is never verified, and ends up
/// unrecognized by the legacy decoder.
#[test]
fn test_no_key_routes_to_legacy() {
    let pipeline = Pipeline::new(None);

    for payload in [secure_payload(SECURE_RECORD), forged_payload(SECURE_RECORD)] {
        let result = pipeline.decode_payload(&payload);
        assert!(matches!(result, Err(Rejection::UnrecognizedFormat)));
    }
}

/// Numeric payloads that are not Secure QR fall back and end unrecognized.
#[test]
fn test_structural_secure_failures_fall_back() {
    let pipeline = Pipeline::new(Some(pinned_key()));

    // exactly 256 bytes: too short
    let payload = RawPayload::new(bytes_to_decimal(&[0xff; 256]));
    assert_eq!(decimal_to_bytes(payload.as_str()).unwrap().len(), 256);
    assert!(matches!(pipeline.decode_payload(&payload), Err(Rejection::UnrecognizedFormat)));

    // signed but not a compressed stream
    let signed = b"plain text record".to_vec();
    let signature = sign(&signed);
    let payload = build_payload(signed, &signature);
    assert!(matches!(pipeline.decode_payload(&payload), Err(Rejection::UnrecognizedFormat)));

    // valid signature, record without a last-four value
    let payload = secure_payload("n:Asha Rao,vtc:Springfield");
    assert!(matches!(pipeline.decode_payload(&payload), Err(Rejection::UnrecognizedFormat)));
}

#[test]
fn test_unrecognized_text() {
    let pipeline = Pipeline::new(Some(pinned_key()));
    for text in ["hello world", "<html><body/></html>", "https://example.com/card"] {
        assert!(matches!(
            pipeline.decode_payload(&RawPayload::from(text)),
            Err(Rejection::UnrecognizedFormat)
        ));
    }
}

#[test]
fn test_split_matches_payload_layout() {
    let payload = secure_payload(SECURE_RECORD);
    let bytes = decimal_to_bytes(payload.as_str()).unwrap();
    let (signed, signature) = split_signature(&bytes).unwrap();

    assert_eq!(signed, compress(SECURE_RECORD).as_slice());
    assert_eq!(signature.len(), 256);
}

#[test]
fn test_certificate_key_verifies() {
    let key = PinnedKey::load(&fixture_path("signer_cert.pem")).unwrap();
    let pipeline = Pipeline::new(Some(std::sync::Arc::new(key)));
    assert!(pipeline.decode_payload(&secure_payload(SECURE_RECORD)).is_ok());
}
