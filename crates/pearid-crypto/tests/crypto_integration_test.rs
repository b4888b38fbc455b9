//! Integration tests for the PearID crypto layer.
//!
//! This test suite validates:
//! - PEM framing and key round-trips through import/export
//! - RSA-PSS sign/verify correctness
//! - RSA-OAEP encrypt/decrypt, plain and labelled
//! - Scheme separation between signing and encryption handles
//! - Error kinds surfaced for bad input

use std::sync::OnceLock;

use pearid_crypto::{
    base64_decode, base64_encode, frame_pem, normalize_pem, unframe_pem, CryptoConfig,
    CryptoError, CryptoService, KeyFingerprint, KeyPair, PemLabel,
};

fn service() -> &'static CryptoService {
    static SERVICE: OnceLock<CryptoService> = OnceLock::new();
    SERVICE.get_or_init(|| CryptoService::new(CryptoConfig::default().with_modulus_bits(2048)))
}

fn alice() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| service().generate_key_pair().unwrap())
}

fn bob() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| service().generate_key_pair().unwrap())
}

// ============================================================================
// Test Category 1: Codec
// ============================================================================

#[test]
fn test_pem_frame_unframe_contract() {
    let body = base64_encode(&[0xabu8; 300]);
    let framed = frame_pem(PemLabel::Public, &body);
    assert_eq!(unframe_pem(&framed), body);
    assert!(framed
        .lines()
        .filter(|l| !l.contains("--"))
        .all(|l| l.len() <= 64));
}

#[test]
fn test_base64_rejects_malformed() {
    assert!(matches!(base64_decode("abc$"), Err(CryptoError::Codec(_))));
}

// ============================================================================
// Test Category 2: Key Management
// ============================================================================

#[test]
fn test_generated_pairs_are_distinct() {
    assert_ne!(alice().public_key, bob().public_key);
    assert_ne!(alice().private_key, bob().private_key);
    assert_ne!(
        KeyFingerprint::of_public_pem(&alice().public_key).unwrap(),
        KeyFingerprint::of_public_pem(&bob().public_key).unwrap()
    );
}

#[test]
fn test_export_import_roundtrip_both_halves() {
    let svc = service();
    for pair in [alice(), bob()] {
        let signing = svc.import_signing_key(&pair.private_key).unwrap();
        let verifying = svc.import_verifying_key(&pair.public_key).unwrap();

        assert_eq!(
            normalize_pem(&svc.export_private_key(&signing).unwrap()),
            normalize_pem(&pair.private_key)
        );
        assert_eq!(
            normalize_pem(&svc.export_public_key(&verifying).unwrap()),
            normalize_pem(&pair.public_key)
        );
    }
}

#[test]
fn test_import_tolerates_crlf_pem() {
    let svc = service();
    let crlf = alice().private_key.replace('\n', "\r\n");
    assert!(svc.import_signing_key(&crlf).is_ok());
}

#[test]
#[ignore = "4096-bit key generation is slow in debug builds"]
fn test_default_parameters_generate_4096_bit_keys() {
    let svc = CryptoService::default();
    let pair = svc.generate_key_pair().unwrap();
    let verifying = svc.import_verifying_key(&pair.public_key).unwrap();
    assert_eq!(verifying.modulus_bits(), 4096);

    let signing = svc.import_signing_key(&pair.private_key).unwrap();
    assert_eq!(
        normalize_pem(&svc.export_private_key(&signing).unwrap()),
        normalize_pem(&pair.private_key)
    );
    assert_eq!(
        normalize_pem(&svc.export_public_key(&verifying).unwrap()),
        normalize_pem(&pair.public_key)
    );

    let sig = svc.sign("payload", &pair.private_key).unwrap();
    assert_eq!(base64_decode(&sig).unwrap().len(), 512);
    assert!(svc.verify("payload", &sig, &pair.public_key).unwrap());
    assert!(!svc.verify("paylaod", &sig, &pair.public_key).unwrap());

    let ciphertext = svc.encrypt("field text", &pair.public_key).unwrap();
    assert_eq!(svc.decrypt(&ciphertext, &pair.private_key).unwrap(), "field text");
}

// ============================================================================
// Test Category 3: Signatures
// ============================================================================

#[test]
fn test_sign_verify_and_single_character_change() {
    let svc = service();
    let sig = svc.sign("this is a test", &alice().private_key).unwrap();
    assert!(svc.verify("this is a test", &sig, &alice().public_key).unwrap());
    assert!(!svc.verify("this is 1 test", &sig, &alice().public_key).unwrap());
}

#[test]
fn test_signature_from_other_key_does_not_verify() {
    let svc = service();
    let sig = svc.sign("payload", &bob().private_key).unwrap();
    assert!(!svc.verify("payload", &sig, &alice().public_key).unwrap());
}

#[test]
fn test_canonical_payload_signature() {
    let svc = service();
    let payload = r#"[["inp1","Input to pearid"],["uuid","a-unique-id"]]"#;
    let sig = svc.sign(payload, &alice().private_key).unwrap();
    assert!(svc.verify(payload, &sig, &alice().public_key).unwrap());

    let reordered = r#"[["uuid","a-unique-id"],["inp1","Input to pearid"]]"#;
    assert!(!svc.verify(reordered, &sig, &alice().public_key).unwrap());
}

// ============================================================================
// Test Category 4: Encryption
// ============================================================================

#[test]
fn test_encrypt_decrypt_roundtrip() {
    let svc = service();
    let text = "The quick brown fox jumps over the lazy dog";
    let ciphertext = svc.encrypt(text, &alice().public_key).unwrap();
    assert_ne!(ciphertext, text);
    assert_eq!(svc.decrypt(&ciphertext, &alice().private_key).unwrap(), text);
}

#[test]
fn test_decrypt_with_wrong_key_fails() {
    let svc = service();
    let ciphertext = svc.encrypt("for alice", &alice().public_key).unwrap();
    assert!(matches!(
        svc.decrypt(&ciphertext, &bob().private_key),
        Err(CryptoError::Decryption(_))
    ));
}

#[test]
fn test_labeled_ciphertext_keeps_iv_separate() {
    let svc = service();
    let sealed = svc.encrypt_labeled("labelled", &alice().public_key).unwrap();
    assert!(!sealed.ciphertext.contains(&sealed.iv));
    assert_eq!(base64_decode(&sealed.ciphertext).unwrap().len(), 256);
    assert_eq!(
        svc.decrypt_labeled(&sealed.ciphertext, &sealed.iv, &alice().private_key)
            .unwrap(),
        "labelled"
    );
}

#[test]
fn test_labeled_ciphertext_serializes() {
    let svc = service();
    let sealed = svc.encrypt_labeled("json", &alice().public_key).unwrap();
    let json = serde_json::to_value(&sealed).unwrap();
    assert!(json.get("ciphertext").is_some());
    assert!(json.get("iv").is_some());
}
