use crate::{handshake::HandshakeOp, initiator::Initiator, responder::Responder, Error};
use rand_chacha::{rand_core::SeedableRng, ChaCha20Rng};
use std::time::Duration;

fn handshake() -> (crate::NoiseCodec, crate::NoiseCodec) {
    let key_pair = Responder::generate_key();

    let mut initiator = Initiator::new(Some(key_pair.x_only_public_key().0));
    let mut responder = Responder::new(key_pair, 31449600);
    let first_message = initiator.step_0().unwrap();
    let (second_message, codec_responder) = responder.step_1(first_message).unwrap();
    let codec_initiator = initiator.step_2(second_message).unwrap();
    (codec_initiator, codec_responder)
}

#[test]
fn test_1() {
    let (mut codec_initiator, mut codec_responder) = handshake();
    let mut message = "ciao".as_bytes().to_vec();
    codec_initiator.encrypt(&mut message).unwrap();
    assert!(message != "ciao".as_bytes().to_vec());
    assert_eq!(message.len(), 4 + crate::AEAD_MAC_LEN);
    codec_responder.decrypt(&mut message).unwrap();

    assert!(message == "ciao".as_bytes().to_vec());
}

#[test]
fn test_1_with_rng() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let key_pair = Responder::generate_key_with_rng(&mut rng);

    let mut initiator = Initiator::new_with_rng(Some(key_pair.x_only_public_key().0), &mut rng);
    let mut responder = Responder::new_with_rng(key_pair, 3600, &mut rng);
    let first_message = initiator.step_0().unwrap();
    let (second_message, mut codec_responder) = responder
        .step_1_with_now_rng(first_message, 1_000, &mut rng)
        .unwrap();
    let mut codec_initiator = initiator.step_2_with_now(second_message, 1_500).unwrap();

    let mut message = b"from the pool".to_vec();
    codec_responder.encrypt(&mut message).unwrap();
    codec_initiator.decrypt(&mut message).unwrap();
    assert_eq!(message, b"from the pool");
}

#[test]
fn each_direction_has_its_own_nonce() {
    let (mut codec_initiator, mut codec_responder) = handshake();
    for i in 0..5_u8 {
        let mut upstream = vec![i; 10];
        codec_initiator.encrypt(&mut upstream).unwrap();
        codec_responder.decrypt(&mut upstream).unwrap();
        assert_eq!(upstream, vec![i; 10]);
    }
    let mut downstream = vec![42; 3];
    codec_responder.encrypt(&mut downstream).unwrap();
    codec_initiator.decrypt(&mut downstream).unwrap();
    assert_eq!(downstream, vec![42; 3]);
}

#[test]
fn tampered_transport_message_is_rejected() {
    let (mut codec_initiator, mut codec_responder) = handshake();
    let mut message = vec![1, 2, 3, 4];
    codec_initiator.encrypt(&mut message).unwrap();
    message[0] ^= 0xff;
    assert!(matches!(
        codec_responder.decrypt(&mut message),
        Err(Error::Aead(_))
    ));
}

#[test]
fn certificate_from_another_authority_is_rejected() {
    let key_pair = Responder::generate_key();
    let other = Responder::generate_key();

    let mut initiator = Initiator::new(Some(other.x_only_public_key().0));
    let mut responder = Responder::new(key_pair, 3600);
    let first_message = initiator.step_0().unwrap();
    let (second_message, _) = responder.step_1(first_message).unwrap();
    assert!(matches!(
        initiator.step_2(second_message),
        Err(Error::InvalidCertificate(_))
    ));
}

#[test]
fn expired_certificate_is_rejected() {
    let mut rng = ChaCha20Rng::seed_from_u64(11);
    let key_pair = Responder::generate_key();

    let mut initiator = Initiator::new(Some(key_pair.x_only_public_key().0));
    let mut responder = Responder::new(key_pair, 60);
    let first_message = initiator.step_0().unwrap();
    let (second_message, _) = responder
        .step_1_with_now_rng(first_message, 1_000, &mut rng)
        .unwrap();
    assert_eq!(
        initiator.step_2_with_now(second_message, 1_061).unwrap_err(),
        Error::CertificateExpired {
            valid_from: 1_000,
            not_valid_after: 1_060,
            now: 1_061
        }
    );
}

#[test]
fn initiator_without_authority_accepts_any_responder() {
    let mut initiator = Initiator::without_pk();
    let mut responder = Responder::new(Responder::generate_key(), 3600);
    let first_message = initiator.step_0().unwrap();
    let (second_message, _) = responder.step_1(first_message).unwrap();
    assert!(initiator.step_2(second_message).is_ok());
}

#[test]
fn corrupted_handshake_message_fails() {
    let key_pair = Responder::generate_key();
    let mut initiator = Initiator::new(Some(key_pair.x_only_public_key().0));
    let mut responder = Responder::new(key_pair, 3600);
    let first_message = initiator.step_0().unwrap();
    let (mut second_message, _) = responder.step_1(first_message).unwrap();
    second_message[100] ^= 1;
    assert!(matches!(
        initiator.step_2(second_message),
        Err(Error::Aead(_))
    ));
}

#[test]
fn raw_keys_are_validated() {
    let kp = Responder::generate_key();
    let public = kp.x_only_public_key().0.serialize();
    let private = kp.secret_bytes();
    let validity = Duration::from_secs(3600);

    assert!(Responder::from_authority_kp(&public, &private, validity).is_ok());
    assert!(Initiator::from_raw_k(public).is_ok());

    let other = Responder::generate_key().x_only_public_key().0.serialize();
    assert!(matches!(
        Responder::from_authority_kp(&other, &private, validity),
        Err(Error::KeypairMismatch)
    ));
    assert!(matches!(
        Responder::from_authority_kp(&public, &[0; 32], validity),
        Err(Error::InvalidRawPrivateKey)
    ));
    // The x coordinate must be a field element lower than p.
    assert!(matches!(
        Initiator::from_raw_k([0xff; 32]),
        Err(Error::InvalidRawPublicKey)
    ));
}
