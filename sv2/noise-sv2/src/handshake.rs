// Symmetric state of the Noise handshake (`h`, `ck` and the handshake cipher), shared by the
// initiator and the responder.

use crate::{
    aed_cipher::AeadCipher, cipher_state::CipherState, error::Error,
    NOISE_HASHED_PROTOCOL_NAME_CHACHA,
};
use chacha20poly1305::ChaCha20Poly1305;
use secp256k1::{
    ellswift::{ElligatorSwift, ElligatorSwiftParty},
    hashes::{sha256::Hash as Sha256Hash, Hash, HashEngine},
    rand, Keypair, Secp256k1, SecretKey,
};

// HMAC-SHA256 with a 32 bytes key, zero padded to the 64 bytes block.
pub(crate) fn hmac_sha256(key: &[u8; 32], data: &[u8]) -> [u8; 32] {
    let padded_key = |pad: u8| {
        let mut block = [pad; 64];
        for (b, k) in block.iter_mut().zip(key) {
            *b ^= k;
        }
        block
    };

    let mut inner = Sha256Hash::engine();
    inner.input(&padded_key(0x36));
    inner.input(data);
    let inner = Sha256Hash::from_engine(inner).to_byte_array();

    let mut outer = Sha256Hash::engine();
    outer.input(&padded_key(0x5c));
    outer.input(&inner);
    Sha256Hash::from_engine(outer).to_byte_array()
}

/// Noise `HKDF` with two outputs.
pub(crate) fn hkdf2(chaining_key: &[u8; 32], input_key_material: &[u8]) -> ([u8; 32], [u8; 32]) {
    let temp_key = hmac_sha256(chaining_key, input_key_material);
    let out_1 = hmac_sha256(&temp_key, &[0x01]);
    let mut second = [0; 33];
    second[..32].copy_from_slice(&out_1);
    second[32] = 0x02;
    (out_1, hmac_sha256(&temp_key, &second))
}

/// Operations of the Noise handshake state.
///
/// Implementors only provide access to their fields, every cryptographic operation is a provided
/// method.
pub trait HandshakeOp<Cipher: AeadCipher>: CipherState<Cipher> {
    fn get_h(&mut self) -> &mut [u8; 32];

    fn get_ck(&mut self) -> &mut [u8; 32];

    fn set_h(&mut self, data: [u8; 32]);

    fn set_ck(&mut self, data: [u8; 32]);

    fn set_handshake_cipher(&mut self, cipher: ChaCha20Poly1305);

    /// `h = SHA-256(h || data)`
    fn mix_hash(&mut self, data: &[u8]) {
        let h = self.get_h();
        let mut to_hash = Vec::with_capacity(32 + data.len());
        to_hash.extend_from_slice(h);
        to_hash.extend_from_slice(data);
        *h = Sha256Hash::hash(&to_hash).to_byte_array();
    }

    /// Generates a keypair whose public key has an even y coordinate.
    fn generate_key() -> Keypair {
        Self::generate_key_with_rng(&mut rand::thread_rng())
    }

    fn generate_key_with_rng<R: rand::Rng + ?Sized>(rng: &mut R) -> Keypair {
        let secp = Secp256k1::new();
        loop {
            let (secret_key, _) = secp.generate_keypair(rng);
            let kp = Keypair::from_secret_key(&secp, &secret_key);
            if kp.x_only_public_key().1 == crate::PARITY {
                return kp;
            }
        }
    }

    fn mix_key(&mut self, input_key_material: &[u8]) {
        let (ck, temp_k) = hkdf2(self.get_ck(), input_key_material);
        self.set_ck(ck);
        self.initialize_key(temp_k);
    }

    /// Encrypts `plaintext` in place with `h` as associated data (when a key is set) and mixes
    /// the result into `h`.
    fn encrypt_and_hash(&mut self, plaintext: &mut Vec<u8>) -> Result<(), Error> {
        if self.get_k().is_some() {
            let h = *self.get_h();
            self.encrypt_with_ad(&h, plaintext)?;
        };
        let ciphertext = plaintext;
        self.mix_hash(ciphertext);
        Ok(())
    }

    fn decrypt_and_hash(&mut self, ciphertext: &mut Vec<u8>) -> Result<(), Error> {
        let encrypted = ciphertext.clone();
        if self.get_k().is_some() {
            let h = *self.get_h();
            self.decrypt_with_ad(&h, ciphertext)?;
        };
        self.mix_hash(&encrypted);
        Ok(())
    }

    /// BIP324 x-only ECDH over ElligatorSwift encoded keys. `initiator` is always the key of the
    /// initiating side, `party` tells which of the two keys `secret` belongs to.
    fn ellswift_ecdh(
        initiator: ElligatorSwift,
        responder: ElligatorSwift,
        secret: SecretKey,
        party: ElligatorSwiftParty,
    ) -> [u8; 32] {
        ElligatorSwift::shared_secret(initiator, responder, secret, party, None).to_secret_bytes()
    }

    fn initialize_self(&mut self) {
        let ck = NOISE_HASHED_PROTOCOL_NAME_CHACHA;
        let h = Sha256Hash::hash(&ck[..]);
        self.set_h(h.to_byte_array());
        self.set_ck(ck);
        self.set_k(None);
    }

    fn initialize_key(&mut self, key: [u8; 32]) {
        self.set_n(0);
        let cipher = <ChaCha20Poly1305 as AeadCipher>::from_key(key);
        self.set_handshake_cipher(cipher);
        *self.get_k() = Some(key);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{Arbitrary, TestResult};
    use quickcheck_macros;
    use secp256k1::PublicKey;
    use std::convert::TryInto;

    struct TestHandShake {
        k: Option<[u8; 32]>,
        n: u64,
        cipher: Option<ChaCha20Poly1305>,
        h: [u8; 32],
        ck: [u8; 32],
    }

    impl TestHandShake {
        pub fn new() -> Self {
            let mut self_ = TestHandShake {
                k: None,
                n: 0,
                cipher: None,
                h: [0; 32],
                ck: [0; 32],
            };
            self_.initialize_self();
            self_
        }
    }

    impl CipherState<ChaCha20Poly1305> for TestHandShake {
        fn get_k(&mut self) -> &mut Option<[u8; 32]> {
            &mut self.k
        }

        fn set_k(&mut self, k: Option<[u8; 32]>) {
            self.k = k
        }

        fn get_n(&self) -> u64 {
            self.n
        }

        fn set_n(&mut self, n: u64) {
            self.n = n
        }

        fn get_cipher(&mut self) -> &mut Option<ChaCha20Poly1305> {
            &mut self.cipher
        }
    }

    impl HandshakeOp<ChaCha20Poly1305> for TestHandShake {
        fn get_h(&mut self) -> &mut [u8; 32] {
            &mut self.h
        }

        fn get_ck(&mut self) -> &mut [u8; 32] {
            &mut self.ck
        }

        fn set_h(&mut self, data: [u8; 32]) {
            self.h = data
        }

        fn set_ck(&mut self, data: [u8; 32]) {
            self.ck = data
        }

        fn set_handshake_cipher(&mut self, cipher: ChaCha20Poly1305) {
            self.cipher = Some(cipher)
        }
    }

    #[test]
    fn is_a_cypher() {
        let mut cipher_1 = TestHandShake::new();
        let mut cipher_2 = TestHandShake::new();
        cipher_1.initialize_key([0; 32]);
        cipher_2.initialize_key([0; 32]);

        let ad = [1, 2, 3];
        let data = vec![1, 7, 92, 3, 4, 5];

        let mut encrypted = data.clone();
        cipher_1.encrypt_with_ad(&ad, &mut encrypted).unwrap();

        cipher_2.decrypt_with_ad(&ad, &mut encrypted).unwrap();

        assert!(encrypted == data);
    }

    #[test]
    fn initial_hash_is_sha256_of_chaining_key() {
        let mut tester = TestHandShake::new();
        let expected = Sha256Hash::hash(&NOISE_HASHED_PROTOCOL_NAME_CHACHA).to_byte_array();
        assert_eq!(*tester.get_h(), expected);
        assert_eq!(*tester.get_ck(), NOISE_HASHED_PROTOCOL_NAME_CHACHA);
        assert!(tester.get_k().is_none());
    }

    #[test]
    fn hmac_matches_the_two_pass_definition() {
        let k = [0; 32];
        let data = [0; 90];
        let value = hmac_sha256(&k, &data);

        // zero key xored with 0x36
        let mut to_hash = vec![0x36; 64];
        to_hash.extend_from_slice(&data);
        let temp = Sha256Hash::hash(&to_hash).to_byte_array();
        // zero key xored with 0x5c
        let mut to_hash = vec![0x5c; 64];
        to_hash.extend_from_slice(&temp);
        let expected = Sha256Hash::hash(&to_hash).to_byte_array();

        assert!(value == expected);
    }

    #[test]
    fn hkdf2_chains_its_outputs() {
        let chaining_key = [0; 32];
        let input_key_material = [0; 32];
        let temp_k = hmac_sha256(&chaining_key, &input_key_material);
        let expected_1 = hmac_sha256(&temp_k, &[0x1]);
        let mut temp_2 = expected_1.to_vec();
        temp_2.push(0x2);
        let expected_2 = hmac_sha256(&temp_k, &temp_2);
        let (out_1, out_2) = hkdf2(&chaining_key, &input_key_material);
        assert!(out_1 == expected_1);
        assert!(out_2 == expected_2);
    }

    #[test]
    fn test_mix_key() {
        let input_key_material = [0; 32];
        let ck = [0; 32];
        let mut tester = TestHandShake::new();
        tester.set_ck(ck);

        let (mut ck, temp_k) = hkdf2(&ck, &input_key_material);

        tester.mix_key(&input_key_material);

        assert!(tester.get_ck() == &mut ck);
        assert!(tester.get_k().unwrap() == temp_k);
        assert_eq!(tester.get_n(), 0);
    }

    #[test]
    fn test_mix_hash() {
        let data = [0; 32];
        let h = [0; 32];
        let mut tester = TestHandShake::new();
        tester.set_h(h);

        let mut to_hash = h.to_vec();
        to_hash.extend_from_slice(&data);
        let mut expected = Sha256Hash::hash(&to_hash).to_byte_array();

        tester.mix_hash(&data);

        assert!(tester.get_h() == &mut expected);
    }

    #[test]
    fn test_decrypt_encrypt_with_hash() {
        let mut cipher_1 = TestHandShake::new();
        let mut cipher_2 = TestHandShake::new();
        cipher_1.initialize_key([0; 32]);
        cipher_2.initialize_key([0; 32]);

        cipher_1.set_h([0; 32]);
        cipher_2.set_h([0; 32]);

        let data = vec![1, 7, 92, 3, 4, 5];

        let mut encrypted = data.clone();
        cipher_1.encrypt_and_hash(&mut encrypted).unwrap();
        assert!(encrypted != data);

        cipher_2.decrypt_and_hash(&mut encrypted).unwrap();

        assert!(encrypted == data);
        assert!(cipher_1.get_h() == cipher_2.get_h());
    }

    #[test]
    fn without_key_encrypt_and_hash_only_hashes() {
        let mut tester = TestHandShake::new();
        let h = *tester.get_h();
        let mut data = vec![];
        tester.encrypt_and_hash(&mut data).unwrap();
        assert!(data.is_empty());
        assert_eq!(*tester.get_h(), Sha256Hash::hash(&h).to_byte_array());
    }

    #[test]
    fn generated_keys_have_even_parity() {
        for _ in 0..16 {
            let kp = TestHandShake::generate_key();
            assert_eq!(kp.x_only_public_key().1, crate::PARITY);
        }
    }

    fn ecdh_agrees(kp1: &Keypair, kp2: &Keypair) -> bool {
        let ell_1 = ElligatorSwift::from_pubkey(kp1.public_key());
        let ell_2 = ElligatorSwift::from_pubkey(kp2.public_key());
        let ecdh_1 =
            TestHandShake::ellswift_ecdh(ell_1, ell_2, kp1.secret_key(), ElligatorSwiftParty::A);
        let ecdh_2 =
            TestHandShake::ellswift_ecdh(ell_1, ell_2, kp2.secret_key(), ElligatorSwiftParty::B);
        ecdh_1 == ecdh_2
    }

    #[test]
    fn test_ecdh() {
        let key_pair_1 = TestHandShake::generate_key();
        let key_pair_2 = TestHandShake::generate_key();
        assert!(ecdh_agrees(&key_pair_1, &key_pair_2));
    }

    #[test]
    fn ellswift_encoding_decodes_to_the_same_key() {
        let kp = TestHandShake::generate_key();
        let encoded = ElligatorSwift::from_pubkey(kp.public_key()).to_array();
        let decoded = PublicKey::from_ellswift(ElligatorSwift::from_array(encoded));
        assert_eq!(decoded, kp.public_key());
    }

    #[derive(Clone, Debug)]
    struct KeypairWrapper(pub Option<Keypair>);

    impl Arbitrary for KeypairWrapper {
        fn arbitrary(g: &mut quickcheck::Gen) -> Self {
            let secp = Secp256k1::new();
            let mut secret = Vec::<u8>::arbitrary(g);
            secret.resize(32, 0);
            let secret: [u8; 32] = secret.try_into().unwrap();
            match SecretKey::from_slice(&secret) {
                Ok(secret) => KeypairWrapper(Some(Keypair::from_secret_key(&secp, &secret))),
                Err(_) => KeypairWrapper(None),
            }
        }
    }

    #[quickcheck_macros::quickcheck]
    fn test_ecdh_1(kp1: KeypairWrapper, kp2: KeypairWrapper) -> TestResult {
        match (kp1.0, kp2.0) {
            (Some(kp1), Some(kp2)) => TestResult::from_bool(ecdh_agrees(&kp1, &kp2)),
            _ => TestResult::discard(),
        }
    }
}
