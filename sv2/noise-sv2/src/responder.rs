// Responder side of the Noise_NX handshake.
//
// The responder owns an authority keypair, whose public key is distributed to the initiators
// out of band, and a static keypair generated at construction. Every handshake certifies the
// static key with a `SignatureNoiseMessage` signed by the authority and valid for
// `cert_validity` seconds from the moment `step_1` runs.

use std::{convert::TryFrom, ptr, time::Duration};

use crate::{
    cipher_state::{Cipher, CipherState, GenericCipher},
    error::Error,
    handshake::{hkdf2, HandshakeOp},
    signature_message::{now_secs, SignatureNoiseMessage},
    NoiseCodec, ELLSWIFT_ENCODING_SIZE, ENCRYPTED_ELLSWIFT_ENCODING_SIZE,
    INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE, SIGNATURE_NOISE_MESSAGE_SIZE,
};
use chacha20poly1305::ChaCha20Poly1305;
use secp256k1::{
    ellswift::{ElligatorSwift, ElligatorSwiftParty},
    rand, Keypair, Secp256k1, SecretKey, XOnlyPublicKey,
};

pub struct Responder {
    handshake_cipher: Option<ChaCha20Poly1305>,
    k: Option<[u8; 32]>,
    n: u64,
    ck: [u8; 32],
    h: [u8; 32],
    // Ephemeral keypair, generated again for every handshake.
    e: Keypair,
    // Static keypair, certified by `a`.
    s: Keypair,
    // Authority keypair.
    a: Keypair,
    cert_validity: u32,
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder").finish()
    }
}

impl CipherState<ChaCha20Poly1305> for Responder {
    fn get_k(&mut self) -> &mut Option<[u8; 32]> {
        &mut self.k
    }

    fn set_k(&mut self, k: Option<[u8; 32]>) {
        self.k = k;
    }

    fn get_n(&self) -> u64 {
        self.n
    }

    fn set_n(&mut self, n: u64) {
        self.n = n;
    }

    fn get_cipher(&mut self) -> &mut Option<ChaCha20Poly1305> {
        &mut self.handshake_cipher
    }
}

impl HandshakeOp<ChaCha20Poly1305> for Responder {
    fn get_h(&mut self) -> &mut [u8; 32] {
        &mut self.h
    }

    fn get_ck(&mut self) -> &mut [u8; 32] {
        &mut self.ck
    }

    fn set_h(&mut self, data: [u8; 32]) {
        self.h = data;
    }

    fn set_ck(&mut self, data: [u8; 32]) {
        self.ck = data;
    }

    fn set_handshake_cipher(&mut self, cipher: ChaCha20Poly1305) {
        self.handshake_cipher = Some(cipher);
    }
}

impl Responder {
    pub fn new(a: Keypair, cert_validity: u32) -> Box<Self> {
        Self::new_with_rng(a, cert_validity, &mut rand::thread_rng())
    }

    pub fn new_with_rng<R: rand::Rng + ?Sized>(
        a: Keypair,
        cert_validity: u32,
        rng: &mut R,
    ) -> Box<Self> {
        let mut self_ = Self {
            handshake_cipher: None,
            k: None,
            n: 0,
            ck: [0; 32],
            h: [0; 32],
            e: Self::generate_key_with_rng(rng),
            s: Self::generate_key_with_rng(rng),
            a,
            cert_validity,
        };
        self_.initialize_self();
        Box::new(self_)
    }

    /// Builds a responder from the serialized authority keys.
    ///
    /// `public` is the x-only public key and must belong to `private`.
    pub fn from_authority_kp(
        public: &[u8; 32],
        private: &[u8; 32],
        cert_validity: Duration,
    ) -> Result<Box<Self>, Error> {
        let secp = Secp256k1::new();
        let secret = SecretKey::from_slice(private).map_err(|_| Error::InvalidRawPrivateKey)?;
        let kp = Keypair::from_secret_key(&secp, &secret);
        let pub_ = XOnlyPublicKey::from_slice(public).map_err(|_| Error::InvalidRawPublicKey)?;
        if kp.x_only_public_key().0 != pub_ {
            return Err(Error::KeypairMismatch);
        }
        let cert_validity = u32::try_from(cert_validity.as_secs()).unwrap_or(u32::MAX);
        Ok(Self::new(kp, cert_validity))
    }

    /// Reads the initiator ephemeral key and answers with
    /// `e.ellswift (64) | enc(s.ellswift) (80) | enc(certificate) (90)`.
    pub fn step_1(
        &mut self,
        elligatorswift_theirs_ephemeral_serialized: [u8; ELLSWIFT_ENCODING_SIZE],
    ) -> Result<([u8; INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE], NoiseCodec), Error> {
        self.step_1_with_now_rng(
            elligatorswift_theirs_ephemeral_serialized,
            now_secs(),
            &mut rand::thread_rng(),
        )
    }

    pub fn step_1_with_now_rng<R: rand::Rng + rand::CryptoRng>(
        &mut self,
        elligatorswift_theirs_ephemeral_serialized: [u8; ELLSWIFT_ENCODING_SIZE],
        now: u32,
        rng: &mut R,
    ) -> Result<([u8; INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE], NoiseCodec), Error> {
        self.mix_hash(&elligatorswift_theirs_ephemeral_serialized);
        self.decrypt_and_hash(&mut vec![])?;

        self.e = Self::generate_key_with_rng(rng);
        let ours_ephemeral = ElligatorSwift::from_pubkey(self.e.public_key());
        let ours_ephemeral_serialized = ours_ephemeral.to_array();
        let mut out = [0; INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE];
        out[..ELLSWIFT_ENCODING_SIZE].copy_from_slice(&ours_ephemeral_serialized);
        self.mix_hash(&ours_ephemeral_serialized);

        let theirs_ephemeral =
            ElligatorSwift::from_array(elligatorswift_theirs_ephemeral_serialized);
        let ecdh_ephemeral = Self::ellswift_ecdh(
            theirs_ephemeral,
            ours_ephemeral,
            self.e.secret_key(),
            ElligatorSwiftParty::B,
        );
        self.mix_key(&ecdh_ephemeral);

        let ours_static = ElligatorSwift::from_pubkey(self.s.public_key());
        let mut encrypted_static = ours_static.to_array().to_vec();
        self.encrypt_and_hash(&mut encrypted_static)?;
        let static_end = ELLSWIFT_ENCODING_SIZE + ENCRYPTED_ELLSWIFT_ENCODING_SIZE;
        if encrypted_static.len() != ENCRYPTED_ELLSWIFT_ENCODING_SIZE {
            return Err(Error::InvalidMessageLength);
        }
        out[ELLSWIFT_ENCODING_SIZE..static_end].copy_from_slice(&encrypted_static);

        let ecdh_static = Self::ellswift_ecdh(
            theirs_ephemeral,
            ours_static,
            self.s.secret_key(),
            ElligatorSwiftParty::B,
        );
        self.mix_key(&ecdh_static);

        let mut certificate = self.certificate(now, rng).to_vec();
        self.encrypt_and_hash(&mut certificate)?;
        if certificate.len() != INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE - static_end {
            return Err(Error::InvalidMessageLength);
        }
        out[static_end..].copy_from_slice(&certificate);

        let (temp_k1, temp_k2) = hkdf2(self.get_ck(), &[]);
        let mut encryptor = GenericCipher::ChaCha20Poly1305(Cipher::from_key(temp_k2));
        let mut decryptor = GenericCipher::ChaCha20Poly1305(Cipher::from_key(temp_k1));
        encryptor.erase_k();
        decryptor.erase_k();
        Ok((
            out,
            NoiseCodec {
                encryptor,
                decryptor,
            },
        ))
    }

    fn certificate<R: rand::Rng + rand::CryptoRng>(
        &self,
        now: u32,
        rng: &mut R,
    ) -> [u8; SIGNATURE_NOISE_MESSAGE_SIZE] {
        let mut msg = [0; SIGNATURE_NOISE_MESSAGE_SIZE];
        let not_valid_after = now.saturating_add(self.cert_validity);
        msg[0..2].copy_from_slice(&0_u16.to_le_bytes());
        msg[2..6].copy_from_slice(&now.to_le_bytes());
        msg[6..10].copy_from_slice(&not_valid_after.to_le_bytes());
        let static_pk = self.s.x_only_public_key().0;
        SignatureNoiseMessage::sign_with_rng(&mut msg, &static_pk, &self.a, rng);
        msg
    }

    fn erase(&mut self) {
        if let Some(k) = self.k.as_mut() {
            for b in k {
                unsafe { ptr::write_volatile(b, 0) };
            }
        }
        for b in self.ck.iter_mut() {
            unsafe { ptr::write_volatile(b, 0) };
        }
        for b in self.h.iter_mut() {
            unsafe { ptr::write_volatile(b, 0) };
        }
        self.e.non_secure_erase();
        self.s.non_secure_erase();
        self.a.non_secure_erase();
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        self.erase();
    }
}
