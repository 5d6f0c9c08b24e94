// Initiator side of the Noise_NX handshake.
//
// The initiator knows the authority public key of the responder in advance. It sends its
// ephemeral key in `step_0` and, in `step_2`, derives the shared keys from the responder answer
// and checks that the responder static key is certified by that authority.

use std::{convert::TryInto, ptr};

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
    rand, Keypair, PublicKey, XOnlyPublicKey,
};

pub struct Initiator {
    handshake_cipher: Option<ChaCha20Poly1305>,
    k: Option<[u8; 32]>,
    n: u64,
    ck: [u8; 32],
    h: [u8; 32],
    // Ephemeral keypair and its ElligatorSwift encoding.
    e: Keypair,
    e_ellswift: ElligatorSwift,
    // When `None` the responder certificate is not checked.
    responder_authority_pk: Option<XOnlyPublicKey>,
}

impl std::fmt::Debug for Initiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Initiator").finish()
    }
}

impl CipherState<ChaCha20Poly1305> for Initiator {
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

impl HandshakeOp<ChaCha20Poly1305> for Initiator {
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

impl Initiator {
    /// Builds an initiator from the serialized x-only authority public key of the responder.
    pub fn from_raw_k(key: [u8; 32]) -> Result<Box<Self>, Error> {
        let pk = XOnlyPublicKey::from_slice(&key).map_err(|_| Error::InvalidRawPublicKey)?;
        Ok(Self::new(Some(pk)))
    }

    /// Builds an initiator that accepts any responder certificate.
    pub fn without_pk() -> Box<Self> {
        Self::new(None)
    }

    pub fn new(pk: Option<XOnlyPublicKey>) -> Box<Self> {
        Self::new_with_rng(pk, &mut rand::thread_rng())
    }

    pub fn new_with_rng<R: rand::Rng + ?Sized>(
        pk: Option<XOnlyPublicKey>,
        rng: &mut R,
    ) -> Box<Self> {
        let e = Self::generate_key_with_rng(rng);
        let mut self_ = Self {
            handshake_cipher: None,
            k: None,
            n: 0,
            ck: [0; 32],
            h: [0; 32],
            e_ellswift: ElligatorSwift::from_pubkey(e.public_key()),
            e,
            responder_authority_pk: pk,
        };
        self_.initialize_self();
        Box::new(self_)
    }

    /// First handshake message: the ElligatorSwift encoding of the ephemeral public key.
    pub fn step_0(&mut self) -> Result<[u8; ELLSWIFT_ENCODING_SIZE], Error> {
        let message = self.e_ellswift.to_array();
        self.mix_hash(&message);
        self.encrypt_and_hash(&mut vec![])?;
        Ok(message)
    }

    /// Reads the responder message and returns the transport codec.
    ///
    /// The certificate is checked against the current time, see [`Self::step_2_with_now`].
    pub fn step_2(
        &mut self,
        message: [u8; INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE],
    ) -> Result<NoiseCodec, Error> {
        self.step_2_with_now(message, now_secs())
    }

    pub fn step_2_with_now(
        &mut self,
        message: [u8; INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE],
        now: u32,
    ) -> Result<NoiseCodec, Error> {
        let mut re = [0; ELLSWIFT_ENCODING_SIZE];
        re.copy_from_slice(&message[0..ELLSWIFT_ENCODING_SIZE]);
        self.mix_hash(&re);

        let e_private_key = self.e.secret_key();
        let theirs_ephemeral = ElligatorSwift::from_array(re);
        let ecdh_ephemeral = Self::ellswift_ecdh(
            self.e_ellswift,
            theirs_ephemeral,
            e_private_key,
            ElligatorSwiftParty::A,
        );
        self.mix_key(&ecdh_ephemeral);

        let static_end = ELLSWIFT_ENCODING_SIZE + ENCRYPTED_ELLSWIFT_ENCODING_SIZE;
        let mut to_decrypt = message[ELLSWIFT_ENCODING_SIZE..static_end].to_vec();
        self.decrypt_and_hash(&mut to_decrypt)?;
        let theirs_static: [u8; ELLSWIFT_ENCODING_SIZE] = to_decrypt[..]
            .try_into()
            .map_err(|_| Error::InvalidMessageLength)?;
        let theirs_static = ElligatorSwift::from_array(theirs_static);
        let ecdh_static = Self::ellswift_ecdh(
            self.e_ellswift,
            theirs_static,
            e_private_key,
            ElligatorSwiftParty::A,
        );
        self.mix_key(&ecdh_static);

        let mut to_decrypt = message[static_end..].to_vec();
        self.decrypt_and_hash(&mut to_decrypt)?;
        let plaintext: [u8; SIGNATURE_NOISE_MESSAGE_SIZE] = to_decrypt
            .try_into()
            .map_err(|_| Error::InvalidMessageLength)?;
        let signature_message = SignatureNoiseMessage::from(plaintext);
        let rs_pk_xonly = PublicKey::from_ellswift(theirs_static).x_only_public_key().0;
        signature_message.verify_with_now(&rs_pk_xonly, &self.responder_authority_pk, now)?;

        let (temp_k1, temp_k2) = hkdf2(self.get_ck(), &[]);
        let mut encryptor = GenericCipher::ChaCha20Poly1305(Cipher::from_key(temp_k1));
        let mut decryptor = GenericCipher::ChaCha20Poly1305(Cipher::from_key(temp_k2));
        encryptor.erase_k();
        decryptor.erase_k();
        Ok(NoiseCodec {
            encryptor,
            decryptor,
        })
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
    }
}

impl Drop for Initiator {
    fn drop(&mut self) {
        self.erase();
    }
}
