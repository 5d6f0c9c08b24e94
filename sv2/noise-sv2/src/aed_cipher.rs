// Thin interface over the AEAD used by the handshake and the transport ciphers, so that the
// nonce bookkeeping in `cipher_state` does not depend on a concrete cipher type.

use chacha20poly1305::{
    aead::{Buffer, Error as AeadError},
    AeadInPlace, ChaCha20Poly1305, KeyInit,
};

pub trait AeadCipher {
    fn from_key(k: [u8; 32]) -> Self;

    fn encrypt<T: Buffer>(
        &mut self,
        nonce: &[u8; 12],
        ad: &[u8],
        data: &mut T,
    ) -> Result<(), AeadError>;

    fn decrypt<T: Buffer>(
        &mut self,
        nonce: &[u8; 12],
        ad: &[u8],
        data: &mut T,
    ) -> Result<(), AeadError>;
}

impl AeadCipher for ChaCha20Poly1305 {
    fn from_key(k: [u8; 32]) -> Self {
        ChaCha20Poly1305::new(&k.into())
    }

    fn encrypt<T: Buffer>(
        &mut self,
        nonce: &[u8; 12],
        ad: &[u8],
        data: &mut T,
    ) -> Result<(), AeadError> {
        self.encrypt_in_place(nonce.into(), ad, data)
    }

    fn decrypt<T: Buffer>(
        &mut self,
        nonce: &[u8; 12],
        ad: &[u8],
        data: &mut T,
    ) -> Result<(), AeadError> {
        self.decrypt_in_place(nonce.into(), ad, data)
    }
}
