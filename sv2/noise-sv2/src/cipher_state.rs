// Nonce and key bookkeeping shared by the handshake states and the transport ciphers.
//
// The nonce is a 12-byte value made of 4 zero bytes followed by the little-endian counter
// `n`. The counter is incremented for every successful operation and left untouched when the
// AEAD operation fails. A counter equal to `u64::MAX` is never used: the session has to be
// closed before that point.

use core::ptr;

use crate::{aed_cipher::AeadCipher, error::Error};
use chacha20poly1305::{aead::Buffer, ChaCha20Poly1305};

pub trait CipherState<Cipher_: AeadCipher>
where
    Self: Sized,
{
    fn get_k(&mut self) -> &mut Option<[u8; 32]>;

    fn set_k(&mut self, k: Option<[u8; 32]>);

    fn get_n(&self) -> u64;

    fn set_n(&mut self, n: u64);

    fn get_cipher(&mut self) -> &mut Option<Cipher_>;

    fn nonce_to_bytes(&self) -> [u8; 12] {
        let mut res = [0u8; 12];
        res[4..].copy_from_slice(&self.get_n().to_le_bytes());
        res
    }

    fn encrypt_with_ad<T: Buffer>(&mut self, ad: &[u8], data: &mut T) -> Result<(), Error> {
        let n = self.get_n();
        if self.get_cipher().is_none() {
            return Ok(());
        }
        if n == u64::MAX {
            return Err(Error::NonceExhausted);
        }
        let nonce = self.nonce_to_bytes();
        if let Some(c) = self.get_cipher() {
            c.encrypt(&nonce, ad, data)?;
        }
        self.set_n(n + 1);
        Ok(())
    }

    fn decrypt_with_ad<T: Buffer>(&mut self, ad: &[u8], data: &mut T) -> Result<(), Error> {
        let n = self.get_n();
        if self.get_cipher().is_none() {
            return Ok(());
        }
        if n == u64::MAX {
            return Err(Error::NonceExhausted);
        }
        let nonce = self.nonce_to_bytes();
        if let Some(c) = self.get_cipher() {
            c.decrypt(&nonce, ad, data)?;
        }
        self.set_n(n + 1);
        Ok(())
    }
}

#[derive(Clone)]
pub enum GenericCipher {
    ChaCha20Poly1305(Cipher<ChaCha20Poly1305>),
}

impl Drop for GenericCipher {
    fn drop(&mut self) {
        self.erase_k();
    }
}

impl GenericCipher {
    pub fn encrypt<T: Buffer>(&mut self, msg: &mut T) -> Result<(), Error> {
        match self {
            GenericCipher::ChaCha20Poly1305(c) => c.encrypt_with_ad(&[], msg),
        }
    }

    pub fn decrypt<T: Buffer>(&mut self, msg: &mut T) -> Result<(), Error> {
        match self {
            GenericCipher::ChaCha20Poly1305(c) => c.decrypt_with_ad(&[], msg),
        }
    }

    // Only the initialized AEAD is needed after the handshake, the raw key can go.
    pub fn erase_k(&mut self) {
        match self {
            GenericCipher::ChaCha20Poly1305(c) => {
                if let Some(k) = c.k.as_mut() {
                    for b in k {
                        unsafe { ptr::write_volatile(b, 0) };
                    }
                    c.k = None;
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn set_nonce(&mut self, n: u64) {
        match self {
            GenericCipher::ChaCha20Poly1305(c) => c.set_n(n),
        }
    }
}

#[derive(Clone)]
pub struct Cipher<C: AeadCipher> {
    k: Option<[u8; 32]>,
    n: u64,
    cipher: Option<C>,
}

impl<C: AeadCipher> Cipher<C> {
    pub fn from_key(k: [u8; 32]) -> Self {
        Self {
            k: Some(k),
            n: 0,
            cipher: Some(C::from_key(k)),
        }
    }
}

impl<C: AeadCipher> CipherState<C> for Cipher<C> {
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

    fn get_cipher(&mut self) -> &mut Option<C> {
        &mut self.cipher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_zero_padded_little_endian_counter() {
        let mut c: Cipher<ChaCha20Poly1305> = Cipher::from_key([3; 32]);
        c.set_n(0x0102);
        assert_eq!(c.nonce_to_bytes(), [0, 0, 0, 0, 2, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn counter_advances_only_on_success() {
        let mut sender: Cipher<ChaCha20Poly1305> = Cipher::from_key([3; 32]);
        let mut receiver: Cipher<ChaCha20Poly1305> = Cipher::from_key([3; 32]);
        let mut msg = vec![1_u8, 2, 3];
        sender.encrypt_with_ad(&[], &mut msg).unwrap();
        assert_eq!(sender.get_n(), 1);

        let mut tampered = msg.clone();
        tampered[0] ^= 1;
        assert!(matches!(
            receiver.decrypt_with_ad(&[], &mut tampered),
            Err(Error::Aead(_))
        ));
        assert_eq!(receiver.get_n(), 0);

        receiver.decrypt_with_ad(&[], &mut msg).unwrap();
        assert_eq!(msg, vec![1, 2, 3]);
        assert_eq!(receiver.get_n(), 1);
    }

    #[test]
    fn last_nonce_is_never_used() {
        let mut c = GenericCipher::ChaCha20Poly1305(Cipher::from_key([9; 32]));
        c.set_nonce(u64::MAX - 1);
        let mut msg = vec![0_u8; 4];
        assert!(c.encrypt(&mut msg).is_ok());
        let mut msg = vec![0_u8; 4];
        assert_eq!(c.encrypt(&mut msg), Err(Error::NonceExhausted));
        assert_eq!(msg, vec![0_u8; 4]);
    }
}
