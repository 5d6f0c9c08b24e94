// Certificate sent by the responder during the handshake.
//
// Layout (74 bytes): `version: u16 LE | valid_from: u32 LE | not_valid_after: u32 LE |
// signature: [u8; 64]`. The Schnorr signature is made by the authority keypair over
// `SHA-256(version | valid_from | not_valid_after | responder static x-only key)`.

use core::convert::TryInto;

use crate::{error::Error, SIGNATURE_NOISE_MESSAGE_SIZE};
use secp256k1::{
    hashes::sha256, rand, schnorr::Signature, Keypair, Message, Secp256k1, XOnlyPublicKey,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureNoiseMessage {
    pub version: u16,
    pub valid_from: u32,
    pub not_valid_after: u32,
    pub signature: [u8; 64],
}

impl From<[u8; SIGNATURE_NOISE_MESSAGE_SIZE]> for SignatureNoiseMessage {
    fn from(value: [u8; SIGNATURE_NOISE_MESSAGE_SIZE]) -> Self {
        let mut signature = [0; 64];
        signature.copy_from_slice(&value[10..74]);
        Self {
            version: u16::from_le_bytes([value[0], value[1]]),
            valid_from: u32::from_le_bytes([value[2], value[3], value[4], value[5]]),
            not_valid_after: u32::from_le_bytes([value[6], value[7], value[8], value[9]]),
            signature,
        }
    }
}

/// Current UNIX time in seconds, saturated to `u32`.
pub(crate) fn now_secs() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .try_into()
        .unwrap_or(u32::MAX)
}

impl SignatureNoiseMessage {
    /// Verifies the certificate of `pk` against the current time.
    pub fn verify(
        &self,
        pk: &XOnlyPublicKey,
        authority_pk: &Option<XOnlyPublicKey>,
    ) -> Result<(), Error> {
        self.verify_with_now(pk, authority_pk, now_secs())
    }

    /// Verifies the certificate of `pk` as if the current time were `now`.
    ///
    /// Without an authority key there is nothing to check the certificate against and it is
    /// accepted as is.
    pub fn verify_with_now(
        &self,
        pk: &XOnlyPublicKey,
        authority_pk: &Option<XOnlyPublicKey>,
        now: u32,
    ) -> Result<(), Error> {
        let authority_pk = match authority_pk {
            Some(authority_pk) => authority_pk,
            None => return Ok(()),
        };
        let secp = Secp256k1::verification_only();
        let m = Self::signed_message(&self.header(), pk);
        let valid_signature = Signature::from_slice(&self.signature)
            .map(|s| secp.verify_schnorr(&s, &m, authority_pk).is_ok())
            .unwrap_or(false);
        if !valid_signature {
            return Err(Error::InvalidCertificate(self.serialize()));
        }
        if self.valid_from <= now && now <= self.not_valid_after {
            Ok(())
        } else {
            Err(Error::CertificateExpired {
                valid_from: self.valid_from,
                not_valid_after: self.not_valid_after,
                now,
            })
        }
    }

    /// Signs the header already written in `msg[..10]` and writes the signature in `msg[10..]`.
    pub fn sign(
        msg: &mut [u8; SIGNATURE_NOISE_MESSAGE_SIZE],
        static_pk: &XOnlyPublicKey,
        kp: &Keypair,
    ) {
        Self::sign_with_rng(msg, static_pk, kp, &mut rand::thread_rng());
    }

    pub fn sign_with_rng<R: rand::Rng + rand::CryptoRng>(
        msg: &mut [u8; SIGNATURE_NOISE_MESSAGE_SIZE],
        static_pk: &XOnlyPublicKey,
        kp: &Keypair,
        rng: &mut R,
    ) {
        let secp = Secp256k1::signing_only();
        let mut header = [0; 10];
        header.copy_from_slice(&msg[0..10]);
        let m = Self::signed_message(&header, static_pk);
        let signature = secp.sign_schnorr_with_rng(&m, kp, rng);
        msg[10..].copy_from_slice(signature.as_ref());
    }

    pub fn serialize(&self) -> [u8; SIGNATURE_NOISE_MESSAGE_SIZE] {
        let mut out = [0; SIGNATURE_NOISE_MESSAGE_SIZE];
        out[..10].copy_from_slice(&self.header());
        out[10..].copy_from_slice(&self.signature);
        out
    }

    fn header(&self) -> [u8; 10] {
        let mut m = [0; 10];
        m[0..2].copy_from_slice(&self.version.to_le_bytes());
        m[2..6].copy_from_slice(&self.valid_from.to_le_bytes());
        m[6..10].copy_from_slice(&self.not_valid_after.to_le_bytes());
        m
    }

    fn signed_message(header: &[u8; 10], static_pk: &XOnlyPublicKey) -> Message {
        let m = [&header[..], &static_pk.serialize()[..]].concat();
        Message::from_hashed_data::<sha256::Hash>(&m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{handshake::HandshakeOp, Responder};

    fn signed(valid_from: u32, not_valid_after: u32) -> (SignatureNoiseMessage, Keypair, Keypair) {
        let authority = Responder::generate_key();
        let static_kp = Responder::generate_key();
        let mut msg = [0; SIGNATURE_NOISE_MESSAGE_SIZE];
        msg[2..6].copy_from_slice(&valid_from.to_le_bytes());
        msg[6..10].copy_from_slice(&not_valid_after.to_le_bytes());
        SignatureNoiseMessage::sign(&mut msg, &static_kp.x_only_public_key().0, &authority);
        (msg.into(), authority, static_kp)
    }

    #[test]
    fn accepts_a_certificate_inside_its_window() {
        let (cert, authority, static_kp) = signed(100, 200);
        let pk = static_kp.x_only_public_key().0;
        let authority_pk = Some(authority.x_only_public_key().0);
        assert_eq!(cert.verify_with_now(&pk, &authority_pk, 100), Ok(()));
        assert_eq!(cert.verify_with_now(&pk, &authority_pk, 200), Ok(()));
    }

    #[test]
    fn rejects_a_certificate_outside_its_window() {
        let (cert, authority, static_kp) = signed(100, 200);
        let pk = static_kp.x_only_public_key().0;
        let authority_pk = Some(authority.x_only_public_key().0);
        assert_eq!(
            cert.verify_with_now(&pk, &authority_pk, 201),
            Err(Error::CertificateExpired {
                valid_from: 100,
                not_valid_after: 200,
                now: 201
            })
        );
        assert!(matches!(
            cert.verify_with_now(&pk, &authority_pk, 99),
            Err(Error::CertificateExpired { .. })
        ));
    }

    #[test]
    fn rejects_a_certificate_signed_by_another_authority() {
        let (cert, _authority, static_kp) = signed(100, 200);
        let pk = static_kp.x_only_public_key().0;
        let other = Some(Responder::generate_key().x_only_public_key().0);
        assert_eq!(
            cert.verify_with_now(&pk, &other, 150),
            Err(Error::InvalidCertificate(cert.serialize()))
        );
    }

    #[test]
    fn rejects_a_certificate_for_another_static_key() {
        let (cert, authority, _static_kp) = signed(100, 200);
        let other_pk = Responder::generate_key().x_only_public_key().0;
        let authority_pk = Some(authority.x_only_public_key().0);
        assert!(matches!(
            cert.verify_with_now(&other_pk, &authority_pk, 150),
            Err(Error::InvalidCertificate(_))
        ));
    }

    #[test]
    fn serialization_keeps_the_layout() {
        let (cert, _, _) = signed(0x0403_0201, 0x0807_0605);
        let bytes = cert.serialize();
        assert_eq!(&bytes[..10], &[0, 0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(SignatureNoiseMessage::from(bytes), cert);
    }
}
