//! Decoders for the binary structures authenticators produce. Everything
//! in this module operates on adversary-controlled bytes: every accessor
//! is fallible, nothing indexes unchecked, and all failures carry the
//! name of the offending field.

use std::convert::TryFrom;

use der_parser::ber::{BerObject, BerObjectContent, Class, Tag};
use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u32, be_u64};
use uuid::Uuid;

use crate::error::WebauthnError;
use crate::proto::{
    AuthenticatorAssertionResponseRaw, AuthenticatorAttestationResponseRaw, CollectedClientData,
};

/// Maximum credential id length permitted by the CTAP2 specification.
const CREDENTIAL_ID_MAX_LEN: usize = 1023;

const FLAG_USER_PRESENT: u8 = 0b0000_0001;
const FLAG_USER_VERIFIED: u8 = 0b0000_0100;
const FLAG_ATTESTED_CRED_DATA: u8 = 0b0100_0000;
const FLAG_EXTENSION_DATA: u8 = 0b1000_0000;

/// Decode a single CBOR value from the front of `input`, returning the
/// value and the number of bytes it occupied. Authenticator data packs
/// CBOR items back to back with no length prefix, so the consumed length
/// has to come from the decoder itself.
pub(crate) fn cbor_value_prefix(
    input: &[u8],
    field: &'static str,
) -> Result<(serde_cbor_2::Value, usize), WebauthnError> {
    let mut deserializer = serde_cbor_2::Deserializer::from_slice(input);
    let value: serde_cbor_2::Value = serde::de::Deserialize::deserialize(&mut deserializer)
        .map_err(|_| WebauthnError::MalformedStructure(field))?;
    Ok((value, deserializer.byte_offset()))
}

/// Attested credential data from a registration.
#[derive(Debug, Clone)]
pub(crate) struct AttestedCredentialData {
    /// The authenticator model identifier.
    pub aaguid: Uuid,
    /// The credential this registration created.
    pub credential_id: Vec<u8>,
    /// The credential public key as a raw COSE map.
    pub credential_pk: serde_cbor_2::Value,
}

/// Decoded authenticator data. Derived once from the raw byte string and
/// never mutated.
#[derive(Debug, Clone)]
pub(crate) struct AuthenticatorData {
    /// SHA-256 of the relying party id the authenticator scoped this to.
    pub rp_id_hash: Vec<u8>,
    /// The signature counter.
    pub counter: u32,
    /// User presence flag.
    pub user_present: bool,
    /// User verification flag.
    pub user_verified: bool,
    /// Attested credential data, present during registration.
    pub acd: Option<AttestedCredentialData>,
    /// Authenticator extension outputs.
    pub extensions: Option<serde_cbor_2::Value>,
}

impl TryFrom<&[u8]> for AuthenticatorData {
    type Error = WebauthnError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        // 37 is the sum of the mandatory field lengths.
        if data.len() < 37 {
            return Err(WebauthnError::MalformedStructure("authenticator data"));
        }

        let rp_id_hash = data[0..32].to_vec();
        let flags = data[32];
        let counter = u32::from_be_bytes(
            data[33..37]
                .try_into()
                .map_err(|_| WebauthnError::MalformedStructure("counter"))?,
        );

        let mut rest = &data[37..];

        let acd = if flags & FLAG_ATTESTED_CRED_DATA != 0 {
            let (r, aaguid) = take::<_, _, nom::error::Error<&[u8]>>(16usize)(rest)
                .map_err(|_| WebauthnError::MalformedStructure("aaguid"))?;
            let (r, cred_id_len) = be_u16::<_, nom::error::Error<&[u8]>>(r)
                .map_err(|_| WebauthnError::MalformedStructure("credential id length"))?;
            if cred_id_len as usize > CREDENTIAL_ID_MAX_LEN {
                return Err(WebauthnError::MalformedStructure("credential id length"));
            }
            let (r, credential_id) = take::<_, _, nom::error::Error<&[u8]>>(cred_id_len as usize)(r)
                .map_err(|_| WebauthnError::MalformedStructure("credential id"))?;
            let (credential_pk, consumed) = cbor_value_prefix(r, "credential public key")?;

            rest = &r[consumed..];
            Some(AttestedCredentialData {
                aaguid: Uuid::from_slice(aaguid)
                    .map_err(|_| WebauthnError::MalformedStructure("aaguid"))?,
                credential_id: credential_id.to_vec(),
                credential_pk,
            })
        } else {
            None
        };

        let extensions = if flags & FLAG_EXTENSION_DATA != 0 {
            let (ext, consumed) = cbor_value_prefix(rest, "extensions")?;
            rest = &rest[consumed..];
            Some(ext)
        } else {
            None
        };

        // Leftover bytes mean the structure lied about its own shape.
        if !rest.is_empty() {
            return Err(WebauthnError::MalformedStructure(
                "authenticator data trailing bytes",
            ));
        }

        Ok(AuthenticatorData {
            rp_id_hash,
            counter,
            user_present: flags & FLAG_USER_PRESENT != 0,
            user_verified: flags & FLAG_USER_VERIFIED != 0,
            acd,
            extensions,
        })
    }
}

/// The decoded top-level registration payload.
#[derive(Debug)]
pub(crate) struct AttestationObject {
    /// The attestation statement format identifier, uninterpreted.
    pub fmt: String,
    /// The format specific statement, left as CBOR for the verifier.
    pub att_stmt: serde_cbor_2::Value,
    /// The decoded authenticator data.
    pub auth_data: AuthenticatorData,
    /// The raw authenticator data bytes. Signatures commit to these, not
    /// to the decoded form.
    pub auth_data_bytes: Vec<u8>,
}

impl TryFrom<&[u8]> for AttestationObject {
    type Error = WebauthnError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        let value: serde_cbor_2::Value = serde_cbor_2::from_slice(data)?;
        let map = cbor_try_map!(&value)?;

        let fmt = map
            .get(&serde_cbor_2::Value::Text("fmt".to_string()))
            .ok_or(WebauthnError::MalformedStructure("attestation fmt"))
            .and_then(|v| cbor_try_string!(v))?;

        let att_stmt = map
            .get(&serde_cbor_2::Value::Text("attStmt".to_string()))
            .cloned()
            .ok_or(WebauthnError::MalformedStructure("attStmt"))?;

        let auth_data_bytes = map
            .get(&serde_cbor_2::Value::Text("authData".to_string()))
            .ok_or(WebauthnError::MalformedStructure("authData"))
            .and_then(|v| cbor_try_bytes!(v))?
            .clone();

        let auth_data = AuthenticatorData::try_from(auth_data_bytes.as_slice())?;

        Ok(AttestationObject {
            fmt,
            att_stmt,
            auth_data,
            auth_data_bytes,
        })
    }
}

/// A fully decoded registration response.
#[derive(Debug)]
pub(crate) struct AuthenticatorAttestationResponse {
    pub attestation_object: AttestationObject,
    pub client_data: CollectedClientData,
    pub client_data_bytes: Vec<u8>,
}

impl TryFrom<&AuthenticatorAttestationResponseRaw> for AuthenticatorAttestationResponse {
    type Error = WebauthnError;

    fn try_from(raw: &AuthenticatorAttestationResponseRaw) -> Result<Self, Self::Error> {
        let client_data: CollectedClientData = serde_json::from_slice(&raw.client_data_json.0)?;
        let attestation_object = AttestationObject::try_from(raw.attestation_object.0.as_slice())?;
        Ok(AuthenticatorAttestationResponse {
            attestation_object,
            client_data,
            client_data_bytes: raw.client_data_json.0.clone(),
        })
    }
}

/// A fully decoded assertion response.
#[derive(Debug)]
pub(crate) struct AuthenticatorAssertionResponse {
    pub authenticator_data: AuthenticatorData,
    pub authenticator_data_bytes: Vec<u8>,
    pub client_data: CollectedClientData,
    pub client_data_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

impl TryFrom<&AuthenticatorAssertionResponseRaw> for AuthenticatorAssertionResponse {
    type Error = WebauthnError;

    fn try_from(raw: &AuthenticatorAssertionResponseRaw) -> Result<Self, Self::Error> {
        let client_data: CollectedClientData = serde_json::from_slice(&raw.client_data_json.0)?;
        let authenticator_data =
            AuthenticatorData::try_from(raw.authenticator_data.0.as_slice())?;
        Ok(AuthenticatorAssertionResponse {
            authenticator_data,
            authenticator_data_bytes: raw.authenticator_data.0.clone(),
            client_data,
            client_data_bytes: raw.client_data_json.0.clone(),
            signature: raw.signature.0.clone(),
        })
    }
}

/// Fallible positional navigation over a parsed ASN.1 tree.
///
/// Attestation verifiers walk attacker-supplied certificate extensions by
/// structural position, so every hop returns an error rather than
/// faulting on an index that is not there.
pub(crate) trait AsnNavigate<'a> {
    /// The `n`th child of a constructed object.
    fn object(&self, n: usize) -> Result<&BerObject<'a>, WebauthnError>;
    /// The `n`th child, additionally asserting its tag.
    fn object_tagged(&self, n: usize, tag: Tag) -> Result<&BerObject<'a>, WebauthnError>;
    /// The primitive content bytes of this object.
    fn bytes(&self) -> Result<&'a [u8], WebauthnError>;
}

impl<'a> AsnNavigate<'a> for BerObject<'a> {
    fn object(&self, n: usize) -> Result<&BerObject<'a>, WebauthnError> {
        let children = match &self.content {
            BerObjectContent::Sequence(v) | BerObjectContent::Set(v) => v,
            _ => return Err(WebauthnError::MalformedStructure("asn1 constructed object")),
        };
        children
            .get(n)
            .ok_or(WebauthnError::MalformedStructure("asn1 child index"))
    }

    fn object_tagged(&self, n: usize, tag: Tag) -> Result<&BerObject<'a>, WebauthnError> {
        let child = self.object(n)?;
        if child.header.tag() != tag {
            return Err(WebauthnError::MalformedStructure("asn1 child tag"));
        }
        Ok(child)
    }

    fn bytes(&self) -> Result<&'a [u8], WebauthnError> {
        self.as_slice()
            .map_err(|_| WebauthnError::MalformedStructure("asn1 primitive content"))
    }
}

/// Parse a DER blob into a navigable tree.
pub(crate) fn parse_asn1(i: &[u8]) -> Result<BerObject<'_>, WebauthnError> {
    der_parser::parse_der(i)
        .map(|(_, obj)| obj)
        .map_err(|_| WebauthnError::MalformedStructure("asn1 der"))
}

/// Does a constructed authorization list contain a context tag with the
/// given number? Used for the android-key `allApplications` (600) check.
pub(crate) fn asn1_contains_context_tag(obj: &BerObject<'_>, number: u32) -> bool {
    let children = match &obj.content {
        BerObjectContent::Sequence(v) | BerObjectContent::Set(v) => v,
        _ => return false,
    };
    children.iter().any(|child| {
        child.header.class() == Class::ContextSpecific && child.header.tag().0 == number
    })
}

// TPM 2.0 structure decoding, TPMS_ATTEST / TPMT_PUBLIC and the 2B
// length-prefixed buffers they carry. Reference: TPM 2.0 Part 2
// (Structures), trimmed to the fields attestation actually inspects.

/// Four byte constant marking a TPM generated structure.
pub(crate) const TPM_GENERATED_VALUE: u32 = 0xff54_4347;
/// TPMI_ST_ATTEST for an attestation certify statement.
pub(crate) const TPM_ST_ATTEST_CERTIFY: u16 = 0x8017;

pub(crate) const TPM_ALG_RSA: u16 = 0x0001;
pub(crate) const TPM_ALG_NULL: u16 = 0x0010;
pub(crate) const TPM_ALG_SHA1: u16 = 0x0004;
pub(crate) const TPM_ALG_SHA256: u16 = 0x000b;
pub(crate) const TPM_ALG_SHA384: u16 = 0x000c;
pub(crate) const TPM_ALG_SHA512: u16 = 0x000d;
pub(crate) const TPM_ALG_ECC: u16 = 0x0023;

fn tpm2b(i: &[u8]) -> nom::IResult<&[u8], &[u8]> {
    let (i, len) = be_u16(i)?;
    take(len as usize)(i)
}

/// Algorithm-specific parameters of a TPMT_PUBLIC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TpmuPublicParms {
    Rsa {
        /// Symmetric algorithm for a restricted decryption key.
        symmetric: u16,
        /// Signing scheme.
        scheme: u16,
        /// Number of bits in the public modulus.
        key_bits: u16,
        /// Public exponent; zero encodes the default 2^16 + 1.
        exponent: u32,
    },
    Ecc {
        symmetric: u16,
        scheme: u16,
        /// TPM_ECC_CURVE identifier.
        curve_id: u16,
        /// Key derivation scheme.
        kdf: u16,
    },
}

/// The unique identifier of a TPMT_PUBLIC. An ECC key carries a
/// TPMS_ECC_POINT, two length-prefixed buffers for x and y.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TpmuPublicId {
    Rsa(Vec<u8>),
    Ecc { x: Vec<u8>, y: Vec<u8> },
}

/// The public area of a TPM key, as carried in the attestation statement.
#[derive(Debug, Clone)]
pub(crate) struct TpmtPublic {
    /// TPM_ALG_RSA or TPM_ALG_ECC.
    pub type_: u16,
    /// The algorithm the key's name is hashed with.
    pub name_alg: u16,
    pub _object_attributes: u32,
    pub _auth_policy: Vec<u8>,
    pub parameters: TpmuPublicParms,
    /// The RSA modulus or the ECC public point.
    pub unique: TpmuPublicId,
}

impl TpmtPublic {
    /// The RSA public exponent, applying the TPM default when encoded as
    /// zero.
    pub(crate) fn rsa_exponent(&self) -> Option<u32> {
        match self.parameters {
            TpmuPublicParms::Rsa { exponent: 0, .. } => Some(65537),
            TpmuPublicParms::Rsa { exponent, .. } => Some(exponent),
            TpmuPublicParms::Ecc { .. } => None,
        }
    }
}

impl TryFrom<&[u8]> for TpmtPublic {
    type Error = WebauthnError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        fn parse(i: &[u8]) -> nom::IResult<&[u8], TpmtPublic> {
            let (i, type_) = be_u16(i)?;
            let (i, name_alg) = be_u16(i)?;
            let (i, object_attributes) = be_u32(i)?;
            let (i, auth_policy) = tpm2b(i)?;
            let (i, (parameters, unique)) = match type_ {
                TPM_ALG_RSA => {
                    let (i, symmetric) = be_u16(i)?;
                    let (i, scheme) = be_u16(i)?;
                    let (i, key_bits) = be_u16(i)?;
                    let (i, exponent) = be_u32(i)?;
                    let (i, modulus) = tpm2b(i)?;
                    (
                        i,
                        (
                            TpmuPublicParms::Rsa {
                                symmetric,
                                scheme,
                                key_bits,
                                exponent,
                            },
                            TpmuPublicId::Rsa(modulus.to_vec()),
                        ),
                    )
                }
                TPM_ALG_ECC => {
                    let (i, symmetric) = be_u16(i)?;
                    let (i, scheme) = be_u16(i)?;
                    let (i, curve_id) = be_u16(i)?;
                    // Two bytes of padding ahead of the kdf.
                    let (i, _) = take(2usize)(i)?;
                    let (i, kdf) = be_u16(i)?;
                    // unique is a TPMS_ECC_POINT, x then y.
                    let (i, x) = tpm2b(i)?;
                    let (i, y) = tpm2b(i)?;
                    (
                        i,
                        (
                            TpmuPublicParms::Ecc {
                                symmetric,
                                scheme,
                                curve_id,
                                kdf,
                            },
                            TpmuPublicId::Ecc {
                                x: x.to_vec(),
                                y: y.to_vec(),
                            },
                        ),
                    )
                }
                _ => {
                    return Err(nom::Err::Failure(nom::error::Error::new(
                        i,
                        nom::error::ErrorKind::Tag,
                    )))
                }
            };
            Ok((
                i,
                TpmtPublic {
                    type_,
                    name_alg,
                    _object_attributes: object_attributes,
                    _auth_policy: auth_policy.to_vec(),
                    parameters,
                    unique,
                },
            ))
        }

        let (rem, public) =
            parse(data).map_err(|_| WebauthnError::MalformedStructure("tpmt public"))?;
        if !rem.is_empty() {
            return Err(WebauthnError::MalformedStructure(
                "tpmt public trailing bytes",
            ));
        }
        Ok(public)
    }
}

/// A TPMS_ATTEST certify statement.
#[derive(Debug, Clone)]
pub(crate) struct TpmsAttest {
    /// Must equal [`TPM_GENERATED_VALUE`].
    pub magic: u32,
    /// Must equal [`TPM_ST_ATTEST_CERTIFY`].
    pub type_: u16,
    pub _qualified_signer: Vec<u8>,
    /// Hash of the attested data, algorithm chosen by the attStmt alg.
    pub extra_data: Vec<u8>,
    pub _firmware_version: u64,
    /// nameAlg id then the nameAlg hash of the pubArea.
    pub attested_name: Vec<u8>,
    pub _attested_qualified_name: Vec<u8>,
}

impl TryFrom<&[u8]> for TpmsAttest {
    type Error = WebauthnError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        fn parse(i: &[u8]) -> nom::IResult<&[u8], TpmsAttest> {
            let (i, magic) = be_u32(i)?;
            let (i, type_) = be_u16(i)?;
            let (i, qualified_signer) = tpm2b(i)?;
            let (i, extra_data) = tpm2b(i)?;
            // TPMS_CLOCK_INFO: clock u64, resetCount u32, restartCount
            // u32, safe u8. Nothing here is attested, skip it whole.
            let (i, _clock_info) = take(17usize)(i)?;
            let (i, firmware_version) = be_u64(i)?;
            let (i, attested_name) = tpm2b(i)?;
            let (i, attested_qualified_name) = tpm2b(i)?;
            Ok((
                i,
                TpmsAttest {
                    magic,
                    type_,
                    _qualified_signer: qualified_signer.to_vec(),
                    extra_data: extra_data.to_vec(),
                    _firmware_version: firmware_version,
                    attested_name: attested_name.to_vec(),
                    _attested_qualified_name: attested_qualified_name.to_vec(),
                },
            ))
        }

        parse(data)
            .map(|(_, p)| p)
            .map_err(|_| WebauthnError::MalformedStructure("tpms attest"))
    }
}

/// The digest a TPM nameAlg identifier selects.
pub(crate) fn tpm_name_alg_digest(
    name_alg: u16,
) -> Result<openssl::hash::MessageDigest, WebauthnError> {
    match name_alg {
        TPM_ALG_SHA1 => Ok(openssl::hash::MessageDigest::sha1()),
        TPM_ALG_SHA256 => Ok(openssl::hash::MessageDigest::sha256()),
        TPM_ALG_SHA384 => Ok(openssl::hash::MessageDigest::sha384()),
        TPM_ALG_SHA512 => Ok(openssl::hash::MessageDigest::sha512()),
        _ => Err(WebauthnError::UnsupportedAlgorithm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags_byte(up: bool, uv: bool, at: bool, ed: bool) -> u8 {
        (up as u8) | ((uv as u8) << 2) | ((at as u8) << 6) | ((ed as u8) << 7)
    }

    #[test]
    fn authenticator_data_too_short() {
        let r = AuthenticatorData::try_from(&[0u8; 36][..]);
        assert!(matches!(r, Err(WebauthnError::MalformedStructure(_))));
    }

    #[test]
    fn authenticator_data_minimal() {
        let mut data = vec![0xaa; 32];
        data.push(flags_byte(true, false, false, false));
        data.extend_from_slice(&42u32.to_be_bytes());
        let ad = AuthenticatorData::try_from(data.as_slice()).expect("decode");
        assert!(ad.user_present);
        assert!(!ad.user_verified);
        assert_eq!(ad.counter, 42);
        assert!(ad.acd.is_none());
        assert!(ad.extensions.is_none());
    }

    #[test]
    fn authenticator_data_trailing_bytes_rejected() {
        let mut data = vec![0xaa; 32];
        data.push(flags_byte(true, false, false, false));
        data.extend_from_slice(&1u32.to_be_bytes());
        data.push(0x00);
        assert!(matches!(
            AuthenticatorData::try_from(data.as_slice()),
            Err(WebauthnError::MalformedStructure(
                "authenticator data trailing bytes"
            ))
        ));
    }

    #[test]
    fn authenticator_data_oversized_credential_id_rejected() {
        let mut data = vec![0xaa; 32];
        data.push(flags_byte(true, false, true, false));
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&[0u8; 16]); // aaguid
        data.extend_from_slice(&2000u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 2000]);
        assert!(matches!(
            AuthenticatorData::try_from(data.as_slice()),
            Err(WebauthnError::MalformedStructure("credential id length"))
        ));
    }

    fn rsa_pubarea_bytes() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&TPM_ALG_RSA.to_be_bytes());
        data.extend_from_slice(&TPM_ALG_SHA256.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes()); // objectAttributes
        data.extend_from_slice(&0u16.to_be_bytes()); // empty authPolicy
        data.extend_from_slice(&TPM_ALG_NULL.to_be_bytes()); // symmetric
        data.extend_from_slice(&TPM_ALG_NULL.to_be_bytes()); // scheme
        data.extend_from_slice(&2048u16.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes()); // default exponent
        data.extend_from_slice(&4u16.to_be_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]); // unique
        data
    }

    #[test]
    fn tpmt_public_rsa_default_exponent() {
        let p = TpmtPublic::try_from(rsa_pubarea_bytes().as_slice()).expect("pubarea");
        assert_eq!(p.rsa_exponent(), Some(65537));
        assert_eq!(p.unique, TpmuPublicId::Rsa(vec![1, 2, 3, 4]));
    }

    #[test]
    fn tpmt_public_ecc_point_carries_both_coordinates() {
        let mut data = Vec::new();
        data.extend_from_slice(&TPM_ALG_ECC.to_be_bytes());
        data.extend_from_slice(&TPM_ALG_SHA256.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes()); // objectAttributes
        data.extend_from_slice(&0u16.to_be_bytes()); // empty authPolicy
        data.extend_from_slice(&TPM_ALG_NULL.to_be_bytes()); // symmetric
        data.extend_from_slice(&0x0018u16.to_be_bytes()); // scheme ecdsa
        data.extend_from_slice(&0x0003u16.to_be_bytes()); // curve nist p256
        data.extend_from_slice(&TPM_ALG_SHA256.to_be_bytes());
        data.extend_from_slice(&TPM_ALG_NULL.to_be_bytes()); // kdf
        data.extend_from_slice(&32u16.to_be_bytes());
        data.extend_from_slice(&[0xaa; 32]); // x
        data.extend_from_slice(&32u16.to_be_bytes());
        data.extend_from_slice(&[0xbb; 32]); // y
        let p = TpmtPublic::try_from(data.as_slice()).expect("pubarea");
        assert_eq!(
            p.unique,
            TpmuPublicId::Ecc {
                x: vec![0xaa; 32],
                y: vec![0xbb; 32],
            }
        );
    }

    #[test]
    fn tpmt_public_trailing_bytes_rejected() {
        let mut data = rsa_pubarea_bytes();
        data.push(0x00);
        assert!(matches!(
            TpmtPublic::try_from(data.as_slice()),
            Err(WebauthnError::MalformedStructure("tpmt public trailing bytes"))
        ));
    }

    #[test]
    fn tpms_attest_rejects_truncation() {
        let data = TPM_GENERATED_VALUE.to_be_bytes();
        assert!(matches!(
            TpmsAttest::try_from(&data[..]),
            Err(WebauthnError::MalformedStructure("tpms attest"))
        ));
    }
}
