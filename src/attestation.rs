//! Attestation statement verification.
//!
//! One verification routine per registered attestation statement format.
//! Each routine checks the statement's internal consistency - signatures,
//! certificate extensions, key equalities - and reports the trust path it
//! found as [`ParsedAttestationData`]. Anchoring that path to configured
//! roots and cross-checking metadata happens in the ceremony layer, which
//! knows where trust comes from.

use std::convert::TryFrom;

use der_parser::ber::{Class, Tag};
use openssl::x509;
use uuid::Uuid;
use x509_parser::oid_registry::Oid;

use crate::crypto::{
    assert_packed_attest_req, assert_tpm_attest_req, cert_public_key_matches, compute_hash,
    compute_sha256, only_hash_from_type, verify_signature_with_cert, COSEAlgorithm, COSEKey,
    COSEKeyType,
};
use crate::error::WebauthnError;
use crate::internals::{
    asn1_contains_context_tag, parse_asn1, AsnNavigate, AttestationObject, AttestedCredentialData,
    TpmsAttest, TpmtPublic, TpmuPublicId, TpmuPublicParms, tpm_name_alg_digest, TPM_ALG_ECC,
    TPM_ALG_NULL, TPM_ALG_RSA, TPM_GENERATED_VALUE, TPM_ST_ATTEST_CERTIFY,
};

/// The registered attestation statement formats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum AttestationFormat {
    /// Packed attestation
    Packed,
    /// TPM attestation
    Tpm,
    /// Android hardware key attestation
    AndroidKey,
    /// Android SafetyNet JWS attestation
    AndroidSafetyNet,
    /// U2F attestation
    FidoU2F,
    /// Apple anonymous attestation
    AppleAnonymous,
    /// No attestation
    None,
}

impl TryFrom<&str> for AttestationFormat {
    type Error = WebauthnError;

    fn try_from(a: &str) -> Result<AttestationFormat, Self::Error> {
        match a {
            "packed" => Ok(AttestationFormat::Packed),
            "tpm" => Ok(AttestationFormat::Tpm),
            "android-key" => Ok(AttestationFormat::AndroidKey),
            "android-safetynet" => Ok(AttestationFormat::AndroidSafetyNet),
            "fido-u2f" => Ok(AttestationFormat::FidoU2F),
            "apple" => Ok(AttestationFormat::AppleAnonymous),
            "none" => Ok(AttestationFormat::None),
            _ => Err(WebauthnError::UnsupportedAttestationFormat(a.to_string())),
        }
    }
}

/// The attestation type a verifier concluded, without the trust path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationType {
    /// Basic attestation with a batch certificate.
    Basic,
    /// Self (surrogate) attestation.
    Self_,
    /// Attestation via a privacy CA (TPM).
    AttCa,
    /// Anonymization CA (Apple).
    AnonCa,
    /// Direct anonymous attestation.
    Ecdaa,
    /// No attestation claim was made.
    None,
    /// The format could not establish an attestation type.
    Uncertain,
}

/// The result of attestation statement verification: the type concluded
/// and the trust path (leaf first) when the format produced one.
#[derive(Debug, Clone)]
pub enum ParsedAttestationData {
    /// Basic attestation, with the x5c trust path.
    Basic(Vec<x509::X509>),
    /// Self attestation; no trust path exists.
    Self_,
    /// Attestation CA, with the x5c trust path.
    AttCa(Vec<x509::X509>),
    /// Anonymization CA, with the x5c trust path.
    AnonCa(Vec<x509::X509>),
    /// ECDAA. Never produced; verification is not implemented.
    Ecdaa,
    /// No attestation was provided.
    None,
    /// Attestation was present but could not be classified.
    Uncertain,
}

impl ParsedAttestationData {
    /// The attestation type without the trust path.
    pub fn attestation_type(&self) -> AttestationType {
        match self {
            ParsedAttestationData::Basic(_) => AttestationType::Basic,
            ParsedAttestationData::Self_ => AttestationType::Self_,
            ParsedAttestationData::AttCa(_) => AttestationType::AttCa,
            ParsedAttestationData::AnonCa(_) => AttestationType::AnonCa,
            ParsedAttestationData::Ecdaa => AttestationType::Ecdaa,
            ParsedAttestationData::None => AttestationType::None,
            ParsedAttestationData::Uncertain => AttestationType::Uncertain,
        }
    }

    /// The trust path, empty for path-less types.
    pub fn trust_path(&self) -> &[x509::X509] {
        match self {
            ParsedAttestationData::Basic(chain)
            | ParsedAttestationData::AttCa(chain)
            | ParsedAttestationData::AnonCa(chain) => chain,
            _ => &[],
        }
    }
}

/// x509 certificate extensions are validated in the webauthn spec by
/// checking that the value of the extension is equal to some expected
/// value derived from the ceremony.
pub(crate) trait AttestationX509Extension {
    /// The type of the value in the certificate extension.
    type Output: Eq;

    /// The oid of the extension.
    const OID: Oid<'static>;

    /// Parse the value out of the certificate extension.
    fn parse(i: &[u8]) -> Result<Self::Output, WebauthnError>;

    /// If `true`, validating the certificate fails when this extension is
    /// missing.
    const IS_REQUIRED: bool;

    /// The error to return when the extension value does not equal the
    /// expected value.
    const VALIDATION_ERROR: WebauthnError;
}

/// The id-fido-gen-ce-aaguid extension.
pub(crate) struct FidoGenCeAaguid;

impl AttestationX509Extension for FidoGenCeAaguid {
    const OID: Oid<'static> = der_parser::oid!(1.3.6 .1 .4 .1 .45724 .1 .1 .4);

    type Output = Uuid;

    fn parse(i: &[u8]) -> Result<Self::Output, WebauthnError> {
        let obj = parse_asn1(i)?;
        let raw = obj.bytes()?;
        Uuid::from_slice(raw).map_err(|_| WebauthnError::MalformedStructure("fido aaguid extension"))
    }

    const IS_REQUIRED: bool = false;

    const VALIDATION_ERROR: WebauthnError = WebauthnError::AttestationCertificateAaguidMismatch;
}

/// The apple anonymous attestation nonce extension.
pub(crate) struct AppleAnonymousNonce;

impl AttestationX509Extension for AppleAnonymousNonce {
    // 1.2.840.113635.100.8.2, a sequence holding a [1] tagged nonce.
    const OID: Oid<'static> = der_parser::oid!(1.2.840 .113635 .100 .8 .2);

    type Output = [u8; 32];

    fn parse(i: &[u8]) -> Result<Self::Output, WebauthnError> {
        let root = parse_asn1(i)?;
        let tagged = root.object(0)?;
        if tagged.header.class() != Class::ContextSpecific || tagged.header.tag().0 != 1 {
            return Err(WebauthnError::MalformedStructure("apple nonce tag"));
        }
        // The tag is explicit; its content is a whole DER octet string.
        let inner = parse_asn1(tagged.bytes()?)?;
        inner
            .bytes()?
            .try_into()
            .map_err(|_| WebauthnError::MalformedStructure("apple nonce length"))
    }

    const IS_REQUIRED: bool = true;

    const VALIDATION_ERROR: WebauthnError = WebauthnError::AttestationCertificateNonceMismatch;
}

/// The android key attestation extension. Parsing extracts the
/// attestation challenge and simultaneously rejects keys that are not
/// bound to a single application.
pub(crate) struct AndroidKeyAttestationExtensionData;

/// KeyDescription field positions per the android keystore schema.
const ANDROID_KEY_CHALLENGE_INDEX: usize = 4;
const ANDROID_KEY_SOFTWARE_ENFORCED_INDEX: usize = 6;
const ANDROID_KEY_TEE_ENFORCED_INDEX: usize = 7;
/// AuthorizationList tag for allApplications.
const ANDROID_KEY_ALL_APPLICATIONS_TAG: u32 = 600;

impl AttestationX509Extension for AndroidKeyAttestationExtensionData {
    const OID: Oid<'static> = der_parser::oid!(1.3.6 .1 .4 .1 .11129 .2 .1 .17);

    type Output = Vec<u8>;

    fn parse(i: &[u8]) -> Result<Self::Output, WebauthnError> {
        let root = parse_asn1(i)?;

        let challenge = root
            .object_tagged(ANDROID_KEY_CHALLENGE_INDEX, Tag::OctetString)?
            .bytes()?
            .to_vec();

        // The credential must be scoped to the RP's application. A key
        // usable by all applications is not origin bound.
        for idx in [
            ANDROID_KEY_SOFTWARE_ENFORCED_INDEX,
            ANDROID_KEY_TEE_ENFORCED_INDEX,
        ] {
            if asn1_contains_context_tag(root.object(idx)?, ANDROID_KEY_ALL_APPLICATIONS_TAG) {
                return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
                    "allApplications must not be present",
                ));
            }
        }

        Ok(challenge)
    }

    const IS_REQUIRED: bool = true;

    const VALIDATION_ERROR: WebauthnError = WebauthnError::AttestationCertificateNonceMismatch;
}

/// Validate an x509 extension against an expected value.
pub(crate) fn validate_extension<T>(
    x509: &x509::X509,
    data: &<T as AttestationX509Extension>::Output,
) -> Result<(), WebauthnError>
where
    T: AttestationX509Extension,
{
    let der_bytes = x509.to_der()?;
    x509_parser::parse_x509_certificate(&der_bytes)
        .map_err(|_| WebauthnError::MalformedStructure("x509 certificate"))?
        .1
        .extensions()
        .iter()
        .find_map(|extension| {
            (extension.oid == T::OID).then(|| {
                T::parse(extension.value).and_then(|output| {
                    if &output == data {
                        Ok(())
                    } else {
                        Err(T::VALIDATION_ERROR)
                    }
                })
            })
        })
        .unwrap_or({
            if T::IS_REQUIRED {
                Err(WebauthnError::AttestationCertificateMissingExtension)
            } else {
                Ok(())
            }
        })
}

fn att_stmt_get<'a>(
    att_stmt_map: &'a std::collections::BTreeMap<serde_cbor_2::Value, serde_cbor_2::Value>,
    key: &'static str,
    missing: &'static str,
) -> Result<&'a serde_cbor_2::Value, WebauthnError> {
    att_stmt_map
        .get(&serde_cbor_2::Value::Text(key.to_string()))
        .ok_or(WebauthnError::AttestationStatementInvalid(missing))
}

fn x5c_to_certs(x5c: &serde_cbor_2::Value) -> Result<Vec<x509::X509>, WebauthnError> {
    let x5c_array_ref = cbor_try_array!(x5c)?;
    x5c_array_ref
        .iter()
        .map(|values| {
            cbor_try_bytes!(values)
                .and_then(|b| x509::X509::from_der(b).map_err(WebauthnError::OpenSSLError))
        })
        .collect()
}

fn att_stmt_alg(
    att_stmt_map: &std::collections::BTreeMap<serde_cbor_2::Value, serde_cbor_2::Value>,
) -> Result<COSEAlgorithm, WebauthnError> {
    att_stmt_get(att_stmt_map, "alg", "alg missing")
        .and_then(|v| cbor_try_i128!(v))
        .and_then(COSEAlgorithm::try_from)
}

// https://w3c.github.io/webauthn/#sctn-none-attestation
pub(crate) fn verify_none_attestation(
    acd: &AttestedCredentialData,
    att_obj: &AttestationObject,
) -> Result<ParsedAttestationData, WebauthnError> {
    // The attestation statement must be an empty map; an authenticator
    // that had something to say should have used another format.
    let att_stmt_map = cbor_try_map!(&att_obj.att_stmt)?;
    if !att_stmt_map.is_empty() {
        return Err(WebauthnError::AttestationStatementInvalid(
            "attStmt must be empty for none",
        ));
    }

    // A none attestation identifies no model.
    if acd.aaguid != Uuid::nil() {
        return Err(WebauthnError::AttestationStatementInvalid(
            "aaguid must be zero for none",
        ));
    }

    Ok(ParsedAttestationData::None)
}

// https://w3c.github.io/webauthn/#fido-u2f-attestation
pub(crate) fn verify_fidou2f_attestation(
    acd: &AttestedCredentialData,
    att_obj: &AttestationObject,
    client_data_hash: &[u8],
) -> Result<ParsedAttestationData, WebauthnError> {
    let att_stmt_map = cbor_try_map!(&att_obj.att_stmt)?;

    // U2F devices predate AAGUIDs; anything else was filled in by a
    // dishonest client.
    if acd.aaguid != Uuid::nil() {
        return Err(WebauthnError::AttestationStatementInvalid(
            "aaguid must be zero for fido-u2f",
        ));
    }

    let sig = att_stmt_get(att_stmt_map, "sig", "sig missing").and_then(|v| cbor_try_bytes!(v))?;

    // x5c has exactly one element, the attestation certificate.
    let x5c = att_stmt_get(att_stmt_map, "x5c", "x5c missing")?;
    let arr_x509 = x5c_to_certs(x5c)?;
    if arr_x509.len() != 1 {
        return Err(WebauthnError::AttestationStatementInvalid(
            "fido-u2f x5c must hold exactly one certificate",
        ));
    }
    let att_cert = arr_x509
        .first()
        .ok_or(WebauthnError::AttestationStatementInvalid("x5c empty"))?;

    // The credential key must be EC P-256; the x9.62 conversion enforces
    // the key type, signature verification enforces the rest.
    let credential_public_key = COSEKey::try_from(&acd.credential_pk)?;
    let public_key_u2f = credential_public_key.get_alg_key_ecc_x962_raw()?;

    // verificationData per FIDO-U2F-Message-Formats §4.3:
    // 0x00 || rpIdHash || clientDataHash || credentialId || publicKeyU2F
    let r: [u8; 1] = [0x00];
    let verification_data: Vec<u8> = r
        .iter()
        .chain(att_obj.auth_data.rp_id_hash.iter())
        .chain(client_data_hash.iter())
        .chain(acd.credential_id.iter())
        .chain(public_key_u2f.iter())
        .copied()
        .collect();

    let verified =
        verify_signature_with_cert(COSEAlgorithm::ES256, att_cert, sig, &verification_data)?;

    if !verified {
        error!("fido-u2f attestation signature verification failed");
        return Err(WebauthnError::SignatureInvalid);
    }

    Ok(ParsedAttestationData::Basic(arr_x509))
}

// Verification procedure for 8.2. Packed Attestation Statement Format
// https://w3c.github.io/webauthn/#sctn-packed-attestation
pub(crate) fn verify_packed_attestation(
    acd: &AttestedCredentialData,
    att_obj: &AttestationObject,
    client_data_hash: &[u8],
) -> Result<ParsedAttestationData, WebauthnError> {
    let att_stmt_map = cbor_try_map!(&att_obj.att_stmt)?;

    let alg = att_stmt_alg(att_stmt_map)?;

    let x5c_key = &serde_cbor_2::Value::Text("x5c".to_string());
    let ecdaa_key_id_key = &serde_cbor_2::Value::Text("ecdaaKeyId".to_string());

    let verification_data: Vec<u8> = att_obj
        .auth_data_bytes
        .iter()
        .chain(client_data_hash.iter())
        .copied()
        .collect();

    match (
        att_stmt_map.get(x5c_key),
        att_stmt_map.get(ecdaa_key_id_key),
    ) {
        (Some(x5c), _) => {
            // x5c present indicates full attestation with a batch
            // certificate; the leaf is the first element.
            let arr_x509 = x5c_to_certs(x5c)?;
            let attestn_cert = arr_x509
                .first()
                .ok_or(WebauthnError::AttestationStatementInvalid("x5c empty"))?;

            let verified = att_stmt_get(att_stmt_map, "sig", "sig missing")
                .and_then(|v| cbor_try_bytes!(v))
                .and_then(|sig| {
                    verify_signature_with_cert(alg, attestn_cert, sig, &verification_data)
                })?;

            if !verified {
                trace!("packed x509 signature invalid");
                return Err(WebauthnError::SignatureInvalid);
            }

            // § 8.2.1 Packed Attestation Statement Certificate
            // Requirements.
            assert_packed_attest_req(attestn_cert)?;

            // If present, id-fido-gen-ce-aaguid must agree with the
            // authenticator data.
            validate_extension::<FidoGenCeAaguid>(attestn_cert, &acd.aaguid)?;

            Ok(ParsedAttestationData::Basic(arr_x509))
        }
        (None, Some(_ecdaa_key_id)) => {
            debug!("packed attestation with ecdaaKeyId");
            Err(WebauthnError::NotImplemented("ecdaa"))
        }
        (None, None) => {
            // Neither x5c nor ecdaaKeyId: self attestation.
            let credential_public_key = COSEKey::try_from(&acd.credential_pk)?;

            // alg must match the algorithm of the credential key itself.
            if alg != credential_public_key.type_ {
                return Err(WebauthnError::AttestationStatementInvalid(
                    "self attestation alg mismatch",
                ));
            }

            let verified = att_stmt_get(att_stmt_map, "sig", "sig missing")
                .and_then(|v| cbor_try_bytes!(v))
                .and_then(|sig| credential_public_key.verify_signature(sig, &verification_data))?;

            if !verified {
                trace!("packed self attestation signature invalid");
                return Err(WebauthnError::SignatureInvalid);
            }

            Ok(ParsedAttestationData::Self_)
        }
    }
}

/// TPM_ECC_CURVE identifiers for the NIST curves.
const TPM_ECC_NIST_P256: u16 = 0x0003;
const TPM_ECC_NIST_P384: u16 = 0x0004;
const TPM_ECC_NIST_P521: u16 = 0x0005;

// https://w3c.github.io/webauthn/#sctn-tpm-attestation
pub(crate) fn verify_tpm_attestation(
    acd: &AttestedCredentialData,
    att_obj: &AttestationObject,
    client_data_hash: &[u8],
    tpm_manufacturers: &[String],
) -> Result<ParsedAttestationData, WebauthnError> {
    debug!("begin verify_tpm_attest");

    let att_stmt_map = cbor_try_map!(&att_obj.att_stmt)?;

    let ver = att_stmt_get(att_stmt_map, "ver", "ver missing").and_then(|v| cbor_try_string!(v))?;
    if ver != "2.0" {
        return Err(WebauthnError::AttestationStatementInvalid(
            "tpm version must be 2.0",
        ));
    }

    let alg = att_stmt_alg(att_stmt_map)?;

    let certinfo_bytes = att_stmt_get(att_stmt_map, "certInfo", "certInfo missing")
        .and_then(|v| cbor_try_bytes!(v))?;
    let certinfo = TpmsAttest::try_from(certinfo_bytes.as_slice())?;

    let pubarea_bytes = att_stmt_get(att_stmt_map, "pubArea", "pubArea missing")
        .and_then(|v| cbor_try_bytes!(v))?;
    let pubarea = TpmtPublic::try_from(pubarea_bytes.as_slice())?;

    let sig = att_stmt_get(att_stmt_map, "sig", "sig missing").and_then(|v| cbor_try_bytes!(v))?;

    let x5c = att_stmt_get(att_stmt_map, "x5c", "x5c missing")?;
    let arr_x509 = x5c_to_certs(x5c)?;
    let aik_cert = arr_x509
        .first()
        .ok_or(WebauthnError::AttestationStatementInvalid("x5c empty"))?;

    // An attestation key is a plain signing key, never a restricted
    // decryption key with a symmetric algorithm attached.
    let symmetric = match &pubarea.parameters {
        TpmuPublicParms::Rsa { symmetric, .. } | TpmuPublicParms::Ecc { symmetric, .. } => {
            *symmetric
        }
    };
    if symmetric != TPM_ALG_NULL {
        return Err(WebauthnError::AttestationStatementInvalid(
            "pubArea symmetric algorithm must be null",
        ));
    }

    // The public key in pubArea must be the credential public key from
    // the authenticator data, starting with the key family itself.
    let credential_public_key = COSEKey::try_from(&acd.credential_pk)?;
    let type_matches = matches!(
        (&credential_public_key.key, pubarea.type_),
        (COSEKeyType::RSA(_), TPM_ALG_RSA) | (COSEKeyType::EC_EC2(_), TPM_ALG_ECC)
    );
    if !type_matches {
        return Err(WebauthnError::AttestationStatementInvalid(
            "pubArea key type does not match credential key type",
        ));
    }

    match (&credential_public_key.key, &pubarea.parameters) {
        (COSEKeyType::RSA(cose_rsa), TpmuPublicParms::Rsa { .. }) => {
            let modulus_matches = matches!(
                &pubarea.unique,
                TpmuPublicId::Rsa(n) if n.as_slice() == cose_rsa.n.as_slice()
            );
            if !modulus_matches {
                return Err(WebauthnError::AttestationStatementInvalid(
                    "pubArea unique does not match credential modulus",
                ));
            }
            if cose_rsa.e.len() > 4 {
                return Err(WebauthnError::AttestationStatementInvalid(
                    "credential exponent too large",
                ));
            }
            let mut e_bytes = [0u8; 4];
            e_bytes[4 - cose_rsa.e.len()..].copy_from_slice(&cose_rsa.e);
            if pubarea.rsa_exponent() != Some(u32::from_be_bytes(e_bytes)) {
                return Err(WebauthnError::AttestationStatementInvalid(
                    "pubArea exponent does not match credential exponent",
                ));
            }
        }
        (COSEKeyType::EC_EC2(cose_ec), TpmuPublicParms::Ecc { curve_id, .. }) => {
            let curve_ok = matches!(
                (cose_ec.curve, *curve_id),
                (crate::crypto::ECDSACurve::SECP256R1, TPM_ECC_NIST_P256)
                    | (crate::crypto::ECDSACurve::SECP384R1, TPM_ECC_NIST_P384)
                    | (crate::crypto::ECDSACurve::SECP521R1, TPM_ECC_NIST_P521)
            );
            if !curve_ok {
                debug!(?curve_id, "tpm curve id mismatch");
                return Err(WebauthnError::AttestationStatementInvalid(
                    "pubArea curve does not match credential curve",
                ));
            }
            // Both coordinates of the attested point must match.
            let point_matches = matches!(
                &pubarea.unique,
                TpmuPublicId::Ecc { x, y }
                    if x.as_slice() == cose_ec.x.as_slice()
                        && y.as_slice() == cose_ec.y.as_slice()
            );
            if !point_matches {
                return Err(WebauthnError::AttestationStatementInvalid(
                    "pubArea unique does not match credential point",
                ));
            }
        }
        _ => {
            return Err(WebauthnError::AttestationStatementInvalid(
                "pubArea key type does not match credential key type",
            ));
        }
    }

    // certInfo integrity.
    if certinfo.magic != TPM_GENERATED_VALUE {
        return Err(WebauthnError::AttestationStatementInvalid(
            "certInfo magic is not TPM_GENERATED",
        ));
    }
    if certinfo.type_ != TPM_ST_ATTEST_CERTIFY {
        return Err(WebauthnError::AttestationStatementInvalid(
            "certInfo type is not TPM_ST_ATTEST_CERTIFY",
        ));
    }

    // extraData is the alg-hash of attToBeSigned,
    // authenticatorData || clientDataHash.
    let verification_data: Vec<u8> = att_obj
        .auth_data_bytes
        .iter()
        .chain(client_data_hash.iter())
        .copied()
        .collect();
    let expected_extra_data = compute_hash(only_hash_from_type(alg)?, &verification_data)?;
    if certinfo.extra_data != expected_extra_data {
        return Err(WebauthnError::AttestationStatementInvalid(
            "certInfo extraData mismatch",
        ));
    }

    // attestedName is the nameAlg identifier followed by the nameAlg hash
    // of the pubArea. The name's own algorithm bytes are folded into the
    // comparison so a substituted algorithm cannot slip through.
    if certinfo.attested_name.len() < 2 {
        return Err(WebauthnError::AttestationStatementInvalid(
            "attestedName too short",
        ));
    }
    let name_alg = u16::from_be_bytes([certinfo.attested_name[0], certinfo.attested_name[1]]);
    if name_alg != pubarea.name_alg {
        return Err(WebauthnError::AttestationStatementInvalid(
            "attestedName algorithm disagrees with pubArea",
        ));
    }
    let mut expected_name = name_alg.to_be_bytes().to_vec();
    expected_name.extend(compute_hash(tpm_name_alg_digest(name_alg)?, pubarea_bytes)?);
    if certinfo.attested_name != expected_name {
        return Err(WebauthnError::AttestationStatementInvalid(
            "attestedName is not the hash of pubArea",
        ));
    }

    // The signature covers certInfo with the AIK certificate key.
    let verified = verify_signature_with_cert(alg, aik_cert, sig, certinfo_bytes)?;
    if !verified {
        return Err(WebauthnError::SignatureInvalid);
    }

    // § 8.3.1 TPM Attestation Statement Certificate Requirements.
    assert_tpm_attest_req(aik_cert, tpm_manufacturers)?;

    validate_extension::<FidoGenCeAaguid>(aik_cert, &acd.aaguid)?;

    Ok(ParsedAttestationData::AttCa(arr_x509))
}

// https://www.w3.org/TR/webauthn-3/#sctn-android-key-attestation
pub(crate) fn verify_android_key_attestation(
    acd: &AttestedCredentialData,
    att_obj: &AttestationObject,
    client_data_hash: &[u8],
) -> Result<ParsedAttestationData, WebauthnError> {
    let att_stmt_map = cbor_try_map!(&att_obj.att_stmt)?;

    let alg = att_stmt_alg(att_stmt_map)?;

    let sig = att_stmt_get(att_stmt_map, "sig", "sig missing").and_then(|v| cbor_try_bytes!(v))?;

    let x5c = att_stmt_get(att_stmt_map, "x5c", "x5c missing")?;
    let arr_x509 = x5c_to_certs(x5c)?;
    let attestn_cert = arr_x509
        .first()
        .ok_or(WebauthnError::AttestationStatementInvalid("x5c empty"))?;

    // Signature over authenticatorData || clientDataHash by the leaf.
    let data_to_verify: Vec<u8> = att_obj
        .auth_data_bytes
        .iter()
        .chain(client_data_hash.iter())
        .copied()
        .collect();

    let verified = verify_signature_with_cert(alg, attestn_cert, sig, &data_to_verify)?;
    if !verified {
        error!("android-key attestation signature verification failed");
        return Err(WebauthnError::SignatureInvalid);
    }

    // The leaf certifies the credential key itself, not a batch key.
    let credential_public_key = COSEKey::try_from(&acd.credential_pk)?;
    if !cert_public_key_matches(attestn_cert, &credential_public_key)? {
        return Err(WebauthnError::AttestationStatementInvalid(
            "credential key does not match certified key",
        ));
    }

    // The keystore extension must carry clientDataHash as its challenge
    // and must not grant the key to all applications.
    validate_extension::<AndroidKeyAttestationExtensionData>(
        attestn_cert,
        &client_data_hash.to_vec(),
    )?;

    Ok(ParsedAttestationData::Basic(arr_x509))
}

// https://www.w3.org/TR/webauthn/#sctn-android-safetynet-attestation
//
// SafetyNet responses are Google-signed JWS blobs. Verifying them means
// carrying a JOSE stack and pinning Google's signing hierarchy, and the
// service itself is deprecated upstream. The format stays recognised so
// it fails loudly rather than falling through to an "unknown format"
// error a caller might be tempted to downgrade.
pub(crate) fn verify_android_safetynet_attestation(
    _acd: &AttestedCredentialData,
    _att_obj: &AttestationObject,
    _client_data_hash: &[u8],
) -> Result<ParsedAttestationData, WebauthnError> {
    Err(WebauthnError::NotImplemented("android-safetynet"))
}

// https://www.w3.org/TR/webauthn-3/#sctn-apple-anonymous-attestation
pub(crate) fn verify_apple_anonymous_attestation(
    acd: &AttestedCredentialData,
    att_obj: &AttestationObject,
    client_data_hash: &[u8],
) -> Result<ParsedAttestationData, WebauthnError> {
    let att_stmt_map = cbor_try_map!(&att_obj.att_stmt)?;

    let x5c = att_stmt_get(att_stmt_map, "x5c", "x5c missing")?;
    let arr_x509 = x5c_to_certs(x5c)?;
    let attestn_cert = arr_x509
        .first()
        .ok_or(WebauthnError::AttestationStatementInvalid("x5c empty"))?;

    // nonceToHash = authenticatorData || clientDataHash; the certificate
    // embeds SHA-256 of it, proving the attestation is live.
    let nonce_to_hash: Vec<u8> = att_obj
        .auth_data_bytes
        .iter()
        .chain(client_data_hash.iter())
        .copied()
        .collect();
    let nonce: [u8; 32] = compute_sha256(&nonce_to_hash)
        .try_into()
        .map_err(|_| WebauthnError::MalformedStructure("sha256 output"))?;

    validate_extension::<AppleAnonymousNonce>(attestn_cert, &nonce)?;

    // The certificate is issued for the credential key itself.
    let credential_public_key = COSEKey::try_from(&acd.credential_pk)?;
    if !cert_public_key_matches(attestn_cert, &credential_public_key)? {
        return Err(WebauthnError::AttestationStatementInvalid(
            "credential key does not match certified key",
        ));
    }

    Ok(ParsedAttestationData::AnonCa(arr_x509))
}
