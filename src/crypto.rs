//! Cryptographic operation wrappers for Webauthn. This module exists to
//! allow ease of auditing, safe operation wrappers for the library, and
//! cryptographic provider abstraction. It currently uses OpenSSL as the
//! cryptographic primitive provider.

use std::convert::TryFrom;

use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Public};
use openssl::rsa::{Padding, Rsa};
use openssl::sha::sha256;
use openssl::sign::Verifier;
use openssl::stack;
use openssl::x509;
use openssl::x509::store;
use openssl::x509::verify::X509VerifyFlags;
use serde::{Deserialize, Serialize};
use x509_parser::oid_registry::Oid;
use x509_parser::prelude::{FromDer, GeneralName, ParsedExtension, X509Certificate};

use crate::error::WebauthnError;

/// The TCG extended-key-usage OID that marks a certificate as a TPM AIK
/// certificate (tcg-kp-AIKCertificate).
const TCG_KP_AIK_CERTIFICATE: Oid<'static> = der_parser::oid!(2.23.133 .8 .3);
/// TCG directory attribute for the TPM manufacturer.
const TCG_AT_TPM_MANUFACTURER: Oid<'static> = der_parser::oid!(2.23.133 .2 .1);

/// A COSE signature algorithm identifier, shared across every identifier
/// space this crate decodes (COSE maps, TPM attStmt algs, FIDO metadata).
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum COSEAlgorithm {
    /// ECDSA with P-256 and SHA-256
    ES256,
    /// ECDSA with P-384 and SHA-384
    ES384,
    /// ECDSA with P-521 and SHA-512
    ES512,
    /// RSASSA-PKCS1-v1_5 with SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 with SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 with SHA-512
    RS512,
    /// RSASSA-PSS with SHA-256
    PS256,
    /// RSASSA-PSS with SHA-384
    PS384,
    /// RSASSA-PSS with SHA-512
    PS512,
    /// EdDSA over Curve25519
    EDDSA,
    /// RSASSA-PKCS1-v1_5 with SHA-1. Legacy, present only because TPM 1.2
    /// era hardware still emits it.
    INSECURE_RS1,
}

impl TryFrom<i128> for COSEAlgorithm {
    type Error = WebauthnError;

    fn try_from(i: i128) -> Result<Self, Self::Error> {
        match i {
            -7 => Ok(COSEAlgorithm::ES256),
            -35 => Ok(COSEAlgorithm::ES384),
            -36 => Ok(COSEAlgorithm::ES512),
            -257 => Ok(COSEAlgorithm::RS256),
            -258 => Ok(COSEAlgorithm::RS384),
            -259 => Ok(COSEAlgorithm::RS512),
            -37 => Ok(COSEAlgorithm::PS256),
            -38 => Ok(COSEAlgorithm::PS384),
            -39 => Ok(COSEAlgorithm::PS512),
            -8 => Ok(COSEAlgorithm::EDDSA),
            -65535 => Ok(COSEAlgorithm::INSECURE_RS1),
            _ => Err(WebauthnError::UnsupportedAlgorithm),
        }
    }
}

impl From<COSEAlgorithm> for i64 {
    fn from(alg: COSEAlgorithm) -> i64 {
        match alg {
            COSEAlgorithm::ES256 => -7,
            COSEAlgorithm::ES384 => -35,
            COSEAlgorithm::ES512 => -36,
            COSEAlgorithm::RS256 => -257,
            COSEAlgorithm::RS384 => -258,
            COSEAlgorithm::RS512 => -259,
            COSEAlgorithm::PS256 => -37,
            COSEAlgorithm::PS384 => -38,
            COSEAlgorithm::PS512 => -39,
            COSEAlgorithm::EDDSA => -8,
            COSEAlgorithm::INSECURE_RS1 => -65535,
        }
    }
}

impl COSEAlgorithm {
    /// Map an ALG_SIGN value from the FIDO Registry of Predefined Values
    /// (metadata statement `authenticationAlgorithm`) onto the shared COSE
    /// space.
    pub fn from_fido_registry(alg_sign: u16) -> Result<Self, WebauthnError> {
        match alg_sign {
            // SECP256R1_ECDSA_SHA256 raw | der
            0x0001 | 0x0002 => Ok(COSEAlgorithm::ES256),
            // RSASSA_PSS_SHA256 raw | der
            0x0003 | 0x0004 => Ok(COSEAlgorithm::PS256),
            0x000a => Ok(COSEAlgorithm::PS384),
            0x000b => Ok(COSEAlgorithm::PS512),
            0x000c => Ok(COSEAlgorithm::RS256),
            0x000d => Ok(COSEAlgorithm::RS384),
            0x000e => Ok(COSEAlgorithm::RS512),
            0x000f => Ok(COSEAlgorithm::INSECURE_RS1),
            0x0010 => Ok(COSEAlgorithm::ES384),
            0x0011 => Ok(COSEAlgorithm::ES512),
            0x0012 => Ok(COSEAlgorithm::EDDSA),
            // SECP256K1 and the remaining registry values have no
            // counterpart we can verify.
            _ => Err(WebauthnError::UnsupportedAlgorithm),
        }
    }
}

/// The hash an algorithm signs with, used where a structure commits to a
/// digest rather than a full signature (TPM certInfo extraData).
pub(crate) fn only_hash_from_type(alg: COSEAlgorithm) -> Result<MessageDigest, WebauthnError> {
    match alg {
        COSEAlgorithm::ES256 | COSEAlgorithm::RS256 | COSEAlgorithm::PS256 => {
            Ok(MessageDigest::sha256())
        }
        COSEAlgorithm::ES384 | COSEAlgorithm::RS384 | COSEAlgorithm::PS384 => {
            Ok(MessageDigest::sha384())
        }
        COSEAlgorithm::ES512 | COSEAlgorithm::RS512 | COSEAlgorithm::PS512 => {
            Ok(MessageDigest::sha512())
        }
        COSEAlgorithm::INSECURE_RS1 => Ok(MessageDigest::sha1()),
        COSEAlgorithm::EDDSA => Err(WebauthnError::UnsupportedAlgorithm),
    }
}

/// An ECDSA curve.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ECDSACurve {
    /// P-256
    SECP256R1,
    /// P-384
    SECP384R1,
    /// P-521
    SECP521R1,
}

impl TryFrom<i128> for ECDSACurve {
    type Error = WebauthnError;

    fn try_from(i: i128) -> Result<Self, Self::Error> {
        match i {
            1 => Ok(ECDSACurve::SECP256R1),
            2 => Ok(ECDSACurve::SECP384R1),
            3 => Ok(ECDSACurve::SECP521R1),
            _ => Err(WebauthnError::UnsupportedAlgorithm),
        }
    }
}

impl ECDSACurve {
    fn to_openssl_nid(self) -> Nid {
        match self {
            ECDSACurve::SECP256R1 => Nid::X9_62_PRIME256V1,
            ECDSACurve::SECP384R1 => Nid::SECP384R1,
            ECDSACurve::SECP521R1 => Nid::SECP521R1,
        }
    }
}

/// An EC public key as affine coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct COSEEC2Key {
    /// The curve this key is on.
    pub curve: ECDSACurve,
    /// The x coordinate.
    pub x: Vec<u8>,
    /// The y coordinate.
    pub y: Vec<u8>,
}

/// An RSA public key as modulus and exponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct COSERSAKey {
    /// The modulus, big endian.
    pub n: Vec<u8>,
    /// The public exponent, big endian.
    pub e: Vec<u8>,
}

/// The key material of a COSE key.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum COSEKeyType {
    /// An elliptic curve key over a NIST curve.
    EC_EC2(COSEEC2Key),
    /// An RSA key.
    RSA(COSERSAKey),
}

/// A credential public key in COSE form, with its bound algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct COSEKey {
    /// The algorithm this key signs with.
    pub type_: COSEAlgorithm,
    /// The key material.
    pub key: COSEKeyType,
}

impl TryFrom<&serde_cbor_2::Value> for COSEKey {
    type Error = WebauthnError;

    fn try_from(d: &serde_cbor_2::Value) -> Result<COSEKey, Self::Error> {
        let m = cbor_try_map!(d)?;

        // CtapV2 canonical map labels: 1 kty, 3 alg, then curve-specific
        // negative labels.
        let kty = m
            .get(&serde_cbor_2::Value::Integer(1))
            .ok_or(WebauthnError::MalformedStructure("cose kty"))
            .and_then(|v| cbor_try_i128!(v))?;

        let type_ = m
            .get(&serde_cbor_2::Value::Integer(3))
            .ok_or(WebauthnError::MalformedStructure("cose alg"))
            .and_then(|v| cbor_try_i128!(v))
            .and_then(COSEAlgorithm::try_from)?;

        match kty {
            // kty == 2, EC2
            2 => {
                let curve = m
                    .get(&serde_cbor_2::Value::Integer(-1))
                    .ok_or(WebauthnError::MalformedStructure("cose crv"))
                    .and_then(|v| cbor_try_i128!(v))
                    .and_then(ECDSACurve::try_from)?;

                let x = m
                    .get(&serde_cbor_2::Value::Integer(-2))
                    .ok_or(WebauthnError::MalformedStructure("cose x"))
                    .and_then(|v| cbor_try_bytes!(v))?;

                let y = m
                    .get(&serde_cbor_2::Value::Integer(-3))
                    .ok_or(WebauthnError::MalformedStructure("cose y"))
                    .and_then(|v| cbor_try_bytes!(v))?;

                let key = COSEKey {
                    type_,
                    key: COSEKeyType::EC_EC2(COSEEC2Key {
                        curve,
                        x: x.clone(),
                        y: y.clone(),
                    }),
                };
                // Validate the key is sound on its claimed curve before
                // anyone trusts a signature from it.
                key.validate()?;
                Ok(key)
            }
            // kty == 3, RSA
            3 => {
                let n = m
                    .get(&serde_cbor_2::Value::Integer(-1))
                    .ok_or(WebauthnError::MalformedStructure("cose n"))
                    .and_then(|v| cbor_try_bytes!(v))?;

                let e = m
                    .get(&serde_cbor_2::Value::Integer(-2))
                    .ok_or(WebauthnError::MalformedStructure("cose e"))
                    .and_then(|v| cbor_try_bytes!(v))?;

                let key = COSEKey {
                    type_,
                    key: COSEKeyType::RSA(COSERSAKey {
                        n: n.clone(),
                        e: e.clone(),
                    }),
                };
                key.validate()?;
                Ok(key)
            }
            _ => {
                debug!("cose kty {:?} unsupported", kty);
                Err(WebauthnError::UnsupportedAlgorithm)
            }
        }
    }
}

impl COSEKey {
    /// The ANSI X9.62 uncompressed point form (`0x04 || x || y`) of an EC
    /// key. U2F signatures commit to the key in this encoding.
    pub fn get_alg_key_ecc_x962_raw(&self) -> Result<Vec<u8>, WebauthnError> {
        match &self.key {
            COSEKeyType::EC_EC2(ec2k) => {
                let mut r = Vec::with_capacity(1 + ec2k.x.len() + ec2k.y.len());
                r.push(0x04);
                r.extend_from_slice(&ec2k.x);
                r.extend_from_slice(&ec2k.y);
                Ok(r)
            }
            COSEKeyType::RSA(_) => Err(WebauthnError::MalformedStructure("cose ec2 key")),
        }
    }

    /// Convert to an openssl public key handle.
    pub fn get_openssl_pkey(&self) -> Result<PKey<Public>, WebauthnError> {
        match &self.key {
            COSEKeyType::EC_EC2(ec2k) => {
                let group = EcGroup::from_curve_name(ec2k.curve.to_openssl_nid())?;
                let xbn = BigNum::from_slice(&ec2k.x)?;
                let ybn = BigNum::from_slice(&ec2k.y)?;
                let ec_key = EcKey::from_public_key_affine_coordinates(&group, &xbn, &ybn)?;
                ec_key.check_key()?;
                Ok(PKey::from_ec_key(ec_key)?)
            }
            COSEKeyType::RSA(rsak) => {
                let nbn = BigNum::from_slice(&rsak.n)?;
                let ebn = BigNum::from_slice(&rsak.e)?;
                let rsa_key = Rsa::from_public_components(nbn, ebn)?;
                Ok(PKey::from_rsa(rsa_key)?)
            }
        }
    }

    fn validate(&self) -> Result<(), WebauthnError> {
        self.get_openssl_pkey().map(|_| ())
    }

    /// Verify a signature over `data` with this key and its bound
    /// algorithm.
    pub fn verify_signature(&self, signature: &[u8], data: &[u8]) -> Result<bool, WebauthnError> {
        let pkey = self.get_openssl_pkey()?;
        verify_signature(self.type_, &pkey, signature, data)
    }
}

/// Verify a signature over `data` using a public key handle and explicit
/// algorithm. ECDSA signatures are expected in DER form, as produced by
/// authenticators.
pub(crate) fn verify_signature(
    alg: COSEAlgorithm,
    pkey: &PKey<Public>,
    signature: &[u8],
    data: &[u8],
) -> Result<bool, WebauthnError> {
    let md = only_hash_from_type(alg)?;
    let mut verifier = Verifier::new(md, pkey)?;
    if matches!(
        alg,
        COSEAlgorithm::PS256 | COSEAlgorithm::PS384 | COSEAlgorithm::PS512
    ) {
        verifier.set_rsa_padding(Padding::PKCS1_PSS)?;
        verifier.set_rsa_mgf1_md(md)?;
    }
    verifier.update(data)?;
    verifier.verify(signature).map_err(WebauthnError::from)
}

/// Verify a signature with the subject public key of an x509 certificate.
pub(crate) fn verify_signature_with_cert(
    alg: COSEAlgorithm,
    cert: &x509::X509,
    signature: &[u8],
    data: &[u8],
) -> Result<bool, WebauthnError> {
    let pkey = cert.public_key()?;
    let md = only_hash_from_type(alg)?;
    let mut verifier = Verifier::new(md, &pkey)?;
    if matches!(
        alg,
        COSEAlgorithm::PS256 | COSEAlgorithm::PS384 | COSEAlgorithm::PS512
    ) {
        verifier.set_rsa_padding(Padding::PKCS1_PSS)?;
        verifier.set_rsa_mgf1_md(md)?;
    }
    verifier.update(data)?;
    verifier.verify(signature).map_err(WebauthnError::from)
}

/// Does the credential public key equal the subject public key of this
/// certificate?
pub(crate) fn cert_public_key_matches(
    cert: &x509::X509,
    key: &COSEKey,
) -> Result<bool, WebauthnError> {
    let cert_pkey = cert.public_key()?;
    let cred_pkey = key.get_openssl_pkey()?;
    Ok(cred_pkey.public_eq(&cert_pkey))
}

/// Compute the SHA-256 of the supplied bytes.
pub fn compute_sha256(data: &[u8]) -> Vec<u8> {
    sha256(data).to_vec()
}

/// Hash `data` with an arbitrary digest.
pub(crate) fn compute_hash(md: MessageDigest, data: &[u8]) -> Result<Vec<u8>, WebauthnError> {
    openssl::hash::hash(md, data)
        .map(|d| d.to_vec())
        .map_err(WebauthnError::from)
}

fn parse_cert_der(der: &[u8]) -> Result<X509Certificate<'_>, WebauthnError> {
    X509Certificate::from_der(der)
        .map(|(_, c)| c)
        .map_err(|_| WebauthnError::MalformedStructure("x509 certificate"))
}

fn cert_is_ca(cert: &X509Certificate<'_>) -> Result<bool, WebauthnError> {
    Ok(cert
        .basic_constraints()
        .map_err(|_| WebauthnError::MalformedStructure("x509 basic constraints"))?
        .map(|bc| bc.value.ca)
        .unwrap_or(false))
}

/// Assert the batch certificate requirements of packed attestation:
/// a version 3 certificate, a fully populated subject with the literal
/// OU "Authenticator Attestation", and no CA capability.
pub(crate) fn assert_packed_attest_req(x509: &x509::X509) -> Result<(), WebauthnError> {
    let der = x509.to_der()?;
    let cert = parse_cert_der(&der)?;

    // Version MUST be set to 3 (which is indicated by ASN.1 value 2).
    if cert.version().0 != 2 {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "version is not 3",
        ));
    }

    let subject = cert.subject();

    // Subject-C: two character ISO 3166 country code.
    let c_ok = subject
        .iter_country()
        .next()
        .and_then(|c| c.as_str().ok())
        .map(|c| c.len() == 2)
        .unwrap_or(false);
    if !c_ok {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "subject C missing or not a two character country code",
        ));
    }

    // Subject-O: legal name of the authenticator vendor.
    let o_ok = subject
        .iter_organization()
        .next()
        .and_then(|o| o.as_str().ok())
        .map(|o| !o.is_empty())
        .unwrap_or(false);
    if !o_ok {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "subject O missing or empty",
        ));
    }

    // Subject-OU: the literal string "Authenticator Attestation".
    let ou_ok = subject
        .iter_organizational_unit()
        .next()
        .and_then(|ou| ou.as_str().ok())
        .map(|ou| ou == "Authenticator Attestation")
        .unwrap_or(false);
    if !ou_ok {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "subject OU is not 'Authenticator Attestation'",
        ));
    }

    // Subject-CN: any non-empty UTF8 string.
    let cn_ok = subject
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(|cn| !cn.is_empty())
        .unwrap_or(false);
    if !cn_ok {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "subject CN missing or empty",
        ));
    }

    // The basic constraints extension MUST have the CA component false.
    if cert_is_ca(&cert)? {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "basic constraints CA must be false",
        ));
    }

    Ok(())
}

/// Assert the AIK certificate requirements of TPM attestation: version 3,
/// an empty subject, a recognised TPM manufacturer in the subject
/// alternative name, the AIK extended key usage, and no CA capability.
pub(crate) fn assert_tpm_attest_req(
    x509: &x509::X509,
    manufacturers: &[String],
) -> Result<(), WebauthnError> {
    let der = x509.to_der()?;
    let cert = parse_cert_der(&der)?;

    if cert.version().0 != 2 {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "version is not 3",
        ));
    }

    // Subject field MUST be set to empty.
    if cert.subject().iter().next().is_some() {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "subject is not empty",
        ));
    }

    // The subject alternative name carries the TCG directory attributes.
    let san = cert
        .subject_alternative_name()
        .map_err(|_| WebauthnError::MalformedStructure("x509 subject alternative name"))?
        .ok_or(WebauthnError::AttestationCertificateRequirementsNotMet(
            "subject alternative name missing",
        ))?;

    let manufacturer = san
        .value
        .general_names
        .iter()
        .find_map(|gn| match gn {
            GeneralName::DirectoryName(dir_name) => dir_name.iter().flat_map(|rdn| rdn.iter()).find_map(
                |atv| {
                    (*atv.attr_type() == TCG_AT_TPM_MANUFACTURER)
                        .then(|| atv.as_str().ok())
                        .flatten()
                },
            ),
            _ => None,
        })
        .ok_or(WebauthnError::AttestationCertificateRequirementsNotMet(
            "tpm manufacturer attribute missing",
        ))?;

    if !manufacturers.iter().any(|m| m == manufacturer) {
        debug!(?manufacturer, "unrecognised TPM manufacturer");
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "tpm manufacturer not recognised",
        ));
    }

    // The extended key usage MUST contain the OID 2.23.133.8.3
    // (tcg-kp-AIKCertificate).
    let has_aik_eku = cert
        .extensions()
        .iter()
        .any(|ext| match ext.parsed_extension() {
            ParsedExtension::ExtendedKeyUsage(eku) => {
                eku.other.iter().any(|oid| *oid == TCG_KP_AIK_CERTIFICATE)
            }
            _ => false,
        });
    if !has_aik_eku {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "AIK extended key usage missing",
        ));
    }

    if cert_is_ca(&cert)? {
        return Err(WebauthnError::AttestationCertificateRequirementsNotMet(
            "basic constraints CA must be false",
        ));
    }

    Ok(())
}

/// Check every certificate against its own notBefore/notAfter window.
///
/// Chain validation covers this when an anchor set is available, but a
/// trust path with nothing to anchor to still must not carry certificates
/// outside their validity.
pub(crate) fn assert_cert_validity_window(certs: &[x509::X509]) -> Result<(), WebauthnError> {
    let now = openssl::asn1::Asn1Time::days_from_now(0)?;
    for cert in certs {
        let premature = cert.not_before().compare(&now)? == std::cmp::Ordering::Greater;
        let expired = cert.not_after().compare(&now)? == std::cmp::Ordering::Less;
        if premature || expired {
            return Err(WebauthnError::CertificateChainInvalid(
                "certificate outside validity window",
            ));
        }
    }
    Ok(())
}

/// Validate an ordered certificate chain (leaf first) against a set of
/// trust anchors.
///
/// Every certificate must be within its validity window and each hop must
/// be signed by the next, terminating at one of `trust_anchors`. The
/// anchor set is supplied by the caller - per-format roots, metadata
/// statement roots, or both - which keeps this routine agnostic of where
/// trust comes from. Certificates found on a supplied revocation list
/// fail the chain.
pub fn verify_attestation_ca_chain(
    chain: &[x509::X509],
    trust_anchors: &[x509::X509],
    crls: &[x509::X509Crl],
    danger_disable_certificate_time_checks: bool,
) -> Result<(), WebauthnError> {
    // An empty anchor set can never produce a valid path. Fail early
    // rather than letting openssl report a less precise error.
    if trust_anchors.is_empty() {
        return Err(WebauthnError::CertificateChainInvalid(
            "no trust anchors configured",
        ));
    }

    let (leaf, rest) = chain
        .split_first()
        .ok_or(WebauthnError::CertificateChainInvalid("chain is empty"))?;

    // Explicit revocation pass. The store-level CRL machinery requires a
    // CRL per issuing CA; attestation CRLs are sparse, so check each
    // certificate directly the way the original metadata service does.
    for crl in crls {
        for cert in chain {
            if matches!(crl.get_by_cert(cert), openssl::x509::CrlStatus::Revoked(_)) {
                return Err(WebauthnError::CertificateChainInvalid(
                    "certificate is revoked",
                ));
            }
        }
    }

    let mut chain_stack = stack::Stack::new()?;
    for crt in rest {
        chain_stack.push(crt.clone())?;
    }

    let mut ca_store = store::X509StoreBuilder::new()?;
    // In tests we may need to allow disabling time window validity.
    if danger_disable_certificate_time_checks {
        ca_store.set_flags(X509VerifyFlags::NO_CHECK_TIME)?;
    }
    for anchor in trust_anchors {
        ca_store.add_cert(anchor.clone())?;
    }
    let ca_store = ca_store.build();

    let mut ca_ctx = x509::X509StoreContext::new()?;
    let res = ca_ctx.init(&ca_store, leaf, &chain_stack, |ca_ctx_ref| {
        ca_ctx_ref.verify_cert().map(|_| ca_ctx_ref.error())
    })?;

    if res == x509::X509VerifyResult::OK {
        Ok(())
    } else {
        debug!(?res, "attestation chain rejected");
        Err(WebauthnError::CertificateChainInvalid(
            "no path to a trust anchor",
        ))
    }
}
