//! An AAGUID-keyed registry of FIDO metadata statements.
//!
//! The registry is a pure verification aid. Retrieving, refreshing, and
//! authenticating a metadata BLOB is the caller's concern; statements
//! arrive here already trusted. When a statement exists for an
//! authenticator model, registration must agree with what the vendor
//! declared - algorithm, attestation type, and a certificate path to one
//! of the declared roots.

use std::collections::BTreeMap;
use std::sync::RwLock;

use openssl::x509::{X509Crl, X509};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attestation::AttestationType;
use crate::crypto::{verify_attestation_ca_chain, COSEAlgorithm};
use crate::error::WebauthnError;

/// FIDO registry ATTESTATION_BASIC_FULL.
pub const ATTESTATION_BASIC_FULL: u16 = 0x3E07;
/// FIDO registry ATTESTATION_BASIC_SURROGATE (self attestation).
pub const ATTESTATION_BASIC_SURROGATE: u16 = 0x3E08;
/// FIDO registry ATTESTATION_ECDAA.
pub const ATTESTATION_ECDAA: u16 = 0x3E09;
/// FIDO registry ATTESTATION_ATTCA.
pub const ATTESTATION_ATTCA: u16 = 0x3E0A;

/// A single authenticator model's metadata statement, reduced to the
/// fields registration verification consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStatement {
    /// The authenticator model this statement describes.
    pub aaguid: Uuid,
    /// The protocol family, `"fido2"` for everything we accept.
    pub protocol_family: String,
    /// The single signing algorithm the vendor declared, as a FIDO
    /// registry ALG_SIGN identifier.
    pub authentication_algorithm: u16,
    /// The attestation types the model can produce, as FIDO registry
    /// ATTESTATION_* identifiers.
    pub attestation_types: Vec<u16>,
    /// DER encoded roots the model's attestation chains terminate at.
    #[serde(with = "der_cert_vec")]
    pub attestation_root_certificates: Vec<X509>,
}

/// Serialize the root list the way metadata BLOBs do, base64 DER.
mod der_cert_vec {
    use openssl::x509::X509;
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(certs: &[X509], ser: S) -> Result<S::Ok, S::Error> {
        let encoded: Result<Vec<String>, _> = certs
            .iter()
            .map(|c| c.to_der().map(base64::encode))
            .collect();
        ser.collect_seq(encoded.map_err(S::Error::custom)?)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<X509>, D::Error> {
        let raw: Vec<String> = Deserialize::deserialize(de)?;
        raw.iter()
            .map(|b64| {
                base64::decode(b64)
                    .map_err(D::Error::custom)
                    .and_then(|der| X509::from_der(&der).map_err(D::Error::custom))
            })
            .collect()
    }
}

/// The registry. Statements are loaded at configuration time and read
/// concurrently during ceremonies, hence the lock around the map only.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    statements: RwLock<BTreeMap<Uuid, MetadataStatement>>,
}

impl MetadataRegistry {
    /// An empty registry. Ceremonies against an empty registry skip all
    /// metadata checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one statement. Statements outside the fido2 protocol family
    /// describe U2F or UAF authenticators whose identifiers are not
    /// AAGUIDs; they are ignored, not an error.
    pub fn load(&self, statement: MetadataStatement) -> Result<(), WebauthnError> {
        if statement.protocol_family != "fido2" {
            debug!(family = %statement.protocol_family, "skipping non-fido2 metadata statement");
            return Ok(());
        }
        let mut statements = self
            .statements
            .write()
            .map_err(|_| WebauthnError::StoreFailure("metadata lock poisoned".to_string()))?;
        statements.insert(statement.aaguid, statement);
        Ok(())
    }

    /// The statement for an authenticator model, if one was loaded.
    pub fn statement_for(&self, aaguid: &Uuid) -> Option<MetadataStatement> {
        self.statements
            .read()
            .ok()
            .and_then(|s| s.get(aaguid).cloned())
    }

    /// Check a registration against this model's statement. Absent a
    /// statement this is a no-op; present, the credential algorithm must
    /// be the declared one and the attestation chain (when the format
    /// produced one) must terminate at one of the declared roots.
    pub(crate) fn verify(
        &self,
        aaguid: &Uuid,
        alg: COSEAlgorithm,
        chain: &[X509],
        crls: &[X509Crl],
        danger_disable_certificate_time_checks: bool,
    ) -> Result<(), WebauthnError> {
        let statement = match self.statement_for(aaguid) {
            Some(s) => s,
            None => return Ok(()),
        };

        let declared = COSEAlgorithm::from_fido_registry(statement.authentication_algorithm)?;
        if declared != alg {
            return Err(WebauthnError::MetadataViolation(
                "credential algorithm differs from metadata declaration",
            ));
        }

        if chain.is_empty() {
            return Ok(());
        }

        // The statement's roots are each tried as the sole anchor; the
        // chain is good as soon as any of them closes it.
        for root in &statement.attestation_root_certificates {
            let anchors = [root.clone()];
            if verify_attestation_ca_chain(
                chain,
                &anchors,
                crls,
                danger_disable_certificate_time_checks,
            )
            .is_ok()
            {
                return Ok(());
            }
        }

        Err(WebauthnError::MetadataViolation(
            "attestation chain does not terminate at a declared root",
        ))
    }

    /// Check that the attestation type a verifier produced is one the
    /// model declared it can produce.
    pub(crate) fn assert_attestation_type(
        &self,
        aaguid: &Uuid,
        produced: AttestationType,
    ) -> Result<(), WebauthnError> {
        let statement = match self.statement_for(aaguid) {
            Some(s) => s,
            None => return Ok(()),
        };

        let registry_id = match produced {
            AttestationType::Basic | AttestationType::AttCa | AttestationType::AnonCa => {
                // AttCa chains are declared either way in practice.
                if statement.attestation_types.contains(&ATTESTATION_ATTCA)
                    && matches!(produced, AttestationType::AttCa)
                {
                    ATTESTATION_ATTCA
                } else {
                    ATTESTATION_BASIC_FULL
                }
            }
            AttestationType::Self_ => ATTESTATION_BASIC_SURROGATE,
            AttestationType::Ecdaa => ATTESTATION_ECDAA,
            // A `none` attestation makes no claim to check.
            AttestationType::None | AttestationType::Uncertain => return Ok(()),
        };

        if statement.attestation_types.contains(&registry_id) {
            Ok(())
        } else {
            Err(WebauthnError::MetadataViolation(
                "attestation type not declared by metadata",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(family: &str, alg: u16, types: Vec<u16>) -> MetadataStatement {
        MetadataStatement {
            aaguid: Uuid::from_bytes([1; 16]),
            protocol_family: family.to_string(),
            authentication_algorithm: alg,
            attestation_types: types,
            attestation_root_certificates: Vec::new(),
        }
    }

    #[test]
    fn non_fido2_statements_are_ignored() {
        let reg = MetadataRegistry::new();
        reg.load(statement("u2f", 0x0001, vec![ATTESTATION_BASIC_FULL]))
            .expect("load");
        assert!(reg.statement_for(&Uuid::from_bytes([1; 16])).is_none());
    }

    #[test]
    fn algorithm_mismatch_is_a_violation() {
        let reg = MetadataRegistry::new();
        // 0x0001 is ALG_SIGN_SECP256R1_ECDSA_SHA256_RAW, ES256.
        reg.load(statement("fido2", 0x0001, vec![ATTESTATION_BASIC_FULL]))
            .expect("load");
        let aaguid = Uuid::from_bytes([1; 16]);
        assert!(reg
            .verify(&aaguid, COSEAlgorithm::ES256, &[], &[], false)
            .is_ok());
        assert!(matches!(
            reg.verify(&aaguid, COSEAlgorithm::RS256, &[], &[], false),
            Err(WebauthnError::MetadataViolation(_))
        ));
    }

    #[test]
    fn surrogate_only_model_rejects_full_attestation() {
        let reg = MetadataRegistry::new();
        reg.load(statement(
            "fido2",
            0x0001,
            vec![ATTESTATION_BASIC_SURROGATE],
        ))
        .expect("load");
        let aaguid = Uuid::from_bytes([1; 16]);
        assert!(reg
            .assert_attestation_type(&aaguid, AttestationType::Self_)
            .is_ok());
        assert!(matches!(
            reg.assert_attestation_type(&aaguid, AttestationType::Basic),
            Err(WebauthnError::MetadataViolation(_))
        ));
    }

    #[test]
    fn unknown_aaguid_passes_every_check() {
        let reg = MetadataRegistry::new();
        let aaguid = Uuid::from_bytes([9; 16]);
        assert!(reg
            .verify(&aaguid, COSEAlgorithm::EDDSA, &[], &[], false)
            .is_ok());
        assert!(reg
            .assert_attestation_type(&aaguid, AttestationType::Basic)
            .is_ok());
    }
}
