//! The ceremony orchestrator.
//!
//! [`Webauthn`] issues challenges and verifies the two Webauthn
//! ceremonies end to end. Configuration is fixed at construction;
//! per-request state lives in the collaborating stores. Nothing is
//! persisted on any failure path - a ceremony either completes fully or
//! leaves no trace beyond the consumed challenge.

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::sync::Arc;

use base64urlsafedata::Base64UrlSafeData;
use openssl::x509::{X509Crl, X509};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::attestation::{
    verify_android_key_attestation, verify_android_safetynet_attestation,
    verify_apple_anonymous_attestation, verify_fidou2f_attestation, verify_none_attestation,
    verify_packed_attestation, verify_tpm_attestation, AttestationFormat, ParsedAttestationData,
};
use crate::constants::{
    ANDROID_KEYSTORE_ROOT_CA_B64, APPLE_WEBAUTHN_ROOT_CA_B64, AUTHENTICATOR_TIMEOUT,
    CHALLENGE_SIZE_BYTES, TPM_MANUFACTURERS,
};
use crate::crypto::{
    assert_cert_validity_window, compute_sha256, verify_attestation_ca_chain, COSEAlgorithm,
    COSEKey,
};
use crate::error::WebauthnError;
use crate::internals::{AuthenticatorAssertionResponse, AuthenticatorAttestationResponse};
use crate::metadata::MetadataRegistry;
use crate::proto::*;
use crate::store::{ChallengeStore, CredentialStore};

/// A credential as this crate persists it: everything authentication
/// needs, plus the attestation context registration established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authenticator {
    /// The credential id.
    pub credential_id: CredentialID,
    /// The account this credential belongs to.
    pub user_name: String,
    /// The credential public key.
    pub cred: COSEKey,
    /// The last accepted signature counter.
    pub counter: u32,
    /// Whether the user was verified at registration.
    pub user_verified: bool,
    /// The authenticator model, all zero when no attestation named one.
    pub aaguid: Uuid,
    /// The attestation format the registration carried.
    pub attestation_format: AttestationFormat,
    /// DER encoded trust path the attestation presented, leaf first.
    /// Empty for path-less attestation types.
    pub attestation_chain: Vec<Base64UrlSafeData>,
}

fn decode_root(b64: &str) -> Result<X509, WebauthnError> {
    let der = base64::decode(b64)?;
    X509::from_der(&der).map_err(WebauthnError::from)
}

/// Immutable relying party configuration.
///
/// Built once at startup with the fluent setters, then handed to
/// [`Webauthn::new`]. The trust-related fields (roots, CRLs, manufacturer
/// list) default to the well-known values in [`crate::constants`] and
/// exist as settables because they rot and must be replaceable without a
/// new release.
pub struct WebauthnOptions {
    rp: RelyingParty,
    origin: Url,
    algorithms: Vec<COSEAlgorithm>,
    attestation: AttestationConveyancePreference,
    user_verification: UserVerificationPolicy,
    resident_key: ResidentKeyPolicy,
    timeout: u32,
    challenge_length: usize,
    transports: Option<Vec<AuthenticatorTransport>>,
    attestation_roots: BTreeMap<AttestationFormat, Vec<X509>>,
    attestation_crls: Vec<X509Crl>,
    apple_webauthn_root: X509,
    android_keystore_root: X509,
    tpm_manufacturers: Vec<String>,
    metadata: Option<Arc<MetadataRegistry>>,
    danger_disable_certificate_time_checks: bool,
}

impl WebauthnOptions {
    /// Options for a relying party. `rp_id` must be the effective domain
    /// of `origin`, or a registrable suffix of it.
    pub fn new(rp_id: &str, rp_name: &str, origin: Url) -> Result<Self, WebauthnError> {
        Ok(WebauthnOptions {
            rp: RelyingParty {
                id: rp_id.to_string(),
                name: rp_name.to_string(),
                icon: None,
            },
            origin,
            algorithms: vec![COSEAlgorithm::ES256],
            attestation: AttestationConveyancePreference::default(),
            user_verification: UserVerificationPolicy::default(),
            resident_key: ResidentKeyPolicy::default(),
            timeout: AUTHENTICATOR_TIMEOUT,
            challenge_length: CHALLENGE_SIZE_BYTES,
            transports: None,
            attestation_roots: BTreeMap::new(),
            attestation_crls: Vec::new(),
            apple_webauthn_root: decode_root(APPLE_WEBAUTHN_ROOT_CA_B64)?,
            android_keystore_root: decode_root(ANDROID_KEYSTORE_ROOT_CA_B64)?,
            tpm_manufacturers: TPM_MANUFACTURERS.iter().map(|m| m.to_string()).collect(),
            metadata: None,
            danger_disable_certificate_time_checks: false,
        })
    }

    /// Set the relying party icon url.
    pub fn rp_icon(mut self, icon: Url) -> Self {
        self.rp.icon = Some(icon);
        self
    }

    /// Set the acceptable credential algorithms, descending preference.
    pub fn algorithms(mut self, algorithms: Vec<COSEAlgorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Set the attestation conveyance preference.
    pub fn attestation(mut self, attestation: AttestationConveyancePreference) -> Self {
        self.attestation = attestation;
        self
    }

    /// Set the user verification policy for both ceremonies.
    pub fn user_verification(mut self, policy: UserVerificationPolicy) -> Self {
        self.user_verification = policy;
        self
    }

    /// Set the resident key policy.
    pub fn resident_key(mut self, policy: ResidentKeyPolicy) -> Self {
        self.resident_key = policy;
        self
    }

    /// Set the authenticator timeout hint, milliseconds.
    pub fn timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the challenge length in bytes. Values below 32 do not carry
    /// enough entropy and are rejected.
    pub fn challenge_length(mut self, length: usize) -> Result<Self, WebauthnError> {
        if length < CHALLENGE_SIZE_BYTES {
            return Err(WebauthnError::Configuration(
                "challenge length below 32 bytes",
            ));
        }
        self.challenge_length = length;
        Ok(self)
    }

    /// Set transport hints to attach to credential descriptors.
    pub fn transports(mut self, transports: Vec<AuthenticatorTransport>) -> Self {
        self.transports = Some(transports);
        self
    }

    /// Add a trust anchor for one attestation format.
    pub fn add_attestation_root(mut self, format: AttestationFormat, root: X509) -> Self {
        self.attestation_roots.entry(format).or_default().push(root);
        self
    }

    /// Add a revocation list consulted during chain validation.
    pub fn add_attestation_crl(mut self, crl: X509Crl) -> Self {
        self.attestation_crls.push(crl);
        self
    }

    /// Replace the pinned Apple WebAuthn root.
    pub fn apple_webauthn_root(mut self, root: X509) -> Self {
        self.apple_webauthn_root = root;
        self
    }

    /// Replace the pinned Android Keystore root.
    pub fn android_keystore_root(mut self, root: X509) -> Self {
        self.android_keystore_root = root;
        self
    }

    /// Replace the TPM manufacturer allow-list.
    pub fn tpm_manufacturers(mut self, manufacturers: Vec<String>) -> Self {
        self.tpm_manufacturers = manufacturers;
        self
    }

    /// Enable metadata cross-checks against a loaded registry.
    pub fn metadata_registry(mut self, registry: Arc<MetadataRegistry>) -> Self {
        self.metadata = Some(registry);
        self
    }

    /// Disable certificate validity window checks. For tests against
    /// captured attestations whose certificates have since expired.
    pub fn danger_disable_certificate_time_checks(mut self, disable: bool) -> Self {
        self.danger_disable_certificate_time_checks = disable;
        self
    }
}

/// The relying party verification core.
pub struct Webauthn {
    options: WebauthnOptions,
    creds: Arc<dyn CredentialStore>,
    challenges: Arc<dyn ChallengeStore>,
}

impl Webauthn {
    /// Construct the core from options and storage collaborators.
    pub fn new(
        options: WebauthnOptions,
        creds: Arc<dyn CredentialStore>,
        challenges: Arc<dyn ChallengeStore>,
    ) -> Result<Self, WebauthnError> {
        let host = options
            .origin
            .host_str()
            .ok_or(WebauthnError::Configuration("origin has no host"))?;
        if host != options.rp.id && !host.ends_with(&format!(".{}", options.rp.id)) {
            return Err(WebauthnError::Configuration(
                "rp id is not a registrable suffix of the origin",
            ));
        }
        if options.algorithms.is_empty() {
            return Err(WebauthnError::Configuration("no algorithms configured"));
        }
        Ok(Webauthn {
            options,
            creds,
            challenges,
        })
    }

    fn generate_challenge(&self) -> Challenge {
        let mut bytes = vec![0; self.options.challenge_length];
        rand::thread_rng().fill_bytes(&mut bytes);
        Challenge::new(bytes)
    }

    fn credential_descriptor(&self, auth: &Authenticator) -> PublicKeyCredentialDescriptor {
        PublicKeyCredentialDescriptor {
            type_: "public-key".to_string(),
            id: Base64UrlSafeData(auth.credential_id.clone()),
            transports: self.options.transports.clone(),
        }
    }

    /// Issue a registration challenge for a user.
    pub async fn generate_challenge_register(
        &self,
        user_name: &str,
    ) -> Result<CreationChallengeResponse, WebauthnError> {
        let challenge = self.generate_challenge();
        self.challenges.issue(user_name, challenge.clone()).await?;

        // Credentials already registered are excluded so a user cannot
        // double-register the same authenticator.
        let exclude: Vec<_> = self
            .creds
            .find_by_username(user_name)
            .await?
            .iter()
            .map(|a| self.credential_descriptor(a))
            .collect();

        Ok(CreationChallengeResponse {
            public_key: PublicKeyCredentialCreationOptions {
                rp: self.options.rp.clone(),
                user: User {
                    id: Base64UrlSafeData(user_name.as_bytes().to_vec()),
                    name: user_name.to_string(),
                    display_name: user_name.to_string(),
                },
                challenge: challenge.0,
                pub_key_cred_params: self
                    .options
                    .algorithms
                    .iter()
                    .map(|alg| PubKeyCredParams {
                        type_: "public-key".to_string(),
                        alg: i64::from(*alg),
                    })
                    .collect(),
                timeout: Some(self.options.timeout),
                attestation: Some(self.options.attestation),
                exclude_credentials: if exclude.is_empty() {
                    None
                } else {
                    Some(exclude)
                },
                authenticator_selection: Some(AuthenticatorSelectionCriteria {
                    authenticator_attachment: None,
                    resident_key: self.options.resident_key,
                    require_resident_key: self.options.resident_key
                        == ResidentKeyPolicy::Required,
                    user_verification: self.options.user_verification,
                }),
            },
        })
    }

    /// Issue an authentication challenge for a user.
    pub async fn generate_challenge_authenticate(
        &self,
        user_name: &str,
    ) -> Result<RequestChallengeResponse, WebauthnError> {
        let registered = self.creds.find_by_username(user_name).await?;
        if registered.is_empty() {
            return Err(WebauthnError::UnknownCredential);
        }

        let challenge = self.generate_challenge();
        self.challenges.issue(user_name, challenge.clone()).await?;

        Ok(RequestChallengeResponse {
            public_key: PublicKeyCredentialRequestOptions {
                challenge: challenge.0,
                timeout: Some(self.options.timeout),
                rp_id: self.options.rp.id.clone(),
                allow_credentials: registered
                    .iter()
                    .map(|a| self.credential_descriptor(a))
                    .collect(),
                user_verification: self.options.user_verification,
            },
        })
    }

    /// Consume the user's outstanding challenge and check the returned
    /// client data against it. The challenge is gone after this call
    /// whatever the outcome; a failed ceremony cannot be retried against
    /// the same challenge.
    async fn consume_and_check_client_data(
        &self,
        user_name: &str,
        client_data: &CollectedClientData,
        expected_type: &str,
    ) -> Result<(), WebauthnError> {
        let stored = self
            .challenges
            .consume(user_name)
            .await?
            .ok_or(WebauthnError::ChallengeConsumed)?;

        if client_data.type_ != expected_type {
            return Err(WebauthnError::TypeMismatch);
        }

        if client_data.challenge.0 != stored.as_ref() {
            return Err(WebauthnError::ChallengeMismatch);
        }

        if client_data.origin != self.options.origin {
            debug!(claimed = %client_data.origin, expected = %self.options.origin, "origin mismatch");
            return Err(WebauthnError::OriginMismatch);
        }

        Ok(())
    }

    fn check_auth_data_flags(
        &self,
        user_present: bool,
        user_verified: bool,
        rp_id_hash: &[u8],
    ) -> Result<(), WebauthnError> {
        if rp_id_hash != compute_sha256(self.options.rp.id.as_bytes()).as_slice() {
            return Err(WebauthnError::RpIdHashMismatch);
        }
        if !user_present {
            return Err(WebauthnError::UserNotPresent);
        }
        if self.options.user_verification == UserVerificationPolicy::Required && !user_verified {
            return Err(WebauthnError::UserNotVerified);
        }
        Ok(())
    }

    fn trust_anchors_for(&self, format: AttestationFormat) -> Vec<X509> {
        let mut anchors = self
            .options
            .attestation_roots
            .get(&format)
            .cloned()
            .unwrap_or_default();
        // Apple and Android attestations chain to a single well-known
        // vendor hierarchy; pin it unless metadata overrides.
        match format {
            AttestationFormat::AppleAnonymous => {
                anchors.push(self.options.apple_webauthn_root.clone())
            }
            AttestationFormat::AndroidKey => {
                anchors.push(self.options.android_keystore_root.clone())
            }
            _ => {}
        }
        anchors
    }

    /// Complete a registration ceremony. On success the credential is
    /// persisted and returned.
    pub async fn register_credential(
        &self,
        user_name: &str,
        rsp: &RegisterPublicKeyCredential,
    ) -> Result<Authenticator, WebauthnError> {
        let data = AuthenticatorAttestationResponse::try_from(&rsp.response)?;

        // The challenge goes first: a replayed or expired ceremony must
        // fail before any signature is inspected.
        self.consume_and_check_client_data(user_name, &data.client_data, "webauthn.create")
            .await?;

        let client_data_hash = compute_sha256(&data.client_data_bytes);

        let att_obj = &data.attestation_object;
        let auth_data = &att_obj.auth_data;

        self.check_auth_data_flags(
            auth_data.user_present,
            auth_data.user_verified,
            &auth_data.rp_id_hash,
        )?;

        // Extension outputs are decoded for the logs but none are acted
        // on yet.
        if let Some(extensions) = &auth_data.extensions {
            trace!(?extensions, "authenticator data carried extensions");
        }

        let acd = auth_data
            .acd
            .as_ref()
            .ok_or(WebauthnError::MissingAttestedCredentialData)?;

        if acd.credential_id != rsp.raw_id.0 {
            return Err(WebauthnError::MalformedStructure(
                "credential id disagrees with attested credential data",
            ));
        }

        let credential_public_key = COSEKey::try_from(&acd.credential_pk)?;
        if !self
            .options
            .algorithms
            .contains(&credential_public_key.type_)
        {
            return Err(WebauthnError::UnsupportedAlgorithm);
        }

        // Unknown formats are fatal. Downgrading to `none` here would let
        // a tampering client strip attestation silently.
        let format = AttestationFormat::try_from(att_obj.fmt.as_str())?;
        debug!(?format, aaguid = %acd.aaguid, "verifying attestation statement");

        let att_data = match format {
            AttestationFormat::None => verify_none_attestation(acd, att_obj)?,
            AttestationFormat::FidoU2F => {
                verify_fidou2f_attestation(acd, att_obj, &client_data_hash)?
            }
            AttestationFormat::Packed => {
                verify_packed_attestation(acd, att_obj, &client_data_hash)?
            }
            AttestationFormat::Tpm => verify_tpm_attestation(
                acd,
                att_obj,
                &client_data_hash,
                &self.options.tpm_manufacturers,
            )?,
            AttestationFormat::AndroidKey => {
                verify_android_key_attestation(acd, att_obj, &client_data_hash)?
            }
            AttestationFormat::AndroidSafetyNet => {
                verify_android_safetynet_attestation(acd, att_obj, &client_data_hash)?
            }
            AttestationFormat::AppleAnonymous => {
                verify_apple_anonymous_attestation(acd, att_obj, &client_data_hash)?
            }
        };

        // Certificates in the trust path must be inside their validity
        // window whether or not an anchor is available to chain to.
        if !self.options.danger_disable_certificate_time_checks {
            assert_cert_validity_window(att_data.trust_path())?;
        }

        // Metadata, when loaded for this model, is authoritative for the
        // algorithm, the attestation type, and the trust roots.
        let mut metadata_has_roots = false;
        if let Some(registry) = &self.options.metadata {
            metadata_has_roots = registry
                .statement_for(&acd.aaguid)
                .map(|s| !s.attestation_root_certificates.is_empty())
                .unwrap_or(false);
            registry.verify(
                &acd.aaguid,
                credential_public_key.type_,
                att_data.trust_path(),
                &self.options.attestation_crls,
                self.options.danger_disable_certificate_time_checks,
            )?;
            registry.assert_attestation_type(&acd.aaguid, att_data.attestation_type())?;
        }

        // Without metadata roots, anchor the trust path against the
        // per-format configuration.
        if !metadata_has_roots {
            let anchors = self.trust_anchors_for(format);
            if !anchors.is_empty() && !att_data.trust_path().is_empty() {
                verify_attestation_ca_chain(
                    att_data.trust_path(),
                    &anchors,
                    &self.options.attestation_crls,
                    self.options.danger_disable_certificate_time_checks,
                )?;
            }
        }

        if let ParsedAttestationData::Uncertain = att_data {
            trace!("attestation could not be classified");
        }

        // Credential ids are global; a collision with any registered
        // credential refuses the registration.
        if !self
            .creds
            .find_by_credential_id(&acd.credential_id)
            .await?
            .is_empty()
        {
            return Err(WebauthnError::CredentialAlreadyExists);
        }

        let attestation_chain = att_data
            .trust_path()
            .iter()
            .map(|c| c.to_der().map(Base64UrlSafeData))
            .collect::<Result<_, _>>()?;

        let authenticator = Authenticator {
            credential_id: acd.credential_id.clone(),
            user_name: user_name.to_string(),
            cred: credential_public_key,
            counter: auth_data.counter,
            user_verified: auth_data.user_verified,
            aaguid: acd.aaguid,
            attestation_format: format,
            attestation_chain,
        };

        self.creds.insert(authenticator.clone()).await?;

        Ok(authenticator)
    }

    /// Complete an authentication ceremony. Returns the accepted counter
    /// value, which has already been persisted.
    pub async fn authenticate_credential(
        &self,
        user_name: &str,
        rsp: &PublicKeyCredential,
    ) -> Result<u32, WebauthnError> {
        let data = AuthenticatorAssertionResponse::try_from(&rsp.response)?;

        self.consume_and_check_client_data(user_name, &data.client_data, "webauthn.get")
            .await?;

        // Exactly one stored credential may match the asserted id.
        let mut matches = self.creds.find_by_credential_id(&rsp.raw_id.0).await?;
        let auth = match matches.len() {
            0 => return Err(WebauthnError::UnknownCredential),
            1 => matches.swap_remove(0),
            _ => return Err(WebauthnError::AmbiguousCredential),
        };

        // The credential must belong to the user running this ceremony;
        // another user's credential id is as good as unknown.
        if auth.user_name != user_name {
            debug!(credential = ?rsp.id, "credential belongs to a different user");
            return Err(WebauthnError::UnknownCredential);
        }

        let auth_data = &data.authenticator_data;
        self.check_auth_data_flags(
            auth_data.user_present,
            auth_data.user_verified,
            &auth_data.rp_id_hash,
        )?;

        // The signature covers the raw authenticator data and the hash of
        // the raw client data bytes, exactly as transmitted.
        let verification_data: Vec<u8> = data
            .authenticator_data_bytes
            .iter()
            .chain(compute_sha256(&data.client_data_bytes).iter())
            .copied()
            .collect();

        let verified = auth.cred.verify_signature(&data.signature, &verification_data)?;
        if !verified {
            error!(credential = ?rsp.id, "assertion signature invalid");
            return Err(WebauthnError::SignatureInvalid);
        }

        // A counter that failed to advance on a counter-bearing
        // credential is a cloned-key signal.
        let counter = auth_data.counter;
        if counter <= auth.counter && auth.counter != 0 {
            error!(
                credential = ?rsp.id,
                received = counter,
                stored = auth.counter,
                "credential counter regression"
            );
            return Err(WebauthnError::CounterRegression);
        }

        if counter > auth.counter {
            self.creds.update_counter(&auth.credential_id, counter).await?;
        }

        Ok(counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{COSEEC2Key, COSEKeyType, ECDSACurve};
    use crate::store::{EphemeralChallengeStore, EphemeralCredentialStore};

    fn setup() {
        let _ = tracing_subscriber::fmt::try_init();
    }

    fn build(options: WebauthnOptions) -> (Webauthn, Arc<EphemeralChallengeStore>) {
        setup();
        let creds = Arc::new(EphemeralCredentialStore::new());
        let challenges = Arc::new(EphemeralChallengeStore::new());
        let wan = Webauthn::new(options, creds, challenges.clone()).expect("construct");
        (wan, challenges)
    }

    async fn issue(challenges: &EphemeralChallengeStore, user: &str, chal: &Challenge) {
        challenges.issue(user, chal.clone()).await.expect("issue");
    }

    // Registration captured from a yubico 5 against a local test rig.
    fn yubico_u2f_response() -> RegisterPublicKeyCredential {
        let rsp = r#"
        {
            "id":"0xYE4bQ_HZM51-XYwp7WHJu8RfeA2Oz3_9HnNIZAKqRTz9gsUlF3QO7EqcJ0pgLSwDcq6cL1_aQpTtKLeGu6Ig",
            "rawId":"0xYE4bQ_HZM51-XYwp7WHJu8RfeA2Oz3_9HnNIZAKqRTz9gsUlF3QO7EqcJ0pgLSwDcq6cL1_aQpTtKLeGu6Ig",
            "response":{
                 "attestationObject":"o2NmbXRoZmlkby11MmZnYXR0U3RtdKJjc2lnWEcwRQIhALjRb43YFcbJ3V9WiYPpIrZkhgzAM6KTR8KIjwCXejBCAiAO5Lvp1VW4dYBhBDv7HZIrxZb1SwKKYOLfFRXykRxMqGN4NWOBWQLBMIICvTCCAaWgAwIBAgIEGKxGwDANBgkqhkiG9w0BAQsFADAuMSwwKgYDVQQDEyNZdWJpY28gVTJGIFJvb3QgQ0EgU2VyaWFsIDQ1NzIwMDYzMTAgFw0xNDA4MDEwMDAwMDBaGA8yMDUwMDkwNDAwMDAwMFowbjELMAkGA1UEBhMCU0UxEjAQBgNVBAoMCVl1YmljbyBBQjEiMCAGA1UECwwZQXV0aGVudGljYXRvciBBdHRlc3RhdGlvbjEnMCUGA1UEAwweWXViaWNvIFUyRiBFRSBTZXJpYWwgNDEzOTQzNDg4MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEeeo7LHxJcBBiIwzSP-tg5SkxcdSD8QC-hZ1rD4OXAwG1Rs3Ubs_K4-PzD4Hp7WK9Jo1MHr03s7y-kqjCrutOOqNsMGowIgYJKwYBBAGCxAoCBBUxLjMuNi4xLjQuMS40MTQ4Mi4xLjcwEwYLKwYBBAGC5RwCAQEEBAMCBSAwIQYLKwYBBAGC5RwBAQQEEgQQy2lIHo_3QDmT7AonKaFUqDAMBgNVHRMBAf8EAjAAMA0GCSqGSIb3DQEBCwUAA4IBAQCXnQOX2GD4LuFdMRx5brr7Ivqn4ITZurTGG7tX8-a0wYpIN7hcPE7b5IND9Nal2bHO2orh_tSRKSFzBY5e4cvda9rAdVfGoOjTaCW6FZ5_ta2M2vgEhoz5Do8fiuoXwBa1XCp61JfIlPtx11PXm5pIS2w3bXI7mY0uHUMGvxAzta74zKXLslaLaSQibSKjWKt9h-SsXy4JGqcVefOlaQlJfXL1Tga6wcO0QTu6Xq-Uw7ZPNPnrpBrLauKDd202RlN4SP7ohL3d9bG6V5hUz_3OusNEBZUn5W3VmPj1ZnFavkMB3RkRMOa58MZAORJT4imAPzrvJ0vtv94_y71C6tZ5aGF1dGhEYXRhWMQSyhe0mvIolDbzA-AWYDCiHlJdJm4gkmdDOAGo_UBxoEEAAAAAAAAAAAAAAAAAAAAAAAAAAABA0xYE4bQ_HZM51-XYwp7WHJu8RfeA2Oz3_9HnNIZAKqRTz9gsUlF3QO7EqcJ0pgLSwDcq6cL1_aQpTtKLeGu6IqUBAgMmIAEhWCCe1KvqpcVWN416_QZc8vJynt3uo3_WeJ2R4uj6kJbaiiJYIDC5ssxxummKviGgLoP9ZLFb836A9XfRO7op18QY3i5m",
                 "clientDataJSON":"eyJjaGFsbGVuZ2UiOiJBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBQUFBIiwiY2xpZW50RXh0ZW5zaW9ucyI6e30sImhhc2hBbGdvcml0aG0iOiJTSEEtMjU2Iiwib3JpZ2luIjoiaHR0cDovLzEyNy4wLjAuMTo4MDgwIiwidHlwZSI6IndlYmF1dGhuLmNyZWF0ZSJ9"
            },
            "type":"public-key"}
        "#;
        serde_json::from_str(rsp).expect("yubico vector")
    }

    fn yubico_options() -> WebauthnOptions {
        WebauthnOptions::new(
            "127.0.0.1",
            "http://127.0.0.1:8080/auth",
            Url::parse("http://127.0.0.1:8080").expect("origin"),
        )
        .expect("options")
    }

    #[tokio::test]
    async fn registration_fido_u2f() {
        let (wan, challenges) = build(yubico_options());
        let zero_chal = Challenge::new(vec![0; CHALLENGE_SIZE_BYTES]);
        issue(&challenges, "alice", &zero_chal).await;

        let result = wan.register_credential("alice", &yubico_u2f_response()).await;
        assert!(result.is_ok(), "{:?}", result);
        let auth = result.expect("registered");
        assert_eq!(auth.attestation_format, AttestationFormat::FidoU2F);
        assert_eq!(auth.aaguid, Uuid::nil());
        assert_eq!(auth.attestation_chain.len(), 1);
        assert!(!auth.user_verified);
    }

    #[tokio::test]
    async fn registration_requires_outstanding_challenge() {
        let (wan, _challenges) = build(yubico_options());
        let result = wan.register_credential("alice", &yubico_u2f_response()).await;
        assert!(matches!(result, Err(WebauthnError::ChallengeConsumed)));
    }

    #[tokio::test]
    async fn registration_challenge_consumed_on_failure() {
        let options = yubico_options().user_verification(UserVerificationPolicy::Required);
        let (wan, challenges) = build(options);
        let zero_chal = Challenge::new(vec![0; CHALLENGE_SIZE_BYTES]);
        issue(&challenges, "alice", &zero_chal).await;

        // The u2f token did not verify the user; required policy fails.
        let result = wan.register_credential("alice", &yubico_u2f_response()).await;
        assert!(matches!(result, Err(WebauthnError::UserNotVerified)));

        // And the challenge is gone, so a retry cannot replay it.
        let result = wan.register_credential("alice", &yubico_u2f_response()).await;
        assert!(matches!(result, Err(WebauthnError::ChallengeConsumed)));
    }

    #[tokio::test]
    async fn registration_challenge_mismatch() {
        let (wan, challenges) = build(yubico_options());
        let chal = Challenge::new(vec![7; CHALLENGE_SIZE_BYTES]);
        issue(&challenges, "alice", &chal).await;

        let result = wan.register_credential("alice", &yubico_u2f_response()).await;
        assert!(matches!(result, Err(WebauthnError::ChallengeMismatch)));
    }

    #[tokio::test]
    async fn registration_origin_mismatch() {
        let options = WebauthnOptions::new(
            "example.com",
            "example",
            Url::parse("http://example.com:8080").expect("origin"),
        )
        .expect("options");
        let (wan, challenges) = build(options);
        let zero_chal = Challenge::new(vec![0; CHALLENGE_SIZE_BYTES]);
        issue(&challenges, "alice", &zero_chal).await;

        let result = wan.register_credential("alice", &yubico_u2f_response()).await;
        assert!(matches!(result, Err(WebauthnError::OriginMismatch)));
    }

    #[tokio::test]
    async fn registration_duplicate_credential_rejected() {
        let (wan, challenges) = build(yubico_options());
        let zero_chal = Challenge::new(vec![0; CHALLENGE_SIZE_BYTES]);

        issue(&challenges, "alice", &zero_chal).await;
        wan.register_credential("alice", &yubico_u2f_response())
            .await
            .expect("first registration");

        // Same authenticator presented for another account.
        issue(&challenges, "bob", &zero_chal).await;
        let result = wan.register_credential("bob", &yubico_u2f_response()).await;
        assert!(matches!(
            result,
            Err(WebauthnError::CredentialAlreadyExists)
        ));
    }

    // Vector from https://github.com/duo-labs/webauthn
    #[tokio::test]
    async fn registration_duo_go() {
        let options = WebauthnOptions::new(
            "webauthn.io",
            "webauthn.io",
            Url::parse("https://webauthn.io").expect("origin"),
        )
        .expect("options");
        let (wan, challenges) = build(options);

        let chal =
            Challenge::new(base64::decode("+Ri5NZTzJ8b6mvW3TVScLotEoALfgBa2Bn4YSaIObHc").expect("chal"));
        issue(&challenges, "alice", &chal).await;

        let rsp = r#"
        {
                "id": "FOxcmsqPLNCHtyILvbNkrtHMdKAeqSJXYZDbeFd0kc5Enm8Kl6a0Jp0szgLilDw1S4CjZhe9Z2611EUGbjyEmg",
                "rawId": "FOxcmsqPLNCHtyILvbNkrtHMdKAeqSJXYZDbeFd0kc5Enm8Kl6a0Jp0szgLilDw1S4CjZhe9Z2611EUGbjyEmg",
                "response": {
                        "attestationObject": "o2NmbXRoZmlkby11MmZnYXR0U3RtdKJjc2lnWEYwRAIgfyIhwZj-fkEVyT1GOK8chDHJR2chXBLSRg6bTCjODmwCIHH6GXI_BQrcR-GHg5JfazKVQdezp6_QWIFfT4ltTCO2Y3g1Y4FZAlMwggJPMIIBN6ADAgECAgQSNtF_MA0GCSqGSIb3DQEBCwUAMC4xLDAqBgNVBAMTI1l1YmljbyBVMkYgUm9vdCBDQSBTZXJpYWwgNDU3MjAwNjMxMCAXDTE0MDgwMTAwMDAwMFoYDzIwNTAwOTA0MDAwMDAwWjAxMS8wLQYDVQQDDCZZdWJpY28gVTJGIEVFIFNlcmlhbCAyMzkyNTczNDEwMzI0MTA4NzBZMBMGByqGSM49AgEGCCqGSM49AwEHA0IABNNlqR5emeDVtDnA2a-7h_QFjkfdErFE7bFNKzP401wVE-QNefD5maviNnGVk4HJ3CsHhYuCrGNHYgTM9zTWriGjOzA5MCIGCSsGAQQBgsQKAgQVMS4zLjYuMS40LjEuNDE0ODIuMS41MBMGCysGAQQBguUcAgEBBAQDAgUgMA0GCSqGSIb3DQEBCwUAA4IBAQAiG5uzsnIk8T6-oyLwNR6vRklmo29yaYV8jiP55QW1UnXdTkEiPn8mEQkUac-Sn6UmPmzHdoGySG2q9B-xz6voVQjxP2dQ9sgbKd5gG15yCLv6ZHblZKkdfWSrUkrQTrtaziGLFSbxcfh83vUjmOhDLFC5vxV4GXq2674yq9F2kzg4nCS4yXrO4_G8YWR2yvQvE2ffKSjQJlXGO5080Ktptplv5XN4i5lS-AKrT5QRVbEJ3B4g7G0lQhdYV-6r4ZtHil8mF4YNMZ0-RaYPxAaYNWkFYdzOZCaIdQbXRZefgGfbMUiAC2gwWN7fiPHV9eu82NYypGU32OijG9BjhGt_aGF1dGhEYXRhWMR0puqSE8mcL3SyJJKzIM9AJiqUwalQoDl_KSULYIQe8EEAAAAAAAAAAAAAAAAAAAAAAAAAAABAFOxcmsqPLNCHtyILvbNkrtHMdKAeqSJXYZDbeFd0kc5Enm8Kl6a0Jp0szgLilDw1S4CjZhe9Z2611EUGbjyEmqUBAgMmIAEhWCD_ap3Q9zU8OsGe967t48vyRxqn8NfFTk307mC1WsH2ISJYIIcqAuW3MxhU0uDtaSX8-Ftf_zeNJLdCOEjZJGHsrLxH",
                        "clientDataJSON": "eyJjaGFsbGVuZ2UiOiItUmk1TlpUeko4YjZtdlczVFZTY0xvdEVvQUxmZ0JhMkJuNFlTYUlPYkhjIiwib3JpZ2luIjoiaHR0cHM6Ly93ZWJhdXRobi5pbyIsInR5cGUiOiJ3ZWJhdXRobi5jcmVhdGUifQ"
                },
                "type": "public-key"
        }
        "#;
        let rsp_d: RegisterPublicKeyCredential = serde_json::from_str(rsp).expect("duo vector");
        let result = wan.register_credential("alice", &rsp_d).await;
        assert!(result.is_ok(), "{:?}", result);
    }

    // Generated with navigator.credentials.create on Chrome 77 using
    // Touch ID on a MacBook running MacOS 10.15. Packed self attestation.
    #[tokio::test]
    async fn registration_packed_self_attestation() {
        let options = WebauthnOptions::new(
            "localhost",
            "localhost:8443/auth",
            Url::parse("https://localhost:8443").expect("origin"),
        )
        .expect("options");
        let (wan, challenges) = build(options);

        let chal = Challenge::new(
            base64::decode("lP6mWNAtG+/Vv15iM7lb/XRkdWMvVQ+lTyKwZuOg1Vo=").expect("chal"),
        );
        issue(&challenges, "alice", &chal).await;

        let rsp = r#"{
            "id":"ATk_7QKbi_ntSdp16LXeU6RDf9YnRLIDTCqEjJFzc6rKBhbqoSYccxNa",
            "rawId":"ATk_7QKbi_ntSdp16LXeU6RDf9YnRLIDTCqEjJFzc6rKBhbqoSYccxNa",
            "response":{
                "attestationObject":"o2NmbXRmcGFja2VkZ2F0dFN0bXSiY2FsZyZjc2lnWEcwRQIgLXPjBtVEhBH3KdUDFFk3LAd9EtHogllIf48vjX4wgfECIQCXOymmfg12FPMXEdwpSjjtmrvki4K8y0uYxqWN5Bw6DGhhdXRoRGF0YViuSZYN5YgOjGh0NBcPZHZgW4_krrmihjLHmVzzuoMdl2NFXaqejq3OAAI1vMYKZIsLJfHwVQMAKgE5P-0Cm4v57Unadei13lOkQ3_WJ0SyA0wqhIyRc3OqygYW6qEmHHMTWqUBAgMmIAEhWCDNRS_Gw52ow5PNrC9OdFTFNudDmZO6Y3wmM9N8e0tJICJYIC09iIH5_RrT5tbS0PIw3srdAxYDMGao7yWgu0JFIEzT",
                "clientDataJSON":"eyJjaGFsbGVuZ2UiOiJsUDZtV05BdEctX1Z2MTVpTTdsYl9YUmtkV012VlEtbFR5S3dadU9nMVZvIiwiZXh0cmFfa2V5c19tYXlfYmVfYWRkZWRfaGVyZSI6ImRvIG5vdCBjb21wYXJlIGNsaWVudERhdGFKU09OIGFnYWluc3QgYSB0ZW1wbGF0ZS4gU2VlIGh0dHBzOi8vZ29vLmdsL3lhYlBleCIsIm9yaWdpbiI6Imh0dHBzOi8vbG9jYWxob3N0Ojg0NDMiLCJ0eXBlIjoid2ViYXV0aG4uY3JlYXRlIn0"
            },
            "type":"public-key"
        }"#;
        let rsp_d: RegisterPublicKeyCredential = serde_json::from_str(rsp).expect("packed vector");
        let result = wan.register_credential("alice", &rsp_d).await;
        assert!(result.is_ok(), "{:?}", result);
    }

    // Windows Hello, attestation none with an RS256 key.
    #[tokio::test]
    async fn registration_win_hello_attest_none() {
        let options = WebauthnOptions::new(
            "etools-dev.example.com",
            "etools",
            Url::parse("https://etools-dev.example.com:8080").expect("origin"),
        )
        .expect("options")
        .algorithms(vec![COSEAlgorithm::ES256, COSEAlgorithm::RS256])
        .user_verification(UserVerificationPolicy::Required);
        let (wan, challenges) = build(options);

        let chal = Challenge::new(vec![
            21, 9, 50, 208, 90, 167, 153, 94, 74, 98, 161, 84, 247, 161, 61, 104, 10, 82, 33, 27,
            99, 94, 34, 156, 84, 85, 31, 240, 9, 188, 136, 52,
        ]);
        issue(&challenges, "alice", &chal).await;

        let rsp_d = RegisterPublicKeyCredential {
            id: "KwlEDOBCBc9P1YU3NWihYLCeY-I9KGMhPap9vwHbVoI".to_string(),
            raw_id: Base64UrlSafeData(vec![
                43, 9, 68, 12, 224, 66, 5, 207, 79, 213, 133, 55, 53, 104, 161, 96, 176, 158, 99,
                226, 61, 40, 99, 33, 61, 170, 125, 191, 1, 219, 86, 130,
            ]),
            response: AuthenticatorAttestationResponseRaw {
                attestation_object: Base64UrlSafeData(vec![
                    163, 99, 102, 109, 116, 100, 110, 111, 110, 101, 103, 97, 116, 116, 83, 116,
                    109, 116, 160, 104, 97, 117, 116, 104, 68, 97, 116, 97, 89, 1, 103, 108, 41,
                    129, 232, 231, 178, 172, 146, 198, 102, 0, 255, 160, 250, 221, 227, 137, 40,
                    196, 142, 208, 221, 115, 246, 47, 198, 69, 45, 165, 107, 42, 27, 69, 0, 0, 0,
                    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 32, 43, 9, 68, 12, 224,
                    66, 5, 207, 79, 213, 133, 55, 53, 104, 161, 96, 176, 158, 99, 226, 61, 40, 99,
                    33, 61, 170, 125, 191, 1, 219, 86, 130, 164, 1, 3, 3, 57, 1, 0, 32, 89, 1, 0,
                    166, 163, 131, 233, 97, 64, 136, 207, 111, 39, 80, 80, 230, 19, 46, 59, 12,
                    247, 151, 113, 167, 157, 140, 198, 227, 168, 159, 211, 232, 112, 116, 209, 54,
                    148, 26, 156, 56, 88, 56, 27, 116, 102, 237, 88, 99, 81, 65, 79, 133, 242, 192,
                    25, 28, 45, 116, 131, 129, 253, 185, 91, 35, 129, 35, 193, 44, 64, 86, 87, 137,
                    44, 19, 74, 239, 72, 178, 243, 11, 195, 135, 194, 216, 109, 62, 84, 172, 16,
                    182, 82, 140, 170, 1, 255, 91, 80, 73, 100, 1, 117, 61, 148, 179, 95, 199, 169,
                    228, 244, 174, 69, 54, 185, 15, 107, 5, 0, 110, 155, 28, 243, 114, 32, 176,
                    220, 93, 196, 172, 158, 22, 3, 154, 18, 148, 20, 132, 94, 166, 45, 24, 27, 8,
                    255, 108, 31, 230, 196, 122, 125, 240, 215, 219, 118, 80, 224, 146, 92, 80,
                    219, 91, 211, 88, 45, 28, 133, 135, 83, 244, 212, 29, 121, 132, 104, 189, 3,
                    98, 42, 180, 10, 249, 232, 59, 172, 204, 109, 64, 206, 139, 76, 247, 230, 40,
                    36, 71, 79, 11, 139, 84, 211, 153, 125, 108, 108, 55, 195, 205, 5, 90, 248, 72,
                    42, 94, 40, 136, 193, 89, 3, 102, 109, 30, 65, 117, 76, 103, 150, 4, 44, 155,
                    104, 207, 126, 92, 16, 161, 175, 223, 119, 246, 169, 127, 72, 13, 83, 129, 12,
                    164, 102, 42, 141, 173, 102, 140, 52, 57, 43, 115, 12, 238, 89, 33, 67, 1, 0,
                    1,
                ]),
                client_data_json: Base64UrlSafeData(vec![
                    123, 34, 116, 121, 112, 101, 34, 58, 34, 119, 101, 98, 97, 117, 116, 104, 110,
                    46, 99, 114, 101, 97, 116, 101, 34, 44, 34, 99, 104, 97, 108, 108, 101, 110,
                    103, 101, 34, 58, 34, 70, 81, 107, 121, 48, 70, 113, 110, 109, 86, 53, 75, 89,
                    113, 70, 85, 57, 54, 69, 57, 97, 65, 112, 83, 73, 82, 116, 106, 88, 105, 75,
                    99, 86, 70, 85, 102, 56, 65, 109, 56, 105, 68, 81, 34, 44, 34, 111, 114, 105,
                    103, 105, 110, 34, 58, 34, 104, 116, 116, 112, 115, 58, 47, 47, 101, 116, 111,
                    111, 108, 115, 45, 100, 101, 118, 46, 101, 120, 97, 109, 112, 108, 101, 46, 99,
                    111, 109, 58, 56, 48, 56, 48, 34, 44, 34, 99, 114, 111, 115, 115, 79, 114, 105,
                    103, 105, 110, 34, 58, 102, 97, 108, 115, 101, 125,
                ]),
            },
            type_: "public-key".to_string(),
        };

        let result = wan.register_credential("alice", &rsp_d).await;
        assert!(result.is_ok(), "{:?}", result);
        let auth = result.expect("registered");
        assert_eq!(auth.attestation_format, AttestationFormat::None);
        assert!(auth.user_verified);
    }

    fn yubico_assertion() -> PublicKeyCredential {
        let rsp = r#"
        {
            "id":"at-FfKGsOI21EhtCu7Vx-7t7FKkpUOyKXIkEBBD_vC-eym_AdW6Y9V8WyKxHmii11EBQEe7uFQ0bkYwb0GWmUQ",
            "rawId":"at-FfKGsOI21EhtCu7Vx-7t7FKkpUOyKXIkEBBD_vC-eym_AdW6Y9V8WyKxHmii11EBQEe7uFQ0bkYwb0GWmUQ",
            "response":{
                "authenticatorData":"SZYN5YgOjGh0NBcPZHZgW4_krrmihjLHmVzzuoMdl2MBAAAAFA",
                "clientDataJSON":"eyJjaGFsbGVuZ2UiOiJXZ1h6X2tUdjNXVVUxa3c4aG0tT0dvR1M0WkNIWF8zYkVxSEgyUHZWcDhNIiwiY2xpZW50RXh0ZW5zaW9ucyI6e30sImhhc2hBbGdvcml0aG0iOiJTSEEtMjU2Iiwib3JpZ2luIjoiaHR0cDovL2xvY2FsaG9zdDo4MDgwIiwidHlwZSI6IndlYmF1dGhuLmdldCJ9",
                "signature":"MEYCIQDmLVOqv85cdRup4Fr8Pf9zC4AWO-XKBJqa8xPwYFCCMAIhAOiExLoyes0xipmUmq0BVlqJaCKLn_MFKG9GIDsCGq_-",
                "userHandle":null
            },
            "type":"public-key"
        }
        "#;
        serde_json::from_str(rsp).expect("assertion vector")
    }

    fn yubico_assertion_challenge() -> Challenge {
        Challenge::new(vec![
            90, 5, 243, 254, 68, 239, 221, 101, 20, 214, 76, 60, 134, 111, 142, 26, 129, 146, 225,
            144, 135, 95, 253, 219, 18, 161, 199, 216, 251, 213, 167, 195,
        ])
    }

    fn yubico_assertion_authenticator(counter: u32) -> Authenticator {
        Authenticator {
            credential_id: vec![
                106, 223, 133, 124, 161, 172, 56, 141, 181, 18, 27, 66, 187, 181, 113, 251, 187,
                123, 20, 169, 41, 80, 236, 138, 92, 137, 4, 4, 16, 255, 188, 47, 158, 202, 111,
                192, 117, 110, 152, 245, 95, 22, 200, 172, 71, 154, 40, 181, 212, 64, 80, 17, 238,
                238, 21, 13, 27, 145, 140, 27, 208, 101, 166, 81,
            ],
            user_name: "alice".to_string(),
            cred: COSEKey {
                type_: COSEAlgorithm::ES256,
                key: COSEKeyType::EC_EC2(COSEEC2Key {
                    curve: ECDSACurve::SECP256R1,
                    x: vec![
                        46, 121, 76, 233, 118, 208, 250, 74, 227, 182, 8, 145, 45, 46, 5, 9, 199,
                        186, 84, 83, 7, 237, 130, 73, 16, 90, 17, 54, 33, 255, 54, 56,
                    ],
                    y: vec![
                        117, 105, 1, 23, 253, 223, 67, 135, 253, 219, 253, 223, 17, 247, 91, 197,
                        205, 225, 143, 59, 47, 138, 70, 120, 74, 155, 177, 177, 166, 233, 48, 71,
                    ],
                }),
            },
            counter,
            user_verified: false,
            aaguid: Uuid::nil(),
            attestation_format: AttestationFormat::FidoU2F,
            attestation_chain: Vec::new(),
        }
    }

    async fn localhost_wan_with_cred(counter: u32) -> (Webauthn, Arc<EphemeralChallengeStore>) {
        setup();
        let options = WebauthnOptions::new(
            "localhost",
            "localhost",
            Url::parse("http://localhost:8080").expect("origin"),
        )
        .expect("options");
        let creds = Arc::new(EphemeralCredentialStore::new());
        creds
            .insert(yubico_assertion_authenticator(counter))
            .await
            .expect("seed credential");
        let challenges = Arc::new(EphemeralChallengeStore::new());
        let wan = Webauthn::new(options, creds, challenges.clone()).expect("construct");
        (wan, challenges)
    }

    #[tokio::test]
    async fn authentication_accepts_advancing_counter() {
        let (wan, challenges) = localhost_wan_with_cred(1).await;
        issue(&challenges, "alice", &yubico_assertion_challenge()).await;

        let result = wan.authenticate_credential("alice", &yubico_assertion()).await;
        assert_eq!(result.expect("authenticated"), 20);
    }

    #[tokio::test]
    async fn authentication_rejects_stalled_counter() {
        // The assertion carries counter 20; a stored value at or above it
        // means this authenticator was cloned.
        let (wan, challenges) = localhost_wan_with_cred(20).await;
        issue(&challenges, "alice", &yubico_assertion_challenge()).await;

        let result = wan.authenticate_credential("alice", &yubico_assertion()).await;
        assert!(matches!(result, Err(WebauthnError::CounterRegression)));
    }

    #[tokio::test]
    async fn authentication_rejects_unknown_credential() {
        let options = WebauthnOptions::new(
            "localhost",
            "localhost",
            Url::parse("http://localhost:8080").expect("origin"),
        )
        .expect("options");
        let (wan, challenges) = build(options);
        issue(&challenges, "alice", &yubico_assertion_challenge()).await;

        let result = wan.authenticate_credential("alice", &yubico_assertion()).await;
        assert!(matches!(result, Err(WebauthnError::UnknownCredential)));
    }

    #[tokio::test]
    async fn authentication_rejects_another_users_credential() {
        let (wan, challenges) = localhost_wan_with_cred(1).await;
        // The stored credential belongs to alice; mallory runs a ceremony
        // presenting it with a matching challenge of their own.
        issue(&challenges, "mallory", &yubico_assertion_challenge()).await;

        let result = wan
            .authenticate_credential("mallory", &yubico_assertion())
            .await;
        assert!(matches!(result, Err(WebauthnError::UnknownCredential)));
    }

    #[tokio::test]
    async fn authentication_rejects_tampered_authenticator_data() {
        let (wan, challenges) = localhost_wan_with_cred(1).await;
        issue(&challenges, "alice", &yubico_assertion_challenge()).await;

        // Flipping a bit in the counter region leaves the rpIdHash and
        // flags intact, so the failure is the signature itself.
        let mut rsp = yubico_assertion();
        if let Some(byte) = rsp.response.authenticator_data.0.last_mut() {
            *byte ^= 0x01;
        }

        let result = wan.authenticate_credential("alice", &rsp).await;
        assert!(matches!(result, Err(WebauthnError::SignatureInvalid)));
    }

    #[tokio::test]
    async fn authentication_rejects_tampered_signature() {
        let (wan, challenges) = localhost_wan_with_cred(1).await;
        issue(&challenges, "alice", &yubico_assertion_challenge()).await;

        let mut rsp = yubico_assertion();
        if let Some(byte) = rsp.response.signature.0.last_mut() {
            *byte ^= 0x01;
        }

        let result = wan.authenticate_credential("alice", &rsp).await;
        // A corrupted DER signature fails either at decode or at verify.
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn challenge_generation_respects_length_floor() {
        assert!(matches!(
            yubico_options().challenge_length(16),
            Err(WebauthnError::Configuration(_))
        ));

        let options = yubico_options().challenge_length(64).expect("length");
        let (wan, _challenges) = build(options);
        let ccr = wan
            .generate_challenge_register("alice")
            .await
            .expect("challenge");
        assert_eq!(ccr.public_key.challenge.0.len(), 64);
        assert_eq!(ccr.public_key.rp.id, "127.0.0.1");
    }

    #[tokio::test]
    async fn mismatched_rp_id_and_origin_refused() {
        let result = Webauthn::new(
            WebauthnOptions::new(
                "example.com",
                "example",
                Url::parse("https://attacker.example.net").expect("origin"),
            )
            .expect("options"),
            Arc::new(EphemeralCredentialStore::new()),
            Arc::new(EphemeralChallengeStore::new()),
        );
        assert!(matches!(result, Err(WebauthnError::Configuration(_))));
    }
}
