//! Error types for ceremony verification.
//!
//! Every failure in this crate is surfaced as a typed [`WebauthnError`];
//! nothing is retried internally and no state is persisted on a failure
//! path.

use thiserror::Error;

/// Possible errors that may occur during Webauthn ceremony verification.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WebauthnError {
    /// A binary structure failed to decode. The payload names the
    /// offending field. Decode failures are always fatal for the ceremony.
    #[error("malformed structure: {0}")]
    MalformedStructure(&'static str),

    /// The client data JSON failed to parse.
    #[error("json decoding failed: {0}")]
    ParseJSONFailure(#[from] serde_json::Error),

    /// The attestation object or a COSE key failed CBOR decoding.
    #[error("cbor decoding failed: {0}")]
    ParseCBORFailure(#[from] serde_cbor_2::Error),

    /// A base64 field failed to decode.
    #[error("base64 decoding failed: {0}")]
    ParseBase64Failure(#[from] base64::DecodeError),

    /// The client data type was not the one expected for this ceremony.
    #[error("client data type mismatch")]
    TypeMismatch,

    /// The returned challenge did not byte-match the issued challenge.
    #[error("challenge mismatch")]
    ChallengeMismatch,

    /// The challenge was already consumed, expired, or never issued.
    /// Ceremonies never reuse a challenge; the caller must issue a new one.
    #[error("challenge not found or already consumed")]
    ChallengeConsumed,

    /// The client data origin did not match the relying party origin.
    #[error("origin mismatch")]
    OriginMismatch,

    /// The rpIdHash in the authenticator data did not match the
    /// SHA-256 of the configured relying party id.
    #[error("rpIdHash mismatch")]
    RpIdHashMismatch,

    /// The user present bit was not set in the authenticator data.
    #[error("user not present")]
    UserNotPresent,

    /// User verification was required but the user verified bit was unset.
    #[error("user not verified")]
    UserNotVerified,

    /// The authenticator data carried no attested credential data.
    #[error("missing attested credential data")]
    MissingAttestedCredentialData,

    /// The credential or attestation certificate used an algorithm this
    /// relying party does not accept.
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,

    /// The attestation object named a format outside the registered set.
    /// This is fatal and is never downgraded to `none`.
    #[error("unsupported attestation format: {0}")]
    UnsupportedAttestationFormat(String),

    /// A signature failed to verify.
    #[error("signature invalid")]
    SignatureInvalid,

    /// An attestation statement field was missing or malformed.
    #[error("attestation statement invalid: {0}")]
    AttestationStatementInvalid(&'static str),

    /// The attestation certificate's subject did not satisfy the
    /// requirements of the attestation format.
    #[error("attestation certificate requirements not met: {0}")]
    AttestationCertificateRequirementsNotMet(&'static str),

    /// The id-fido-gen-ce-aaguid certificate extension disagreed with the
    /// AAGUID in the attested credential data.
    #[error("attestation certificate aaguid mismatch")]
    AttestationCertificateAaguidMismatch,

    /// A nonce or challenge embedded in a certificate extension did not
    /// match the expected hash.
    #[error("attestation certificate nonce mismatch")]
    AttestationCertificateNonceMismatch,

    /// A certificate extension required by the format was absent.
    #[error("attestation certificate missing required extension")]
    AttestationCertificateMissingExtension,

    /// A certificate trust path could not be built to any configured
    /// trust anchor, or a certificate in the chain was outside its
    /// validity window.
    #[error("certificate chain invalid: {0}")]
    CertificateChainInvalid(&'static str),

    /// A metadata statement exists for this AAGUID and contradicts the
    /// credential's claimed algorithm or attestation type.
    #[error("metadata violation: {0}")]
    MetadataViolation(&'static str),

    /// The assertion counter did not increase. This is a clone-detection
    /// signal and should be treated as an incident by callers.
    #[error("credential counter regression")]
    CounterRegression,

    /// No stored credential matched the asserted credential id.
    #[error("unknown credential")]
    UnknownCredential,

    /// More than one stored credential matched the asserted credential id.
    #[error("ambiguous credential")]
    AmbiguousCredential,

    /// The credential id is already registered.
    #[error("credential already exists")]
    CredentialAlreadyExists,

    /// A verification path this crate deliberately does not implement.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// The external store reported a failure.
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// An invalid configuration value was supplied.
    #[error("invalid configuration: {0}")]
    Configuration(&'static str),

    /// An error from the underlying cryptographic library.
    #[error("openssl failure")]
    OpenSSLError(#[from] openssl::error::ErrorStack),
}
