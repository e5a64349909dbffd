//! JSON wire types for the two Webauthn ceremonies.
//!
//! These map 1:1 to the structures the browser produces from
//! `navigator.credentials.create()` and `navigator.credentials.get()`,
//! and to the option documents we send it. Fields are camelCase on the
//! wire and byte fields travel as base64url.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use base64urlsafedata::Base64UrlSafeData;
use serde::{Deserialize, Serialize};
use url::Url;

/// A challenge issued to a client. Consumed exactly once - after a
/// ceremony attempt, pass or fail, it can never be replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge(pub Base64UrlSafeData);

impl Challenge {
    /// Wrap freshly generated random bytes as a challenge.
    pub fn new(bytes: Vec<u8>) -> Self {
        Challenge(Base64UrlSafeData(bytes))
    }
}

impl Deref for Challenge {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0 .0
    }
}

impl AsRef<[u8]> for Challenge {
    fn as_ref(&self) -> &[u8] {
        &self.0 .0
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", base64::encode_config(&self.0, base64::URL_SAFE_NO_PAD))
    }
}

/// A credential identifier as issued by an authenticator.
pub type CredentialID = Vec<u8>;

/// The relying party as presented to authenticators. `id` must be a
/// registrable domain suffix of the origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelyingParty {
    /// The relying party id - the effective domain, no scheme or port.
    pub id: String,
    /// The human-readable relying party name.
    pub name: String,
    /// An optional icon url.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Url>,
}

/// The user account a registration is for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// An opaque, stable user handle.
    pub id: Base64UrlSafeData,
    /// The account name.
    pub name: String,
    /// The name displayed during ceremonies.
    pub display_name: String,
}

/// An acceptable credential algorithm, as (type, COSE alg id).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubKeyCredParams {
    /// Always "public-key".
    #[serde(rename = "type")]
    pub type_: String,
    /// The COSE algorithm identifier.
    pub alg: i64,
}

/// A descriptor of an already-registered credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialDescriptor {
    /// Always "public-key".
    #[serde(rename = "type")]
    pub type_: String,
    /// The credential id.
    pub id: Base64UrlSafeData,
    /// Transport hints for this credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<AuthenticatorTransport>>,
}

/// How an authenticator may communicate with the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorTransport {
    /// Roaming USB token.
    Usb,
    /// NFC tap.
    Nfc,
    /// Bluetooth low energy.
    Ble,
    /// Platform authenticator built into the device.
    Internal,
    /// Cross-device (caBLE/hybrid) flow.
    Hybrid,
}

/// The relying party's preference for receiving attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    /// No attestation wanted.
    #[default]
    None,
    /// Attestation may be anonymised by the client.
    Indirect,
    /// Full attestation from the authenticator.
    Direct,
}

/// The user verification policy for a ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationPolicy {
    /// Verification must occur; its absence fails the ceremony.
    Required,
    /// Verification is requested but its absence is accepted.
    Preferred,
    /// Verification should not be performed.
    #[default]
    Discouraged,
}

/// Resident (discoverable) key policy for a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyPolicy {
    /// The credential must be discoverable.
    Required,
    /// Discoverable if the authenticator supports it.
    Preferred,
    /// Server-side credential preferred.
    #[default]
    Discouraged,
}

/// Authenticator selection criteria for a registration ceremony.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelectionCriteria {
    /// Required attachment, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_attachment: Option<AuthenticatorAttachment>,
    /// Resident key requirement.
    pub resident_key: ResidentKeyPolicy,
    /// Whether a resident key is required. Retained for level 1 clients.
    pub require_resident_key: bool,
    /// User verification requirement.
    pub user_verification: UserVerificationPolicy,
}

/// Hint for the attachment class of authenticator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthenticatorAttachment {
    /// Built into the client device.
    Platform,
    /// Roaming key.
    CrossPlatform,
}

/// The options document for `navigator.credentials.create()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    /// The relying party.
    pub rp: RelyingParty,
    /// The registering user.
    pub user: User,
    /// The challenge to sign.
    pub challenge: Base64UrlSafeData,
    /// Acceptable algorithms, in descending preference order.
    pub pub_key_cred_params: Vec<PubKeyCredParams>,
    /// Timeout hint in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// Attestation conveyance preference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation: Option<AttestationConveyancePreference>,
    /// Credentials to refuse re-registration of.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_credentials: Option<Vec<PublicKeyCredentialDescriptor>>,
    /// Authenticator selection criteria.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
}

/// The outer registration challenge sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationChallengeResponse {
    /// The creation options.
    pub public_key: PublicKeyCredentialCreationOptions,
}

/// The options document for `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    /// The challenge to sign.
    pub challenge: Base64UrlSafeData,
    /// Timeout hint in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    /// The relying party id.
    pub rp_id: String,
    /// Credentials the user may assert with.
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,
    /// User verification requirement.
    pub user_verification: UserVerificationPolicy,
}

/// The outer authentication challenge sent to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChallengeResponse {
    /// The request options.
    pub public_key: PublicKeyCredentialRequestOptions,
}

/// The client data JSON, as claimed by the client. The raw bytes are
/// hashed separately - this decoded form is only used for the
/// type/challenge/origin checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedClientData {
    /// "webauthn.create" or "webauthn.get".
    #[serde(rename = "type")]
    pub type_: String,
    /// The returned challenge.
    pub challenge: Base64UrlSafeData,
    /// The origin the client observed.
    pub origin: Url,
    /// Whether the request came from a cross-origin iframe.
    #[serde(rename = "crossOrigin", skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<bool>,
    /// Any keys we do not understand but must tolerate.
    #[serde(flatten)]
    pub unknown_keys: BTreeMap<String, serde_json::Value>,
}

/// The raw attestation response from `navigator.credentials.create()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAttestationResponseRaw {
    /// The CBOR attestation object.
    pub attestation_object: Base64UrlSafeData,
    /// The raw client data JSON bytes.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Base64UrlSafeData,
}

/// A completed registration ceremony response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPublicKeyCredential {
    /// The credential id, base64url.
    pub id: String,
    /// The credential id, raw.
    pub raw_id: Base64UrlSafeData,
    /// The attestation response.
    pub response: AuthenticatorAttestationResponseRaw,
    /// Always "public-key".
    #[serde(rename = "type")]
    pub type_: String,
}

/// The raw assertion response from `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAssertionResponseRaw {
    /// The raw authenticator data bytes.
    pub authenticator_data: Base64UrlSafeData,
    /// The raw client data JSON bytes.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Base64UrlSafeData,
    /// The assertion signature.
    pub signature: Base64UrlSafeData,
    /// The user handle, for discoverable credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<Base64UrlSafeData>,
}

/// A completed authentication ceremony response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredential {
    /// The credential id, base64url.
    pub id: String,
    /// The credential id, raw.
    pub raw_id: Base64UrlSafeData,
    /// The assertion response.
    pub response: AuthenticatorAssertionResponseRaw,
    /// Always "public-key".
    #[serde(rename = "type")]
    pub type_: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_data_tolerates_unknown_keys() {
        let raw = r#"{
            "type":"webauthn.create",
            "challenge":"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "origin":"https://idm.example.com",
            "clientExtensions":{},
            "hashAlgorithm":"SHA-256"
        }"#;
        let cd: CollectedClientData = serde_json::from_str(raw).expect("client data");
        assert_eq!(cd.type_, "webauthn.create");
        assert_eq!(cd.origin.as_str(), "https://idm.example.com/");
        assert_eq!(cd.unknown_keys.len(), 2);
    }

    #[test]
    fn challenge_round_trips_base64url() {
        let chal = Challenge::new(vec![0xab; 32]);
        let ser = serde_json::to_string(&chal).expect("serialise");
        let de: Challenge = serde_json::from_str(&ser).expect("deserialise");
        assert_eq!(chal, de);
    }
}
