use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;

use crate::claims::ClaimValue;
use crate::error::Error;
use crate::error::Result;

const TENANTS_CLAIM: &str = "tenants";
const CURRENT_TENANT_CLAIM: &str = "dct";
const PERMISSIONS_CLAIM: &str = "permissions";
const ROLES_CLAIM: &str = "roles";

/// One verified session or refresh token.
///
/// A `Token` is an immutable view over the claims of a JWT that passed
/// verification: the flat claim map, a derived per-tenant claim map, and the
/// permission/role queries resolved against either. It holds no network or
/// cache state.
#[derive(Debug, Clone)]
pub struct Token {
    jwt: String,
    project_id: String,
    subject: String,
    expiration: DateTime<Utc>,
    refresh_expiration: Option<DateTime<Utc>>,
    claims: BTreeMap<String, ClaimValue>,
    tenant_claims: BTreeMap<String, BTreeMap<String, ClaimValue>>,
}

impl Token {
    /// Build a token directly from already-verified parts.
    ///
    /// The per-tenant claim map is derived from the `tenants` entry of
    /// `claims`, which is accepted either as a nested map or as a
    /// JSON-encoded string.
    pub fn new(
        jwt: impl Into<String>,
        project_id: impl Into<String>,
        subject: impl Into<String>,
        expiration: DateTime<Utc>,
        claims: BTreeMap<String, ClaimValue>,
    ) -> Self {
        let tenant_claims = tenant_claims(&claims);

        Self {
            jwt: jwt.into(),
            project_id: project_id.into(),
            subject: subject.into(),
            expiration,
            refresh_expiration: None,
            claims,
            tenant_claims,
        }
    }

    /// Build a token from a payload whose signature and expiration were
    /// already verified.
    pub(crate) fn from_payload(jwt: &str, payload: Value) -> Result<Self> {
        let claims: BTreeMap<String, ClaimValue> = match payload {
            Value::Object(entries) => entries
                .into_iter()
                .map(|(name, value)| (name, ClaimValue::from(value)))
                .collect(),
            _ => {
                return Err(Error::MalformedToken(
                    "payload is not a JSON object".to_string(),
                ))
            }
        };

        let issuer = claims
            .get("iss")
            .and_then(ClaimValue::as_str)
            .unwrap_or_default();
        let project_id = issuer.rsplit('/').next().unwrap_or(issuer).to_string();
        if project_id.is_empty() {
            return Err(Error::MalformedToken(
                "missing or empty 'iss' claim".to_string(),
            ));
        }

        let subject = claims
            .get("sub")
            .and_then(ClaimValue::as_str)
            .unwrap_or_default()
            .to_string();
        if subject.is_empty() {
            return Err(Error::MalformedToken(
                "missing or empty 'sub' claim".to_string(),
            ));
        }

        let expiration = claims
            .get("exp")
            .and_then(ClaimValue::as_i64)
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
            .ok_or(Error::MissingExpiration)?;

        Ok(Self {
            tenant_claims: tenant_claims(&claims),
            jwt: jwt.to_string(),
            project_id,
            subject,
            expiration,
            refresh_expiration: None,
            claims,
        })
    }

    pub(crate) fn with_refresh_expiration(
        mut self,
        refresh_expiration: Option<DateTime<Utc>>,
    ) -> Self {
        self.refresh_expiration = refresh_expiration;
        self
    }

    /// The raw compact JWT this token was verified from
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    /// The identity project that issued the token
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The user the token was issued to
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    /// Expiration of the refresh token this token was obtained with, if any
    pub fn refresh_expiration(&self) -> Option<DateTime<Utc>> {
        self.refresh_expiration
    }

    /// The flat claim map of the verified payload
    pub fn claims(&self) -> &BTreeMap<String, ClaimValue> {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name)
    }

    /// Tenant ids carried by the token's `tenants` claim.
    ///
    /// Empty when the claim is absent or unparsable, never an error.
    pub fn tenants(&self) -> Vec<&str> {
        self.tenant_claims.keys().map(String::as_str).collect()
    }

    /// Look up `key` inside the named tenant's claims
    pub fn tenant_value(&self, tenant: &str, key: &str) -> Option<&ClaimValue> {
        self.tenant_claims.get(tenant)?.get(key)
    }

    /// The currently selected tenant, from the `dct` claim
    pub fn current_tenant(&self) -> Option<&str> {
        self.claim(CURRENT_TENANT_CLAIM)?.as_str()
    }

    /// Whether the token grants every one of `permissions`, resolved against
    /// the named tenant or, without one, the top-level `permissions` claim
    pub fn validate_permissions(&self, permissions: &[&str], tenant: Option<&str>) -> bool {
        self.validate_claim_items(PERMISSIONS_CLAIM, permissions, tenant)
    }

    /// The subset of `permissions` the token grants, in the caller's order
    pub fn matched_permissions(&self, permissions: &[&str], tenant: Option<&str>) -> Vec<String> {
        self.matched_claim_items(PERMISSIONS_CLAIM, permissions, tenant)
    }

    /// Whether the token carries every one of `roles`, resolved against the
    /// named tenant or, without one, the top-level `roles` claim
    pub fn validate_roles(&self, roles: &[&str], tenant: Option<&str>) -> bool {
        self.validate_claim_items(ROLES_CLAIM, roles, tenant)
    }

    /// The subset of `roles` the token carries, in the caller's order
    pub fn matched_roles(&self, roles: &[&str], tenant: Option<&str>) -> Vec<String> {
        self.matched_claim_items(ROLES_CLAIM, roles, tenant)
    }

    /// Claim items granted under `claim`, resolved per the tenant scoping
    /// rules: an unknown tenant grants nothing, a known tenant grants its own
    /// entry, no tenant grants the top-level entry.
    fn claim_items(&self, claim: &str, tenant: Option<&str>) -> Vec<String> {
        let entries = match tenant {
            Some(tenant) => match self.tenant_claims.get(tenant) {
                Some(entries) => entries,
                None => return Vec::new(),
            },
            None => &self.claims,
        };

        entries
            .get(claim)
            .map(ClaimValue::string_items)
            .unwrap_or_default()
    }

    fn validate_claim_items(&self, claim: &str, wanted: &[&str], tenant: Option<&str>) -> bool {
        // a token cannot authorize against a tenant it does not carry
        if let Some(tenant) = tenant {
            if !self.tenant_claims.contains_key(tenant) {
                return false;
            }
        }

        let granted = self.claim_items(claim, tenant);
        wanted.iter().all(|item| granted.iter().any(|g| g == item))
    }

    fn matched_claim_items(&self, claim: &str, wanted: &[&str], tenant: Option<&str>) -> Vec<String> {
        let granted = self.claim_items(claim, tenant);

        wanted
            .iter()
            .filter(|item| granted.iter().any(|g| g == *item))
            .map(|item| (*item).to_string())
            .collect()
    }
}

/// Derive the per-tenant claim map from the flat claims.
///
/// The keys are exactly the tenant ids present in the `tenants` claim; an
/// absent or unparsable claim yields an empty map.
fn tenant_claims(
    claims: &BTreeMap<String, ClaimValue>,
) -> BTreeMap<String, BTreeMap<String, ClaimValue>> {
    claims
        .get(TENANTS_CLAIM)
        .and_then(as_claim_map)
        .map(|tenants| {
            tenants
                .iter()
                .map(|(tenant, value)| {
                    (tenant.clone(), as_claim_map(value).unwrap_or_default())
                })
                .collect()
        })
        .unwrap_or_default()
}

/// A claim value as a nested map, tolerating a JSON-encoded string in place
/// of a native object
fn as_claim_map(value: &ClaimValue) -> Option<BTreeMap<String, ClaimValue>> {
    match value {
        ClaimValue::Map(entries) => Some(entries.clone()),
        ClaimValue::Str(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(entries)) => Some(
                entries
                    .into_iter()
                    .map(|(name, value)| (name, ClaimValue::from(value)))
                    .collect(),
            ),
            _ => None,
        },
        _ => None,
    }
}
