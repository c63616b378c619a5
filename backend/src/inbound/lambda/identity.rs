//! Caller identity asserted by the upstream authoriser.
//!
//! Sources are tried in [`IdentitySource::SEARCH_ORDER`]; the first one
//! yielding a usable subject wins.

use serde_json::Value;
use tracing::debug;

use crate::domain::OwnerId;

/// Marker preceding the subject in a legacy identity-provider string.
const PROVIDER_MARKER: &str = ":CognitoSignIn:";

/// Places an authenticated subject may be found under `requestContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// `authorizer.claims.sub` (user-pool authoriser).
    Claims,
    /// `authorizer.jwt.claims.sub` (JWT authoriser on the HTTP API).
    JwtClaims,
    /// `authorizer.principalId` (custom authoriser).
    PrincipalId,
    /// `authorizer.sub`.
    Subject,
    /// `identity.cognitoAuthenticationProvider`, subject after the marker.
    IdentityProvider,
}

impl IdentitySource {
    pub const SEARCH_ORDER: [Self; 5] = [
        Self::Claims,
        Self::JwtClaims,
        Self::PrincipalId,
        Self::Subject,
        Self::IdentityProvider,
    ];

    fn subject(self, context: &Value) -> Option<&str> {
        let authorizer = context.get("authorizer");
        let text = match self {
            Self::Claims => authorizer?.get("claims")?.get("sub")?.as_str()?,
            Self::JwtClaims => authorizer?.get("jwt")?.get("claims")?.get("sub")?.as_str()?,
            Self::PrincipalId => authorizer?.get("principalId")?.as_str()?,
            Self::Subject => authorizer?.get("sub")?.as_str()?,
            Self::IdentityProvider => {
                let provider = context
                    .get("identity")?
                    .get("cognitoAuthenticationProvider")?
                    .as_str()?;
                provider.rsplit_once(PROVIDER_MARKER)?.1
            }
        };
        Some(text.trim()).filter(|subject| !subject.is_empty())
    }
}

/// Authenticated caller of `event`, if any source names one.
pub fn caller_identity(event: &Value) -> Option<OwnerId> {
    let context = event.get("requestContext")?;
    IdentitySource::SEARCH_ORDER.into_iter().find_map(|source| {
        let subject = source.subject(context)?;
        let owner = OwnerId::new(subject).ok()?;
        debug!(source = ?source, "caller identity found");
        Some(owner)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::claims(json!({"authorizer": {"claims": {"sub": "u-claims"}}}), "u-claims")]
    #[case::jwt(json!({"authorizer": {"jwt": {"claims": {"sub": "u-jwt"}}}}), "u-jwt")]
    #[case::principal(json!({"authorizer": {"principalId": "u-principal"}}), "u-principal")]
    #[case::subject(json!({"authorizer": {"sub": "u-sub"}}), "u-sub")]
    #[case::provider(
        json!({"identity": {"cognitoAuthenticationProvider":
            "cognito-idp.eu-west-1.amazonaws.com/pool,cognito-idp.eu-west-1.amazonaws.com/pool:CognitoSignIn:u-legacy"}}),
        "u-legacy"
    )]
    fn finds_subject_in_each_source(#[case] context: Value, #[case] expected: &str) {
        let event = json!({"requestContext": context});
        assert_eq!(
            caller_identity(&event).as_ref().map(OwnerId::as_str),
            Some(expected)
        );
    }

    #[rstest]
    fn claims_take_priority_over_principal() {
        let event = json!({"requestContext": {"authorizer": {
            "claims": {"sub": "first"},
            "principalId": "second",
        }}});
        assert_eq!(
            caller_identity(&event).as_ref().map(OwnerId::as_str),
            Some("first")
        );
    }

    #[rstest]
    fn empty_sources_fall_through() {
        let event = json!({"requestContext": {
            "authorizer": {"claims": {"sub": ""}, "principalId": " "},
            "identity": {"cognitoAuthenticationProvider": "pool:CognitoSignIn:u-legacy"},
        }});
        assert_eq!(
            caller_identity(&event).as_ref().map(OwnerId::as_str),
            Some("u-legacy")
        );
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"requestContext": {}}))]
    #[case(json!({"requestContext": {"authorizer": {"claims": {}}}}))]
    #[case(json!({"requestContext": {"identity": {"cognitoAuthenticationProvider": "pool:u1"}}}))]
    fn no_identity_without_subject(#[case] event: Value) {
        assert_eq!(caller_identity(&event), None);
    }
}
