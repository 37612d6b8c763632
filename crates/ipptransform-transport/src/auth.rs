// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Authorization-scheme negotiation for a `401 Unauthorized` Send-Document
// response. Schemes are tried in the order the destination offers them in
// `WWW-Authenticate`, each scheme gets up to three attempts before it is
// abandoned in favor of the next, and exhausting every offered scheme is
// reported as `AuthorizationCanceled` rather than a bare protocol error —
// the caller (CLI or embedding print server) is expected to surface that to
// whoever holds the credentials.

use crate::error::{Result, SinkError};

const ATTEMPTS_PER_SCHEME: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    Bearer,
    Basic,
    Digest,
    Negotiate,
    /// SO_PEERCRED-based local credential, offered only over a Unix domain
    /// socket transport whose peer uid matches the caller's.
    PeerCred,
}

impl AuthScheme {
    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "bearer" => Some(Self::Bearer),
            "basic" => Some(Self::Basic),
            "digest" => Some(Self::Digest),
            "negotiate" => Some(Self::Negotiate),
            _ => None,
        }
    }
}

/// Parses a (possibly multi-valued) `WWW-Authenticate` header into the
/// schemes it offers, in the order listed. Unrecognized scheme tokens are
/// skipped rather than rejected outright, since a printer may offer a
/// scheme this client does not implement alongside ones it does.
pub fn offered_schemes(www_authenticate: &str, local_peer_cred_eligible: bool) -> Vec<AuthScheme> {
    let mut schemes: Vec<AuthScheme> = www_authenticate
        .split(',')
        .filter_map(|entry| entry.trim().split_whitespace().next())
        .filter_map(AuthScheme::from_token)
        .collect();
    if local_peer_cred_eligible {
        schemes.push(AuthScheme::PeerCred);
    }
    schemes.dedup();
    schemes
}

/// A resolved credential for one scheme attempt. `Bearer`/`Digest`/
/// `Negotiate` carry an opaque token the transport layer hands to the HTTP
/// `Authorization` header verbatim; `Basic` carries user:pass already
/// base64-less (the caller encodes it); `PeerCred` carries nothing — the
/// kernel asserts the identity.
#[derive(Debug, Clone)]
pub enum Credential {
    Bearer(String),
    Basic { username: String, password: String },
    Digest(String),
    Negotiate(String),
    PeerCred,
}

/// Supplies credentials on demand. The CLI's implementation prompts on a
/// controlling terminal or reads `IPP_DOCUMENT_PASSWORD[n]`; a test double
/// can return canned credentials or `None` to simulate a canceled prompt.
pub trait CredentialSource {
    fn credential_for(&mut self, scheme: AuthScheme, realm: Option<&str>) -> Option<Credential>;
}

/// Walks the offered schemes in order, asking `source` for a credential and
/// invoking `attempt` with it up to `ATTEMPTS_PER_SCHEME` times per scheme.
/// `attempt` returns `Ok(true)` on a successful resend, `Ok(false)` if the
/// destination rejected that credential (try again / move to next scheme),
/// or `Err` for anything else (propagated immediately).
pub fn negotiate<F>(
    schemes: &[AuthScheme],
    source: &mut dyn CredentialSource,
    realm: Option<&str>,
    mut attempt: F,
) -> Result<()>
where
    F: FnMut(&Credential) -> Result<bool>,
{
    for scheme in schemes {
        for _ in 0..ATTEMPTS_PER_SCHEME {
            let Some(credential) = source.credential_for(*scheme, realm) else {
                return Err(SinkError::AuthorizationCanceled(
                    "credential prompt canceled".to_string(),
                ));
            };
            if attempt(&credential)? {
                return Ok(());
            }
        }
    }
    Err(SinkError::AuthorizationCanceled(
        "exhausted all offered authorization schemes".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Option<Credential>);
    impl CredentialSource for FixedSource {
        fn credential_for(&mut self, _scheme: AuthScheme, _realm: Option<&str>) -> Option<Credential> {
            self.0.clone()
        }
    }
    impl Clone for Credential {
        fn clone(&self) -> Self {
            match self {
                Credential::Bearer(s) => Credential::Bearer(s.clone()),
                Credential::Basic { username, password } => Credential::Basic {
                    username: username.clone(),
                    password: password.clone(),
                },
                Credential::Digest(s) => Credential::Digest(s.clone()),
                Credential::Negotiate(s) => Credential::Negotiate(s.clone()),
                Credential::PeerCred => Credential::PeerCred,
            }
        }
    }

    #[test]
    fn parses_comma_separated_schemes_in_order() {
        let schemes = offered_schemes("Negotiate, Basic realm=\"printers\"", false);
        assert_eq!(schemes, vec![AuthScheme::Negotiate, AuthScheme::Basic]);
    }

    #[test]
    fn peer_cred_only_offered_when_locally_eligible() {
        assert!(!offered_schemes("Basic", false).contains(&AuthScheme::PeerCred));
        assert!(offered_schemes("Basic", true).contains(&AuthScheme::PeerCred));
    }

    #[test]
    fn exhausting_every_scheme_cancels_authorization() {
        let schemes = vec![AuthScheme::Basic];
        let mut source = FixedSource(Some(Credential::Basic {
            username: "u".into(),
            password: "p".into(),
        }));
        let result = negotiate(&schemes, &mut source, None, |_| Ok(false));
        assert!(matches!(result, Err(SinkError::AuthorizationCanceled(_))));
    }

    #[test]
    fn canceled_prompt_surfaces_immediately() {
        let schemes = vec![AuthScheme::Basic, AuthScheme::Digest];
        let mut source = FixedSource(None);
        let result = negotiate(&schemes, &mut source, None, |_| Ok(true));
        assert!(matches!(result, Err(SinkError::AuthorizationCanceled(_))));
    }

    #[test]
    fn succeeds_on_first_accepted_credential() {
        let schemes = vec![AuthScheme::Basic];
        let mut source = FixedSource(Some(Credential::Basic {
            username: "u".into(),
            password: "p".into(),
        }));
        let result = negotiate(&schemes, &mut source, None, |_| Ok(true));
        assert!(result.is_ok());
    }
}
