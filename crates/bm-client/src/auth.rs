//! Identity provider client: sign up, log in, and token refresh.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bm_core::{Session, UserId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout for identity calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default identity toolkit base URL.
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default secure token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Shortest password accepted before contacting the provider.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Longest token lifetime accepted from the provider: one year.
const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

/// Authentication errors. `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The API key was missing or blank.
    #[error("invalid API key: {reason}")]
    InvalidApiKey { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// Password shorter than [`MIN_PASSWORD_LEN`].
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    /// Sign-up password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
    /// The provider rejected the request.
    #[error("{message}")]
    Provider { code: String, message: String },
    /// No response from the provider.
    #[error("Network error. Please try again.")]
    Network(#[source] reqwest::Error),
    /// The provider answered with something unexpected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Builds a provider error from the raw `error.message` value.
    pub fn from_provider(raw: &str) -> Self {
        let code = provider_code(raw);
        Self::Provider {
            code: code.to_string(),
            message: provider_message(raw),
        }
    }
}

/// The error code part of a provider message.
///
/// Messages may carry detail after the code (`WEAK_PASSWORD : Password should
/// be at least 6 characters`).
fn provider_code(raw: &str) -> &str {
    raw.split(" : ").next().unwrap_or(raw).trim()
}

/// Maps a provider error message to the text shown to the user. Unknown codes
/// pass through unchanged.
pub fn provider_message(raw: &str) -> String {
    let known = match provider_code(raw) {
        "EMAIL_EXISTS" => "An account with this email already exists",
        "EMAIL_NOT_FOUND" => "No account found with this email",
        "INVALID_PASSWORD" => "Incorrect password",
        "INVALID_EMAIL" => "Please enter a valid email address",
        "WEAK_PASSWORD" => "Password must be at least 6 characters",
        "INVALID_LOGIN_CREDENTIALS" => "Invalid email or password",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts. Please try again later",
        _ => return raw.to_string(),
    };
    known.to_string()
}

/// Client-side checks run before sign-up.
pub fn validate_sign_up(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password != confirmation {
        return Err(AuthError::PasswordMismatch);
    }
    validate_password(password)
}

/// Client-side check run before log-in and sign-up.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// Tokens returned by sign-up and log-in.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub id_token: String,
    pub refresh_token: String,
    pub local_id: UserId,
    pub email: String,
    pub expires_in_secs: i64,
}

impl fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGrant")
            .field("local_id", &self.local_id)
            .field("email", &self.email)
            .field("expires_in_secs", &self.expires_in_secs)
            .finish_non_exhaustive()
    }
}

impl AuthGrant {
    /// Session issued at `issued_at`.
    pub fn into_session(self, issued_at: DateTime<Utc>) -> Session {
        Session::issued(
            self.id_token,
            self.refresh_token,
            self.local_id,
            self.email,
            issued_at,
            self.expires_in_secs,
        )
    }
}

/// Tokens returned by a refresh. The provider does not echo the e-mail.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: UserId,
    pub expires_in_secs: i64,
}

impl fmt::Debug for RefreshedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshedToken")
            .field("user_id", &self.user_id)
            .field("expires_in_secs", &self.expires_in_secs)
            .finish_non_exhaustive()
    }
}

impl RefreshedToken {
    /// Session issued at `issued_at`, keeping the caller's e-mail.
    pub fn into_session(self, email: String, issued_at: DateTime<Utc>) -> Session {
        Session::issued(
            self.id_token,
            self.refresh_token,
            self.user_id,
            email,
            issued_at,
            self.expires_in_secs,
        )
    }
}

/// Exchanges a refresh token for fresh credentials.
pub trait TokenRefresher {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<RefreshedToken, AuthError>> + Send;
}

/// Identity provider endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    /// Base for `accounts:signUp` and `accounts:signInWithPassword`.
    pub identity_url: String,
    /// Full URL of the token refresh endpoint.
    pub token_url: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
        }
    }
}

impl AuthEndpoints {
    fn sign_up_url(&self) -> String {
        format!("{}/accounts:signUp", self.identity_url.trim_end_matches('/'))
    }

    fn log_in_url(&self) -> String {
        format!(
            "{}/accounts:signInWithPassword",
            self.identity_url.trim_end_matches('/')
        )
    }
}

/// Identity provider client.
///
/// Cloning shares the underlying HTTP connection pool.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    api_key: String,
    endpoints: AuthEndpoints,
}

impl fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthClient")
            .field("api_key", &"[REDACTED]")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Creates a client for `endpoints` authenticated by `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>, endpoints: AuthEndpoints) -> Result<Self, AuthError> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(AuthError::InvalidApiKey {
                reason: "API key cannot be empty",
            });
        }
        if api_key.trim().is_empty() {
            return Err(AuthError::InvalidApiKey {
                reason: "API key cannot be whitespace-only",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(AuthError::ClientBuild)?;

        Ok(Self {
            http,
            api_key,
            endpoints,
        })
    }

    /// Creates an account. Fails fast on a short or mismatched password.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<AuthGrant, AuthError> {
        validate_sign_up(password, confirmation)?;
        let url = self.endpoints.sign_up_url();
        self.password_grant(&url, email, password).await
    }

    /// Logs in. Fails fast on a short password.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<AuthGrant, AuthError> {
        validate_password(password)?;
        let url = self.endpoints.log_in_url();
        self.password_grant(&url, email, password).await
    }

    async fn password_grant(
        &self,
        url: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, AuthError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        tracing::debug!(url, "sending password grant");
        let body = self.post(url, &request).await?;
        let reply: PasswordReply = parse_reply(&body)?;
        reply.try_into()
    }

    async fn post<B: Serialize + Sync>(&self, url: &str, body: &B) -> Result<String, AuthError> {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(AuthError::Network)?;

        let status = response.status();
        let text = response.text().await.map_err(AuthError::Network)?;
        tracing::debug!(%status, "identity provider responded");
        Ok(text)
    }
}

impl TokenRefresher for AuthClient {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, AuthError> {
        let request = RefreshRequest {
            grant_type: "refresh_token",
            refresh_token,
        };
        let url = self.endpoints.token_url.clone();
        let body = self.post(&url, &request).await?;
        let reply: RefreshReply = parse_reply(&body)?;
        reply.try_into()
    }
}

// ========== Wire Format ==========

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordReply {
    id_token: String,
    refresh_token: String,
    local_id: String,
    #[serde(default)]
    email: String,
    expires_in: ExpiresIn,
}

impl TryFrom<PasswordReply> for AuthGrant {
    type Error = AuthError;

    fn try_from(reply: PasswordReply) -> Result<Self, Self::Error> {
        Ok(Self {
            expires_in_secs: reply.expires_in.seconds()?,
            local_id: UserId::new(reply.local_id)
                .map_err(|err| AuthError::InvalidResponse(err.to_string()))?,
            id_token: reply.id_token,
            refresh_token: reply.refresh_token,
            email: reply.email,
        })
    }
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshReply {
    id_token: String,
    refresh_token: String,
    user_id: String,
    expires_in: ExpiresIn,
}

impl TryFrom<RefreshReply> for RefreshedToken {
    type Error = AuthError;

    fn try_from(reply: RefreshReply) -> Result<Self, Self::Error> {
        Ok(Self {
            expires_in_secs: reply.expires_in.seconds()?,
            user_id: UserId::new(reply.user_id)
                .map_err(|err| AuthError::InvalidResponse(err.to_string()))?,
            id_token: reply.id_token,
            refresh_token: reply.refresh_token,
        })
    }
}

/// Token lifetime: a decimal string from the provider, a number from emulators.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(i64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Result<i64, AuthError> {
        let secs = match self {
            Self::Seconds(secs) => *secs,
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| AuthError::InvalidResponse(format!("invalid expiresIn: {text}")))?,
        };
        if (0..=MAX_TOKEN_LIFETIME_SECS).contains(&secs) {
            Ok(secs)
        } else {
            Err(AuthError::InvalidResponse(format!(
                "expiresIn out of range: {secs}"
            )))
        }
    }
}

/// Parses a provider reply, preferring its `{"error": {"message": ...}}` form.
fn parse_reply<T: DeserializeOwned>(body: &str) -> Result<T, AuthError> {
    if let Some(err) = parse_provider_error(body) {
        return Err(err);
    }
    serde_json::from_str(body).map_err(|err| AuthError::InvalidResponse(err.to_string()))
}

fn parse_provider_error(body: &str) -> Option<AuthError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| AuthError::from_provider(&payload.error.message))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    /// Nothing listens on the discard port; requests fail without a response.
    fn offline_client() -> AuthClient {
        AuthClient::new(
            "test-key",
            AuthEndpoints {
                identity_url: "http://127.0.0.1:9/v1".to_string(),
                token_url: "http://127.0.0.1:9/v1/token".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn client_rejects_empty_api_key() {
        assert!(matches!(
            AuthClient::new("", AuthEndpoints::default()),
            Err(AuthError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_rejects_whitespace_api_key() {
        assert!(matches!(
            AuthClient::new("   ", AuthEndpoints::default()),
            Err(AuthError::InvalidApiKey { .. })
        ));
    }

    #[test]
    fn client_debug_redacts_api_key() {
        let client = AuthClient::new("secret-key", AuthEndpoints::default()).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn endpoint_urls() {
        let endpoints = AuthEndpoints::default();
        assert_eq!(
            endpoints.sign_up_url(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signUp"
        );
        assert_eq!(
            endpoints.log_in_url(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword"
        );
    }

    #[test]
    fn known_codes_map_to_friendly_messages() {
        assert_eq!(
            provider_message("EMAIL_EXISTS"),
            "An account with this email already exists"
        );
        assert_eq!(
            provider_message("INVALID_LOGIN_CREDENTIALS"),
            "Invalid email or password"
        );
        assert_eq!(
            provider_message("TOO_MANY_ATTEMPTS_TRY_LATER"),
            "Too many attempts. Please try again later"
        );
    }

    #[test]
    fn detail_suffix_still_maps() {
        assert_eq!(
            provider_message("WEAK_PASSWORD : Password should be at least 6 characters"),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(provider_message("USER_DISABLED"), "USER_DISABLED");
    }

    #[test]
    fn mismatch_checked_before_length() {
        assert!(matches!(
            validate_sign_up("abc", "abd"),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            validate_sign_up("abc", "abc"),
            Err(AuthError::PasswordTooShort)
        ));
        assert!(validate_sign_up("abcdef", "abcdef").is_ok());
    }

    #[test]
    fn validation_messages() {
        assert_eq!(
            AuthError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
        assert_eq!(
            AuthError::PasswordMismatch.to_string(),
            "Passwords do not match"
        );
    }

    #[test]
    fn parse_password_reply() {
        let body = r#"{
            "kind": "identitytoolkit#SignupNewUserResponse",
            "idToken": "id-1",
            "email": "parent@example.com",
            "refreshToken": "refresh-1",
            "expiresIn": "3600",
            "localId": "uid-1"
        }"#;
        let reply: PasswordReply = parse_reply(body).unwrap();
        let grant = AuthGrant::try_from(reply).unwrap();
        assert_eq!(grant.expires_in_secs, 3600);
        assert_eq!(grant.local_id.as_str(), "uid-1");

        let issued_at = Utc.with_ymd_and_hms(2025, 1, 29, 8, 0, 0).unwrap();
        let session = grant.into_session(issued_at);
        assert_eq!(session.email, "parent@example.com");
        assert_eq!(
            session.expires_at,
            Utc.with_ymd_and_hms(2025, 1, 29, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn parse_refresh_reply() {
        let body = r#"{
            "expires_in": "3600",
            "token_type": "Bearer",
            "refresh_token": "refresh-2",
            "id_token": "id-2",
            "user_id": "uid-1",
            "project_id": "123"
        }"#;
        let reply: RefreshReply = parse_reply(body).unwrap();
        let token = RefreshedToken::try_from(reply).unwrap();
        assert_eq!(token.id_token, "id-2");
        assert_eq!(token.user_id.as_str(), "uid-1");
        assert_eq!(token.expires_in_secs, 3600);
    }

    #[test]
    fn parse_reply_surfaces_provider_error() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND","errors":[]}}"#;
        let err = parse_reply::<PasswordReply>(body).unwrap_err();
        assert_eq!(err.to_string(), "No account found with this email");
        assert!(matches!(err, AuthError::Provider { ref code, .. } if code == "EMAIL_NOT_FOUND"));
    }

    #[test]
    fn parse_reply_rejects_garbage() {
        let err = parse_reply::<PasswordReply>("<html>").unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[test]
    fn bad_expires_in_is_invalid_response() {
        let body = r#"{"idToken":"a","refreshToken":"b","localId":"c","expiresIn":"soon"}"#;
        let reply: PasswordReply = parse_reply(body).unwrap();
        assert!(matches!(
            AuthGrant::try_from(reply),
            Err(AuthError::InvalidResponse(_))
        ));
    }

    #[test]
    fn out_of_range_expires_in_is_invalid_response() {
        for expires_in in [r#""9223372036854775""#, r#""-1""#, "31536001"] {
            let body = format!(
                r#"{{"idToken":"a","refreshToken":"b","localId":"c","expiresIn":{expires_in}}}"#
            );
            let reply: PasswordReply = parse_reply(&body).unwrap();
            assert!(
                matches!(AuthGrant::try_from(reply), Err(AuthError::InvalidResponse(_))),
                "{expires_in}"
            );
        }

        let body = r#"{"id_token":"a","refresh_token":"b","user_id":"c","expires_in":"99999999999"}"#;
        let reply: RefreshReply = parse_reply(body).unwrap();
        assert!(matches!(
            RefreshedToken::try_from(reply),
            Err(AuthError::InvalidResponse(_))
        ));
    }

    #[test]
    fn year_long_expires_in_is_accepted() {
        let body = r#"{"idToken":"a","refreshToken":"b","localId":"c","expiresIn":"31536000"}"#;
        let reply: PasswordReply = parse_reply(body).unwrap();
        assert!(AuthGrant::try_from(reply).is_ok());
    }

    #[tokio::test]
    async fn short_password_fails_before_network() {
        let err = offline_client()
            .log_in("parent@example.com", "12345")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooShort));
    }

    #[tokio::test]
    async fn unreachable_provider_is_network_error() {
        let err = offline_client()
            .log_in("parent@example.com", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Network(_)));
        assert_eq!(err.to_string(), "Network error. Please try again.");
    }
}
