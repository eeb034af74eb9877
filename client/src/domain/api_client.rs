//! Authenticated API client.
//!
//! Every call reads the bearer token from the injected [`TokenStore`], sends
//! the request through the [`HttpTransport`] port and translates the outcome
//! into either the unwrapped payload or an [`ApiError`]. Failure
//! classification is evaluated in a fixed order:
//!
//! 1. `401` (first time for the request): clear the session, notify the
//!    [`SessionExpiredHandler`], `AUTH_FAILED`.
//! 2. `403`: `FORBIDDEN`.
//! 3. `404`: `NOT_FOUND`.
//! 4. `>= 500`: `SERVER_ERROR`.
//! 5. Any other non-2xx: `API_ERROR` with the body's `error` or `message`.
//! 6. Sent without a response: `NETWORK_ERROR`.
//! 7. Not sent at all: `UNKNOWN_ERROR`.
//!
//! The client never retries.

use std::sync::Arc;

use envelope::{Envelope, unwrap_payload};
use mockable::{Clock, DefaultClock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::error::ApiError;
use super::ports::{
    ApiRequest, HttpMethod, HttpTransport, MultipartForm, NoopSessionExpiredHandler, RequestBody,
    SessionExpiredHandler, TokenStore, TokenStoreError, TransportError, TransportResponse,
    is_sign_in_path,
};
use super::session_keys::{self, ROLE_KEY, TOKEN_KEY, USER_DATA_KEY};
use super::session_token::SessionClaims;

/// Route the host shows when the session is rejected.
pub const DEFAULT_SIGN_IN_ROUTE: &str = "/auth";

/// Result alias for client operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Tracks whether the session-expiry side effects already ran for a request.
///
/// One guard lives for one logical request and is threaded through every
/// `classify_failure` call made for it. The client sends each request once
/// today, so the guard only trips when a replay path passes the same guard
/// back in; a second `401` then falls through to the generic classification
/// instead of clearing and redirecting again.
#[derive(Debug, Default)]
struct AuthRedirectGuard {
    tripped: bool,
}

/// Authenticated client for the School ERP REST API.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use erp_client::domain::ApiClient;
/// use erp_client::domain::ports::{FixtureHttpTransport, MemoryTokenStore};
/// use serde_json::{json, Value};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let transport = FixtureHttpTransport::json(200, &json!({ "success": true, "data": { "id": 1 } }));
/// let client = ApiClient::new(Arc::new(transport), Arc::new(MemoryTokenStore::default()));
/// let student: Value = client.get("/students/1").await?;
/// assert_eq!(student, json!({ "id": 1 }));
/// # Ok::<(), erp_client::domain::ApiError>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn TokenStore>,
    session_handler: Arc<dyn SessionExpiredHandler>,
    clock: Arc<dyn Clock>,
    sign_in_route: String,
}

impl ApiClient {
    /// Build a client that ignores session expiry and uses the system clock.
    pub fn new(transport: Arc<dyn HttpTransport>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            transport,
            store,
            session_handler: Arc::new(NoopSessionExpiredHandler),
            clock: Arc::new(DefaultClock),
            sign_in_route: DEFAULT_SIGN_IN_ROUTE.to_owned(),
        }
    }

    /// Notify `handler` when the backend rejects the session.
    #[must_use]
    pub fn with_session_handler(mut self, handler: Arc<dyn SessionExpiredHandler>) -> Self {
        self.session_handler = handler;
        self
    }

    /// Use `clock` for token expiry checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Redirect to `route` instead of [`DEFAULT_SIGN_IN_ROUTE`].
    #[must_use]
    pub fn with_sign_in_route(mut self, route: impl Into<String>) -> Self {
        self.sign_in_route = route.into();
        self
    }

    /// Route used for session-expiry redirects.
    #[must_use]
    pub fn sign_in_route(&self) -> &str {
        &self.sign_in_route
    }

    /// `GET` `path` and return the envelope payload.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] classified as described in the module docs.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let (status, body) = self
            .execute(HttpMethod::Get, path, Vec::new(), RequestBody::Empty)
            .await?;
        decode_payload(status, body)
    }

    /// `GET` `path` with query parameters and return the envelope payload.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] classified as described in the module docs.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let query = query
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        let (status, body) = self
            .execute(HttpMethod::Get, path, query, RequestBody::Empty)
            .await?;
        decode_payload(status, body)
    }

    /// `GET` `path` and return the full envelope, including pagination.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] classified as described in the module docs.
    pub async fn get_with_meta<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Envelope<T>> {
        let (status, body) = self
            .execute(HttpMethod::Get, path, Vec::new(), RequestBody::Empty)
            .await?;
        Envelope::from_value(body).map_err(|error| ApiError::undecodable(status, error.to_string()))
    }

    /// `POST` a JSON body to `path` and return the envelope payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::UnknownError`] when `body` cannot
    /// be encoded, otherwise classifies as described in the module docs.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.send_and_decode(HttpMethod::Post, path, body).await
    }

    /// `POST` to `path` without a body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] classified as described in the module docs.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send_and_decode(HttpMethod::Post, path, RequestBody::Empty)
            .await
    }

    /// `PUT` a JSON body to `path` and return the envelope payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::UnknownError`] when `body` cannot
    /// be encoded, otherwise classifies as described in the module docs.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = json_body(body)?;
        self.send_and_decode(HttpMethod::Put, path, body).await
    }

    /// `PUT` to `path` without a body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] classified as described in the module docs.
    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send_and_decode(HttpMethod::Put, path, RequestBody::Empty)
            .await
    }

    /// `DELETE` `path` and return the envelope payload.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] classified as described in the module docs.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send_and_decode(HttpMethod::Delete, path, RequestBody::Empty)
            .await
    }

    /// `POST` a multipart form to `path` and return the envelope payload.
    ///
    /// No JSON content type is set; the transport supplies the multipart
    /// boundary.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] classified as described in the module docs.
    pub async fn post_form_data<T: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
    ) -> ApiResult<T> {
        self.send_and_decode(HttpMethod::Post, path, RequestBody::Multipart(form))
            .await
    }

    async fn send_and_decode<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: RequestBody,
    ) -> ApiResult<T> {
        let (status, body) = self.execute(method, path, Vec::new(), body).await?;
        decode_payload(status, body)
    }

    async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        query: Vec<(String, String)>,
        body: RequestBody,
    ) -> ApiResult<(u16, Value)> {
        let request_id = Uuid::new_v4();
        let bearer = self.bearer();
        debug!(
            %request_id,
            %method,
            path,
            authenticated = bearer.is_some(),
            "sending api request"
        );
        let request = ApiRequest {
            method,
            path: path.to_owned(),
            query,
            body,
            bearer,
        };

        let mut guard = AuthRedirectGuard::default();
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|error| translate_transport_error(request_id, &error))?;
        if !response.is_success() {
            let error = self.classify_failure(&response, &mut guard);
            debug!(
                %request_id,
                status = response.status,
                code = %error.code(),
                "api request failed"
            );
            return Err(error);
        }
        Ok((response.status, parse_body(&response.body)))
    }

    fn bearer(&self) -> Option<Zeroizing<String>> {
        match session_keys::read_token(self.store.as_ref()) {
            Ok(token) => token.map(|token| token.to_bearer()),
            Err(error) => {
                warn!(error = %error, "session storage unreadable; sending request without credentials");
                None
            }
        }
    }

    fn classify_failure(
        &self,
        response: &TransportResponse,
        guard: &mut AuthRedirectGuard,
    ) -> ApiError {
        match response.status {
            401 if !guard.tripped => {
                guard.tripped = true;
                self.expire_session();
                ApiError::auth_failed()
            }
            403 => ApiError::forbidden(),
            404 => ApiError::not_found(),
            status if status >= 500 => ApiError::server_error(status),
            status => ApiError::api(status, failure_message(status, &response.body)),
        }
    }

    fn expire_session(&self) {
        if let Err(error) = session_keys::clear_session(self.store.as_ref()) {
            warn!(error = %error, "failed to clear rejected session");
        }
        let current_path = self.session_handler.current_path();
        if current_path
            .as_deref()
            .is_some_and(|path| is_sign_in_path(path, &self.sign_in_route))
        {
            debug!(path = ?current_path, "already on sign-in path; skipping redirect");
            return;
        }
        warn!(route = %self.sign_in_route, "session rejected by backend; redirecting to sign-in");
        self.session_handler.redirect_to_sign_in(&self.sign_in_route);
    }

    /// Whether a usable, unexpired session token is stored.
    ///
    /// Expired tokens are removed from both token keys before returning
    /// `false`. Undecodable tokens count as unauthenticated and are left in
    /// place.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let token = match session_keys::read_token(self.store.as_ref()) {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(error) => {
                warn!(error = %error, "session storage unreadable; treating as signed out");
                return false;
            }
        };
        let claims = match token.claims() {
            Ok(claims) => claims,
            Err(error) => {
                debug!(error = %error, "stored session token is undecodable");
                return false;
            }
        };
        if claims.is_expired_at(self.clock.utc()) {
            warn!("stored session token has expired; clearing it");
            if let Err(error) = session_keys::clear_tokens(self.store.as_ref()) {
                warn!(error = %error, "failed to clear expired session token");
            }
            return false;
        }
        true
    }

    /// Role claim of the stored token, if decodable.
    #[must_use]
    pub fn role(&self) -> Option<String> {
        self.claims()?.role().map(str::to_owned)
    }

    /// School identifier claim of the stored token, if decodable.
    #[must_use]
    pub fn school_id(&self) -> Option<i64> {
        self.claims()?.school_id()
    }

    fn claims(&self) -> Option<SessionClaims> {
        let token = session_keys::read_token(self.store.as_ref()).ok().flatten()?;
        token.claims().ok()
    }

    /// Decode the stored `userData` object, if present and well formed.
    #[must_use]
    pub fn user_data<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = self.store.get(USER_DATA_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    /// Replace the stored session after a successful sign-in.
    ///
    /// Writes only the primary keys; legacy aliases are removed.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn store_session(
        &self,
        token: &str,
        role: Option<&str>,
        user_data: Option<&Value>,
    ) -> Result<(), TokenStoreError> {
        let store = self.store.as_ref();
        session_keys::clear_session(store)?;
        store.set(TOKEN_KEY, token)?;
        if let Some(role) = role {
            store.set(ROLE_KEY, role)?;
        }
        if let Some(user_data) = user_data {
            store.set(USER_DATA_KEY, &user_data.to_string())?;
        }
        info!(role = ?role, "stored session");
        Ok(())
    }

    /// Remove every session key.
    ///
    /// # Errors
    ///
    /// Returns the first storage failure after attempting every removal.
    pub fn logout(&self) -> Result<(), TokenStoreError> {
        session_keys::clear_session(self.store.as_ref())?;
        info!("cleared session");
        Ok(())
    }

    /// Fold legacy session keys into the primary keys.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn migrate_legacy_keys(&self) -> Result<session_keys::MigrationReport, TokenStoreError> {
        session_keys::migrate_legacy(self.store.as_ref())
    }
}

fn json_body<B: Serialize + ?Sized>(body: &B) -> ApiResult<RequestBody> {
    serde_json::to_value(body)
        .map(RequestBody::Json)
        .map_err(|error| ApiError::unknown(format!("failed to encode request body: {error}")))
}

fn decode_payload<T: DeserializeOwned>(status: u16, body: Value) -> ApiResult<T> {
    unwrap_payload(body).map_err(|error| ApiError::undecodable(status, error.to_string()))
}

fn translate_transport_error(request_id: Uuid, error: &TransportError) -> ApiError {
    match error {
        TransportError::NoResponse { message } => {
            warn!(%request_id, reason = %message, "no response from api");
            ApiError::network()
        }
        TransportError::NotSent { message } => {
            warn!(%request_id, reason = %message, "api request could not be sent");
            ApiError::unknown(message.as_str())
        }
    }
}

/// Decode a response body; non-JSON text is kept as a JSON string.
fn parse_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

fn failure_message(status: u16, body: &[u8]) -> String {
    let parsed = parse_body(body);
    ["error", "message"]
        .into_iter()
        .filter_map(|field| parsed.get(field).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map_or_else(
            || format!("Request failed with status code {status}"),
            str::to_owned,
        )
}
