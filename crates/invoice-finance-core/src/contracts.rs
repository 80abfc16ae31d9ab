//! Typed shapes for the collaborators around the core: the REST backend,
//! the realtime push channel, and the locally cached session.
//!
//! Nothing in this module performs I/O. Transport layers serialize these
//! types onto the wire and hand the decoded values to the core.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvoiceFinanceError;
use crate::types::{InvoiceId, Money, UserId};
use crate::InvoiceFinanceResult;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Marketplace role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Seller,
    Buyer,
    Investor,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Seller => "seller",
            UserRole::Buyer => "buyer",
            UserRole::Investor => "investor",
            UserRole::Admin => "admin",
        };
        f.write_str(s)
    }
}

/// The logged-in user, passed explicitly to anything that needs identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    #[serde(alias = "userType")]
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: UserId::new(id),
            role,
            name: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// ---------------------------------------------------------------------------
// REST
// ---------------------------------------------------------------------------

/// Response envelope used by every backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, surfacing `success: false` as an error.
    pub fn into_result(self) -> InvoiceFinanceResult<T> {
        if !self.success {
            return Err(InvoiceFinanceError::Api(
                self.message.unwrap_or_else(|| "request failed".into()),
            ));
        }
        self.data
            .ok_or_else(|| InvoiceFinanceError::Api("response carried no data".into()))
    }
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    pub fn from_json(body: &str) -> InvoiceFinanceResult<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Backend endpoints the client consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Register,
    Profile,
    CreateInvoice,
    ConfirmInvoice(InvoiceId),
    FundInvoice(InvoiceId),
    Marketplace,
    Dashboard,
    Portfolio,
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Login => "/auth/login".into(),
            Endpoint::Register => "/auth/register".into(),
            Endpoint::Profile => "/auth/profile".into(),
            Endpoint::CreateInvoice => "/invoices/create".into(),
            Endpoint::ConfirmInvoice(id) => format!("/invoices/{id}/confirm"),
            Endpoint::FundInvoice(id) => format!("/invoices/{id}/fund"),
            Endpoint::Marketplace => "/invoices/marketplace".into(),
            Endpoint::Dashboard => "/users/dashboard".into(),
            Endpoint::Portfolio => "/users/portfolio".into(),
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Endpoint::Profile | Endpoint::Marketplace | Endpoint::Dashboard | Endpoint::Portfolio => {
                HttpMethod::Get
            }
            _ => HttpMethod::Post,
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Endpoint::Login | Endpoint::Register)
    }
}

/// `Authorization` header carrying the bearer token.
pub fn bearer_header(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: CurrentUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub buyer_email: String,
    pub amount: Money,
    pub due_date: chrono::NaiveDate,
    pub invoice_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundInvoiceRequest {
    pub discounted_amount: Money,
}

// ---------------------------------------------------------------------------
// Realtime
// ---------------------------------------------------------------------------

/// Socket event emitted by the client to subscribe to per-user pushes.
pub const JOIN_ROOM_EVENT: &str = "join-room";

/// Push events delivered on a user's realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RealtimeEvent {
    Notification(serde_json::Value),
    InvoiceUpdate(serde_json::Value),
    MarketplaceUpdate(serde_json::Value),
    DashboardUpdate(serde_json::Value),
    TransactionUpdate(serde_json::Value),
}

impl RealtimeEvent {
    /// Whether a held `PortfolioSummary` is stale after this event.
    pub fn invalidates_portfolio(&self) -> bool {
        matches!(
            self,
            RealtimeEvent::InvoiceUpdate(_)
                | RealtimeEvent::DashboardUpdate(_)
                | RealtimeEvent::TransactionUpdate(_)
        )
    }

    /// Whether marketplace listings should be re-fetched.
    pub fn invalidates_marketplace(&self) -> bool {
        matches!(
            self,
            RealtimeEvent::InvoiceUpdate(_) | RealtimeEvent::MarketplaceUpdate(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Session cache
// ---------------------------------------------------------------------------

/// How far a restored session has been checked against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTrust {
    /// Read from the local cache; the token has not been re-validated yet.
    Unverified,
    Verified,
}

/// Session restored from the client's local storage.
///
/// Trust-on-read, verify-async: a cached session is usable immediately but
/// stays `Unverified` until the profile call succeeds. A failed check ends the
/// session instead of keeping the user logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub user: CurrentUser,
    pub trust: SessionTrust,
}

impl StoredSession {
    /// Rebuild a session from the cached token and serialized profile.
    ///
    /// Returns `Ok(None)` when either entry is missing. A profile that does
    /// not parse is an error; callers should clear the cache.
    pub fn restore(
        token: Option<&str>,
        user_data: Option<&str>,
    ) -> InvoiceFinanceResult<Option<Self>> {
        let (Some(token), Some(user_data)) = (token, user_data) else {
            return Ok(None);
        };
        if token.is_empty() {
            return Ok(None);
        }
        let user: CurrentUser = serde_json::from_str(user_data)?;
        Ok(Some(Self {
            token: token.to_string(),
            user,
            trust: SessionTrust::Unverified,
        }))
    }

    pub fn from_login(response: LoginResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
            trust: SessionTrust::Verified,
        }
    }

    /// Apply the outcome of background token validation.
    pub fn on_verification(self, valid: bool) -> Option<Self> {
        valid.then(|| Self {
            trust: SessionTrust::Verified,
            ..self
        })
    }

    pub fn is_verified(&self) -> bool {
        self.trust == SessionTrust::Verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_envelope_success() {
        let env: ApiEnvelope<FundInvoiceRequest> =
            ApiEnvelope::from_json(r#"{ "success": true, "data": { "discountedAmount": "9000" } }"#)
                .unwrap();
        let data = env.into_result().unwrap();
        assert_eq!(data.discounted_amount, dec!(9000));
    }

    #[test]
    fn test_envelope_failure_carries_message() {
        let env: ApiEnvelope<serde_json::Value> =
            ApiEnvelope::from_json(r#"{ "success": false, "message": "Invoice not found" }"#)
                .unwrap();
        match env.into_result() {
            Err(InvoiceFinanceError::Api(msg)) => assert_eq!(msg, "Invoice not found"),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_success_without_data_is_error() {
        let env: ApiEnvelope<serde_json::Value> =
            ApiEnvelope::from_json(r#"{ "success": true }"#).unwrap();
        assert!(env.into_result().is_err());
    }

    #[test]
    fn test_endpoint_paths() {
        let id = InvoiceId::new("INV-001");
        assert_eq!(Endpoint::FundInvoice(id.clone()).path(), "/invoices/INV-001/fund");
        assert_eq!(Endpoint::ConfirmInvoice(id).path(), "/invoices/INV-001/confirm");
        assert_eq!(Endpoint::Marketplace.method(), HttpMethod::Get);
        assert!(!Endpoint::Login.requires_auth());
        assert!(Endpoint::Portfolio.requires_auth());
        assert_eq!(bearer_header("abc").1, "Bearer abc");
    }

    #[test]
    fn test_realtime_event_tags() {
        let ev: RealtimeEvent =
            serde_json::from_str(r#"{ "event": "transaction-update", "data": { "id": 1 } }"#)
                .unwrap();
        assert!(ev.invalidates_portfolio());
        assert!(!ev.invalidates_marketplace());

        let ev: RealtimeEvent =
            serde_json::from_str(r#"{ "event": "marketplace-update", "data": null }"#).unwrap();
        assert!(ev.invalidates_marketplace());
        assert!(!ev.invalidates_portfolio());
    }

    #[test]
    fn test_session_restore_is_unverified() {
        let session = StoredSession::restore(
            Some("tok"),
            Some(r#"{ "id": "u1", "userType": "investor", "name": "Asha" }"#),
        )
        .unwrap()
        .unwrap();
        assert_eq!(session.user.role, UserRole::Investor);
        assert!(!session.is_verified());

        let verified = session.clone().on_verification(true).unwrap();
        assert!(verified.is_verified());
        assert!(session.on_verification(false).is_none());
    }

    #[test]
    fn test_session_restore_missing_or_corrupt() {
        assert!(StoredSession::restore(None, Some("{}")).unwrap().is_none());
        assert!(StoredSession::restore(Some("tok"), None).unwrap().is_none());
        assert!(StoredSession::restore(Some("tok"), Some("not json")).is_err());
    }
}
