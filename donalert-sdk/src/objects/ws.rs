//! Close codes used on the alert socket (`GET /ws/{secret_token}`).
//!
//! The socket is push-only: the server sends [`AlertMessage`] text frames and
//! ignores anything the client sends besides close and ping frames.
//!
//! [`AlertMessage`]: super::AlertMessage

/// Well-known WebSocket close codes sent by the alert socket.
///
/// Codes in the 4000–4999 range are reserved for application use by
/// [RFC 6455 §7.4.2](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.2).
pub struct WsCloseCode;

impl WsCloseCode {
    /// The hub closed the connection's buffer: a newer connection for the
    /// same creator took over, the client fell too far behind, or the server
    /// is shutting down.
    pub const NORMAL: u16 = 1000;

    /// The secret token in the path did not resolve to a creator. Sent as an
    /// HTTP 401 before the upgrade; listed so clients can share one table.
    pub const UNAUTHORIZED: u16 = 4001;
}
