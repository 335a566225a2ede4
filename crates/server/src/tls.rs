//! TLS peer identification.

use tokio_rustls::rustls::ServerConnection;
use x509_parser::prelude::*;

/// Extracts a peer name from an established TLS connection.
///
/// Invoked right after the handshake, before any record is read.
/// Returning `None` makes the receiver close the connection.
pub type TlsPeerNameFn = dyn Fn(&ServerConnection) -> Option<String> + Send + Sync;

/// Default peer-name extractor: the subject common name of the first
/// peer certificate. Connections that present no client certificate
/// are rejected.
pub fn default_tls_peer_name(conn: &ServerConnection) -> Option<String> {
    let der = conn.peer_certificates()?.first()?;
    let (_, cert) = X509Certificate::from_der(der.as_ref()).ok()?;
    let cn = cert.subject().iter_common_name().next()?;
    cn.as_str().ok().map(str::to_owned)
}
