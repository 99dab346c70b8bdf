use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use openssl::ssl::{SslConnector, SslMethod, SslVersion};

use crate::rotate_error::RotateError;
use crate::{create_rotate_error, create_rotate_error_result};

/// Probes whether `domain` is reachable and negotiates TLS 1.3.
/// Reality camouflage requires the dest to speak TLS 1.3, anything less
/// disqualifies the candidate.
pub fn check_domain_tls13(domain: &str, port: u16, timeout: Duration) -> Result<(), RotateError> {
    let addr = (domain, port)
        .to_socket_addrs()
        .map_err(|err| create_rotate_error!("{domain}: dns resolution failed: {err}"))?
        .next()
        .ok_or_else(|| create_rotate_error!("{domain}: dns resolution returned no address"))?;

    let stream = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|err| create_rotate_error!("{domain}: connect failed: {err}"))?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let mut builder = SslConnector::builder(SslMethod::tls_client())?;
    builder.set_min_proto_version(Some(SslVersion::TLS1_3))?;
    let connector = builder.build();

    let tls_stream = connector
        .connect(domain, stream)
        .map_err(|err| create_rotate_error!("{domain}: tls handshake failed: {err}"))?;

    let version = tls_stream.ssl().version_str();
    if version == "TLSv1.3" {
        Ok(())
    } else {
        create_rotate_error_result!("{domain}: negotiated {version}, not TLSv1.3")
    }
}
