//! Default `Transport` backed by `ureq`.
//!
//! # Design
//! A fresh agent is built for every call from the request's timeouts, proxy
//! and TLS settings, so nothing carries over between calls or slots. Status
//! codes are returned as data, redirects are not followed unless configured,
//! and arbitrary method names are allowed through. HTTPS goes through the
//! connector in `tls`, which honours the peer and host checks separately.

use std::io::{self, Read};

use tracing::warn;
use ureq::http::{Method, Request};
use ureq::unversioned::resolver::DefaultResolver;
use ureq::unversioned::transport::{ConnectProxyConnector, Connector, TcpConnector};
use ureq::{Agent, Proxy, ProxyProtocol};

use crate::config::FetchConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, OutboundRequest, ResponseSink, Transport};
use crate::tls::{self, TlsConnector, TlsOptions};

const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct UreqTransport {
    user_agent: String,
    max_redirects: u32,
}

impl UreqTransport {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
        }
    }

    fn agent(&self, request: &OutboundRequest<'_>) -> Result<Agent, TransportError> {
        // Only the slot's own proxy applies; proxy environment variables are ignored.
        let proxy = request.proxy.map(parse_proxy).transpose()?;
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .max_redirects(self.max_redirects)
            .max_redirects_will_error(false)
            .user_agent(self.user_agent.as_str())
            .timeout_global(request.timeout)
            .timeout_connect(request.connect_timeout)
            .proxy(proxy)
            .build();

        let https = is_https(request.url);
        let options = TlsOptions {
            verify_peer: request.verify_peer,
            verify_host: request.verify_host,
            ca_file: request.ca_file.filter(|_| https),
            ca_dir: request.ca_dir.filter(|_| https),
        };
        let connector = ()
            .chain(ConnectProxyConnector::default())
            .chain(TcpConnector::default())
            .chain(TlsConnector::new(tls::client_config(&options)?));
        Ok(Agent::with_parts(
            config,
            connector,
            DefaultResolver::default(),
        ))
    }
}

fn parse_proxy(url: &str) -> Result<Proxy, TransportError> {
    let proxy =
        Proxy::new(url).map_err(|e| TransportError::InvalidRequest(format!("proxy {url}: {e}")))?;
    match proxy.protocol() {
        ProxyProtocol::Http | ProxyProtocol::Https => Ok(proxy),
        other => Err(TransportError::InvalidRequest(format!(
            "proxy {url}: unsupported protocol {other:?}"
        ))),
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl Transport for UreqTransport {
    fn perform(
        &self,
        request: &OutboundRequest<'_>,
        sink: &mut dyn ResponseSink,
    ) -> Result<(), TransportError> {
        let agent = self.agent(request)?;

        let method = Method::from_bytes(request.wire_method().as_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        let mut builder = Request::builder().method(method).uri(request.url);
        for line in request.headers {
            match split_header_line(line) {
                Some((name, value)) => builder = builder.header(name, value),
                None => warn!(line = %line, "skipping request header without a colon"),
            }
        }

        let sent = match request.body {
            Some(body) => builder.body(body).map(|req| agent.run(req)),
            None => builder.body(()).map(|req| agent.run(req)),
        };
        let mut response = sent
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?
            .map_err(classify)?;

        let status = response.status();
        sink.status(status.as_u16());
        sink.header_line(format!("{:?} {}\r\n", response.version(), status).as_bytes());
        let mut line = Vec::new();
        for (name, value) in response.headers() {
            line.clear();
            line.extend_from_slice(name.as_str().as_bytes());
            line.extend_from_slice(b": ");
            line.extend_from_slice(value.as_bytes());
            line.extend_from_slice(b"\r\n");
            sink.header_line(&line);
        }

        if request.method == HttpMethod::Head {
            return Ok(());
        }

        let mut reader = response.body_mut().as_reader();
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(n) => sink.body_chunk(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }
}

/// Split a raw `Name: Value` line; `None` when there is no colon.
fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    Some((name.trim(), value.trim()))
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        e @ ureq::Error::Timeout(_) => TransportError::Timeout(e.to_string()),
        e @ (ureq::Error::HostNotFound | ureq::Error::ConnectionFailed) => {
            TransportError::Connect(e.to_string())
        }
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
            TransportError::Connect(e.to_string())
        }
        // rustls reports handshake failures through the socket's io::Error.
        ureq::Error::Io(e) if is_tls_failure(&e) => TransportError::Tls(e.to_string()),
        ureq::Error::Io(e) => TransportError::Io(e),
        e @ (ureq::Error::BadUri(_) | ureq::Error::Http(_)) => {
            TransportError::InvalidRequest(e.to_string())
        }
        e @ (ureq::Error::Tls(_) | ureq::Error::Rustls(_)) => TransportError::Tls(e.to_string()),
        e => TransportError::Other(e.to_string()),
    }
}

fn is_tls_failure(err: &io::Error) -> bool {
    err.get_ref()
        .is_some_and(|inner| inner.is::<rustls::Error>())
}

fn is_https(url: &str) -> bool {
    url.get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lines_split_at_first_colon() {
        assert_eq!(split_header_line("X-Foo: bar"), Some(("X-Foo", "bar")));
        assert_eq!(
            split_header_line("Referer:  http://a:1/ "),
            Some(("Referer", "http://a:1/"))
        );
        assert_eq!(split_header_line("X-Empty:"), Some(("X-Empty", "")));
        assert_eq!(split_header_line("garbage"), None);
    }

    #[test]
    fn https_detection_ignores_case() {
        assert!(is_https("https://example.com/"));
        assert!(is_https("HTTPS://example.com/"));
        assert!(!is_https("http://example.com/"));
        assert!(!is_https("http"));
    }

    #[test]
    fn ca_files_are_ignored_for_plain_http() {
        let config = FetchConfig::default();
        let transport = UreqTransport::new(&config);
        let request = OutboundRequest {
            method: HttpMethod::Get,
            custom_method: None,
            url: "http://127.0.0.1:9/",
            body: None,
            headers: &[],
            timeout: None,
            connect_timeout: None,
            verify_peer: true,
            verify_host: true,
            ca_file: Some("/nonexistent/ca.pem"),
            ca_dir: None,
            proxy: None,
        };
        assert!(transport.agent(&request).is_ok());
    }

    #[test]
    fn bad_proxy_is_an_invalid_request() {
        let transport = UreqTransport::default();
        let request = OutboundRequest {
            method: HttpMethod::Get,
            custom_method: None,
            url: "http://127.0.0.1:9/",
            body: None,
            headers: &[],
            timeout: None,
            connect_timeout: None,
            verify_peer: false,
            verify_host: false,
            ca_file: None,
            ca_dir: None,
            proxy: Some("not a proxy url"),
        };
        assert!(matches!(
            transport.agent(&request),
            Err(TransportError::InvalidRequest(_))
        ));
    }

    #[test]
    fn socks_proxy_is_an_invalid_request() {
        assert!(matches!(
            parse_proxy("socks5://127.0.0.1:1080"),
            Err(TransportError::InvalidRequest(_))
        ));
        assert!(parse_proxy("http://127.0.0.1:3128").is_ok());
    }

    #[test]
    fn rustls_failures_inside_io_errors_are_tls_errors() {
        let handshake = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer),
        );
        assert!(matches!(
            classify(ureq::Error::Io(handshake)),
            TransportError::Tls(_)
        ));

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(
            classify(ureq::Error::Io(reset)),
            TransportError::Io(_)
        ));
    }
}
