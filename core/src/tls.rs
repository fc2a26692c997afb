//! rustls connector for `UreqTransport` with separate peer and host checks.
//!
//! # Design
//! Every call gets its own rustls client config. The certificate verifier
//! checks the chain against the trust roots only when peer verification is
//! on and checks the host name only when host verification is on, so either
//! can be switched off without the other. The connector slots into ureq's
//! connector chain after the TCP connector.

use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::{verify_server_name, WebPkiServerVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{
    CertificateError, ClientConfig, ClientConnection, DigitallySignedStruct, RootCertStore,
    SignatureScheme, StreamOwned,
};
use tracing::debug;
use ureq::unversioned::transport::{
    Buffers, ConnectionDetails, Connector, Either, LazyBuffers, NextTimeout, Transport,
    TransportAdapter,
};

use crate::error::TransportError;

/// TLS settings of one call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsOptions<'a> {
    pub verify_peer: bool,
    pub verify_host: bool,
    pub ca_file: Option<&'a str>,
    pub ca_dir: Option<&'a str>,
}

/// Build the rustls client config for one call.
///
/// Trust roots come from `ca_file` and `ca_dir` when either yields a
/// certificate, otherwise from the bundled web PKI roots. They are only read
/// when the peer is verified.
pub fn client_config(options: &TlsOptions<'_>) -> Result<Arc<ClientConfig>, TransportError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let chain = if options.verify_peer {
        Some(chain_verifier(options, &provider)?)
    } else {
        None
    };
    let verifier = SplitVerifier {
        chain,
        check_host: options.verify_host,
        provider: Arc::clone(&provider),
    };
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    Ok(Arc::new(config))
}

fn chain_verifier(
    options: &TlsOptions<'_>,
    provider: &Arc<CryptoProvider>,
) -> Result<Arc<WebPkiServerVerifier>, TransportError> {
    let custom = load_ca_certs(options.ca_file, options.ca_dir)?;
    let roots = if custom.is_empty() {
        RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        }
    } else {
        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(custom);
        debug!(added, ignored, "loaded trust roots");
        roots
    };
    WebPkiServerVerifier::builder_with_provider(Arc::new(roots), Arc::clone(provider))
        .build()
        .map_err(|e| TransportError::Tls(e.to_string()))
}

/// Collect trust roots from a PEM bundle and from every `.pem`/`.crt` file in
/// a directory.
pub fn load_ca_certs(
    ca_file: Option<&str>,
    ca_dir: Option<&str>,
) -> Result<Vec<CertificateDer<'static>>, TransportError> {
    let mut certs = Vec::new();
    if let Some(file) = ca_file {
        read_pem(Path::new(file), &mut certs)?;
    }
    if let Some(dir) = ca_dir {
        let entries =
            fs::read_dir(dir).map_err(|e| TransportError::Tls(format!("{dir}: {e}")))?;
        for entry in entries {
            let path = entry
                .map_err(|e| TransportError::Tls(format!("{dir}: {e}")))?
                .path();
            let is_cert = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("crt")
                });
            if is_cert {
                read_pem(&path, &mut certs)?;
            }
        }
    }
    Ok(certs)
}

fn read_pem(
    path: &Path,
    certs: &mut Vec<CertificateDer<'static>>,
) -> Result<(), TransportError> {
    let pem =
        fs::read(path).map_err(|e| TransportError::Tls(format!("{}: {e}", path.display())))?;
    for cert in CertificateDer::pem_slice_iter(&pem) {
        let cert = cert.map_err(|e| TransportError::Tls(format!("{}: {e}", path.display())))?;
        certs.push(cert);
    }
    Ok(())
}

/// Chain check and host name check, each optional.
#[derive(Debug)]
struct SplitVerifier {
    chain: Option<Arc<WebPkiServerVerifier>>,
    check_host: bool,
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for SplitVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if let Some(chain) = &self.chain {
            // webpki checks the name only after the chain has verified.
            return match chain.verify_server_cert(
                end_entity,
                intermediates,
                server_name,
                ocsp_response,
                now,
            ) {
                Err(rustls::Error::InvalidCertificate(
                    CertificateError::NotValidForName
                    | CertificateError::NotValidForNameContext { .. },
                )) if !self.check_host => Ok(ServerCertVerified::assertion()),
                other => other,
            };
        }
        if self.check_host {
            let cert = ParsedCertificate::try_from(end_entity)?;
            verify_server_name(&cert, server_name)?;
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Wraps `https` connections from the previous connector in rustls.
#[derive(Debug)]
pub struct TlsConnector {
    config: Arc<ClientConfig>,
}

impl TlsConnector {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }
}

impl<In: Transport> Connector<In> for TlsConnector {
    type Out = Either<In, TlsTransport>;

    fn connect(
        &self,
        details: &ConnectionDetails,
        chained: Option<In>,
    ) -> Result<Option<Self::Out>, ureq::Error> {
        let Some(transport) = chained else {
            return Ok(None);
        };
        if !details.needs_tls() || transport.is_tls() {
            return Ok(Some(Either::A(transport)));
        }

        let host = details
            .uri
            .host()
            .ok_or(ureq::Error::Tls("missing host name"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let name = ServerName::try_from(host)
            .map_err(|_| ureq::Error::Tls("invalid server name"))?
            .to_owned();

        let mut conn = ClientConnection::new(Arc::clone(&self.config), name)?;
        let mut sock = TransportAdapter::new(transport.boxed());
        sock.set_timeout(details.timeout);
        conn.complete_io(&mut sock)?;
        debug!(host, "tls handshake complete");

        let buffers = LazyBuffers::new(
            details.config.input_buffer_size(),
            details.config.output_buffer_size(),
        );
        Ok(Some(Either::B(TlsTransport {
            buffers,
            stream: StreamOwned::new(conn, sock),
        })))
    }
}

pub struct TlsTransport {
    buffers: LazyBuffers,
    stream: StreamOwned<ClientConnection, TransportAdapter>,
}

impl Transport for TlsTransport {
    fn buffers(&mut self) -> &mut dyn Buffers {
        &mut self.buffers
    }

    fn transmit_output(&mut self, amount: usize, timeout: NextTimeout) -> Result<(), ureq::Error> {
        self.stream.get_mut().set_timeout(timeout);
        let output = &self.buffers.output()[..amount];
        self.stream.write_all(output)?;
        Ok(())
    }

    fn await_input(&mut self, timeout: NextTimeout) -> Result<bool, ureq::Error> {
        self.stream.get_mut().set_timeout(timeout);
        let input = self.buffers.input_append_buf();
        let amount = self.stream.read(input)?;
        self.buffers.input_appended(amount);
        Ok(amount > 0)
    }

    fn is_open(&mut self) -> bool {
        self.stream.get_mut().get_mut().is_open()
    }

    fn is_tls(&self) -> bool {
        true
    }
}

impl fmt::Debug for TlsTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsTransport").finish_non_exhaustive()
    }
}
