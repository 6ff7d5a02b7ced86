// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SASL negotiation over a byte stream.
//!
//! # Frame Format
//!
//! ```text
//! +--------+----------------+-----------------+
//! | status | length (u32 BE)| payload         |
//! | 1 byte | 4 bytes        | length bytes    |
//! +--------+----------------+-----------------+
//! ```
//!
//! # Exchange
//!
//! ```text
//! Client                                   Server
//!    |--- START(mechanism name) ------------->|
//!    |--- OK(initial response) -------------->|  evaluate_response
//!    |<-- COMPLETE(empty) | BAD(error text) --|
//! ```
//!
//! Once negotiation completes both sides hand back a decorated stream that
//! implements `Read`/`Write`. The server side routes payloads through the
//! mechanism's `wrap`/`unwrap`.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::error::{SaslError, SaslResult};
use crate::mechanism::{MechanismProperties, SaslClient, SaslServer};
use crate::registry::MechanismRegistry;

/// Default upper bound for a negotiation frame payload (64 KiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Frame header size: status byte + length.
pub const FRAME_HEADER_LEN: usize = 5;

/// Negotiation frame status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NegotiationStatus {
    Start = 1,
    Ok = 2,
    Bad = 3,
    Error = 4,
    Complete = 5,
}

impl NegotiationStatus {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Start),
            2 => Some(Self::Ok),
            3 => Some(Self::Bad),
            4 => Some(Self::Error),
            5 => Some(Self::Complete),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Write one negotiation frame and flush.
pub fn write_frame<W: Write>(
    writer: &mut W,
    status: NegotiationStatus,
    payload: &[u8],
) -> SaslResult<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        SaslError::Negotiation(format!("frame payload too large: {} bytes", payload.len()))
    })?;

    let mut header = [0u8; FRAME_HEADER_LEN];
    header[0] = status.as_byte();
    header[1..].copy_from_slice(&len.to_be_bytes());

    writer.write_all(&header)?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one negotiation frame.
///
/// # Errors
///
/// - `SaslError::Negotiation` -- unknown status byte, or the announced
///   length exceeds `max_frame_size` (the payload is not read)
/// - `SaslError::Io` -- the stream failed or closed mid-frame
pub fn read_frame<R: Read>(
    reader: &mut R,
    max_frame_size: usize,
) -> SaslResult<(NegotiationStatus, Vec<u8>)> {
    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header)?;

    let status = NegotiationStatus::from_byte(header[0]).ok_or_else(|| {
        SaslError::Negotiation(format!("invalid negotiation status: {}", header[0]))
    })?;

    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    if len > max_frame_size {
        return Err(SaslError::Negotiation(format!(
            "invalid frame length: {} (max {})",
            len, max_frame_size
        )));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok((status, payload))
}

/// Parameters used when instantiating a server mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDefinition {
    pub protocol: String,
    pub server_name: String,
    pub properties: MechanismProperties,
}

/// Accepts raw streams and runs server-side negotiation on them.
#[derive(Debug)]
pub struct SaslServerTransportFactory {
    registry: Arc<MechanismRegistry>,
    definitions: HashMap<String, ServerDefinition>,
    max_frame_size: usize,
}

impl SaslServerTransportFactory {
    pub fn new(registry: Arc<MechanismRegistry>) -> Self {
        Self {
            registry,
            definitions: HashMap::new(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set the negotiation frame limit.
    pub fn max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Allow `mechanism` on accepted connections.
    pub fn add_server_definition(
        &mut self,
        mechanism: &str,
        protocol: impl Into<String>,
        server_name: impl Into<String>,
        properties: MechanismProperties,
    ) {
        self.definitions.insert(
            mechanism.to_ascii_uppercase(),
            ServerDefinition {
                protocol: protocol.into(),
                server_name: server_name.into(),
                properties,
            },
        );
    }

    /// Server definition registered for `mechanism`.
    pub fn server_definition(&self, mechanism: &str) -> Option<&ServerDefinition> {
        self.definitions.get(&mechanism.to_ascii_uppercase())
    }

    /// Run negotiation on a freshly accepted stream.
    ///
    /// On failure the peer is sent a BAD (or ERROR) frame carrying the
    /// error text before the error is returned.
    pub fn accept<T: Read + Write>(&self, mut inner: T) -> SaslResult<SaslServerTransport<T>> {
        let (status, payload) = read_frame(&mut inner, self.max_frame_size)?;
        if status != NegotiationStatus::Start {
            return Err(send_failure(
                &mut inner,
                NegotiationStatus::Error,
                format!("expected START frame, got {:?}", status),
            ));
        }

        let mechanism = String::from_utf8_lossy(&payload).into_owned();
        tracing::debug!("SASL negotiation started with mechanism '{}'", mechanism);

        let mut server = match self.create_server(&mechanism) {
            Ok(server) => server,
            Err(e) => return Err(reject(&mut inner, e)),
        };

        loop {
            let (status, payload) = read_frame(&mut inner, self.max_frame_size)?;
            match status {
                NegotiationStatus::Ok | NegotiationStatus::Complete => {}
                NegotiationStatus::Bad | NegotiationStatus::Error => {
                    server.dispose();
                    return Err(SaslError::Negotiation(
                        String::from_utf8_lossy(&payload).into_owned(),
                    ));
                }
                NegotiationStatus::Start => {
                    server.dispose();
                    return Err(send_failure(
                        &mut inner,
                        NegotiationStatus::Error,
                        "unexpected START frame".to_string(),
                    ));
                }
            }

            let challenge = match server.evaluate_response(&payload) {
                Ok(challenge) => challenge,
                Err(e) => {
                    tracing::warn!("SASL negotiation failed: {}", e);
                    server.dispose();
                    return Err(reject(&mut inner, e));
                }
            };

            if server.is_complete() {
                write_frame(&mut inner, NegotiationStatus::Complete, &challenge)?;
                break;
            }
            write_frame(&mut inner, NegotiationStatus::Ok, &challenge)?;
        }

        tracing::debug!(
            "SASL negotiation completed for '{}'",
            server.authorization_id().unwrap_or_default()
        );

        Ok(SaslServerTransport {
            inner,
            server,
            pending: Vec::new(),
            pos: 0,
        })
    }

    fn create_server(&self, mechanism: &str) -> SaslResult<Box<dyn SaslServer>> {
        let definition = self
            .server_definition(mechanism)
            .ok_or_else(|| SaslError::UnsupportedMechanism(mechanism.to_string()))?;
        let factory = self
            .registry
            .server_factory(mechanism)
            .ok_or_else(|| SaslError::UnsupportedMechanism(mechanism.to_string()))?;

        factory.create_server(
            mechanism,
            &definition.protocol,
            &definition.server_name,
            &definition.properties,
        )
    }
}

/// Report `error` to the peer with a BAD frame and hand it back.
fn reject<W: Write>(writer: &mut W, error: SaslError) -> SaslError {
    if let Err(e) = write_frame(writer, NegotiationStatus::Bad, error.to_string().as_bytes()) {
        tracing::debug!("failed to send BAD frame: {}", e);
    }
    error
}

fn send_failure<W: Write>(writer: &mut W, status: NegotiationStatus, message: String) -> SaslError {
    if let Err(e) = write_frame(writer, status, message.as_bytes()) {
        tracing::debug!("failed to send {:?} frame: {}", status, e);
    }
    SaslError::Negotiation(message)
}

/// Authenticated server-side stream.
#[derive(Debug)]
pub struct SaslServerTransport<T> {
    inner: T,
    server: Box<dyn SaslServer>,
    pending: Vec<u8>,
    pos: usize,
}

impl<T> SaslServerTransport<T> {
    /// Identity the peer is authorized as.
    pub fn authorization_id(&self) -> SaslResult<&str> {
        self.server.authorization_id()
    }

    pub fn mechanism_name(&self) -> &str {
        self.server.mechanism_name()
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Dispose the mechanism and return the raw stream.
    pub fn into_inner(mut self) -> T {
        self.server.dispose();
        self.inner
    }
}

impl<T: Read> Read for SaslServerTransport<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.pending.len() {
            let mut raw = vec![0u8; buf.len().max(1)];
            let n = self.inner.read(&mut raw)?;
            if n == 0 {
                return Ok(0);
            }
            self.pending = self.server.unwrap(&raw[..n]).map_err(io::Error::other)?;
            self.pos = 0;
        }

        let available = &self.pending[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl<T: Write> Write for SaslServerTransport<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let wrapped = self.server.wrap(buf).map_err(io::Error::other)?;
        self.inner.write_all(&wrapped)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Authenticated client-side stream.
#[derive(Debug)]
pub struct SaslClientTransport<T> {
    inner: T,
    mechanism: String,
}

impl<T: Read + Write> SaslClientTransport<T> {
    /// Negotiate `client`'s mechanism over `inner`.
    pub fn open(inner: T, client: Box<dyn SaslClient>) -> SaslResult<Self> {
        Self::open_with_limit(inner, client, DEFAULT_MAX_FRAME_SIZE)
    }

    /// Like [`open`](Self::open) with an explicit frame limit.
    pub fn open_with_limit(
        mut inner: T,
        mut client: Box<dyn SaslClient>,
        max_frame_size: usize,
    ) -> SaslResult<Self> {
        let mechanism = client.mechanism_name().to_string();
        write_frame(&mut inner, NegotiationStatus::Start, mechanism.as_bytes())?;

        let initial = if client.has_initial_response() {
            client.evaluate_challenge(&[])?.unwrap_or_default()
        } else {
            Vec::new()
        };
        write_frame(&mut inner, NegotiationStatus::Ok, &initial)?;

        loop {
            let (status, payload) = read_frame(&mut inner, max_frame_size)?;
            match status {
                NegotiationStatus::Complete => break,
                NegotiationStatus::Bad | NegotiationStatus::Error => {
                    let message = String::from_utf8_lossy(&payload).into_owned();
                    tracing::warn!("SASL negotiation rejected by server: {}", message);
                    return Err(SaslError::Negotiation(message));
                }
                NegotiationStatus::Ok => {
                    let response = client.evaluate_challenge(&payload)?.unwrap_or_default();
                    write_frame(&mut inner, NegotiationStatus::Ok, &response)?;
                }
                NegotiationStatus::Start => {
                    return Err(SaslError::Negotiation(
                        "unexpected START frame from server".to_string(),
                    ));
                }
            }
        }

        tracing::debug!("SASL negotiation completed with mechanism '{}'", mechanism);
        Ok(Self { inner, mechanism })
    }
}

impl<T> SaslClientTransport<T> {
    pub fn mechanism_name(&self) -> &str {
        &self.mechanism
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Read for SaslClientTransport<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<T: Write> Write for SaslClientTransport<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
