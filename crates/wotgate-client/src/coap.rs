//! Confirmable CoAP request/response exchange over UDP
//!
//! One exchange is one socket: the request is sent as a CON message with a
//! random token, the reply is matched by token, and a CON reply (separate
//! response) is acknowledged before its payload is returned.

use std::net::SocketAddr;
use std::time::Duration;

use coap_lite::{
    CoapOption, ContentFormat, MessageClass, MessageType, Packet, RequestType, ResponseType,
};
use tokio::net::UdpSocket;
use tracing::{debug, trace};
use url::Url;
use wotgate_core::Method;

use crate::error::{Result, ThingClientError};

/// Default CoAP port
pub const DEFAULT_COAP_PORT: u16 = 5683;

/// Largest datagram we accept
const MAX_DATAGRAM: usize = 1152;

pub(crate) struct CoapExchange<'a> {
    pub url: &'a Url,
    pub method: Method,
    pub content_type: &'a str,
    pub payload: Option<&'a [u8]>,
    pub message_id: u16,
}

impl CoapExchange<'_> {
    /// Run the exchange, bounded by `timeout`
    pub async fn run(self, timeout: Duration) -> Result<Vec<u8>> {
        match tokio::time::timeout(timeout, self.exchange()).await {
            Ok(result) => result,
            Err(_) => Err(ThingClientError::Timeout),
        }
    }

    async fn exchange(self) -> Result<Vec<u8>> {
        if !self.url.scheme().eq_ignore_ascii_case("coap") {
            return Err(ThingClientError::InvalidUrl(format!(
                "unsupported CoAP scheme '{}'",
                self.url.scheme()
            )));
        }

        let peer = resolve_peer(self.url)?;
        let local: SocketAddr = if peer.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;

        let token = uuid::Uuid::new_v4().as_bytes()[..8].to_vec();
        let request = self.build_request(token.clone());
        let bytes = request
            .to_bytes()
            .map_err(|e| ThingClientError::CoapError(format!("{:?}", e)))?;

        debug!(peer = %peer, message_id = self.message_id, "Sending CoAP request");
        socket.send(&bytes).await?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let n = socket.recv(&mut buf).await?;
            let response = match Packet::from_bytes(&buf[..n]) {
                Ok(packet) => packet,
                Err(e) => {
                    trace!(error = ?e, "Ignoring undecodable datagram");
                    continue;
                }
            };

            if response.header.get_type() == MessageType::Reset
                && response.header.message_id == self.message_id
            {
                return Err(ThingClientError::CoapError(
                    "request rejected with RST".to_string(),
                ));
            }
            // Empty ACK announces a separate response
            if response.header.code == MessageClass::Empty {
                trace!("Received empty ACK, waiting for separate response");
                continue;
            }
            if response.get_token() != &token[..] {
                trace!("Ignoring response with foreign token");
                continue;
            }

            if response.header.get_type() == MessageType::Confirmable {
                let ack = empty_ack(response.header.message_id);
                if let Ok(ack) = ack.to_bytes() {
                    socket.send(&ack).await?;
                }
            }

            return match response.header.code {
                MessageClass::Response(
                    ResponseType::Created
                    | ResponseType::Deleted
                    | ResponseType::Valid
                    | ResponseType::Changed
                    | ResponseType::Content,
                ) => Ok(response.payload),
                other => Err(ThingClientError::status_error(
                    format!("{:?}", other),
                    String::from_utf8_lossy(&response.payload),
                )),
            };
        }
    }

    fn build_request(&self, token: Vec<u8>) -> Packet {
        let mut packet = Packet::new();
        packet.header.set_version(1);
        packet.header.set_type(MessageType::Confirmable);
        packet.header.code = MessageClass::Request(request_type(self.method));
        packet.header.message_id = self.message_id;
        packet.set_token(token);

        if let Some(segments) = self.url.path_segments() {
            for segment in segments.filter(|s| !s.is_empty()) {
                packet.add_option(CoapOption::UriPath, segment.as_bytes().to_vec());
            }
        }
        if let Some(query) = self.url.query() {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                packet.add_option(CoapOption::UriQuery, pair.as_bytes().to_vec());
            }
        }

        if let Some(payload) = self.payload {
            if let Some(format) = content_format(self.content_type) {
                packet.set_content_format(format);
            }
            packet.payload = payload.to_vec();
        }

        packet
    }
}

fn request_type(method: Method) -> RequestType {
    match method {
        Method::Get => RequestType::Get,
        Method::Post => RequestType::Post,
        Method::Put => RequestType::Put,
    }
}

fn content_format(content_type: &str) -> Option<ContentFormat> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "application/json" => Some(ContentFormat::ApplicationJSON),
        "text/plain" => Some(ContentFormat::TextPlain),
        "application/cbor" => Some(ContentFormat::ApplicationCBOR),
        _ => None,
    }
}

fn empty_ack(message_id: u16) -> Packet {
    let mut ack = Packet::new();
    ack.header.set_version(1);
    ack.header.set_type(MessageType::Acknowledgement);
    ack.header.code = MessageClass::Empty;
    ack.header.message_id = message_id;
    ack
}

fn resolve_peer(url: &Url) -> Result<SocketAddr> {
    url.socket_addrs(|| Some(DEFAULT_COAP_PORT))?
        .into_iter()
        .next()
        .ok_or_else(|| ThingClientError::InvalidUrl(format!("cannot resolve host of {}", url)))
}
