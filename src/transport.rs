//! Modbus-TCP transport layer
//!
//! Owns the socket, MBAP framing, transaction-id bookkeeping, and the
//! per-request deadline. One request is in flight at a time; the response is
//! matched to its request by transaction id and anything else on the wire is
//! a protocol error.
//!
//! The [`ModbusTransport`] trait is the seam the rest of the crate is built
//! against; [`ModbusConnector`] abstracts "open a fresh transport," which the
//! poll coordinator does once per cycle.

use std::fmt;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

use crate::constants::{MAX_MBAP_LENGTH, MBAP_HEADER_LEN};
use crate::error::{ModbusError, ModbusResult};
use crate::pdu::ModbusPdu;

// ============================================================================
// Request / Response
// ============================================================================

/// The two request shapes the controller is driven with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// FC03
    ReadHolding { address: u16, count: u16 },
    /// FC06
    WriteSingle { address: u16, value: u16 },
}

/// A single Modbus request, addressed to one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModbusRequest {
    pub unit_id: u8,
    pub kind: RequestKind,
}

impl ModbusRequest {
    /// FC03 request
    #[inline]
    pub fn read_holding(unit_id: u8, address: u16, count: u16) -> Self {
        Self {
            unit_id,
            kind: RequestKind::ReadHolding { address, count },
        }
    }

    /// FC06 request
    #[inline]
    pub fn write_single(unit_id: u8, address: u16, value: u16) -> Self {
        Self {
            unit_id,
            kind: RequestKind::WriteSingle { address, value },
        }
    }

    /// Build the request PDU
    pub fn to_pdu(&self) -> ModbusResult<ModbusPdu> {
        match self.kind {
            RequestKind::ReadHolding { address, count } => ModbusPdu::read_holding(address, count),
            RequestKind::WriteSingle { address, value } => ModbusPdu::write_single(address, value),
        }
    }

    /// Short description for logs and timeout errors
    pub fn describe(&self) -> String {
        match self.kind {
            RequestKind::ReadHolding { address, count } => {
                format!("FC03 read {}+{}", address, count)
            }
            RequestKind::WriteSingle { address, value } => {
                format!("FC06 write {}={}", address, value)
            }
        }
    }
}

/// A well-formed response frame
///
/// Exception responses are well-formed: they are returned as responses here
/// and mapped to errors when the PDU is parsed. The unit-id convention shim
/// depends on that distinction to tell "device answered" from "nothing
/// there."
#[derive(Debug, Clone)]
pub struct ModbusResponse {
    pub transaction_id: u16,
    pub unit_id: u8,
    pdu: ModbusPdu,
}

impl ModbusResponse {
    pub fn new(transaction_id: u16, unit_id: u8, pdu: ModbusPdu) -> Self {
        Self {
            transaction_id,
            unit_id,
            pdu,
        }
    }

    /// The response PDU
    #[inline]
    pub fn pdu(&self) -> &ModbusPdu {
        &self.pdu
    }

    /// Whether the device answered with a Modbus exception
    #[inline]
    pub fn is_exception(&self) -> bool {
        self.pdu.is_exception()
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Transport statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub errors: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl fmt::Display for TransportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requests, {} responses, {} errors, {} B out, {} B in",
            self.requests_sent,
            self.responses_received,
            self.errors,
            self.bytes_sent,
            self.bytes_received
        )
    }
}

/// One-request-at-a-time Modbus transport
pub trait ModbusTransport: Send {
    /// Send a request and await its matching response
    fn request(
        &mut self,
        request: &ModbusRequest,
    ) -> impl std::future::Future<Output = ModbusResult<ModbusResponse>> + Send;

    /// Whether the transport considers itself connected
    fn is_connected(&self) -> bool;

    /// Close the transport
    fn close(&mut self) -> impl std::future::Future<Output = ModbusResult<()>> + Send;

    /// Counters accumulated over the transport's lifetime
    fn stats(&self) -> TransportStats;
}

/// Factory for fresh transports
///
/// The poll coordinator discards its connection at the end of every cycle
/// and asks the connector for a new one at the start of the next.
pub trait ModbusConnector: Send + Sync {
    type Transport: ModbusTransport;

    fn connect(&self) -> impl std::future::Future<Output = ModbusResult<Self::Transport>> + Send;
}

// ============================================================================
// MBAP Framing
// ============================================================================

/// Parsed MBAP header (the 6 fixed bytes plus the unit id)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MbapHeader {
    pub transaction_id: u16,
    pub unit_id: u8,
    /// Remaining PDU length after the unit id byte
    pub pdu_len: usize,
}

/// Encode a request frame: MBAP header + unit id + PDU
pub(crate) fn encode_frame(transaction_id: u16, unit_id: u8, pdu: &ModbusPdu) -> Bytes {
    let mut frame = BytesMut::with_capacity(MBAP_HEADER_LEN + 1 + pdu.len());
    frame.put_u16(transaction_id);
    frame.put_u16(0); // protocol id
    frame.put_u16(1 + pdu.len() as u16); // unit id + PDU
    frame.put_u8(unit_id);
    frame.put_slice(pdu.as_slice());
    frame.freeze()
}

/// Validate and split a received 7-byte header
pub(crate) fn parse_header(header: &[u8; 7]) -> ModbusResult<MbapHeader> {
    let transaction_id = u16::from_be_bytes([header[0], header[1]]);
    let protocol_id = u16::from_be_bytes([header[2], header[3]]);
    let length = u16::from_be_bytes([header[4], header[5]]) as usize;
    let unit_id = header[6];

    if protocol_id != 0 {
        return Err(ModbusError::protocol(format!(
            "Invalid protocol id: {protocol_id} (expected 0)"
        )));
    }
    if length < 2 || length > MAX_MBAP_LENGTH {
        return Err(ModbusError::protocol(format!(
            "Invalid MBAP length: {length}"
        )));
    }

    Ok(MbapHeader {
        transaction_id,
        unit_id,
        pdu_len: length - 1,
    })
}

// ============================================================================
// TCP Transport
// ============================================================================

/// Modbus-TCP transport over a single [`TcpStream`]
pub struct TcpTransport {
    stream: TcpStream,
    peer: String,
    timeout: Duration,
    next_transaction_id: u16,
    connected: bool,
    stats: TransportStats,
}

impl TcpTransport {
    /// Connect to `addr` with a connect (and per-request) deadline
    pub async fn connect<A: ToSocketAddrs + fmt::Debug>(
        addr: A,
        timeout: Duration,
    ) -> ModbusResult<Self> {
        let peer = format!("{addr:?}");
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ModbusError::timeout(format!("connect {peer}"), timeout.as_millis() as u64))??;

        // Request/response traffic, one small frame at a time
        stream.set_nodelay(true)?;

        info!("Connected to Modbus device at {peer}");
        Ok(Self {
            stream,
            peer,
            timeout,
            next_transaction_id: 0,
            connected: true,
            stats: TransportStats::default(),
        })
    }

    /// The peer this transport was opened against
    #[inline]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn next_transaction_id(&mut self) -> u16 {
        self.next_transaction_id = self.next_transaction_id.wrapping_add(1);
        self.next_transaction_id
    }

    async fn send_request(&mut self, transaction_id: u16, request: &ModbusRequest) -> ModbusResult<()> {
        let pdu = request.to_pdu()?;
        let frame = encode_frame(transaction_id, request.unit_id, &pdu);

        debug!(
            "TX txn={} unit={} {}: {} bytes",
            transaction_id,
            request.unit_id,
            request.describe(),
            frame.len()
        );

        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        self.stats.requests_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        Ok(())
    }

    async fn recv_response(&mut self, expected_transaction_id: u16) -> ModbusResult<ModbusResponse> {
        let mut header = [0u8; 7];
        self.stream.read_exact(&mut header).await?;
        let mbap = parse_header(&header)?;

        let mut pdu_buf = vec![0u8; mbap.pdu_len];
        self.stream.read_exact(&mut pdu_buf).await?;
        self.stats.bytes_received += (7 + mbap.pdu_len) as u64;

        if mbap.transaction_id != expected_transaction_id {
            return Err(ModbusError::protocol(format!(
                "Transaction id mismatch: sent {}, got {}",
                expected_transaction_id, mbap.transaction_id
            )));
        }

        let pdu = ModbusPdu::from_slice(&pdu_buf)?;
        debug!(
            "RX txn={} unit={}: {} bytes",
            mbap.transaction_id,
            mbap.unit_id,
            7 + mbap.pdu_len
        );

        self.stats.responses_received += 1;
        Ok(ModbusResponse::new(mbap.transaction_id, mbap.unit_id, pdu))
    }
}

impl ModbusTransport for TcpTransport {
    fn request(
        &mut self,
        request: &ModbusRequest,
    ) -> impl std::future::Future<Output = ModbusResult<ModbusResponse>> + Send {
        async move {
            if !self.connected {
                self.stats.errors += 1;
                return Err(ModbusError::connection("Transport is closed"));
            }

            let transaction_id = self.next_transaction_id();
            let deadline = self.timeout;
            let round_trip = async {
                self.send_request(transaction_id, request).await?;
                self.recv_response(transaction_id).await
            };

            let result = tokio::time::timeout(deadline, round_trip)
                .await
                .unwrap_or_else(|_| {
                    Err(ModbusError::timeout(
                        request.describe(),
                        deadline.as_millis() as u64,
                    ))
                });

            if result.is_err() {
                self.stats.errors += 1;
            }
            result
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn close(&mut self) -> impl std::future::Future<Output = ModbusResult<()>> + Send {
        async move {
            if self.connected {
                self.connected = false;
                self.stream.shutdown().await?;
                debug!("Closed connection to {}", self.peer);
            }
            Ok(())
        }
    }

    fn stats(&self) -> TransportStats {
        self.stats
    }
}

/// [`ModbusConnector`] producing [`TcpTransport`]s for one address
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    timeout: Duration,
}

impl TcpConnector {
    pub fn new<S: Into<String>>(addr: S, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// The address new transports connect to
    #[inline]
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl ModbusConnector for TcpConnector {
    type Transport = TcpTransport;

    fn connect(&self) -> impl std::future::Future<Output = ModbusResult<TcpTransport>> + Send {
        TcpTransport::connect(self.addr.clone(), self.timeout)
    }
}

// ============================================================================
// Mock transport (test support)
// ============================================================================

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::constants::FC_READ_HOLDING_REGISTERS;

    /// Register bank shared by every transport a [`MockConnector`] hands out
    #[derive(Default)]
    struct Bank {
        registers: HashMap<u16, u16>,
        faulted: HashSet<u16>,
    }

    enum Mode {
        /// Replays canned responses in FIFO order
        Scripted(Mutex<VecDeque<ModbusResult<ModbusResponse>>>),
        /// Simulates a device: reads serve the bank, writes update it
        Banked(Arc<Mutex<Bank>>),
    }

    /// Test transport: records every request, answers from a script or a
    /// register bank
    pub(crate) struct MockTransport {
        requests: Arc<Mutex<Vec<ModbusRequest>>>,
        mode: Mode,
        connected: bool,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                requests: Arc::new(Mutex::new(Vec::new())),
                mode: Mode::Scripted(Mutex::new(VecDeque::new())),
                connected: true,
            }
        }

        fn banked(bank: Arc<Mutex<Bank>>, requests: Arc<Mutex<Vec<ModbusRequest>>>) -> Self {
            Self { requests, mode: Mode::Banked(bank), connected: true }
        }

        /// Handle for inspecting requests after the transport is consumed
        pub fn request_log(&self) -> Arc<Mutex<Vec<ModbusRequest>>> {
            Arc::clone(&self.requests)
        }

        /// Queue a successful FC03 response carrying `values`
        pub fn push_registers(&self, values: &[u16]) {
            self.push_response(Ok(read_response(values)));
        }

        /// Queue a successful FC06 echo for `address`/`value`
        pub fn push_write_echo(&self, address: u16, value: u16) {
            let pdu = ModbusPdu::write_single(address, value).expect("mock pdu");
            self.push_response(Ok(ModbusResponse::new(0, 0, pdu)));
        }

        /// Queue an exception response for `function` with `code`
        pub fn push_exception(&self, function: u8, code: u8) {
            let pdu = ModbusPdu::from_slice(&[function | 0x80, code]).expect("mock pdu");
            self.push_response(Ok(ModbusResponse::new(0, 0, pdu)));
        }

        /// Queue a transport-level failure
        pub fn push_error(&self, error: ModbusError) {
            self.push_response(Err(error));
        }

        pub fn push_response(&self, response: ModbusResult<ModbusResponse>) {
            match &self.mode {
                Mode::Scripted(queue) => queue.lock().unwrap().push_back(response),
                Mode::Banked(_) => panic!("banked mock answers from its bank, not a script"),
            }
        }

        /// Get recorded requests for verification
        pub fn requests(&self) -> Vec<ModbusRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    fn read_response(values: &[u16]) -> ModbusResponse {
        let mut raw = Vec::with_capacity(2 + values.len() * 2);
        raw.push(FC_READ_HOLDING_REGISTERS);
        raw.push((values.len() * 2) as u8);
        for &value in values {
            raw.extend_from_slice(&value.to_be_bytes());
        }
        let pdu = ModbusPdu::from_slice(&raw).expect("mock pdu");
        ModbusResponse::new(0, 0, pdu)
    }

    fn serve_from_bank(bank: &Mutex<Bank>, request: &ModbusRequest) -> ModbusResult<ModbusResponse> {
        let mut bank = bank.lock().unwrap();
        match request.kind {
            RequestKind::ReadHolding { address, count } => {
                let mut values = Vec::with_capacity(count as usize);
                for offset in 0..count {
                    let target = address + offset;
                    if bank.faulted.contains(&target) {
                        return Err(ModbusError::connection(format!(
                            "Mock fault at register {target}"
                        )));
                    }
                    values.push(bank.registers.get(&target).copied().unwrap_or(0));
                }
                Ok(read_response(&values))
            }
            RequestKind::WriteSingle { address, value } => {
                if bank.faulted.contains(&address) {
                    return Err(ModbusError::connection(format!(
                        "Mock fault at register {address}"
                    )));
                }
                bank.registers.insert(address, value);
                let pdu = ModbusPdu::write_single(address, value).expect("mock pdu");
                Ok(ModbusResponse::new(0, 0, pdu))
            }
        }
    }

    impl ModbusTransport for MockTransport {
        fn request(
            &mut self,
            request: &ModbusRequest,
        ) -> impl std::future::Future<Output = ModbusResult<ModbusResponse>> + Send {
            self.requests.lock().unwrap().push(*request);

            let response = match &self.mode {
                Mode::Scripted(queue) => queue
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| Err(ModbusError::connection("No response prepared in mock"))),
                Mode::Banked(bank) => serve_from_bank(bank, request),
            };

            async move { response }
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn close(&mut self) -> impl std::future::Future<Output = ModbusResult<()>> + Send {
            self.connected = false;
            async { Ok(()) }
        }

        fn stats(&self) -> TransportStats {
            TransportStats::default()
        }
    }

    /// Simulated device for coordinator tests: every connect hands out a
    /// fresh transport over the same register bank, so state written in one
    /// session is visible in the next. Clones share the bank, which lets a
    /// test keep a control handle after the coordinator takes ownership.
    #[derive(Clone)]
    pub(crate) struct MockConnector {
        bank: Arc<Mutex<Bank>>,
        connect_failures: Arc<Mutex<u32>>,
        /// Request logs of transports handed out, oldest first
        sessions: Arc<Mutex<Vec<Arc<Mutex<Vec<ModbusRequest>>>>>>,
    }

    impl MockConnector {
        pub fn new() -> Self {
            Self {
                bank: Arc::new(Mutex::new(Bank::default())),
                connect_failures: Arc::new(Mutex::new(0)),
                sessions: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn set_register(&self, address: u16, value: u16) {
            self.bank.lock().unwrap().registers.insert(address, value);
        }

        pub fn register(&self, address: u16) -> Option<u16> {
            self.bank.lock().unwrap().registers.get(&address).copied()
        }

        /// Make every read or write touching `address` fail
        pub fn fail_register(&self, address: u16) {
            self.bank.lock().unwrap().faulted.insert(address);
        }

        pub fn clear_faults(&self) {
            self.bank.lock().unwrap().faulted.clear();
        }

        /// Make the next `n` connect attempts fail
        pub fn fail_next_connects(&self, n: u32) {
            *self.connect_failures.lock().unwrap() = n;
        }

        pub fn session_count(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }

        /// Request logs of every transport handed out so far
        pub fn session_logs(&self) -> Vec<Vec<ModbusRequest>> {
            self.sessions
                .lock()
                .unwrap()
                .iter()
                .map(|log| log.lock().unwrap().clone())
                .collect()
        }
    }

    impl ModbusConnector for MockConnector {
        type Transport = MockTransport;

        fn connect(&self) -> impl std::future::Future<Output = ModbusResult<MockTransport>> + Send {
            let result = {
                let mut failures = self.connect_failures.lock().unwrap();
                if *failures > 0 {
                    *failures -= 1;
                    Err(ModbusError::connection("connect refused (mock)"))
                } else {
                    let log = Arc::new(Mutex::new(Vec::new()));
                    self.sessions.lock().unwrap().push(Arc::clone(&log));
                    Ok(MockTransport::banked(Arc::clone(&self.bank), log))
                }
            };

            async move { result }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REQUEST_FRAME_LEN;

    #[test]
    fn test_request_frames_are_twelve_bytes() {
        for request in [
            ModbusRequest::read_holding(0, 1020, 3),
            ModbusRequest::write_single(0, 1208, 1),
        ] {
            let pdu = request.to_pdu().unwrap();
            let frame = encode_frame(1, request.unit_id, &pdu);
            assert_eq!(frame.len(), REQUEST_FRAME_LEN);
        }
    }

    #[test]
    fn test_encode_frame_layout() {
        let pdu = ModbusPdu::read_holding(1020, 3).unwrap();
        let frame = encode_frame(0x1234, 0xFF, &pdu);
        // txn, protocol id 0, length = 1 + 5, unit, then PDU
        assert_eq!(
            frame.as_ref(),
            &[0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0xFF, 0x03, 0x03, 0xFC, 0x00, 0x03]
        );
    }

    #[test]
    fn test_parse_header_roundtrip() {
        let header = [0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x00];
        let mbap = parse_header(&header).unwrap();
        assert_eq!(mbap.transaction_id, 0x1234);
        assert_eq!(mbap.unit_id, 0);
        assert_eq!(mbap.pdu_len, 5);
    }

    #[test]
    fn test_parse_header_rejects_nonzero_protocol_id() {
        let header = [0x00, 0x01, 0x00, 0x01, 0x00, 0x06, 0x00];
        assert!(parse_header(&header).is_err());
    }

    #[test]
    fn test_parse_header_rejects_bad_lengths() {
        // Length 1 leaves no PDU at all
        let header = [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00];
        assert!(parse_header(&header).is_err());

        // Length above the MBAP maximum
        let header = [0x00, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00];
        assert!(parse_header(&header).is_err());
    }

    async fn serve_one_frame(
        listener: tokio::net::TcpListener,
        respond: impl FnOnce(&[u8]) -> Vec<u8> + Send + 'static,
    ) {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; REQUEST_FRAME_LEN];
        socket.read_exact(&mut request).await.unwrap();
        let response = respond(&request);
        socket.write_all(&response).await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_roundtrip_against_local_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(serve_one_frame(listener, |request| {
            // Echo the transaction id, answer two registers
            vec![
                request[0], request[1], 0x00, 0x00, 0x00, 0x07, request[6], 0x03, 0x04, 0x00,
                0xAE, 0x00, 0x4B,
            ]
        }));

        let mut transport = TcpTransport::connect(addr, Duration::from_secs(1))
            .await
            .unwrap();
        let response = transport
            .request(&ModbusRequest::read_holding(0, 1020, 2))
            .await
            .unwrap();
        let registers = response.pdu().parse_read_registers(2).unwrap();
        assert_eq!(registers, vec![174, 75]);

        let stats = transport.stats();
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.responses_received, 1);
        assert_eq!(stats.bytes_sent, REQUEST_FRAME_LEN as u64);

        transport.close().await.unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_rejects_transaction_id_mismatch() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(serve_one_frame(listener, |request| {
            // Stale transaction id from "another" exchange
            let wrong = u16::from_be_bytes([request[0], request[1]]).wrapping_add(7);
            let mut frame = Vec::new();
            frame.extend_from_slice(&wrong.to_be_bytes());
            frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x05, request[6], 0x03, 0x02, 0x00, 0x01]);
            frame
        }));

        let mut transport = TcpTransport::connect(addr, Duration::from_secs(1))
            .await
            .unwrap();
        let err = transport
            .request(&ModbusRequest::read_holding(0, 1020, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ModbusError::Protocol { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_tcp_connect_failure() {
        // Port 1 on loopback is essentially never listening
        let result = TcpTransport::connect("127.0.0.1:1", Duration::from_millis(250)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_closed_transport_refuses_requests() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut transport = TcpTransport::connect(addr, Duration::from_secs(1))
            .await
            .unwrap();
        transport.close().await.unwrap();
        assert!(!transport.is_connected());

        let err = transport
            .request(&ModbusRequest::read_holding(0, 1001, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ModbusError::Connection { .. }));
    }
}
