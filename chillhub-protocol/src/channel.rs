//! The serial channel to the hub
//!
//! One [`Channel`] owns everything the link needs: the UART, the ring
//! buffer, the scanner, the handler registry and the counters. The
//! application drives it by calling [`Channel::poll`] from its main loop;
//! each call moves a bounded burst of bytes off the UART and scans
//! everything buffered.

use chillhub_hal::{Uart, UartTx};

use crate::config::{ChannelConfig, OverflowPolicy};
use crate::diagnostics::{Diagnostic, DiagnosticHook, Stats};
use crate::dispatch::{category_for, dispatch};
use crate::encoder::{encode_to_vec, EncodeError};
use crate::frame::validate;
use crate::messages::{HubRequest, Value};
use crate::registry::{Handler, Key, Registry, RegistryFull};
use crate::ring::RingBuffer;
use crate::scanner::{FrameScanner, ScanState, Step};

/// Default ring buffer capacity
pub const DEFAULT_RING_SIZE: usize = 64;

/// Default frame accumulator capacity (largest LEN accepted is this minus 2)
pub const DEFAULT_FRAME_SIZE: usize = 64;

/// Default number of handler slots
pub const DEFAULT_HANDLER_SLOTS: usize = 16;

/// Errors from the outbound side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError<E> {
    Encode(EncodeError),
    Registry(RegistryFull),
    Uart(E),
}

impl<E> From<EncodeError> for SendError<E> {
    fn from(err: EncodeError) -> Self {
        SendError::Encode(err)
    }
}

impl<E> From<RegistryFull> for SendError<E> {
    fn from(err: RegistryFull) -> Self {
        SendError::Registry(err)
    }
}

/// Serial channel over UART `U`, delivering messages to context `C`
pub struct Channel<
    U,
    C,
    const RING: usize = DEFAULT_RING_SIZE,
    const FRAME: usize = DEFAULT_FRAME_SIZE,
    const SLOTS: usize = DEFAULT_HANDLER_SLOTS,
> {
    uart: U,
    config: ChannelConfig,
    ring: RingBuffer<RING>,
    scanner: FrameScanner<FRAME>,
    registry: Registry<C, SLOTS>,
    stats: Stats,
    hook: Option<DiagnosticHook>,
}

impl<U, C, const RING: usize, const FRAME: usize, const SLOTS: usize>
    Channel<U, C, RING, FRAME, SLOTS>
where
    U: Uart,
{
    pub fn new(uart: U, config: ChannelConfig) -> Self {
        Self {
            uart,
            config,
            ring: RingBuffer::new(),
            scanner: FrameScanner::new(),
            registry: Registry::new(),
            stats: Stats::default(),
            hook: None,
        }
    }

    /// Pump the link once: pull received bytes, then scan them
    ///
    /// The scanner is stepped until it stops consuming bytes, so every
    /// frame completed by this burst is dispatched before the next one
    /// arrives. Never blocks and never fails; dropped data is reported
    /// through the diagnostic hook and [`Channel::stats`].
    pub fn poll(&mut self, ctx: &mut C) {
        self.pump_rx();

        loop {
            let before = self.ring.bytes_used();
            let diagnostic = match self.scanner.step(&mut self.ring) {
                Step::Pending if self.ring.bytes_used() == before => break,
                Step::Pending => continue,
                Step::Oversized { length } => Diagnostic::Oversized { length },
                Step::Complete(raw) => match validate(raw) {
                    Err(err) => Diagnostic::Invalid(err),
                    Ok(frame) => {
                        let reserved = self.config.reserved_msg_max;
                        match dispatch(&frame, &mut self.registry, ctx, reserved) {
                            Ok(delivery) => Diagnostic::Delivered(delivery),
                            Err(err) => Diagnostic::Dropped(err),
                        }
                    }
                },
            };
            self.report(diagnostic);
        }
    }

    fn pump_rx(&mut self) {
        for _ in 0..self.config.rx_burst {
            if !self.uart.byte_available() {
                break;
            }
            let byte = match self.uart.read_byte() {
                Ok(byte) => byte,
                Err(_) => {
                    self.report(Diagnostic::UartRead);
                    continue;
                }
            };
            self.stats.bytes_received = self.stats.bytes_received.saturating_add(1);

            match self.config.overflow {
                OverflowPolicy::EvictOldest => {
                    if let Some(evicted) = self.ring.write_evicting(byte) {
                        self.report(Diagnostic::Evicted { byte: evicted });
                    }
                }
                OverflowPolicy::DropNewest => {
                    if self.ring.write(byte).is_err() {
                        self.report(Diagnostic::Rejected { byte });
                    }
                }
            }
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        log_diagnostic(&diagnostic);
        self.stats.record(&diagnostic);
        if let Some(hook) = self.hook {
            hook(&diagnostic);
        }
    }

    /// Install a callback that sees every receive-side diagnostic
    pub fn set_diagnostic_hook(&mut self, hook: Option<DiagnosticHook>) {
        self.hook = hook;
    }

    /// Install `handler` for `key`, replacing any previous one
    pub fn register(&mut self, key: Key, handler: Handler<C>) -> Result<(), RegistryFull> {
        self.registry.register(key, handler).map(|_| ())
    }

    /// Unregister `key`, returning its handler if there was one
    pub fn remove(&mut self, key: Key) -> Option<Handler<C>> {
        self.registry.remove(key)
    }

    /// Encode and transmit one request, flushing the UART
    pub fn send(
        &mut self,
        request: &HubRequest<'_>,
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        let body = request.to_body()?;
        let wire = encode_to_vec(&body)?;
        self.uart.write_bytes(&wire).map_err(SendError::Uart)?;
        self.uart.flush().map_err(SendError::Uart)
    }

    /// Install `handler` for `key`, then send `request`
    ///
    /// If the request cannot be sent the registry is put back as it was.
    fn register_and_send(
        &mut self,
        key: Key,
        handler: Handler<C>,
        request: &HubRequest<'_>,
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        let previous = self.registry.register(key, handler)?;
        let sent = self.send(request);
        if sent.is_err() {
            match previous {
                // Key is present, so this cannot hit the capacity limit
                Some(handler) => {
                    let _ = self.registry.register(key, handler);
                }
                None => {
                    self.registry.remove(key);
                }
            }
        }
        sent
    }

    pub fn send_value(
        &mut self,
        msg_type: u8,
        value: Value,
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        self.send(&HubRequest::Value { msg_type, value })
    }

    /// Announce this device to the hub
    pub fn set_device_id(
        &mut self,
        name: &str,
        uuid: &str,
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        self.send(&HubRequest::DeviceId { name, uuid })
    }

    /// Register `handler` for a message type and ask the hub to forward it
    pub fn subscribe(
        &mut self,
        msg_type: u8,
        handler: Handler<C>,
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        let key = Key::new(category_for(msg_type, self.config.reserved_msg_max), msg_type);
        self.register_and_send(key, handler, &HubRequest::Subscribe(msg_type))
    }

    /// Ask the hub to stop forwarding `msg_type` and drop its handler
    ///
    /// The handler is removed even if the request fails to send.
    pub fn unsubscribe(&mut self, msg_type: u8) -> Result<(), SendError<<U as UartTx>::Error>> {
        let key = Key::new(category_for(msg_type, self.config.reserved_msg_max), msg_type);
        let sent = self.send(&HubRequest::Unsubscribe(msg_type));
        self.registry.remove(key);
        sent
    }

    /// Install a cron alarm; `handler` runs on every notification for `id`
    pub fn set_alarm(
        &mut self,
        id: u8,
        cron: &str,
        handler: fn(&mut C, [u8; 4]),
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        self.register_and_send(
            Key::alarm(id),
            Handler::Timestamp(handler),
            &HubRequest::SetAlarm { id, cron },
        )
    }

    /// Cancel alarm `id` on the hub and drop its handler
    pub fn unset_alarm(&mut self, id: u8) -> Result<(), SendError<<U as UartTx>::Error>> {
        let sent = self.send(&HubRequest::UnsetAlarm(id));
        self.registry.remove(Key::alarm(id));
        sent
    }

    /// Request the hub's time; `handler` runs once for the response
    pub fn get_time(
        &mut self,
        handler: fn(&mut C, [u8; 4]),
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        self.register_and_send(Key::time(), Handler::Timestamp(handler), &HubRequest::GetTime)
    }

    /// Listen for a user-defined message; nothing is sent to the hub
    pub fn add_cloud_listener(
        &mut self,
        msg_type: u8,
        handler: Handler<C>,
    ) -> Result<(), RegistryFull> {
        self.register(Key::cloud(msg_type), handler)
    }

    pub fn register_resource(
        &mut self,
        name: &str,
        res_id: u8,
        can_update: bool,
        initial: Value,
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        self.send(&HubRequest::RegisterResource {
            name,
            res_id,
            can_update,
            initial,
        })
    }

    pub fn update_resource(
        &mut self,
        res_id: u8,
        value: Value,
    ) -> Result<(), SendError<<U as UartTx>::Error>> {
        self.send(&HubRequest::UpdateResource { res_id, value })
    }

    /// Handlers currently installed
    pub fn registry(&self) -> &Registry<C, SLOTS> {
        &self.registry
    }

    /// Snapshot of the receive counters
    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn scan_state(&self) -> ScanState {
        self.scanner.state()
    }

    /// Unread bytes waiting in the ring buffer
    pub fn buffered(&self) -> usize {
        self.ring.bytes_used()
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Drop buffered input and any partial frame; handlers stay registered
    pub fn reset(&mut self) {
        self.ring.clear();
        self.scanner.reset();
    }

    /// Tear down the channel and hand the UART back
    pub fn release(self) -> U {
        self.uart
    }
}

#[cfg(feature = "defmt")]
fn log_diagnostic(diagnostic: &Diagnostic) {
    if diagnostic.is_loss() {
        defmt::warn!("hub rx: {}", diagnostic);
    } else {
        defmt::debug!("hub rx: {}", diagnostic);
    }
}

#[cfg(not(feature = "defmt"))]
fn log_diagnostic(_diagnostic: &Diagnostic) {}
