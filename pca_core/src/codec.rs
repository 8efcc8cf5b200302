//! Register codec: turns register reads and writes into bus transactions.
//!
//! Every transaction clears the last error when it begins and records the
//! transport status when it ends, so `last_error` always reflects the most
//! recent bus operation.

use pca_traits::{Bus, BusError};
use tracing::{trace, warn};

use crate::config::PhaseByteOrder;
use crate::phase::PhaseWindow;

/// Bytes per channel register block.
pub const CHANNEL_BLOCK_LEN: usize = 4;

#[derive(Debug)]
pub struct RegisterCodec<B> {
    bus: B,
    address: u8,
    byte_order: PhaseByteOrder,
    last_error: Option<BusError>,
}

impl<B: Bus> RegisterCodec<B> {
    pub fn new(bus: B, address: u8) -> Self {
        Self {
            bus,
            address,
            byte_order: PhaseByteOrder::default(),
            last_error: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn set_address(&mut self, address: u8) {
        self.address = address;
    }

    pub fn byte_order(&self) -> PhaseByteOrder {
        self.byte_order
    }

    pub fn set_byte_order(&mut self, order: PhaseByteOrder) {
        self.byte_order = order;
    }

    pub fn last_error(&self) -> Option<BusError> {
        self.last_error
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Channel blocks that fit in one transaction after the register byte.
    pub fn channels_per_transaction(&self) -> usize {
        (self.bus.buffer_len().saturating_sub(1) / CHANNEL_BLOCK_LEN).max(1)
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        trace!(reg, value, "write register");
        self.transmit(self.address, &[reg, value])
    }

    pub fn read_register(&mut self, reg: u8) -> Result<u8, BusError> {
        let [value] = self.read_block::<1>(reg)?;
        trace!(reg, value, "read register");
        Ok(value)
    }

    /// Write consecutive channel blocks starting at `reg` in one transaction.
    pub fn write_phase_windows(&mut self, reg: u8, windows: &[PhaseWindow]) -> Result<(), BusError> {
        let mut bytes = Vec::with_capacity(1 + windows.len() * CHANNEL_BLOCK_LEN);
        bytes.push(reg);
        for w in windows {
            trace!(reg, begin = w.begin, end = w.end, "write phase window");
            bytes.extend_from_slice(&self.encode(*w));
        }
        self.transmit(self.address, &bytes)
    }

    pub fn read_phase_window(&mut self, reg: u8) -> Result<PhaseWindow, BusError> {
        let raw = self.read_block::<CHANNEL_BLOCK_LEN>(reg)?;
        let w = self.decode(raw);
        trace!(reg, begin = w.begin, end = w.end, "read phase window");
        Ok(w)
    }

    /// Raw transaction to an arbitrary address (general call, proxies).
    pub fn transmit(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        self.last_error = None;
        self.bus.begin_transmission(address);
        let accepted: usize = bytes.iter().map(|&b| self.bus.write(b)).sum();
        let status = self.bus.end_transmission();
        let result = match BusError::from_status(status) {
            Some(err) => Err(err),
            None if accepted < bytes.len() => Err(BusError::DataTooLong),
            None => Ok(()),
        };
        self.record(result)
    }

    fn read_block<const N: usize>(&mut self, reg: u8) -> Result<[u8; N], BusError> {
        self.transmit(self.address, &[reg])?;
        let available = self.bus.request_from(self.address, N);
        if available != N {
            // Drain whatever arrived so the next transaction starts clean.
            for _ in 0..available {
                self.bus.read();
            }
            return self.record(Err(BusError::SHORT_READ));
        }
        let mut out = [0u8; N];
        for b in out.iter_mut() {
            *b = self.bus.read();
        }
        Ok(out)
    }

    fn record<T>(&mut self, result: Result<T, BusError>) -> Result<T, BusError> {
        if let Err(e) = &result {
            warn!(address = self.address, code = e.code(), error = %e, "bus error");
            self.last_error = Some(*e);
        }
        result
    }

    fn encode(&self, w: PhaseWindow) -> [u8; CHANNEL_BLOCK_LEN] {
        let [bl, bh] = w.begin.to_le_bytes();
        let [el, eh] = w.end.to_le_bytes();
        match self.byte_order {
            PhaseByteOrder::BeginEnd => [bl, bh, el, eh],
            PhaseByteOrder::EndBegin => [el, eh, bl, bh],
        }
    }

    fn decode(&self, raw: [u8; CHANNEL_BLOCK_LEN]) -> PhaseWindow {
        let first = u16::from_le_bytes([raw[0], raw[1]]);
        let second = u16::from_le_bytes([raw[2], raw[3]]);
        match self.byte_order {
            PhaseByteOrder::BeginEnd => PhaseWindow::new(first, second),
            PhaseByteOrder::EndBegin => PhaseWindow::new(second, first),
        }
    }
}
