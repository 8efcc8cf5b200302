use std::collections::VecDeque;

use pca_traits::{Bus, DEFAULT_BUFFER_LEN};
use rppal::i2c::I2c;
use tracing::{trace, warn};

use crate::error::{HwError, Result};

// errno values the i2c-dev driver reports for a missing acknowledge.
const ENXIO: i32 = 6;
const EREMOTEIO: i32 = 121;

const STATUS_OK: u8 = 0;
const STATUS_TOO_LONG: u8 = 1;
const STATUS_ADDR_NACK: u8 = 2;
const STATUS_OTHER: u8 = 4;

/// Linux `/dev/i2c-N` transport.
///
/// Queued bytes are sent as a single `write` when the transaction ends;
/// `request_from` issues a single `read` of the requested length.
pub struct I2cBus {
    i2c: I2c,
    slave: Option<u8>,
    tx_address: Option<u8>,
    tx: Vec<u8>,
    tx_overflow: bool,
    rx: VecDeque<u8>,
    buffer_len: usize,
}

impl I2cBus {
    pub fn open(bus: u8) -> Result<Self> {
        let i2c = I2c::with_bus(bus).map_err(|e| {
            warn!(bus, error = %e, "open i2c bus");
            HwError::NoSuchBus(bus)
        })?;
        Ok(Self {
            i2c,
            slave: None,
            tx_address: None,
            tx: Vec::with_capacity(DEFAULT_BUFFER_LEN),
            tx_overflow: false,
            rx: VecDeque::new(),
            buffer_len: DEFAULT_BUFFER_LEN,
        })
    }

    /// Clock speed reported by the kernel driver.
    pub fn clock_speed(&self) -> Result<u32> {
        self.i2c
            .clock_speed()
            .map_err(|e| HwError::I2c(e.to_string()))
    }

    fn select(&mut self, address: u8) -> std::result::Result<(), rppal::i2c::Error> {
        if self.slave != Some(address) {
            self.i2c.set_slave_address(u16::from(address))?;
            self.slave = Some(address);
        }
        Ok(())
    }
}

fn status_for(err: &rppal::i2c::Error) -> u8 {
    match err {
        rppal::i2c::Error::Io(io) => match io.raw_os_error() {
            Some(ENXIO) | Some(EREMOTEIO) => STATUS_ADDR_NACK,
            _ => STATUS_OTHER,
        },
        _ => STATUS_OTHER,
    }
}

impl Bus for I2cBus {
    fn begin_transmission(&mut self, address: u8) {
        self.tx_address = Some(address);
        self.tx.clear();
        self.tx_overflow = false;
    }

    fn write(&mut self, byte: u8) -> usize {
        if self.tx.len() >= self.buffer_len {
            self.tx_overflow = true;
            return 0;
        }
        self.tx.push(byte);
        1
    }

    fn end_transmission(&mut self) -> u8 {
        let Some(address) = self.tx_address.take() else {
            return STATUS_OTHER;
        };
        if self.tx_overflow {
            return STATUS_TOO_LONG;
        }
        let bytes = std::mem::take(&mut self.tx);
        let result = self
            .select(address)
            .and_then(|()| self.i2c.write(&bytes).map(|_| ()));
        match result {
            Ok(()) => {
                trace!(address, len = bytes.len(), "i2c write");
                STATUS_OK
            }
            Err(e) => {
                warn!(address, error = %e, "i2c write failed");
                status_for(&e)
            }
        }
    }

    fn request_from(&mut self, address: u8, len: usize) -> usize {
        self.rx.clear();
        let mut buf = vec![0u8; len];
        let result = self
            .select(address)
            .and_then(|()| self.i2c.read(&mut buf));
        match result {
            Ok(n) => {
                self.rx.extend(&buf[..n.min(len)]);
                trace!(address, requested = len, delivered = n, "i2c read");
                self.rx.len()
            }
            Err(e) => {
                warn!(address, error = %e, "i2c read failed");
                0
            }
        }
    }

    fn read(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }

    fn buffer_len(&self) -> usize {
        self.buffer_len
    }
}
