//! Software model of a PCA9685 sitting on a two-wire bus.
//!
//! The model keeps the full register file, honours the auto-increment bit,
//! the sleep-gated prescaler, the broadcast `ALL_LED` block, sub-address and
//! all-call matching, and the general-call software reset. Every transaction
//! is logged so tests can assert exact bus sequences.
use std::collections::VecDeque;

use pca_traits::{Bus, DEFAULT_BUFFER_LEN};
use tracing::trace;

/// Default 7-bit address of a module with all address pins low.
pub const DEFAULT_ADDRESS: u8 = 0x40;

const GENERAL_CALL: u8 = 0x00;
const SWRST: u8 = 0x06;

const MODE1: u8 = 0x00;
const MODE2: u8 = 0x01;
const SUBADR1: u8 = 0x02;
const SUBADR2: u8 = 0x03;
const SUBADR3: u8 = 0x04;
const ALLCALLADR: u8 = 0x05;
const LED0: u8 = 0x06;
const LED15_END: u8 = 0x45;
const ALL_LED: u8 = 0xFA;
const ALL_LED_END: u8 = 0xFD;
const PRE_SCALE: u8 = 0xFE;

const MODE1_AI: u8 = 0x20;
const MODE1_SLEEP: u8 = 0x10;
const MODE1_SUB1: u8 = 0x08;
const MODE1_SUB2: u8 = 0x04;
const MODE1_SUB3: u8 = 0x02;
const MODE1_ALLCALL: u8 = 0x01;

const STATUS_OK: u8 = 0;
const STATUS_TOO_LONG: u8 = 1;
const STATUS_ADDR_NACK: u8 = 2;
const STATUS_OTHER: u8 = 4;

/// One completed bus transaction as seen by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write {
        address: u8,
        bytes: Vec<u8>,
        status: u8,
    },
    Read {
        address: u8,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Module,
    Proxy,
    GeneralCall,
}

/// Simulated PCA9685 implementing [`Bus`] directly.
#[derive(Debug, Clone)]
pub struct SimulatedPca9685 {
    address: u8,
    regs: [u8; 256],
    pointer: u8,
    buffer_len: usize,
    tx_address: Option<u8>,
    tx: Vec<u8>,
    tx_overflow: bool,
    rx: VecDeque<u8>,
    log: Vec<Transaction>,
    writes_seen: usize,
    faults: Vec<(usize, u8)>,
    short_read: Option<usize>,
    offline: bool,
}

impl Default for SimulatedPca9685 {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS)
    }
}

impl SimulatedPca9685 {
    pub fn new(address: u8) -> Self {
        let mut sim = SimulatedPca9685 {
            address: address & 0x7F,
            regs: [0; 256],
            pointer: 0,
            buffer_len: DEFAULT_BUFFER_LEN,
            tx_address: None,
            tx: Vec::with_capacity(DEFAULT_BUFFER_LEN),
            tx_overflow: false,
            rx: VecDeque::new(),
            log: Vec::new(),
            writes_seen: 0,
            faults: Vec::new(),
            short_read: None,
            offline: false,
        };
        sim.power_on_reset();
        sim
    }

    /// Override the transport transmit buffer size.
    pub fn with_buffer_len(mut self, len: usize) -> Self {
        self.buffer_len = len.max(1);
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    /// Raw `(begin, end)` register pair of a channel, sentinel bits included.
    pub fn phase_window(&self, channel: u8) -> (u16, u16) {
        let base = (LED0 + 4 * (channel & 0x0F)) as usize;
        let begin = u16::from_le_bytes([self.regs[base], self.regs[base + 1]]);
        let end = u16::from_le_bytes([self.regs[base + 2], self.regs[base + 3]]);
        (begin, end)
    }

    pub fn log(&self) -> &[Transaction] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Number of write transactions completed so far, failed ones included.
    pub fn writes_seen(&self) -> usize {
        self.writes_seen
    }

    /// Make the `nth` upcoming write transaction (0 = the next one) fail with
    /// `status` without touching any register.
    pub fn fail_write(&mut self, nth: usize, status: u8) {
        self.faults.push((self.writes_seen + nth, status));
    }

    /// Deliver only `available` bytes on the next read request.
    pub fn short_read_next(&mut self, available: usize) {
        self.short_read = Some(available);
    }

    /// When offline the device NACKs its address and returns no data.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn power_on_reset(&mut self) {
        self.regs = [0; 256];
        self.regs[MODE1 as usize] = MODE1_SLEEP | MODE1_ALLCALL;
        self.regs[MODE2 as usize] = 0x04;
        self.regs[SUBADR1 as usize] = 0xE2;
        self.regs[SUBADR2 as usize] = 0xE4;
        self.regs[SUBADR3 as usize] = 0xE8;
        self.regs[ALLCALLADR as usize] = 0xE0;
        for ch in 0..16u8 {
            // LEDn_OFF_H power-on value: full off.
            self.regs[(LED0 + 4 * ch + 3) as usize] = 0x10;
        }
        self.regs[PRE_SCALE as usize] = 0x1E;
        self.pointer = 0;
    }

    fn target(&self, address: u8) -> Option<Target> {
        if address == self.address {
            return Some(Target::Module);
        }
        if address == GENERAL_CALL {
            return Some(Target::GeneralCall);
        }
        let mode1 = self.regs[MODE1 as usize];
        let proxies = [
            (MODE1_ALLCALL, ALLCALLADR),
            (MODE1_SUB1, SUBADR1),
            (MODE1_SUB2, SUBADR2),
            (MODE1_SUB3, SUBADR3),
        ];
        proxies
            .iter()
            .any(|&(bit, reg)| mode1 & bit != 0 && self.regs[reg as usize] >> 1 == address)
            .then_some(Target::Proxy)
    }

    fn next_pointer(&self, reg: u8) -> u8 {
        if self.regs[MODE1 as usize] & MODE1_AI != 0 {
            reg.wrapping_add(1)
        } else {
            reg
        }
    }

    fn store(&mut self, reg: u8, value: u8) {
        match reg {
            PRE_SCALE => {
                // Writes are blocked while the oscillator runs.
                if self.regs[MODE1 as usize] & MODE1_SLEEP != 0 {
                    self.regs[PRE_SCALE as usize] = value.max(3);
                }
            }
            ALL_LED..=ALL_LED_END => {
                let offset = reg - ALL_LED;
                for ch in 0..16u8 {
                    self.regs[(LED0 + 4 * ch + offset) as usize] = value;
                }
            }
            r if r > LED15_END && r < ALL_LED => {}
            r => self.regs[r as usize] = value,
        }
    }

    fn load(&self, reg: u8) -> u8 {
        match reg {
            ALL_LED..=ALL_LED_END => 0,
            r => self.regs[r as usize],
        }
    }

    fn apply_write(&mut self, target: Target, bytes: &[u8]) {
        if target == Target::GeneralCall {
            if bytes.first() == Some(&SWRST) {
                trace!("sim: software reset");
                self.power_on_reset();
            }
            return;
        }
        let Some((&reg, data)) = bytes.split_first() else {
            return;
        };
        let mut ptr = reg;
        for &b in data {
            self.store(ptr, b);
            ptr = self.next_pointer(ptr);
        }
        if target == Target::Module {
            self.pointer = if data.is_empty() { reg } else { ptr };
        }
    }
}

impl Bus for SimulatedPca9685 {
    fn begin_transmission(&mut self, address: u8) {
        self.tx_address = Some(address);
        self.tx.clear();
        self.tx_overflow = false;
    }

    fn write(&mut self, byte: u8) -> usize {
        if self.tx_address.is_none() || self.tx.len() >= self.buffer_len {
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
        let bytes = std::mem::take(&mut self.tx);
        let index = self.writes_seen;
        self.writes_seen += 1;

        let fault = self
            .faults
            .iter()
            .position(|&(at, _)| at == index)
            .map(|i| self.faults.swap_remove(i).1);
        let status = if self.tx_overflow {
            STATUS_TOO_LONG
        } else if let Some(code) = fault {
            code
        } else if self.offline {
            STATUS_ADDR_NACK
        } else {
            match self.target(address) {
                Some(target) => {
                    self.apply_write(target, &bytes);
                    STATUS_OK
                }
                None => STATUS_ADDR_NACK,
            }
        };
        trace!(address, len = bytes.len(), status, "sim: write");
        self.log.push(Transaction::Write {
            address,
            bytes,
            status,
        });
        status
    }

    fn request_from(&mut self, address: u8, len: usize) -> usize {
        self.rx.clear();
        if self.offline || address != self.address {
            return 0;
        }
        let n = self.short_read.take().map_or(len, |n| n.min(len));
        for _ in 0..n {
            let b = self.load(self.pointer);
            self.rx.push_back(b);
            self.pointer = self.next_pointer(self.pointer);
        }
        trace!(address, requested = len, delivered = n, "sim: read");
        self.log.push(Transaction::Read {
            address,
            bytes: self.rx.iter().copied().collect(),
        });
        n
    }

    fn read(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }

    fn buffer_len(&self) -> usize {
        self.buffer_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state_reads_full_off() {
        let sim = SimulatedPca9685::default();
        for ch in 0..16 {
            assert_eq!(sim.phase_window(ch), (0, 0x1000));
        }
        assert_eq!(sim.register(PRE_SCALE), 0x1E);
    }

    #[test]
    fn unknown_address_is_nacked() {
        let mut sim = SimulatedPca9685::default();
        sim.begin_transmission(0x41);
        sim.write(0x00);
        assert_eq!(sim.end_transmission(), STATUS_ADDR_NACK);
        assert_eq!(sim.request_from(0x41, 1), 0);
    }
}
