use thiserror::Error;

/// Transmit buffer size of the common two-wire controller implementations.
pub const DEFAULT_BUFFER_LEN: usize = 32;

/// Non-zero status reported by [`Bus::end_transmission`], or a short read.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("data too long to fit in transmit buffer")]
    DataTooLong,
    #[error("received NACK on transmit of address")]
    AddressNack,
    #[error("received NACK on transmit of data")]
    DataNack,
    #[error("other bus error (code {0})")]
    Other(u8),
}

impl BusError {
    /// Status code recorded when fewer bytes arrive than were requested.
    pub const SHORT_READ: BusError = BusError::Other(4);

    /// Map a transport status code; 0 means success.
    pub fn from_status(code: u8) -> Option<Self> {
        match code {
            0 => None,
            1 => Some(BusError::DataTooLong),
            2 => Some(BusError::AddressNack),
            3 => Some(BusError::DataNack),
            other => Some(BusError::Other(other)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            BusError::DataTooLong => 1,
            BusError::AddressNack => 2,
            BusError::DataNack => 3,
            BusError::Other(c) => c,
        }
    }
}

/// Addressed two-wire bus transport.
///
/// Mirrors the transaction model of the common embedded wire libraries:
/// bytes written between `begin_transmission` and `end_transmission` are
/// queued and sent as one transaction; `request_from` reads a block into a
/// receive queue drained with `read`.
pub trait Bus {
    fn begin_transmission(&mut self, address: u8);
    /// Queue one byte, returning how many bytes were accepted (0 when the
    /// transmit buffer is full).
    fn write(&mut self, byte: u8) -> usize;
    /// Send the queued transaction and return its status code.
    fn end_transmission(&mut self) -> u8;
    /// Read `len` bytes from `address`, returning how many are available.
    fn request_from(&mut self, address: u8, len: usize) -> usize;
    fn read(&mut self) -> u8;

    /// Largest transaction (register byte included) the transport can send.
    fn buffer_len(&self) -> usize {
        DEFAULT_BUFFER_LEN
    }
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn begin_transmission(&mut self, address: u8) {
        (**self).begin_transmission(address)
    }
    fn write(&mut self, byte: u8) -> usize {
        (**self).write(byte)
    }
    fn end_transmission(&mut self) -> u8 {
        (**self).end_transmission()
    }
    fn request_from(&mut self, address: u8, len: usize) -> usize {
        (**self).request_from(address, len)
    }
    fn read(&mut self) -> u8 {
        (**self).read()
    }
    fn buffer_len(&self) -> usize {
        (**self).buffer_len()
    }
}

impl<B: Bus + ?Sized> Bus for Box<B> {
    fn begin_transmission(&mut self, address: u8) {
        (**self).begin_transmission(address)
    }
    fn write(&mut self, byte: u8) -> usize {
        (**self).write(byte)
    }
    fn end_transmission(&mut self) -> u8 {
        (**self).end_transmission()
    }
    fn request_from(&mut self, address: u8, len: usize) -> usize {
        (**self).request_from(address, len)
    }
    fn read(&mut self) -> u8 {
        (**self).read()
    }
    fn buffer_len(&self) -> usize {
        (**self).buffer_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        assert_eq!(BusError::from_status(0), None);
        for code in 1..=5u8 {
            let err = BusError::from_status(code).unwrap();
            assert_eq!(err.code(), code);
        }
        assert_eq!(BusError::from_status(2), Some(BusError::AddressNack));
        assert_eq!(BusError::SHORT_READ.code(), 4);
    }
}
