//! PCA9685 register map and bit definitions (datasheet section 7.3).

pub const MODE1: u8 = 0x00;
pub const MODE2: u8 = 0x01;
pub const SUBADR1: u8 = 0x02;
pub const SUBADR2: u8 = 0x03;
pub const SUBADR3: u8 = 0x04;
pub const ALLCALLADR: u8 = 0x05;
/// First channel register block; 4 bytes per channel, begin then end, little-endian.
pub const LED0: u8 = 0x06;
pub const ALL_LED: u8 = 0xFA;
pub const PRE_SCALE: u8 = 0xFE;

pub mod mode1 {
    pub const RESTART: u8 = 0x80;
    pub const EXTCLK: u8 = 0x40;
    pub const AUTOINC: u8 = 0x20;
    pub const SLEEP: u8 = 0x10;
    pub const SUB1: u8 = 0x08;
    pub const SUB2: u8 = 0x04;
    pub const SUB3: u8 = 0x02;
    pub const ALLCALL: u8 = 0x01;
}

pub mod mode2 {
    pub const INVRT: u8 = 0x10;
    pub const OCH_ONACK: u8 = 0x08;
    pub const OUTDRV_TPOLE: u8 = 0x04;
    pub const OUTNE_HIGHZ: u8 = 0x02;
    pub const OUTNE_TPHIGH: u8 = 0x01;
}

/// Module addresses are `0b1xx_xxxx`.
pub const MODULE_BASE_ADDRESS: u8 = 0x40;
pub const MODULE_ADDRESS_MASK: u8 = 0x3F;
/// Proxy (sub-address / all-call) addresses, 7-bit form of `0xE0 | (a & 0xFE)`.
pub const PROXY_BASE_ADDRESS: u8 = 0x70;
pub const PROXY_ADDRESS_MASK: u8 = 0x0F;
pub const DEFAULT_ALL_CALL_ADDRESS: u8 = 0x70;

/// General call address and the software reset byte sent to it.
pub const GENERAL_CALL_ADDRESS: u8 = 0x00;
pub const SW_RESET: u8 = 0x06;

/// Internal oscillator frequency.
pub const OSC_CLOCK_HZ: f64 = 25_000_000.0;
pub const PRESCALE_MIN: u8 = 3;
pub const PRESCALE_MAX: u8 = 255;

/// Oscillator start-up time after SLEEP is cleared.
pub const OSC_STARTUP_US: u32 = 500;
/// Settle time after a software reset.
pub const RESET_SETTLE_US: u32 = 10;

#[inline]
pub fn module_address(address: u8) -> u8 {
    MODULE_BASE_ADDRESS | (address & MODULE_ADDRESS_MASK)
}

#[inline]
pub fn proxy_address(address: u8) -> u8 {
    PROXY_BASE_ADDRESS | (address & PROXY_ADDRESS_MASK)
}

/// Register address of a channel's 4-byte phase block.
#[inline]
pub fn channel_register(channel: u8) -> u8 {
    LED0 + 4 * channel
}

/// Prescaler for a PWM frequency: `trunc(25 MHz / (4096 * hz)) - 1`, clamped
/// to the chip's [3, 255] range (roughly 1526 Hz down to 24 Hz).
pub fn prescaler_for(hz: f32) -> u8 {
    let raw = (OSC_CLOCK_HZ / (4096.0 * f64::from(hz))) as i64 - 1;
    raw.clamp(i64::from(PRESCALE_MIN), i64::from(PRESCALE_MAX)) as u8
}

/// PWM frequency the chip produces for a given prescaler.
pub fn frequency_for(prescale: u8) -> f32 {
    (OSC_CLOCK_HZ / (4096.0 * (f64::from(prescale) + 1.0))) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescaler_matches_servo_and_led_defaults() {
        assert_eq!(prescaler_for(50.0), 121);
        assert_eq!(prescaler_for(60.0), 100);
    }

    #[test]
    fn prescaler_clamps_at_extremes() {
        assert_eq!(prescaler_for(1.0e9), PRESCALE_MIN);
        assert_eq!(prescaler_for(f32::INFINITY), PRESCALE_MIN);
        assert_eq!(prescaler_for(1.0e-6), PRESCALE_MAX);
        assert_eq!(prescaler_for(0.0), PRESCALE_MAX);
        assert_eq!(prescaler_for(1600.0), PRESCALE_MIN);
    }

    #[test]
    fn addresses_normalize_into_their_ranges() {
        assert_eq!(module_address(0x00), 0x40);
        assert_eq!(module_address(0x7F), 0x7F);
        assert_eq!(module_address(0x05), 0x45);
        assert_eq!(proxy_address(0x00), 0x70);
        assert_eq!(proxy_address(0x71), 0x71);
        assert_eq!(proxy_address(0x04), 0x74);
    }
}
