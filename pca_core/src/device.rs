//! PCA9685 device controller.
//!
//! Owns the bus transport (through [`RegisterCodec`]), the device address and
//! the output configuration. Channel state lives on the chip only; nothing
//! here caches duty values.

use pca_traits::{Bus, BusError, Delay, MonotonicTicks, YieldingDelay};
use tracing::{debug, info, trace};

use crate::codec::RegisterCodec;
use crate::config::{DeviceConfig, PhaseBalancer, PhaseByteOrder};
use crate::error::Result;
use crate::phase::{CHANNEL_COUNT, ChannelTarget, PhaseWindow, compute_phase_window};
use crate::registers::{self, mode1};

/// Servo-friendly PWM frequency.
pub const SERVO_FREQUENCY_HZ: f32 = 50.0;
/// Flicker-free LED PWM frequency.
pub const LED_FREQUENCY_HZ: f32 = 60.0;
pub const DEFAULT_BUS_SPEED_HZ: u32 = 400_000;

/// How this instance is addressed on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Addressing {
    /// A single, uniquely addressed chip.
    #[default]
    Module,
    /// A shared sub-address or all-call group. Channel writes are broadcast;
    /// device configuration and read-back are disabled.
    Proxy,
}

/// One of the three programmable sub-addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubAddress {
    One,
    Two,
    Three,
}

impl SubAddress {
    fn register(self) -> u8 {
        match self {
            SubAddress::One => registers::SUBADR1,
            SubAddress::Two => registers::SUBADR2,
            SubAddress::Three => registers::SUBADR3,
        }
    }

    fn mode1_bit(self) -> u8 {
        match self {
            SubAddress::One => mode1::SUB1,
            SubAddress::Two => mode1::SUB2,
            SubAddress::Three => mode1::SUB3,
        }
    }
}

/// Snapshot of the configuration registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub mode1: u8,
    pub mode2: u8,
    pub sub_addresses: [u8; 3],
    pub all_call: u8,
    pub prescale: u8,
}

impl RegisterSnapshot {
    pub fn frequency_hz(&self) -> f32 {
        registers::frequency_for(self.prescale)
    }

    pub fn is_sleeping(&self) -> bool {
        self.mode1 & mode1::SLEEP != 0
    }
}

pub struct Pca9685<B, D = YieldingDelay<MonotonicTicks>> {
    codec: RegisterCodec<B>,
    delay: D,
    addressing: Addressing,
    config: Option<DeviceConfig>,
    bus_speed_hz: u32,
}

impl<B, D> core::fmt::Debug for Pca9685<B, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pca9685")
            .field("addressing", &self.addressing)
            .field("config", &self.config)
            .field("bus_speed_hz", &self.bus_speed_hz)
            .finish_non_exhaustive()
    }
}

impl<B: Bus> Pca9685<B> {
    /// Controller for the chip at `address` using the default yielding delay.
    pub fn new(bus: B, address: u8) -> Self {
        Self::with_delay(bus, address, YieldingDelay::default())
    }

    pub fn builder(bus: B) -> Pca9685Builder<B> {
        Pca9685Builder::new(bus)
    }
}

impl<B: Bus, D: Delay> Pca9685<B, D> {
    pub fn with_delay(bus: B, address: u8, delay: D) -> Self {
        Self {
            codec: RegisterCodec::new(bus, address),
            delay,
            addressing: Addressing::Module,
            config: None,
            bus_speed_hz: DEFAULT_BUS_SPEED_HZ,
        }
    }

    // ── accessors ───────────────────────────────────────────────────────────

    pub fn address(&self) -> u8 {
        self.codec.address()
    }

    pub fn bus_speed_hz(&self) -> u32 {
        self.bus_speed_hz
    }

    pub fn addressing(&self) -> Addressing {
        self.addressing
    }

    pub fn is_proxy_addresser(&self) -> bool {
        self.addressing == Addressing::Proxy
    }

    /// Configuration passed to the last `init` that passed validation. Set
    /// before the mode registers are written, so a later bus failure leaves
    /// it in place.
    pub fn config(&self) -> Option<&DeviceConfig> {
        self.config.as_ref()
    }

    pub fn phase_balancer(&self) -> PhaseBalancer {
        self.config
            .map(|c| c.phase_balancer)
            .unwrap_or_default()
    }

    pub fn phase_byte_order(&self) -> PhaseByteOrder {
        self.codec.byte_order()
    }

    /// Error left by the most recent bus transaction.
    pub fn last_error(&self) -> Option<BusError> {
        self.codec.last_error()
    }

    /// Last transport status code, 0 on success.
    pub fn last_error_code(&self) -> u8 {
        self.codec.last_error().map_or(0, BusError::code)
    }

    pub fn bus(&self) -> &B {
        self.codec.bus()
    }

    pub fn bus_mut(&mut self) -> &mut B {
        self.codec.bus_mut()
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Give back the bus transport.
    pub fn release(self) -> B {
        self.codec.into_bus()
    }

    // ── setup ───────────────────────────────────────────────────────────────

    /// Software-reset every PCA9685 on the bus via the general call address.
    pub fn reset_devices(&mut self) -> Result<()> {
        debug!("software reset");
        self.codec
            .transmit(registers::GENERAL_CALL_ADDRESS, &[registers::SW_RESET])?;
        self.delay.delay_us(registers::RESET_SETTLE_US);
        Ok(())
    }

    /// Apply `config` to the chip. Does nothing for a proxy addresser.
    ///
    /// An invalid configuration is rejected before anything is sent.
    pub fn init(&mut self, config: DeviceConfig) -> Result<()> {
        if self.is_proxy_addresser() {
            return Ok(());
        }
        config.validate()?;

        let address = registers::module_address(self.codec.address());
        self.codec.set_address(address);
        self.config = Some(config);

        let mode2 = config.mode2_value();
        info!(
            address = format_args!("{address:#04x}"),
            mode2 = format_args!("{mode2:#04x}"),
            bus_speed_hz = self.bus_speed_hz,
            driver = ?config.driver_mode,
            enabled = ?config.enabled_mode,
            disabled = ?config.disabled_mode,
            update = ?config.update_mode,
            balancer = ?config.phase_balancer,
            "init"
        );
        self.codec
            .write_register(registers::MODE1, mode1::RESTART | mode1::AUTOINC)?;
        self.codec.write_register(registers::MODE2, mode2)?;
        Ok(())
    }

    /// Turn this instance into a proxy addresser for a sub-address or
    /// all-call group. Ignored once the instance has been initialized as a
    /// module.
    pub fn init_as_proxy_addresser(&mut self) {
        if self.config.is_some() {
            return;
        }
        let address = registers::proxy_address(self.codec.address());
        self.codec.set_address(address);
        self.addressing = Addressing::Proxy;
        info!(address = format_args!("{address:#04x}"), "init as proxy addresser");
    }

    /// Program the PWM frequency. Negative or NaN frequencies are ignored, as
    /// are proxy addressers.
    pub fn set_pwm_frequency(&mut self, hz: f32) -> Result<()> {
        if hz.is_nan() || hz < 0.0 || self.is_proxy_addresser() {
            return Ok(());
        }
        let prescale = registers::prescaler_for(hz);
        debug!(hz, prescale, "set pwm frequency");

        // PRE_SCALE only accepts writes while the oscillator sleeps.
        let mode1 = self.codec.read_register(registers::MODE1)?;
        let sleeping = (mode1 & !mode1::RESTART) | mode1::SLEEP;
        self.codec.write_register(registers::MODE1, sleeping)?;
        self.codec.write_register(registers::PRE_SCALE, prescale)?;
        let running = (sleeping & !mode1::SLEEP) | mode1::RESTART;
        self.codec.write_register(registers::MODE1, running)?;
        self.delay.delay_us(registers::OSC_STARTUP_US);
        Ok(())
    }

    pub fn set_pwm_freq_servo(&mut self) -> Result<()> {
        self.set_pwm_frequency(SERVO_FREQUENCY_HZ)
    }

    pub fn set_pwm_freq_led(&mut self) -> Result<()> {
        self.set_pwm_frequency(LED_FREQUENCY_HZ)
    }

    // ── channels ────────────────────────────────────────────────────────────

    pub fn set_channel_on(&mut self, channel: u8) -> Result<()> {
        if !valid_channel(channel) {
            return Ok(());
        }
        debug!(channel, "channel full on");
        self.write_windows(ChannelTarget::Channel(channel), &[PhaseWindow::FULL_ON])
    }

    pub fn set_channel_off(&mut self, channel: u8) -> Result<()> {
        if !valid_channel(channel) {
            return Ok(());
        }
        debug!(channel, "channel full off");
        self.write_windows(ChannelTarget::Channel(channel), &[PhaseWindow::FULL_OFF])
    }

    pub fn set_channel_pwm(&mut self, channel: u8, duty: u16) -> Result<()> {
        if !valid_channel(channel) {
            return Ok(());
        }
        let target = ChannelTarget::Channel(channel);
        let window = compute_phase_window(target, duty, self.phase_balancer());
        debug!(channel, duty, "set channel pwm");
        self.write_windows(target, &[window])
    }

    /// Program consecutive channels starting at `start`, one duty per
    /// channel. Values past channel 15 are dropped. Channels are written in
    /// as many transactions as the transport buffer requires, stopping at
    /// the first transport error.
    pub fn set_channels_pwm(&mut self, start: u8, duties: &[u16]) -> Result<()> {
        if !valid_channel(start) {
            return Ok(());
        }
        let count = duties.len().min(usize::from(CHANNEL_COUNT - start));
        let per_batch = self.codec.channels_per_transaction();
        let balancer = self.phase_balancer();
        debug!(start, count, per_batch, "set channels pwm");

        let mut channel = start;
        for batch in duties[..count].chunks(per_batch) {
            let windows: Vec<PhaseWindow> = batch
                .iter()
                .zip(channel..)
                .map(|(&duty, ch)| compute_phase_window(ChannelTarget::Channel(ch), duty, balancer))
                .collect();
            self.write_windows(ChannelTarget::Channel(channel), &windows)?;
            channel += batch.len() as u8;
        }
        Ok(())
    }

    /// Program every channel at once through the broadcast block.
    pub fn set_all_channels_pwm(&mut self, duty: u16) -> Result<()> {
        let window = compute_phase_window(ChannelTarget::All, duty, self.phase_balancer());
        debug!(duty, "set all channels pwm");
        self.write_windows(ChannelTarget::All, &[window])
    }

    /// Read back a channel's duty. Returns 0 for an invalid channel or a
    /// proxy addresser.
    pub fn channel_pwm(&mut self, channel: u8) -> Result<u16> {
        if !valid_channel(channel) || self.is_proxy_addresser() {
            return Ok(0);
        }
        let window = self
            .codec
            .read_phase_window(registers::channel_register(channel))?;
        let duty = window.duty();
        trace!(channel, begin = window.begin, end = window.end, duty, "channel pwm");
        Ok(duty)
    }

    // ── addressing ──────────────────────────────────────────────────────────

    /// Program the all-call address (7-bit, normalized into the proxy range)
    /// and enable it.
    pub fn enable_all_call_address(&mut self, address: u8) -> Result<()> {
        if self.is_proxy_addresser() {
            return Ok(());
        }
        let address = registers::proxy_address(address);
        debug!(address = format_args!("{address:#04x}"), "enable all-call address");
        self.codec
            .write_register(registers::ALLCALLADR, address << 1)?;
        self.update_mode1(|m| m | mode1::ALLCALL)
    }

    pub fn disable_all_call_address(&mut self) -> Result<()> {
        if self.is_proxy_addresser() {
            return Ok(());
        }
        debug!("disable all-call address");
        self.update_mode1(|m| m & !mode1::ALLCALL)
    }

    /// Program a sub-address (7-bit, normalized into the proxy range) and
    /// enable it.
    pub fn enable_sub_address(&mut self, slot: SubAddress, address: u8) -> Result<()> {
        if self.is_proxy_addresser() {
            return Ok(());
        }
        let address = registers::proxy_address(address);
        debug!(?slot, address = format_args!("{address:#04x}"), "enable sub-address");
        self.codec.write_register(slot.register(), address << 1)?;
        self.update_mode1(|m| m | slot.mode1_bit())
    }

    pub fn disable_sub_address(&mut self, slot: SubAddress) -> Result<()> {
        if self.is_proxy_addresser() {
            return Ok(());
        }
        debug!(?slot, "disable sub-address");
        self.update_mode1(|m| m & !slot.mode1_bit())
    }

    /// Switch to the EXTCLK pin as clock source. The bit is sticky until the
    /// next power cycle or software reset.
    pub fn enable_ext_clock_line(&mut self) -> Result<()> {
        debug!("enable external clock");
        let mode1 = self.codec.read_register(registers::MODE1)?;
        let sleeping = (mode1 & !mode1::RESTART) | mode1::SLEEP;
        self.codec.write_register(registers::MODE1, sleeping)?;
        let external = sleeping | mode1::EXTCLK;
        self.codec.write_register(registers::MODE1, external)?;
        let running = (external & !mode1::SLEEP) | mode1::RESTART;
        self.codec.write_register(registers::MODE1, running)?;
        self.delay.delay_us(registers::OSC_STARTUP_US);
        Ok(())
    }

    /// Read the configuration registers. `None` for a proxy addresser.
    pub fn read_registers(&mut self) -> Result<Option<RegisterSnapshot>> {
        if self.is_proxy_addresser() {
            return Ok(None);
        }
        let snapshot = RegisterSnapshot {
            mode1: self.codec.read_register(registers::MODE1)?,
            mode2: self.codec.read_register(registers::MODE2)?,
            sub_addresses: [
                self.codec.read_register(registers::SUBADR1)?,
                self.codec.read_register(registers::SUBADR2)?,
                self.codec.read_register(registers::SUBADR3)?,
            ],
            all_call: self.codec.read_register(registers::ALLCALLADR)?,
            prescale: self.codec.read_register(registers::PRE_SCALE)?,
        };
        Ok(Some(snapshot))
    }

    fn update_mode1(&mut self, f: impl FnOnce(u8) -> u8) -> Result<()> {
        let mode1 = self.codec.read_register(registers::MODE1)?;
        self.codec.write_register(registers::MODE1, f(mode1))?;
        Ok(())
    }

    fn write_windows(&mut self, target: ChannelTarget, windows: &[PhaseWindow]) -> Result<()> {
        let reg = match target {
            ChannelTarget::Channel(ch) => registers::channel_register(ch),
            ChannelTarget::All => registers::ALL_LED,
        };
        self.codec.write_phase_windows(reg, windows)?;
        Ok(())
    }
}

#[inline]
fn valid_channel(channel: u8) -> bool {
    channel < CHANNEL_COUNT
}

/// Builder for [`Pca9685`].
pub struct Pca9685Builder<B, D = YieldingDelay<MonotonicTicks>> {
    bus: B,
    delay: D,
    address: u8,
    bus_speed_hz: u32,
    byte_order: PhaseByteOrder,
    proxy: bool,
}

impl<B: Bus> Pca9685Builder<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            delay: YieldingDelay::default(),
            address: registers::MODULE_BASE_ADDRESS,
            bus_speed_hz: DEFAULT_BUS_SPEED_HZ,
            byte_order: PhaseByteOrder::default(),
            proxy: false,
        }
    }
}

impl<B: Bus, D: Delay> Pca9685Builder<B, D> {
    pub fn address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Informational; the transport owns the actual clock.
    pub fn bus_speed_hz(mut self, hz: u32) -> Self {
        self.bus_speed_hz = hz;
        self
    }

    pub fn phase_byte_order(mut self, order: PhaseByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Build as a proxy addresser instead of a module.
    pub fn proxy(mut self, proxy: bool) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn delay<D2: Delay>(self, delay: D2) -> Pca9685Builder<B, D2> {
        Pca9685Builder {
            bus: self.bus,
            delay,
            address: self.address,
            bus_speed_hz: self.bus_speed_hz,
            byte_order: self.byte_order,
            proxy: self.proxy,
        }
    }

    pub fn build(self) -> Pca9685<B, D> {
        let mut dev = Pca9685::with_delay(self.bus, self.address, self.delay);
        dev.bus_speed_hz = self.bus_speed_hz;
        dev.codec.set_byte_order(self.byte_order);
        if self.proxy {
            dev.init_as_proxy_addresser();
        }
        dev
    }
}
