use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use std::time::Instant;

/// Free-running microsecond counter that wraps at `u32::MAX`.
///
/// - micros(): current tick; consecutive reads may wrap around to 0
/// - elapsed_since(): wrap-safe distance from an earlier tick
pub trait TickSource {
    fn micros(&self) -> u32;

    /// Microseconds elapsed since `start`, tolerating one wraparound.
    fn elapsed_since(&self, start: u32) -> u32 {
        self.micros().wrapping_sub(start)
    }
}

/// Real-time tick source backed by `std::time::Instant`, truncated to `u32`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTicks {
    origin: Instant,
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicTicks {
    #[inline]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TickSource for MonotonicTicks {
    #[inline]
    fn micros(&self) -> u32 {
        // Truncation is the wraparound.
        self.origin.elapsed().as_micros() as u32
    }
}

/// Deterministic tick source for tests and simulations.
///
/// Every read returns the current tick and then advances it by `step`, so a
/// polling loop always makes progress without real time passing.
#[derive(Debug, Clone)]
pub struct ManualTicks {
    now: Arc<AtomicU32>,
    step: u32,
}

impl ManualTicks {
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(start)),
            step,
        }
    }

    /// Current tick without advancing.
    pub fn peek(&self) -> u32 {
        self.now.load(Ordering::Relaxed)
    }

    pub fn set(&self, tick: u32) {
        self.now.store(tick, Ordering::Relaxed);
    }
}

impl TickSource for ManualTicks {
    fn micros(&self) -> u32 {
        self.now.fetch_add(self.step, Ordering::Relaxed)
    }
}

/// Blocking delay strategy used by the driver between register writes.
pub trait Delay {
    fn delay_us(&mut self, us: u32);

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_us(1_000);
        }
    }
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

impl<D: Delay + ?Sized> Delay for Box<D> {
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// Default delay: yields the thread until the deadline passes instead of
/// spinning. A zero-length wait still yields once.
#[derive(Debug, Clone, Default)]
pub struct YieldingDelay<T = MonotonicTicks> {
    ticks: T,
}

impl<T: TickSource> YieldingDelay<T> {
    pub fn new(ticks: T) -> Self {
        Self { ticks }
    }

    pub fn ticks(&self) -> &T {
        &self.ticks
    }
}

impl<T: TickSource> Delay for YieldingDelay<T> {
    fn delay_us(&mut self, us: u32) {
        if us == 0 {
            thread::yield_now();
            return;
        }
        let start = self.ticks.micros();
        while self.ticks.elapsed_since(start) < us {
            thread::yield_now();
        }
    }
}

/// Adapts a plain function or closure taking microseconds into a [`Delay`].
pub struct FnDelay<F>(pub F);

impl<F: FnMut(u32)> Delay for FnDelay<F> {
    fn delay_us(&mut self, us: u32) {
        (self.0)(us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_tolerates_wraparound() {
        let ticks = ManualTicks::new(u32::MAX - 10, 0);
        let start = ticks.micros();
        ticks.set(20);
        assert_eq!(ticks.elapsed_since(start), 31);
    }

    #[test]
    fn yielding_delay_waits_across_wrap() {
        let ticks = ManualTicks::new(u32::MAX - 100, 7);
        let mut delay = YieldingDelay::new(ticks.clone());
        delay.delay_us(500);
        let waited = ticks.peek().wrapping_sub(u32::MAX - 100);
        assert!(waited >= 500, "waited only {waited}us");
        assert!(waited < 500 + 3 * 7, "overshot: {waited}us");
    }

    #[test]
    fn zero_delay_returns_without_reading_ticks() {
        let ticks = ManualTicks::new(5, 1);
        let mut delay = YieldingDelay::new(ticks.clone());
        delay.delay_us(0);
        assert_eq!(ticks.peek(), 5);
    }

    #[test]
    fn fn_delay_forwards_and_splits_millis() {
        let mut total = 0u32;
        {
            let mut d = FnDelay(|us| total += us);
            d.delay_us(10);
            d.delay_ms(2);
        }
        assert_eq!(total, 2_010);
    }

    #[test]
    fn monotonic_ticks_advance() {
        let ticks = MonotonicTicks::new();
        let a = ticks.micros();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(ticks.elapsed_since(a) >= 1_000);
    }
}
