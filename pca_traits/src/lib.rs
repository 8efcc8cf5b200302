pub mod bus;
pub mod delay;

pub use bus::{Bus, BusError, DEFAULT_BUFFER_LEN};
pub use delay::{Delay, FnDelay, ManualTicks, MonotonicTicks, TickSource, YieldingDelay};
