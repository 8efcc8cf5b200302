#![no_main]
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;
use pca_core::{ChannelTarget, PWM_FULL, PhaseBalancer, PhaseWindow, ServoEval, compute_phase_window};

#[derive(Debug, Arbitrary)]
struct Input {
    channel: u8,
    duty: u16,
    linear: bool,
    raw_begin: u16,
    raw_end: u16,
    min: u16,
    mid: u16,
    max: u16,
    angle: f32,
}

fuzz_target!(|input: Input| {
    let balancer = if input.linear {
        PhaseBalancer::Linear
    } else {
        PhaseBalancer::None
    };
    let channel = input.channel % 16;
    let w = compute_phase_window(ChannelTarget::Channel(channel), input.duty, balancer);
    assert_eq!(w.duty(), input.duty.min(PWM_FULL));

    // Decoding arbitrary register contents never panics or overflows.
    let decoded = PhaseWindow::new(input.raw_begin, input.raw_end).duty();
    assert!(decoded <= PWM_FULL);

    let eval = ServoEval::new(input.min, input.mid, input.max);
    assert!(eval.pwm_for_angle(input.angle) <= PWM_FULL);
});
