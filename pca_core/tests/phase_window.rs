use pca_core::{ChannelTarget, PWM_FULL, PhaseBalancer, PhaseWindow, compute_phase_window};
use proptest::prelude::*;

fn balancer() -> impl Strategy<Value = PhaseBalancer> {
    prop_oneof![
        Just(PhaseBalancer::None),
        Just(PhaseBalancer::Linear),
        Just(PhaseBalancer::Dynamic),
    ]
}

proptest! {
    #[test]
    fn windows_stay_in_range_and_decode_to_duty(
        channel in 0u8..16,
        duty in 1u16..PWM_FULL,
        balancer in balancer(),
    ) {
        let w = compute_phase_window(ChannelTarget::Channel(channel), duty, balancer);
        prop_assert!(w.begin < PWM_FULL);
        prop_assert!(w.end < PWM_FULL);
        prop_assert!(w.begin <= w.end);
        prop_assert_eq!(w.duty(), duty);
    }

    #[test]
    fn zero_and_full_scale_use_sentinels(
        channel in 0u8..16,
        over in PWM_FULL..=u16::MAX,
        balancer in balancer(),
    ) {
        let target = ChannelTarget::Channel(channel);
        prop_assert_eq!(compute_phase_window(target, 0, balancer), PhaseWindow::FULL_OFF);
        prop_assert_eq!(compute_phase_window(target, over, balancer), PhaseWindow::FULL_ON);
    }

    #[test]
    fn full_off_sentinel_wins_on_decode(begin in 0u16..=0x1FFF, end_low in 0u16..PWM_FULL) {
        prop_assert_eq!(PhaseWindow::new(begin, end_low | PWM_FULL).duty(), 0);
    }

    #[test]
    fn spanning_windows_decode_across_the_boundary(begin in 1u16..PWM_FULL, end in 0u16..PWM_FULL) {
        prop_assume!(end < begin);
        let duty = PhaseWindow::new(begin, end).duty();
        prop_assert_eq!(u32::from(duty), u32::from(end) + 4096 - u32::from(begin));
    }

    #[test]
    fn broadcast_block_is_never_shifted(duty in 1u16..PWM_FULL, balancer in balancer()) {
        let w = compute_phase_window(ChannelTarget::All, duty, balancer);
        prop_assert_eq!(w, PhaseWindow::new(0, duty));
    }
}
