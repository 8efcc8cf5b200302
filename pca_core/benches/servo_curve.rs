use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pca_core::{ChannelTarget, PhaseBalancer, ServoEval, compute_phase_window};

fn bench_servo(c: &mut Criterion) {
    let linear = ServoEval::linear(102, 512);
    let spline = ServoEval::new(102, 350, 512);
    let angles: Vec<f32> = (-90..=90).map(|a| a as f32).collect();

    c.bench_function("servo_linear_sweep", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for &a in &angles {
                acc += u32::from(linear.pwm_for_angle(black_box(a)));
            }
            black_box(acc)
        })
    });

    c.bench_function("servo_spline_sweep", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for &a in &angles {
                acc += u32::from(spline.pwm_for_angle(black_box(a)));
            }
            black_box(acc)
        })
    });

    c.bench_function("servo_spline_build", |b| {
        b.iter(|| ServoEval::new(black_box(102), black_box(350), black_box(512)))
    });
}

fn bench_phase(c: &mut Criterion) {
    c.bench_function("phase_window_linear_all_channels", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for ch in 0..16u8 {
                let w = compute_phase_window(
                    ChannelTarget::Channel(ch),
                    black_box(1500),
                    PhaseBalancer::Linear,
                );
                acc += u32::from(w.end);
            }
            black_box(acc)
        })
    });
}

criterion_group!(benches, bench_servo, bench_phase);
criterion_main!(benches);
