use pca_config::{DisabledMode, DriverMode, PhaseBalancer, load_toml};
use rstest::rstest;

const FULL: &str = r#"
[device]
address = 0x41
bus = 1
speed_hz = 400000
swap_phase_registers = true

[output]
driver_mode = "totem-pole"
enabled_mode = "inverted"
disabled_mode = "floating"
update_mode = "after-ack"
phase_balancer = "linear"

[pwm]
frequency_hz = 50.0

[servo]
min = 102
mid = 310
max = 512

[logging]
level = "debug"
rotation = "daily"
"#;

#[test]
fn parses_full_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.device.address, 0x41);
    assert!(cfg.device.swap_phase_registers);
    assert_eq!(cfg.output.disabled_mode, DisabledMode::Floating);
    assert_eq!(cfg.output.phase_balancer, PhaseBalancer::Linear);
    let servo = cfg.servo.expect("servo section");
    assert_eq!((servo.min, servo.mid, servo.max), (102, Some(310), 512));
}

#[test]
fn empty_config_uses_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults are valid");
    assert_eq!(cfg.device.address, 0x40);
    assert_eq!(cfg.device.speed_hz, 400_000);
    assert!(!cfg.device.proxy);
    assert_eq!(cfg.output.driver_mode, DriverMode::TotemPole);
    assert!((cfg.pwm.frequency_hz - 50.0).abs() < f32::EPSILON);
    assert!(cfg.servo.is_none());
}

#[test]
fn rejects_unknown_mode_names() {
    let err = load_toml("[output]\ndriver_mode = \"push-pull\"\n").expect_err("unknown variant");
    assert!(format!("{err}").contains("push-pull"));
}

#[rstest]
#[case("[output]\ndriver_mode = \"open-drain\"\ndisabled_mode = \"high\"\n", "open-drain")]
#[case("[device]\naddress = 0x80\n", "7-bit")]
#[case("[device]\nspeed_hz = 0\n", "speed_hz must be > 0")]
#[case("[pwm]\nfrequency_hz = 10.0\n", "frequency_hz must be in")]
#[case("[pwm]\nfrequency_hz = 2000.0\n", "frequency_hz must be in")]
#[case("[servo]\nmin = 600\nmax = 500\n", "servo.min must be <= servo.max")]
#[case("[servo]\nmin = 100\nmax = 5000\n", "servo.max must be <= 4096")]
#[case("[servo]\nmin = 100\nmid = 50\nmax = 500\n", "servo.mid must lie between")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(format!("{err}").contains(needle), "{err}");
}

#[test]
fn open_drain_may_idle_floating() {
    let cfg = load_toml("[output]\ndriver_mode = \"open-drain\"\ndisabled_mode = \"floating\"\n")
        .expect("parse TOML");
    cfg.validate().expect("open-drain + floating is fine");
}
