#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing and validation must reject bad input without panicking.
    if let Ok(cfg) = toml::from_str::<pca_config::Config>(data)
        && cfg.validate().is_ok()
    {
        // Anything that validates must also convert cleanly.
        let dc = pca_core::DeviceConfig::from(&cfg.output);
        assert!(dc.validate().is_ok());
        if let Some(servo) = &cfg.servo {
            let eval = pca_core::ServoEval::from(servo);
            assert!(eval.pwm_for_angle(0.0) <= pca_core::PWM_FULL);
        }
    }
});
