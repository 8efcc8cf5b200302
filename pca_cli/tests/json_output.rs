use assert_cmd::prelude::*;
use rstest::rstest;
use std::process::Command;

fn json_stdout(args: &[&str]) -> (i32, serde_json::Value) {
    let out = Command::cargo_bin("pca9685")
        .unwrap()
        .arg("--json")
        .args(args)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&out.stdout);
    let line = stdout.lines().last().unwrap_or("").to_string();
    let v: serde_json::Value =
        serde_json::from_str(&line).unwrap_or_else(|e| panic!("{e}: stdout was {stdout}"));
    (out.status.code().unwrap_or(-1), v)
}

#[rstest]
fn self_check_reports_registers() {
    let (code, v) = json_stdout(&["self-check"]);
    assert_eq!(code, 0);
    assert_eq!(v["status"], "ok");
    let regs = &v["registers"];
    assert_eq!(regs["address"], 64);
    assert_eq!(regs["prescale"], 121);
    assert_eq!(regs["mode1"], 0xA0);
    assert_eq!(regs["sleeping"], false);
    assert!(regs["frequency_hz"].as_f64().is_some());
}

#[rstest]
#[case(&["set", "--channel", "1", "--value", "500"], 1, 500)]
#[case(&["on", "--channel", "7"], 7, 4096)]
#[case(&["get", "--channel", "0"], 0, 0)]
fn channel_commands_report_duty(#[case] args: &[&str], #[case] channel: u64, #[case] duty: u64) {
    let (code, v) = json_stdout(args);
    assert_eq!(code, 0);
    assert_eq!(v["channel"].as_u64(), Some(channel));
    assert_eq!(v["duty"].as_u64(), Some(duty));
}

#[rstest]
fn set_range_lists_duties() {
    let (code, v) = json_stdout(&["set-range", "--start", "0", "--values", "10,20,30"]);
    assert_eq!(code, 0);
    assert_eq!(v["start"], 0);
    assert_eq!(v["duties"], serde_json::json!([10, 20, 30]));
}

#[rstest]
fn errors_are_structured() {
    let out = Command::cargo_bin("pca9685")
        .unwrap()
        .env("PCA_TEST_SIM_OFFLINE", "1")
        .args(["--json", "self-check"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(4));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON");
    assert_eq!(v["reason"], "AddressNack");
    assert_eq!(v["bus_code"], 2);
    assert_eq!(v["exit_code"], 4);
    assert!(v["message"].as_str().unwrap().contains("What happened"));
}
