//! Argument dispatch through the built binary
//!
//! Usage errors must never touch the GPU, so these run on any machine.
//! Valid tokens are only checked up to the banner, which is printed before
//! the Vulkan context is created.

use std::process::{Command, Output};

fn mapcopy(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mapcopy"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch mapcopy")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// -1 as observed through the platform's exit status
fn is_minus_one(output: &Output) -> bool {
    match output.status.code() {
        Some(code) => code == -1 || code == 255,
        None => false,
    }
}

#[test]
fn test_no_argument_is_missing() {
    let output = mapcopy(&[]);
    assert_eq!(stdout(&output), "Missing arg\n");
    assert!(is_minus_one(&output), "status: {:?}", output.status);
}

#[test]
fn test_two_arguments_are_missing() {
    let cases: [&[&str]; 3] = [&["memcpy", "dumb"], &["reference", "reference"], &["a", "b", "c"]];
    for args in cases {
        let output = mapcopy(args);
        assert_eq!(stdout(&output), "Missing arg\n", "args {:?}", args);
        assert!(is_minus_one(&output));
    }
}

#[test]
fn test_unknown_argument() {
    for arg in ["foo", "MEMCPY", "dumb-copy", "--help", ""] {
        let output = mapcopy(&[arg]);
        assert_eq!(stdout(&output), "Unknown arg\n", "arg {:?}", arg);
        assert!(is_minus_one(&output));
    }
}

#[test]
fn test_each_strategy_prints_only_its_banner() {
    let cases = [
        ("memcpy", "=== Using memcpy ==="),
        ("dumb", "=== Using dumb-copy ==="),
        ("reference", "=== Using reference ==="),
    ];

    for (arg, banner) in cases {
        let output = mapcopy(&[arg]);
        let text = stdout(&output);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(banner), "arg {}", arg);
        assert!(
            lines.all(|l| !l.starts_with("=== Using")),
            "more than one banner for {}: {:?}",
            arg,
            text
        );

        if output.status.success() {
            assert!(text.contains("\nGPU: "), "missing GPU line: {:?}", text);
            assert!(text.contains("\nDuration:  "));
            assert!(text.contains("\nBandwidth: "));
        } else {
            // No Vulkan driver on this machine: fatal path, no partial report.
            assert_eq!(output.status.code(), Some(1));
            assert!(text.contains("Fatal : "), "unexpected failure output: {:?}", text);
            assert!(!text.contains("Duration:"));
            assert!(!text.contains("Bandwidth:"));
        }
    }
}

#[test]
fn test_gpu_line_comes_before_everything_after_the_banner() {
    let output = mapcopy(&["reference"]);
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();

    // A device was selected: the GPU line follows the banner directly, even
    // when logical-device creation or a later step failed.
    if let Some(pos) = lines.iter().position(|l| l.starts_with("GPU: ")) {
        assert_eq!(pos, 1, "GPU line out of place: {:?}", lines);
        assert_eq!(lines.iter().filter(|l| l.starts_with("GPU: ")).count(), 1);
    }
    if output.status.success() {
        assert_eq!(lines.len(), 4, "unexpected report: {:?}", lines);
        assert!(lines[2].starts_with("Duration:  "));
        assert!(lines[3].starts_with("Bandwidth: "));
    } else {
        assert!(lines.last().is_some_and(|l| l.starts_with("Fatal : ")), "{:?}", lines);
    }
}
