// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Help text for CLI commands.

use crate::output;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn print_usage() {
    println!(
        "{} {} - cooperative coroutines driven by time and events",
        output::title("Pacer"),
        output::version(VERSION)
    );
    println!();
    println!(
        "{}: {} {} {}",
        output::section_header("Usage"),
        output::command("pacer"),
        output::arg("<command>"),
        output::arg("[flags]")
    );
    println!();
    println!("{}", output::section_header("Commands:"));
    println!(
        "  {} {}   Run the showcase scenario",
        output::command("demo"),
        output::arg("[flags]")
    );
    println!("  {}             Show this help", output::command("help"));
    println!("  {}          Show version", output::command("version"));
    println!();
    println!("{}", output::section_header("Demo flags:"));
    println!(
        "  {} {}   Pump interval in milliseconds (env PACER_TICK_MS, default 1)",
        output::arg("--tick-ms"),
        output::arg("<n>")
    );
    println!(
        "  {} {}       Clock multiplier (env PACER_TIME_SCALE, default 1.0)",
        output::arg("--scale"),
        output::arg("<x>")
    );
    println!(
        "  {}         Advance a simulated clock instead of sleeping (env PACER_SIMULATE)",
        output::arg("--simulate")
    );
    println!(
        "  {}             Print a JSON summary of the finished coroutine",
        output::arg("--json")
    );
    println!();
    println!("Logging is controlled by {}.", output::arg("RUST_LOG"));
}
