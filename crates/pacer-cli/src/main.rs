// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Pacer CLI - runs the coroutine showcase.

mod config;
mod demo;
mod help;
mod output;

use std::env;
use std::process;

use config::DemoConfig;

fn main() {
    output::init();
    env_logger::Builder::from_env(env_logger::Env::default())
        .format_timestamp(None)
        .try_init()
        .ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        help::print_usage();
        return;
    }

    match args[1].as_str() {
        "demo" => cmd_demo(&args[2..]),
        "help" | "--help" | "-h" => help::print_usage(),
        "version" | "--version" | "-V" => {
            println!("pacer {}", help::VERSION);
        }
        other => {
            eprintln!("{}: unknown command `{}`", output::error_label(), other);
            help::print_usage();
            process::exit(1);
        }
    }
}

fn cmd_demo(args: &[String]) {
    let mut config = match DemoConfig::from_env() {
        Ok(c) => c,
        Err(e) => fail(&e.to_string()),
    };
    if let Err(e) = config.apply_args(args) {
        fail(&e.to_string());
    }

    let (summary, _) = match demo::run(&config, !config.json) {
        Ok(r) => r,
        Err(e) => fail(&e.to_string()),
    };

    if config.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(&e.to_string()),
        }
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("{}: {}", output::error_label(), msg);
    process::exit(1);
}
