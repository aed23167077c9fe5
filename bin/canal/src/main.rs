#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use clap::Parser;

pub mod cli;
pub mod commands;
pub mod flags;
pub mod runtime;
pub mod scenario;

fn main() {
    canal_cli::backtrace::enable();
    if let Err(err) = cli::Cli::parse().run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
