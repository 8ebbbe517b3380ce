use std::process::ExitCode;

mod app;
mod cli;

#[cfg(test)]
mod unit_tests;

fn main() -> ExitCode {
    app::main()
}
