use std::process::ExitCode;

fn main() -> ExitCode {
    greenmatch_cli::run()
}
