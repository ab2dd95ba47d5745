use std::process::ExitCode;

fn main() -> ExitCode {
    threadlink_cli::run()
}
