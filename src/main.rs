use std::process::ExitCode;

fn main() -> ExitCode {
    hitload::entry::run()
}
