use std::process::ExitCode;

fn main() -> ExitCode {
    dhobi_cli::run()
}
