use std::process::ExitCode;

fn main() -> ExitCode {
    match cuidar_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("cuidar: {e}");
            ExitCode::FAILURE
        }
    }
}
