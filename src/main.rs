use std::process::ExitCode;

fn main() -> ExitCode {
    match adresse::cli::cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            adresse::cli::exit_code(&err)
        }
    }
}
