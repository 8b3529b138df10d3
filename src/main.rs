use urldetect::cli::Args;
use urldetect::core::run;

fn main() -> std::process::ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("urldetect: {e}");
            std::process::ExitCode::from(2)
        }
    }
}
