use std::io::{self, BufRead, BufWriter, Write};
use std::process::ExitCode;

use crate::cli::Args;
use crate::files;
use crate::{detect, normalize};

/// Entry point for the application, called from main().
pub fn run(args: &Args) -> Result<ExitCode, String> {
    let options = args.into_options();

    let file_iter = if args.haystacks.is_empty() {
        files::FileSourceIter::new().add_stdin()
    } else {
        files::FileSourceIter::new().add_files(&args.haystacks)
    };

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    let mut any_match = false;

    for file_res in file_iter {
        let file = match file_res {
            Ok(o) => o,
            Err(e) => {
                eprintln!("urldetect: {e}");
                continue;
            }
        };

        let mut reader = file.reader;
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    eprintln!("urldetect: {}: {} (skipping)", file.name, e);
                    break;
                }
            }

            for url in detect(line.trim_end_matches(['\r', '\n']), options) {
                any_match = true;
                let text = if args.normalize {
                    normalize(&url).full_url()
                } else {
                    url.original_url().to_string()
                };
                writeln!(writer, "{text}").map_err(|e| e.to_string())?;
            }
        }
    }

    writer.flush().ok();

    Ok(if any_match {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
