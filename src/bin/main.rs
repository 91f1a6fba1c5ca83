use std::{
    env,
    error::Error,
    fs::File,
    io::{self, BufReader, BufWriter},
    path::PathBuf,
    process::ExitCode,
};

use vmtrans::{
    driver::Driver,
    source::{self, InputKind},
};

fn main() -> ExitCode {
    match run() {
        Ok(clean) if clean => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("failed to run: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the run completed without line-scoped diagnostics.
fn run() -> Result<bool, Box<dyn Error>> {
    let Some(input) = env::args().nth(1) else {
        return Err("usage: vmtrans <file.vm | directory>".into());
    };
    let input = PathBuf::from(input);
    let Some(kind) = source::classify(&input)? else {
        return Err(format!("no .vm input found at `{}`", input.display()).into());
    };

    let output = source::output_path(&input, kind);
    let mut driver = Driver::new(BufWriter::new(File::create(&output)?));

    match kind {
        InputKind::File => {
            let file = File::open(&input)?;
            driver.translate_unit(source::unit_name(&input), BufReader::new(file))?;
        }
        InputKind::Directory => {
            driver.bootstrap()?;
            for unit in source::discover_units(&input)? {
                match File::open(&unit) {
                    // A unit that cannot be opened is reported; the rest of
                    // the run continues. Output-artifact failures abort via
                    // `?` instead.
                    Err(error) => {
                        eprintln!("could not open input file `{}`: {error}", unit.display());
                    }
                    Ok(file) => {
                        driver.translate_unit(source::unit_name(&unit), BufReader::new(file))?;
                    }
                }
            }
        }
    }

    let (out, diagnostics) = driver.finish();
    out.into_inner().map_err(io::IntoInnerError::into_error)?;

    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
    }
    Ok(diagnostics.is_empty())
}
