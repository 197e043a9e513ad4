mod commands;
mod intake_state;

use std::process::ExitCode;

use chrono::Local;
use clap::Parser;

use commands::IntakeOptions;
use intake_state::IntakeState;

fn main() -> ExitCode {
    env_logger::init();

    let options = IntakeOptions::parse();

    log::info!("Starting intake ({})", if options.manual.is_some() { "manual entry" } else { "camera" });

    let state = IntakeState::new();
    let events = commands::open_session(&state, &options);

    let outcome = match &options.manual {
        Some(input) => commands::submit_manual(&state, input),
        None => commands::scan(&state, &events, &options),
    };
    commands::close_session(&state);

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            eprintln!("scan failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Scanned {} ({:?}) at {}",
        result.text(),
        result.source(),
        result.captured_at().with_timezone(&Local).format("%H:%M:%S")
    );

    match commands::save_item(&result, &options) {
        Ok((item, path, count)) => {
            println!(
                "Saved {:?} (…{}) to {} ({} item(s))",
                item.name,
                item.last_six_digits,
                path.display(),
                count
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to save item: {}", e);
            ExitCode::FAILURE
        }
    }
}
