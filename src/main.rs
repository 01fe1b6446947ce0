// Copyright (c) 2026 the srcpack contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use srcpack::packer::PackOutcome;
use srcpack::utils::error::{PackError, format_error};
use srcpack::{cli, run};

/// Exit status for a pack stopped by Ctrl-C.
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() {
    // Early errors (before args are parsed) are shown without detail
    let verbose = std::env::args().any(|arg| arg.starts_with("-v"));

    match run_main().await {
        Ok(PackOutcome::Completed(_)) => {}
        Ok(PackOutcome::Cancelled(_)) => std::process::exit(EXIT_CANCELLED),
        Err(e) => {
            display_error(&e, verbose);
            std::process::exit(1);
        }
    }
}

/// Display an error with contextual formatting.
///
/// Tries to downcast to `PackError` for rich formatting, falls back to
/// anyhow's error chain display for other errors.
fn display_error(error: &anyhow::Error, verbose: bool) {
    if let Some(pack_error) = error.downcast_ref::<PackError>() {
        eprintln!("{}", format_error(pack_error, verbose));
        return;
    }

    eprintln!("\n\u{26a0} Error: {}", error);

    let causes: Vec<_> = error.chain().skip(1).collect();
    if !causes.is_empty() {
        eprintln!("\nCaused by:");
        for (i, cause) in causes.iter().enumerate() {
            let prefix = if i == causes.len() - 1 {
                "\u{2514}\u{2500}"
            } else {
                "\u{251c}\u{2500}"
            };
            eprintln!("{} {}", prefix, cause);
        }
    }

    if verbose {
        let backtrace = error.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            eprintln!("\nBacktrace:\n{}", backtrace);
        }
    }
}

async fn run_main() -> Result<PackOutcome> {
    let args = cli::args::parse();

    srcpack::init_logging(args.verbose, args.quiet);

    // Config files + env, then CLI flags on top
    let file_config = cli::config::load(&args)?;
    let settings = cli::config::merge_config(&args, file_config);

    run(settings).await
}
