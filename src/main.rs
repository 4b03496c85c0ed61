use std::collections::BTreeSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{error, info};
use santa_score::combine::{self, Gate};
use santa_score::config::{CombineConfig, EvalConfig, ReaderConfig, ReportConfig};
use santa_score::io::{self, Schema};
use santa_score::puzzle::PuzzleId;
use santa_score::{report, scorer};

const USAGE: &str = "Usage:
    santa-score evaluate --puzzles P --puzzle-info I --submission S [--ids 1,2] [--np N]
    santa-score combine --dir D --output O (--puzzles P --puzzle-info I | --trust-sources [--puzzles P]) [--np N] [--top N]
    santa-score analyze --submission S --puzzles P [--top N]";

type CliResult<T> = Result<T, Box<dyn Error>>;

fn options() -> getopts::Options {
    let mut opts = getopts::Options::new();
    opts.optopt("", "puzzles", "path to puzzles.csv", "PUZZLES");
    opts.optopt("", "puzzle-info", "path to puzzle_info.csv", "PUZZLE_INFO");
    opts.optopt("", "submission", "path to a submission csv", "SUBMISSION");
    opts.optopt("", "ids", "only score these puzzle ids", "ID,ID,...");
    opts.optopt("", "np", "thread parallel", "NUM_THREADS");
    opts.optopt("", "dir", "directory of candidate csv files", "DIR");
    opts.optopt("", "output", "where to write the combined submission", "OUTPUT");
    opts.optflag("", "trust-sources", "combine without verifying candidates");
    opts.optopt("", "top", "number of puzzle ids to list", "N");
    opts.optopt("", "max-field-len", "largest csv field accepted", "BYTES");
    opts.optflag("h", "help", "print this help");
    opts
}

fn required(matches: &getopts::Matches, name: &str) -> CliResult<PathBuf> {
    matches
        .opt_str(name)
        .map(PathBuf::from)
        .ok_or_else(|| format!("--{name} is required").into())
}

fn parsed<T: std::str::FromStr>(matches: &getopts::Matches, name: &str) -> CliResult<Option<T>> {
    match matches.opt_str(name) {
        Some(s) => s.parse::<T>().map(Some).map_err(|_| format!("--{name} could not be parsed: {s}").into()),
        None => Ok(None),
    }
}

fn reader_config(matches: &getopts::Matches) -> CliResult<ReaderConfig> {
    let mut config = ReaderConfig::default();
    if let Some(max_field_len) = parsed(matches, "max-field-len")? {
        config.max_field_len = max_field_len;
    }
    Ok(config)
}

fn evaluate(matches: &getopts::Matches) -> CliResult<()> {
    let reader = reader_config(matches)?;
    let catalog = io::load_catalog(&required(matches, "puzzle-info")?, reader)?;
    let puzzles = io::load_puzzles(&required(matches, "puzzles")?, &catalog, reader)?;
    let submission = io::open_candidates(&required(matches, "submission")?, Schema::Exact, reader)?;

    let specific_ids = match matches.opt_str("ids") {
        Some(ids) => Some(
            ids.split(',')
                .map(|id| id.trim().parse::<PuzzleId>())
                .collect::<Result<BTreeSet<_>, _>>()
                .map_err(|e| format!("--ids could not be parsed: {e}"))?,
        ),
        None => None,
    };
    let config = EvalConfig { threads: parsed(matches, "np")?, specific_ids, reader };

    let report = scorer::evaluate(&puzzles, submission, &config)?;
    let summary = report::summarize(&report::rows_from_evaluation(&report), ReportConfig::default().top_n);
    print!("{summary}");
    for rejection in report.rejections() {
        println!("rejected: {rejection}");
    }
    if report.rejected > 0 {
        return Err(format!("{} submission rows were rejected", report.rejected).into());
    }
    Ok(())
}

fn combine(matches: &getopts::Matches) -> CliResult<()> {
    let reader = reader_config(matches)?;
    let dir = required(matches, "dir")?;
    let output = required(matches, "output")?;
    let config = CombineConfig { threads: parsed(matches, "np")?, reader };

    let puzzles = if matches.opt_present("trust-sources") {
        None
    } else {
        let catalog = io::load_catalog(&required(matches, "puzzle-info")?, reader)?;
        Some(io::load_puzzles(&required(matches, "puzzles")?, &catalog, reader)?)
    };
    let gate = match &puzzles {
        Some(puzzles) => Gate::Verify(puzzles),
        None => Gate::TrustSources,
    };
    let combined = combine::combine_dir(&dir, gate, &config)?;
    combined.log_summary();

    io::save_table(&output, &combined.table)?;
    info!("Find the combined submission at: {}", output.display());

    let puzzle_types = match (&puzzles, matches.opt_str("puzzles")) {
        (Some(puzzles), _) => Some(puzzles.puzzle_types()),
        (None, Some(path)) => Some(io::load_puzzle_types(Path::new(&path), reader)?),
        (None, None) => None,
    };
    if let Some(puzzle_types) = puzzle_types {
        let top_n = parsed(matches, "top")?.unwrap_or(ReportConfig::default().top_n);
        let rows = report::rows_from_table(&combined.table, &puzzle_types)?;
        print!("{}", report::summarize(&rows, top_n));
    }
    println!("Final score = {}", combined.table.total_score());
    Ok(())
}

fn analyze(matches: &getopts::Matches) -> CliResult<()> {
    let mut config = ReportConfig { reader: reader_config(matches)?, ..ReportConfig::default() };
    if let Some(top_n) = parsed(matches, "top")? {
        config.top_n = top_n;
    }
    let puzzle_types = io::load_puzzle_types(&required(matches, "puzzles")?, config.reader)?;
    let submission = io::open_candidates(&required(matches, "submission")?, Schema::Contains, config.reader)?;

    let rows = report::rows_from_submission(submission, &puzzle_types)?;
    print!("{}", report::summarize(&rows, config.top_n));
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let opts = options();
    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", opts.usage(USAGE));
            return ExitCode::FAILURE;
        }
    };
    if matches.opt_present("help") {
        println!("{}", opts.usage(USAGE));
        return ExitCode::SUCCESS;
    }

    let result = match matches.free.first().map(String::as_str) {
        Some("evaluate") => evaluate(&matches),
        Some("combine") => combine(&matches),
        Some("analyze") => analyze(&matches),
        _ => {
            eprintln!("{}", opts.usage(USAGE));
            return ExitCode::FAILURE;
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
