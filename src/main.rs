use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{arg, Arg, Command};
use thief_eval::neighbors::{build_neighbors, build_neighbors_par};
use thief_eval::problem::Problem;
use thief_eval::verifier::{
    verify_competition, verify_files, CompetitionLayout, InstanceReport, VerifyError, VerifyOptions,
};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("thief-verify")
        .about("Verifies Traveling Thief Problem submissions")
        .arg_required_else_help(true)
        .arg(
            arg!(--tolerance [TOLERANCE] "Absolute tolerance on time and profit")
                .value_parser(clap::value_parser!(f64))
                .global(true),
        )
        .arg(arg!(--json "Print reports as JSON").global(true))
        .subcommand(
            Command::new("competition")
                .about("Verifies every instance of a team's competition submission")
                .arg(
                    arg!(--root <ROOT> "Competition directory")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(arg!(--team <TEAM> "Team name").value_parser(clap::value_parser!(String)))
                .arg(
                    arg!(--instance [INSTANCE] "Only verify this instance (repeatable)")
                        .value_parser(clap::value_parser!(String))
                        .action(clap::ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Verifies one solution file against its objective file")
                .arg(arg!(<PROBLEM> "Problem description").value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(<SOLUTIONS> "Solution file (.x)").value_parser(clap::value_parser!(PathBuf)))
                .arg(arg!(<OBJECTIVES> "Objective file (.f)").value_parser(clap::value_parser!(PathBuf)))
                .arg(
                    arg!(--name [NAME] "Instance name used for the submission cap")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("neighbors")
                .about("Prints the K nearest neighbors of every city")
                .arg(arg!(<PROBLEM> "Problem description").value_parser(clap::value_parser!(PathBuf)))
                .arg(
                    Arg::new("k")
                        .short('k')
                        .value_name("K")
                        .required(true)
                        .help("Candidates per city")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(arg!(--parallel "Build the lists on all cores")),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = cli().get_matches();
    let mut options = VerifyOptions::default();
    if let Some(tolerance) = matches.get_one::<f64>("tolerance") {
        options.tolerance = *tolerance;
    }
    let json = matches.get_flag("json");

    let result = match matches.subcommand() {
        Some(("competition", sub_m)) => {
            let root = sub_m.get_one::<PathBuf>("root").cloned().unwrap_or_default();
            let team = sub_m.get_one::<String>("team").cloned().unwrap_or_default();
            let mut layout = CompetitionLayout::gecco19(root, team);
            if let Some(instances) = sub_m.get_many::<String>("instance") {
                layout.instances = instances.cloned().collect();
            }
            run_verification(verify_competition(&layout, &options), json)
        }
        Some(("check", sub_m)) => {
            let problem = sub_m.get_one::<PathBuf>("PROBLEM").cloned().unwrap_or_default();
            let solutions = sub_m.get_one::<PathBuf>("SOLUTIONS").cloned().unwrap_or_default();
            let objectives = sub_m.get_one::<PathBuf>("OBJECTIVES").cloned().unwrap_or_default();
            let name = sub_m.get_one::<String>("name").cloned().unwrap_or_else(|| {
                problem
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or_default()
                    .to_string()
            });
            let report = verify_files(&name, &problem, &solutions, &objectives, &options);
            run_verification(report.map(|report| vec![report]), json)
        }
        Some(("neighbors", sub_m)) => print_neighbors(
            sub_m.get_one::<PathBuf>("PROBLEM").cloned().unwrap_or_default(),
            sub_m.get_one::<usize>("k").copied().unwrap_or_default(),
            sub_m.get_flag("parallel"),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_verification(result: Result<Vec<InstanceReport>, VerifyError>, json: bool) -> Result<()> {
    let reports = match result {
        Ok(reports) => reports,
        Err(e) => {
            eprint!("{}", diagnostic(&e));
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report);
        }
    }
    Ok(())
}

fn print_neighbors(path: PathBuf, k: usize, parallel: bool) -> Result<()> {
    let problem = Problem::load(&path)?;
    let neighbors = if parallel {
        build_neighbors_par(problem.coordinates(), k)?
    } else {
        build_neighbors(problem.coordinates(), k)?
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for list in neighbors.iter() {
        let line = list
            .iter()
            .map(|city| city.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

/// Rejection report; the error itself names the offending solution.
fn diagnostic(e: &VerifyError) -> String {
    format!("ERROR\n{}\nSubmission can not be accepted.\n", e)
}
