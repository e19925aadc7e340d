use std::fmt::Display;
use std::path::{Path, PathBuf};

use abcvote_rules::rational::to_f64;
use abcvote_rules::{Ballot, IlpConfig, IlpOutcome, IlpRules, Profile, ScoreFunction};
use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "abcvote")]
#[command(about = "Optimal approval-based committees via integer linear programming", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the committees maximizing a Thiele score
    Thiele {
        /// JSON profile
        file: PathBuf,
        /// Score function (av, cc, pav, geom<base>, generalizedcc<ell>, lp-av<ell>)
        #[arg(short, long, default_value = "pav")]
        rule: String,
        /// Number of seats
        #[arg(short = 'k', long)]
        committee_size: usize,
        /// Return a single committee
        #[arg(long)]
        resolute: bool,
        /// Branch-and-bound node budget
        #[arg(long)]
        node_limit: Option<usize>,
        /// Log solver progress
        #[arg(short, long)]
        verbose: bool,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Compute Monroe committees (unit weights only)
    Monroe {
        /// JSON profile
        file: PathBuf,
        /// Number of seats
        #[arg(short = 'k', long)]
        committee_size: usize,
        /// Return a single committee
        #[arg(long)]
        resolute: bool,
        /// Branch-and-bound node budget
        #[arg(long)]
        node_limit: Option<usize>,
        /// Log solver progress
        #[arg(short, long)]
        verbose: bool,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Thiele score of a committee
    Score {
        /// JSON profile
        file: PathBuf,
        #[arg(short, long, default_value = "pav")]
        rule: String,
        /// Comma-separated candidate ids
        #[arg(short, long, value_delimiter = ',')]
        committee: Vec<usize>,
    },
    /// Marginal Thiele score of adding each candidate to a committee
    Marginal {
        /// JSON profile
        file: PathBuf,
        #[arg(short, long, default_value = "pav")]
        rule: String,
        /// Number of seats the score function is parameterized for
        #[arg(short = 'k', long)]
        committee_size: usize,
        /// Comma-separated candidate ids already elected
        #[arg(short, long, value_delimiter = ',')]
        committee: Vec<usize>,
    },
}

#[derive(Deserialize)]
struct ProfileFile {
    num_cand: usize,
    ballots: Vec<BallotEntry>,
}

#[derive(Deserialize)]
struct BallotEntry {
    approved: Vec<usize>,
    #[serde(default = "unit_weight")]
    weight: u32,
}

fn unit_weight() -> u32 {
    1
}

fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn load_profile(path: &Path) -> Profile {
    let source = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("cannot read {}: {}", path.display(), e)));
    let file: ProfileFile = serde_json::from_str(&source)
        .unwrap_or_else(|e| fail(format!("invalid profile {}: {}", path.display(), e)));

    let mut profile = Profile::new(file.num_cand);
    profile
        .add_ballots(
            file.ballots
                .into_iter()
                .map(|entry| Ballot::with_weight(entry.approved, entry.weight)),
        )
        .unwrap_or_else(|e| fail(e));
    profile
}

fn check_committee(profile: &Profile, committee: &[usize]) {
    if let Some(cand) = committee.iter().find(|&&c| c >= profile.num_cand()) {
        fail(format!(
            "candidate {} is out of range (num_cand = {})",
            cand,
            profile.num_cand()
        ));
    }
}

fn ilp_rules(node_limit: Option<usize>, verbose: bool) -> IlpRules {
    let mut config = IlpConfig::default().with_output(verbose);
    if let Some(limit) = node_limit {
        config = config.with_node_limit(limit);
    }
    IlpRules::new().with_config(config)
}

fn print_outcome(rule: &str, outcome: &IlpOutcome, format: &str) {
    if format == "json" {
        let json = serde_json::to_string_pretty(outcome).unwrap_or_else(|e| fail(e));
        println!("{}", json);
        return;
    }

    println!("Rule: {}", rule);
    if outcome.is_optimal() {
        println!("Status: OPTIMAL");
    } else {
        println!(
            "Status: {} (code {}), results may be incomplete",
            outcome.status.to_string().to_uppercase(),
            outcome.status.code()
        );
    }
    println!();
    println!("Committees ({}):", outcome.committees.len());
    for committee in &outcome.committees {
        let members: Vec<String> = committee.iter().map(|c| c.to_string()).collect();
        println!("  {{{}}}", members.join(", "));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Thiele {
            file,
            rule,
            committee_size,
            resolute,
            node_limit,
            verbose,
            format,
        } => {
            let profile = load_profile(&file);
            let outcome = ilp_rules(node_limit, verbose)
                .thiele(&profile, committee_size, &rule, resolute)
                .unwrap_or_else(|e| fail(e));
            print_outcome(&rule, &outcome, &format);
        }
        Commands::Monroe {
            file,
            committee_size,
            resolute,
            node_limit,
            verbose,
            format,
        } => {
            let profile = load_profile(&file);
            let outcome = ilp_rules(node_limit, verbose)
                .monroe(&profile, committee_size, resolute)
                .unwrap_or_else(|e| fail(e));
            print_outcome("monroe", &outcome, &format);
        }
        Commands::Score { file, rule, committee } => {
            let profile = load_profile(&file);
            check_committee(&profile, &committee);
            let score = abcvote_rules::thiele_score_by_name(&profile, &committee, &rule)
                .unwrap_or_else(|e| fail(e));
            println!("{}-score of {:?}: {} (~{:.6})", rule, committee, score, to_f64(&score));
        }
        Commands::Marginal {
            file,
            rule,
            committee_size,
            committee,
        } => {
            let profile = load_profile(&file);
            check_committee(&profile, &committee);
            let scorefct = ScoreFunction::parse(&rule, committee_size).unwrap_or_else(|e| fail(e));
            let marginal = abcvote_rules::additional_thiele_scores(&profile, &committee, &scorefct);

            println!("Marginal {}-scores given {:?}:", scorefct, committee);
            for (cand, gain) in marginal.iter().enumerate() {
                match gain {
                    Some(gain) => println!("  {:4} {:>12} (~{:.6})", cand, gain.to_string(), to_f64(gain)),
                    None => println!("  {:4} {:>12}", cand, "elected"),
                }
            }
        }
    }
}
