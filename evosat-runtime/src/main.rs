use anyhow::{anyhow, Context, Result};
use clap::{arg, ArgAction, ArgMatches, Command};
use evosat_algorithms::satisfiability::{genetic_sat, wpso_sat, SearchOutcome};
use evosat_challenges::satisfiability::{Challenge, Difficulty, Solution};
use serde_json::{Map, Value};
use std::{fs, io::Read, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const GENETIC_USIZE_ARGS: [&str; 4] = [
    "max_iterations",
    "generation_size",
    "selection_size",
    "tournament_size",
];
const GENETIC_F64_ARGS: [&str; 2] = ["mutation_rate", "crossover_p"];
const GENETIC_STR_ARGS: [&str; 1] = ["selection"];

const WPSO_USIZE_ARGS: [&str; 3] = ["num_particles", "max_iteration", "max_flip"];
const WPSO_F64_ARGS: [&str; 3] = ["w", "c1", "c2"];
const WPSO_STR_ARGS: [&str; 1] = ["position_update"];

fn search_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(arg!(<CNF> "Path to a DIMACS cnf file").value_parser(clap::value_parser!(PathBuf)))
        .arg(
            arg!(--hyperparameters <HYPERPARAMETERS> "Hyperparameters json string or path to json file. Flags take precedence")
                .required(false)
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            arg!(--seed <SEED> "Seed for the random number generator")
                .default_value("0")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--output <OUTPUT_FILE> "If set, the result will be saved to this file path instead of stdout")
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

fn usize_arg(arg: clap::Arg) -> clap::Arg {
    arg.required(false).value_parser(clap::value_parser!(usize))
}

fn f64_arg(arg: clap::Arg) -> clap::Arg {
    arg.required(false).value_parser(clap::value_parser!(f64))
}

fn cli() -> Command {
    Command::new("evosat")
        .about("Approximate MAX-SAT with genetic and particle swarm search")
        .arg_required_else_help(true)
        .arg(
            arg!(-v --verbose "Increase logging verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            search_command("genetic", "Runs the genetic search engine")
                .arg(usize_arg(arg!(--max_iterations <N> "Generations before giving up (default 1000)")))
                .arg(usize_arg(arg!(--generation_size <N> "Individuals per generation (default 100)")))
                .arg(f64_arg(arg!(--mutation_rate <P> "Probability that a child gets one bit flipped (default 0.01)")))
                .arg(usize_arg(arg!(--selection_size <N> "Size of the reproduction pool (default 10)")))
                .arg(f64_arg(arg!(--crossover_p <P> "Probability of keeping a parent's bit during uniform crossover (default 0.5)")))
                .arg(
                    arg!(--selection <POLICY> "Reproduction pool policy (default lowest)")
                        .required(false)
                        .value_parser(["lowest", "highest", "tournament"]),
                )
                .arg(usize_arg(arg!(--tournament_size <N> "Draws per tournament (default 20)"))),
        )
        .subcommand(
            search_command("wpso", "Runs the weighted particle swarm engine")
                .arg(usize_arg(arg!(--num_particles <N> "Particles in the swarm (default 20)")))
                .arg(usize_arg(arg!(--max_iteration <N> "Iterations before giving up (default 1000)")))
                .arg(usize_arg(arg!(--max_flip <N> "Flip budget of each local search (default 30000)")))
                .arg(f64_arg(arg!(--w <W> "Inertia factor (default 1)")))
                .arg(f64_arg(arg!(--c1 <C1> "Individual factor (default 1.7)")))
                .arg(f64_arg(arg!(--c2 <C2> "Social factor (default 2.1)")))
                .arg(
                    arg!(--position_update <STRATEGY> "How particles move (default local_search)")
                        .required(false)
                        .value_parser(["local_search", "flight"]),
                ),
        )
        .subcommand(
            Command::new("verify_solution")
                .about("Verifies that a solution satisfies every clause")
                .arg(arg!(<CNF> "Path to a DIMACS cnf file").value_parser(clap::value_parser!(PathBuf)))
                .arg(
                    arg!(<SOLUTION> "Solution or search result json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("generate_instance")
                .about("Generates a random 3-SAT instance in DIMACS format")
                .arg(
                    arg!(--num_variables <N> "Number of variables")
                        .required(true)
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--clauses_to_variables_percent <PERCENT> "Clauses per 100 variables")
                        .default_value("426")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    arg!(--seed <SEED> "Seed for the random number generator")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--output <OUTPUT_FILE> "If set, the instance will be saved to this file path instead of stdout")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    if let Err(e) = match matches.subcommand() {
        Some(("genetic", sub_m)) => run_search(sub_m, genetic_sat::solve_challenge, |m, map| {
            merge_flags(m, map, &GENETIC_USIZE_ARGS, &GENETIC_F64_ARGS, &GENETIC_STR_ARGS)
        }),
        Some(("wpso", sub_m)) => run_search(sub_m, wpso_sat::solve_challenge, |m, map| {
            merge_flags(m, map, &WPSO_USIZE_ARGS, &WPSO_F64_ARGS, &WPSO_STR_ARGS)
        }),
        Some(("verify_solution", sub_m)) => verify_solution(
            sub_m.get_one::<PathBuf>("CNF").unwrap(),
            sub_m.get_one::<String>("SOLUTION").unwrap(),
        ),
        Some(("generate_instance", sub_m)) => generate_instance(
            *sub_m.get_one::<usize>("num_variables").unwrap(),
            *sub_m.get_one::<u32>("clauses_to_variables_percent").unwrap(),
            *sub_m.get_one::<u64>("seed").unwrap(),
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

type SolveFn = fn(&Challenge, &Option<Map<String, Value>>, u64) -> Result<SearchOutcome>;

fn run_search(
    sub_m: &ArgMatches,
    solve: SolveFn,
    flags: impl Fn(&ArgMatches, &mut Map<String, Value>),
) -> Result<()> {
    let challenge = load_challenge(sub_m.get_one::<PathBuf>("CNF").unwrap())?;
    let mut hyperparameters = match sub_m.get_one::<String>("hyperparameters") {
        Some(arg) => match load_json(arg)? {
            Value::Object(map) => map,
            _ => return Err(anyhow!("Hyperparameters must be a json object")),
        },
        None => Map::new(),
    };
    flags(sub_m, &mut hyperparameters);
    let seed = *sub_m.get_one::<u64>("seed").unwrap();

    info!(
        num_variables = challenge.num_variables(),
        num_clauses = challenge.num_clauses(),
        seed,
        "starting search"
    );
    let outcome = solve(&challenge, &Some(hyperparameters), seed)?;
    write_output(
        sub_m.get_one::<PathBuf>("output"),
        &serde_json::to_string_pretty(&outcome)?,
    )
}

fn merge_flags(
    sub_m: &ArgMatches,
    map: &mut Map<String, Value>,
    usize_args: &[&str],
    f64_args: &[&str],
    str_args: &[&str],
) {
    for &key in usize_args {
        if let Some(&v) = sub_m.get_one::<usize>(key) {
            map.insert(key.to_string(), Value::from(v));
        }
    }
    for &key in f64_args {
        if let Some(&v) = sub_m.get_one::<f64>(key) {
            map.insert(key.to_string(), Value::from(v));
        }
    }
    for &key in str_args {
        if let Some(v) = sub_m.get_one::<String>(key) {
            map.insert(key.to_string(), Value::from(v.as_str()));
        }
    }
}

pub fn verify_solution(cnf: &PathBuf, solution: &str) -> Result<()> {
    let challenge = load_challenge(cnf)?;
    let solution = match load_json(solution)? {
        // accept the output of a search run as well as a bare solution
        Value::Object(mut map) if map.contains_key("solution") => {
            serde_json::from_value::<Solution>(map.remove("solution").unwrap_or(Value::Null))
        }
        value => serde_json::from_value::<Solution>(value),
    }
    .context("Invalid solution")?;

    challenge
        .verify_solution(&solution)
        .context("Invalid solution")?;
    println!("Solution is valid");
    Ok(())
}

pub fn generate_instance(
    num_variables: usize,
    clauses_to_variables_percent: u32,
    seed: u64,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let challenge = Challenge::generate_instance(
        seed,
        &Difficulty {
            num_variables,
            clauses_to_variables_percent,
        },
    )?;
    write_output(output_file.as_ref(), &challenge.to_dimacs())
}

fn load_challenge(path: &PathBuf) -> Result<Challenge> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to read cnf file: {}", path.display()))?;
    Challenge::from_dimacs_reader(file)
        .with_context(|| format!("Failed to parse cnf file: {}", path.display()))
}

fn load_json(arg: &str) -> Result<Value> {
    let content = if arg == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read json from stdin")?;
        buffer
    } else if arg.ends_with(".json") {
        fs::read_to_string(arg).with_context(|| format!("Failed to read json file: {}", arg))?
    } else {
        arg.to_string()
    };
    serde_json::from_str(&content).context("Failed to parse json")
}

fn write_output(output_file: Option<&PathBuf>, content: &str) -> Result<()> {
    match output_file {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write output file: {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcommand_names() {
        cli().debug_assert();

        let matches = cli()
            .try_get_matches_from(["evosat", "verify_solution", "formula.cnf", "[1,0]"])
            .unwrap();
        let (name, sub_m) = matches.subcommand().unwrap();
        assert_eq!(name, "verify_solution");
        assert_eq!(sub_m.get_one::<String>("SOLUTION").unwrap(), "[1,0]");

        let matches = cli()
            .try_get_matches_from(["evosat", "generate_instance", "--num_variables", "50"])
            .unwrap();
        let (name, sub_m) = matches.subcommand().unwrap();
        assert_eq!(name, "generate_instance");
        assert_eq!(*sub_m.get_one::<usize>("num_variables").unwrap(), 50);
        assert_eq!(*sub_m.get_one::<u32>("clauses_to_variables_percent").unwrap(), 426);

        assert!(cli()
            .try_get_matches_from(["evosat", "verify", "formula.cnf", "[1,0]"])
            .is_err());
        assert!(cli()
            .try_get_matches_from(["evosat", "generate", "--num_variables", "50"])
            .is_err());
    }
}
