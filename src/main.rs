use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gridmdp::config::{BoardParams, EvaluationMode, SolverParams};
use gridmdp::sweep::{self, Axis};
use gridmdp::{Algorithm, Board, format_cells, format_policy, generator, render};

#[derive(Parser)]
#[command(name = "gridmdp")]
#[command(version, about = "Value and policy iteration on grid-world MDPs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a board and print utilities and policies
    Solve(SolveArgs),

    /// Average iteration counts over random boards while varying one parameter
    Sweep(SweepArgs),

    /// Print a random board as JSON
    Board(RandomBoardArgs),
}

#[derive(Args)]
struct SolveArgs {
    /// Board file (JSON with rewards, walls, terminals). Defaults to the 6x6 demo board
    #[arg(long, conflicts_with = "random")]
    board: Option<PathBuf>,

    /// Solve a random board instead
    #[arg(long)]
    random: bool,

    #[command(flatten)]
    random_board: RandomBoardArgs,

    #[command(flatten)]
    solver: SolverArgs,

    /// Algorithms to run (all three when omitted)
    #[arg(long, value_enum)]
    algorithm: Vec<Algorithm>,

    /// Directory for utility, policy and history PNGs
    #[arg(long, default_value = "artifacts")]
    out: PathBuf,

    /// Skip writing PNGs
    #[arg(long)]
    no_plots: bool,

    /// Pixels per cell in the utility and policy images
    #[arg(long, default_value_t = 48)]
    cell_px: usize,
}

#[derive(Args, Clone)]
struct RandomBoardArgs {
    #[arg(long, default_value_t = 6)]
    size: usize,
    #[arg(long, default_value_t = 0.2)]
    wall_probability: f64,
    #[arg(long, default_value_t = 0.2)]
    reward_probability: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl From<&RandomBoardArgs> for BoardParams {
    fn from(a: &RandomBoardArgs) -> Self {
        BoardParams {
            size: a.size,
            wall_probability: a.wall_probability,
            reward_probability: a.reward_probability,
            seed: a.seed,
        }
    }
}

#[derive(Args)]
struct SolverArgs {
    /// Discount factor, strictly between 0 and 1
    #[arg(long, default_value_t = 0.99)]
    gamma: f64,
    /// Value-iteration threshold, also the policy-evaluation threshold
    #[arg(long, default_value_t = 0.001)]
    epsilon: f64,
    /// Evaluation sweeps per round for modified policy iteration
    #[arg(long, default_value_t = 10)]
    sweeps: usize,
}

impl From<&SolverArgs> for SolverParams {
    fn from(a: &SolverArgs) -> Self {
        SolverParams {
            gamma: a.gamma,
            epsilon: a.epsilon,
            evaluation: EvaluationMode::Sweeps(a.sweeps),
            ..Default::default()
        }
    }
}

#[derive(Args)]
struct SweepArgs {
    #[arg(long, value_enum)]
    axis: Axis,
    /// Random boards per sample point
    #[arg(long, default_value_t = 5)]
    trials: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Also write the results as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Solve(args) => solve(args),
        Commands::Sweep(args) => run_sweep(args),
        Commands::Board(args) => {
            let board = generator::generate(&BoardParams::from(&args))?;
            println!("{}", serde_json::to_string_pretty(&board.to_spec())?);
            Ok(())
        }
    }
}

fn load_board(args: &SolveArgs) -> Result<Board> {
    if let Some(path) = &args.board {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read board file {}", path.display()))?;
        return Board::from_json(&text)
            .with_context(|| format!("invalid board file {}", path.display()));
    }
    if args.random {
        return Ok(generator::generate(&BoardParams::from(&args.random_board))?);
    }
    Ok(Board::demo())
}

fn solve(args: SolveArgs) -> Result<()> {
    let board = load_board(&args)?;
    let params = SolverParams::from(&args.solver);
    let algorithms = if args.algorithm.is_empty() {
        Algorithm::ALL.to_vec()
    } else {
        args.algorithm.clone()
    };

    if !args.no_plots {
        std::fs::create_dir_all(&args.out)
            .with_context(|| format!("failed to create {}", args.out.display()))?;
    }

    for algorithm in algorithms {
        let sol = gridmdp::solve(&board, algorithm, &params)?;
        println!("{algorithm}: {} iterations", sol.iterations);
        println!("--------POLICY---------");
        print!("{}", format_policy(&sol.policy));
        println!("--------UTILITY---------");
        print!("{}", format_cells(&sol.utilities));

        if !args.no_plots {
            let save = |suffix: &str, img: &render::Image| -> Result<()> {
                let path = args.out.join(format!("{algorithm}_{suffix}.png"));
                render::save_png(&path, img)?;
                eprintln!("Saved {}", path.display());
                Ok(())
            };
            save("utility", &render::render_utility(&board, &sol.utilities, args.cell_px))?;
            save("policy", &render::render_policy(&board, &sol.policy, args.cell_px))?;
            save("history", &render::render_history(&sol.history, 1000, 1000))?;
        }
    }
    Ok(())
}

fn run_sweep(args: SweepArgs) -> Result<()> {
    let base = BoardParams {
        seed: args.seed,
        ..sweep::sweep_base()
    };
    let values = args.axis.default_values();
    let points = sweep::run(args.axis, &values, &base, &sweep::sweep_solver(), args.trials)?;

    println!("{:>8} {:>16} {:>16}", "value", "value_iter", "policy_iter");
    for p in &points {
        println!("{:>8.2} {:>16.1} {:>16.1}", p.value, p.value_iteration, p.policy_iteration);
    }

    if let Some(path) = &args.json {
        write_json(path, &points)?;
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("Saved {}", path.display());
    Ok(())
}
