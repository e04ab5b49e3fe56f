use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::cards::Rank;
use crate::display::{outcome_grid, policy_grid, print_error, state_space_summary};
use crate::error::PokerResult;
use crate::opponent::{OpponentModel, RandomModel, ThresholdModel};
use crate::play::run_play;
use crate::probabilities::ProbabilityTables;
use crate::solvers::{policy_iteration, QLearning};
use crate::state_space::{validate, StateSpaceBuilder};

#[derive(Parser)]
#[command(
    name = "minilimit",
    version = "1.0.0",
    about = "Two-round limit poker: live engine, exact MDP builder, and tabular solvers."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum Opponent {
    #[value(name = "random")]
    Random,
    #[value(name = "threshold")]
    Threshold,
}

impl Opponent {
    fn model(&self) -> Box<dyn OpponentModel> {
        match self {
            Opponent::Random => Box::new(RandomModel),
            Opponent::Threshold => Box::new(ThresholdModel),
        }
    }
}

#[derive(Clone, ValueEnum)]
enum Algorithm {
    #[value(name = "policy-iteration")]
    PolicyIteration,
    #[value(name = "q-learning")]
    QLearning,
}

#[derive(Subcommand)]
enum Commands {
    /// Play hands against an opponent model
    Play {
        /// Opponent behavior
        #[arg(short, long, default_value = "threshold")]
        opponent: Opponent,
        /// Seed for reproducible dealing
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compute the exact card-probability tables
    Tables {
        /// Hero rank for the printed showdown grid
        #[arg(long, default_value = "A")]
        hand: char,
        /// Dump all tables as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build the MDP induced by a known opponent
    StateSpace {
        #[arg(short, long, default_value = "threshold")]
        opponent: Opponent,
        /// Dump the state space as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Solve the MDP and print the round-1 policy
    Solve {
        #[arg(short, long, default_value = "threshold")]
        opponent: Opponent,
        #[arg(short, long, default_value = "policy-iteration")]
        algorithm: Algorithm,
        /// Training episodes (q-learning only)
        #[arg(long, default_value = "200000")]
        episodes: u64,
        #[arg(long, default_value = "0")]
        seed: u64,
        /// Dump the solver output as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli) {
        print_error(&err.to_string());
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> PokerResult<()> {
    match cli.command {
        Commands::Play { opponent, seed } => {
            let model = opponent.model();
            run_play(model.as_ref(), seed)
        }

        Commands::Tables { hand, out } => {
            let hand = Rank::from_char(hand.to_ascii_uppercase())?;
            let tables = ProbabilityTables::compute()?;
            println!("{}", outcome_grid(&tables, hand));
            if let Some(path) = out {
                fs::write(&path, serde_json::to_string_pretty(&tables.to_json())?)?;
                println!("Tables written to {}", path.display().to_string().bold());
            }
            Ok(())
        }

        Commands::StateSpace { opponent, out } => {
            let model = opponent.model();
            let tables = ProbabilityTables::compute()?;
            let space = StateSpaceBuilder::new(&tables, model.as_ref()).build()?;
            validate(&space)?;
            println!("{}", state_space_summary(&space, model.name()));
            if let Some(path) = out {
                fs::write(&path, serde_json::to_string_pretty(&space)?)?;
                println!("State space written to {}", path.display().to_string().bold());
            }
            Ok(())
        }

        Commands::Solve {
            opponent,
            algorithm,
            episodes,
            seed,
            out,
        } => {
            let model = opponent.model();
            let tables = ProbabilityTables::compute()?;
            let space = StateSpaceBuilder::new(&tables, model.as_ref()).build()?;
            validate(&space)?;

            match algorithm {
                Algorithm::PolicyIteration => {
                    let result = policy_iteration(&space, 1.0, 1e-10);
                    println!(
                        "Policy iteration vs {} converged after {} iterations",
                        model.name().bold(),
                        result.iterations
                    );
                    println!("{}", policy_grid(&result.policy));
                    if let Some(path) = out {
                        fs::write(&path, serde_json::to_string_pretty(&result)?)?;
                        println!("Solution written to {}", path.display().to_string().bold());
                    }
                }
                Algorithm::QLearning => {
                    let mut learner = QLearning::new(&space, seed);
                    learner.train(episodes);
                    println!(
                        "Q-learning vs {} over {} episodes",
                        model.name().bold(),
                        episodes
                    );
                    println!("{}", policy_grid(&learner.model.policy));
                    if let Some(path) = out {
                        fs::write(&path, serde_json::to_string_pretty(&learner.model)?)?;
                        println!("Model written to {}", path.display().to_string().bold());
                    }
                }
            }
            Ok(())
        }
    }
}
