use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config_file::FromConfigFile;
use serde::Serialize;

use cutstock_rl::{CutEnv, CutPolicy, PolicyConfig, PolicyKind, SimConfig, StockGrid};

/// Command line argument parser.
#[derive(Parser, Debug)]
#[command(about = "Train a learning policy on the 2D cutting-stock problem", long_about = None)]
struct Args {
    /// Path to the simulation TOML configuration file.
    config_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run episodes with the policy configured via environment variables
    /// (POLICY_ID, LEARNING_RATE, DISCOUNT_FACTOR, EXPLORATION_RATE).
    Run {
        /// Number of episodes to run.
        #[arg(long, default_value_t = 100)]
        episodes: u64,
        /// Use the greedy largest-first heuristic instead of a learner.
        #[arg(long)]
        greedy: bool,
        /// Base RNG seed; episode e resets the environment with seed + e.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Write per-episode statistics to this CSV file.
        #[arg(long)]
        stats: Option<PathBuf>,
    },
    /// Print the first-fit position for an item on an empty stock sheet.
    Place {
        stock_w: usize,
        stock_h: usize,
        item_w: usize,
        item_h: usize,
    },
}

/// One CSV record per finished episode.
#[derive(Serialize, Debug)]
struct EpisodeStats {
    episode: u64,
    steps: usize,
    reward: f64,
    filled_ratio: f64,
}

fn main() {
    let args = Args::parse();

    match &args.command {
        Commands::Run {
            episodes,
            greedy,
            seed,
            stats,
        } => {
            let sim_config = read_sim_config(&args.config_path);
            let policy_config = build_policy_config(*greedy);
            run_episodes(sim_config, &policy_config, *episodes, *seed, stats.as_deref());
        }
        Commands::Place {
            stock_w,
            stock_h,
            item_w,
            item_h,
        } => {
            let grid = StockGrid::new(*stock_w, *stock_h);
            match grid.find_position((*item_w, *item_h)) {
                Some((x, y)) => println!("First fit at ({}, {})", x, y),
                None => println!("Item does not fit."),
            }
        }
    }
}

fn read_sim_config(config_path: &PathBuf) -> SimConfig {
    println!(
        "Reading config file: {}",
        config_path.to_str().expect("Invalid file path.")
    );
    SimConfig::from_config_file(config_path).expect("Unable to read configuration file.")
}

fn build_policy_config(greedy: bool) -> PolicyConfig {
    let mut config = match PolicyConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid policy configuration: {}", err);
            std::process::exit(1);
        }
    };
    if greedy {
        config.kind = PolicyKind::Greedy;
    }
    config
}

fn run_episodes(
    sim_config: SimConfig,
    policy_config: &PolicyConfig,
    episodes: u64,
    base_seed: u64,
    stats_path: Option<&std::path::Path>,
) {
    println!(
        "Policy: {:?}, alpha: {}, gamma: {}, epsilon: {}",
        policy_config.kind,
        policy_config.learning_rate,
        policy_config.discount_factor,
        policy_config.exploration_rate
    );

    let mut env = CutEnv::new(sim_config);
    let mut policy = CutPolicy::new(policy_config, base_seed);
    let mut all_stats: Vec<EpisodeStats> = Vec::new();

    for episode in 0..episodes {
        env.reset(base_seed + episode);
        let mut episode_reward = 0.0;
        loop {
            let action = {
                let obs = env.observe();
                policy.decide(&obs)
            };
            let outcome = env.step(&action);
            episode_reward += outcome.reward;
            if outcome.done() {
                break;
            }
        }
        let stats = EpisodeStats {
            episode,
            steps: env.steps(),
            reward: episode_reward,
            filled_ratio: env.filled_ratio(),
        };
        println!(
            "E{:5}  steps: {:4}, reward: {:8.3}, filled: {:.3}, states: {}",
            stats.episode,
            stats.steps,
            stats.reward,
            stats.filled_ratio,
            policy.table().len()
        );
        all_stats.push(stats);
    }

    print_summary(&all_stats);
    if let Some(path) = stats_path {
        write_stats(path, &all_stats);
    }
}

fn print_summary(all_stats: &[EpisodeStats]) {
    println!("--- Summary ---");
    if all_stats.is_empty() {
        println!("No episodes were run.");
        return;
    }
    let best = all_stats
        .iter()
        .map(|s| s.filled_ratio)
        .fold(f64::NEG_INFINITY, f64::max);
    let mean_reward: f64 =
        all_stats.iter().map(|s| s.reward).sum::<f64>() / all_stats.len() as f64;
    println!("Episodes: {}", all_stats.len());
    println!("Highest filled ratio: {:.3}", best);
    println!("Mean episode reward: {:.3}", mean_reward);
}

fn write_stats(path: &std::path::Path, all_stats: &[EpisodeStats]) {
    let mut writer = csv::Writer::from_path(path).expect("Unable to create stats file.");
    for stats in all_stats {
        writer.serialize(stats).expect("Unable to write stats record.");
    }
    writer.flush().expect("Unable to flush stats file.");
    println!("Wrote {} records to {}", all_stats.len(), path.display());
}
