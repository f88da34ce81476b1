use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use kdam::{tqdm, Bar, BarExt};
use plotters::style::{BLUE, GREEN};
use rand::rngs::StdRng;
use rand::SeedableRng;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use student_mdp::algorithms::{MonteCarlo, QLearning, Step, ValueIteration};
use student_mdp::config::{MonteCarloConfig, QLearningConfig, ValueIterationConfig};
use student_mdp::env::{student_mdp, Mdp};
use student_mdp::observer::{Observer, QUpdate, Reporter, Silent, StateUpdate, TracingObserver, ValueUpdate};
use student_mdp::policy::Policy;
use student_mdp::utils::{moving_average, plot_moving_average};

#[derive(StructOpt, Debug, Clone, Copy, PartialEq)]
enum Command {
    /// Solve the MDP exactly with synchronous value iteration
    ValueIteration,
    /// Learn Q-values under the equiprobable policy
    QLearning,
    /// Estimate state values of the equiprobable policy
    MonteCarlo,
    /// Run the three solvers one after the other
    All,
}

/// Solve the student MDP with value iteration, Q-learning and Monte Carlo
#[derive(StructOpt, Debug)]
#[structopt(name = "RLRust - Student MDP")]
struct Cli {
    #[structopt(subcommand)]
    command: Command,

    /// Discount factor used by value iteration and Q-learning
    #[structopt(long = "discount_factor", default_value = "0.99")]
    discount_factor: f64,

    /// Largest change below which value iteration and Q-learning stop
    #[structopt(long = "threshold", default_value = "0.001")]
    threshold: f64,

    /// Initial learning rate of Q-learning
    #[structopt(long = "learning_rate", default_value = "0.2")]
    learning_rate: f64,

    /// Factor applied to the learning rate after every Q-learning episode
    #[structopt(long = "learning_rate_decay", default_value = "0.995")]
    learning_rate_decay: f64,

    /// Give up after this many sweeps or Q-learning episodes
    #[structopt(long = "max_iterations")]
    max_iterations: Option<usize>,

    /// Number of Monte Carlo episodes
    #[structopt(long = "n_episodes", short = "n", default_value = "50")]
    n_episodes: usize,

    /// Constant step size of the Monte Carlo update
    #[structopt(long = "step_size", default_value = "0.1")]
    step_size: f64,

    /// Seed of the random generator, drawn from the OS when absent
    #[structopt(long = "seed")]
    seed: Option<u64>,

    /// Directory where charts are written
    #[structopt(long = "plot_dir", parse(from_os_str))]
    plot_dir: Option<PathBuf>,

    /// Moving average window used on the charts
    #[structopt(long = "moving_average_window", default_value = "10")]
    moving_average_window: usize,

    /// Log every sweep, update and episode
    #[structopt(long = "narrate")]
    narrate: bool,
}

/// Forwards to a [`Reporter`] and advances a progress bar once per episode.
struct Progress {
    reporter: Reporter,
    bar: Bar,
}

impl Progress {
    fn new(reporter: Reporter, total: usize, description: &str) -> Self {
        let mut bar = tqdm!(total = total);
        bar.set_description(description);
        Self { reporter, bar }
    }

    fn tick(&mut self) {
        self.bar.update(1);
    }
}

impl Observer for Progress {
    fn on_sweep(&mut self, mdp: &Mdp, sweep: usize, updates: &[StateUpdate], max_change: f64) {
        self.reporter.on_sweep(mdp, sweep, updates, max_change);
        self.bar.set_postfix(format!("max change={:.5}", max_change));
        self.tick();
    }

    fn on_q_update(&mut self, mdp: &Mdp, episode: usize, update: &QUpdate) {
        self.reporter.on_q_update(mdp, episode, update);
    }

    fn on_q_episode_end(&mut self, mdp: &Mdp, episode: usize, max_change: f64, learning_rate: f64) {
        self.reporter.on_q_episode_end(mdp, episode, max_change, learning_rate);
        self.bar
            .set_postfix(format!("max change={:.5}, learning rate={:.4}", max_change, learning_rate));
        self.tick();
    }

    fn on_mc_episode(&mut self, mdp: &Mdp, episode: usize, steps: &[Step], updates: &[ValueUpdate]) {
        self.reporter.on_mc_episode(mdp, episode, steps, updates);
        self.tick();
    }
}

fn reporter(narrate: bool) -> Reporter {
    if narrate {
        Reporter::TracingObserver(TracingObserver)
    } else {
        Reporter::Silent(Silent)
    }
}

fn print_policy(mdp: &Mdp, policy: &Policy) {
    println!("Policy:");
    for (state, action) in policy.labels(mdp) {
        println!("  {:>6} -> {}", state, action);
    }
}

fn run_value_iteration(cli: &Cli, mdp: &Mdp) -> anyhow::Result<()> {
    let config = ValueIterationConfig::default()
        .with_discount_factor(cli.discount_factor)
        .with_threshold(cli.threshold)
        .with_max_sweeps(cli.max_iterations);
    let mut progress = Progress::new(reporter(cli.narrate), cli.max_iterations.unwrap_or(0), "Value iteration");

    let now: Instant = Instant::now();
    let result = ValueIteration::new(config)
        .solve(mdp, &mut progress)
        .context("value iteration failed")?;
    eprintln!();
    println!("Value iteration converged after {} sweeps in {:.2?}", result.sweeps, now.elapsed());

    println!("State values:");
    for state in mdp.states() {
        println!("  {:>6}: {:.3}", mdp.name(state), result.values.get(state));
    }
    print_policy(mdp, &result.policy);
    Ok(())
}

fn run_q_learning(cli: &Cli, mdp: &Mdp, rng: &mut StdRng) -> anyhow::Result<()> {
    let config = QLearningConfig::default()
        .with_discount_factor(cli.discount_factor)
        .with_threshold(cli.threshold)
        .with_learning_rate(cli.learning_rate)
        .with_learning_rate_decay(cli.learning_rate_decay)
        .with_max_episodes(cli.max_iterations);
    let mut progress = Progress::new(reporter(cli.narrate), cli.max_iterations.unwrap_or(0), "Q-learning");

    let now: Instant = Instant::now();
    let result = QLearning::new(config)
        .train(mdp, rng, &mut progress)
        .context("q-learning failed")?;
    eprintln!();
    println!(
        "Q-learning converged after {} episodes in {:.2?} (final learning rate {:.4})",
        result.episodes,
        now.elapsed(),
        result.learning_rate
    );

    println!("Q-values:");
    for state in mdp.states() {
        let values: Vec<String> = result
            .q_values
            .values(state)
            .iter()
            .enumerate()
            .map(|(a, q)| format!("{}: {:.3}", mdp.action_name(state, a), q))
            .collect();
        println!("  {:>6}: {}", mdp.name(state), values.join(", "));
    }
    print_policy(mdp, &result.policy);

    if let Some(dir) = &cli.plot_dir {
        let averaged = moving_average(cli.moving_average_window, &result.max_changes);
        let path = dir.join("q_learning_max_change.png");
        plot_moving_average(&[averaged], &[&BLUE], &["Q-learning"], "Max change per episode", &path)
            .with_context(|| format!("could not write {}", path.display()))?;
        println!("Chart written to {}", path.display());
    }
    Ok(())
}

fn run_monte_carlo(cli: &Cli, mdp: &Mdp, rng: &mut StdRng) -> anyhow::Result<()> {
    let config = MonteCarloConfig::default()
        .with_episodes(cli.n_episodes)
        .with_step_size(cli.step_size);
    let mut progress = Progress::new(reporter(cli.narrate), cli.n_episodes, "Monte Carlo");

    let now: Instant = Instant::now();
    let result = MonteCarlo::new(config)
        .evaluate(mdp, rng, &mut progress)
        .context("monte carlo evaluation failed")?;
    eprintln!();
    println!("Monte Carlo ran {} episodes in {:.2?}", cli.n_episodes, now.elapsed());

    println!("State values:");
    for state in mdp.states() {
        println!(
            "  {:>6}: {:.3} ({} visits)",
            mdp.name(state),
            result.values.get(state),
            result.visits[state]
        );
    }
    println!("Average reward: {:.3}", result.average_reward());
    println!("Min reward: {:.3}", result.min_reward());
    println!("Max reward: {:.3}", result.max_reward());

    if let Some(dir) = &cli.plot_dir {
        let averaged = moving_average(cli.moving_average_window, &result.episode_rewards);
        let path = dir.join("monte_carlo_rewards.png");
        plot_moving_average(&[averaged], &[&GREEN], &["Monte Carlo"], "Episode rewards", &path)
            .with_context(|| format!("could not write {}", path.display()))?;
        println!("Chart written to {}", path.display());
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("could not create {}", dir.display()))
}

fn main() -> anyhow::Result<()> {
    let cli: Cli = Cli::from_args();

    let filter = if cli.narrate {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    if let Some(dir) = &cli.plot_dir {
        ensure_dir(dir)?;
    }

    let mdp: Mdp = student_mdp().context("could not build the student MDP")?;
    let mut rng: StdRng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match cli.command {
        Command::ValueIteration => run_value_iteration(&cli, &mdp)?,
        Command::QLearning => run_q_learning(&cli, &mdp, &mut rng)?,
        Command::MonteCarlo => run_monte_carlo(&cli, &mdp, &mut rng)?,
        Command::All => {
            run_value_iteration(&cli, &mdp)?;
            run_q_learning(&cli, &mdp, &mut rng)?;
            run_monte_carlo(&cli, &mdp, &mut rng)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use student_mdp::observer::{Event, Recorder};

    #[test]
    fn progress_forwards_events_and_counts_episodes() {
        let mdp = student_mdp().unwrap();
        let mut progress = Progress::new(Reporter::Recorder(Recorder::default()), 0, "test");
        let result = QLearning::default()
            .train(&mdp, &mut StdRng::seed_from_u64(6), &mut progress)
            .unwrap();

        assert_eq!(progress.bar.get_counter(), result.episodes);
        match &progress.reporter {
            Reporter::Recorder(recorder) => {
                let ends = recorder
                    .events
                    .iter()
                    .filter(|e| matches!(e, Event::QEpisodeEnd { .. }))
                    .count();
                assert_eq!(ends, result.episodes);
            }
            other => panic!("unexpected reporter {other:?}"),
        }
    }
}
