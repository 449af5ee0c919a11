use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{Dataset, SplitOptions, read_similarity_matrix, write_matrix};
use knn::{KnnConfig, Normalization, PredictionStats, RatingRange, UserKnn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// user-knn - user-based KNN rating prediction
#[derive(Parser)]
#[command(name = "user-knn")]
#[command(
    about = "Predict missing ratings with user-based collaborative filtering",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a ratings file, predict the held-out ratings and report accuracy
    Predict {
        #[command(flatten)]
        data: DataArgs,

        /// Dense comma-delimited user x user similarity matrix
        #[arg(long)]
        similarity: PathBuf,

        /// JSON engine config; command-line flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Neighborhood size
        #[arg(short, long)]
        k: Option<usize>,

        /// Lowest valid rating
        #[arg(long)]
        min_rating: Option<f64>,

        /// Highest valid rating
        #[arg(long)]
        max_rating: Option<f64>,

        /// Normalization of the similarity weights
        #[arg(long, value_enum)]
        normalization: Option<NormalizationArg>,

        /// Predict users one after another instead of in parallel
        #[arg(long)]
        sequential: bool,

        /// Write the predicted matrix to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Split a ratings file and write the train and test matrices
    Split {
        #[command(flatten)]
        data: DataArgs,

        /// Destination of the training matrix
        #[arg(long)]
        train_out: PathBuf,

        /// Destination of the test matrix
        #[arg(long)]
        test_out: PathBuf,
    },
}

/// Where the ratings come from and how they are split
#[derive(Args)]
struct DataArgs {
    /// Ratings file with user, item, rating (and optional timestamp) per line
    #[arg(short, long, default_value = "data/ml-100k/u.data")]
    ratings: PathBuf,

    /// Field delimiter of the ratings file
    #[arg(long, default_value = "\t")]
    delimiter: String,

    /// Drop users with fewer ratings than this
    #[arg(long, default_value = "20")]
    min_ratings: usize,

    /// Ratings per user kept for training; the rest are predicted
    #[arg(long, default_value = "10")]
    train_ratings: usize,

    /// Visit ratings in a seeded random order before splitting
    #[arg(long)]
    shuffle: bool,

    /// Seed for --shuffle
    #[arg(long, default_value = "1")]
    seed: u64,
}

impl DataArgs {
    fn split_options(&self) -> SplitOptions {
        SplitOptions {
            min_ratings: self.min_ratings,
            train_ratings_per_user: self.train_ratings,
            shuffle: self.shuffle,
            seed: self.seed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum NormalizationArg {
    Signed,
    Absolute,
}

impl From<NormalizationArg> for Normalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::Signed => Normalization::Signed,
            NormalizationArg::Absolute => Normalization::Absolute,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Predict {
            data,
            similarity,
            config,
            k,
            min_rating,
            max_rating,
            normalization,
            sequential,
            output,
        } => {
            let mut knn_config = load_config(config.as_deref())?;
            if let Some(k) = k {
                knn_config.k = k;
            }
            if let Some(min) = min_rating {
                knn_config.rating_range.min = min;
            }
            if let Some(max) = max_rating {
                knn_config.rating_range.max = max;
            }
            if let Some(normalization) = normalization {
                knn_config.normalization = normalization.into();
            }
            if sequential {
                knn_config.parallel = false;
            }
            handle_predict(&data, &similarity, knn_config, output.as_deref())?
        }
        Commands::Split {
            data,
            train_out,
            test_out,
        } => handle_split(&data, &train_out, &test_out)?,
    }

    Ok(())
}

/// Engine config from a JSON file, or the defaults
fn load_config(path: Option<&Path>) -> Result<KnnConfig> {
    let Some(path) = path else {
        return Ok(KnnConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: KnnConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

fn load_dataset(data: &DataArgs) -> Result<Dataset> {
    println!("Loading ratings from {}...", data.ratings.display());
    let start = Instant::now();
    let dataset = Dataset::load(&data.ratings, &data.delimiter, &data.split_options())
        .context("Failed to load ratings")?;
    println!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    print_value("# users", dataset.users.len());
    print_value("# items", dataset.items.len());
    print_value("# removed users", dataset.removed_users);
    print_value("# train ratings", dataset.train.non_zeros_count());
    print_value("# test ratings", dataset.test.non_zeros_count());
    Ok(dataset)
}

/// Handle the 'predict' command
fn handle_predict(
    data: &DataArgs,
    similarity_path: &Path,
    config: KnnConfig,
    output: Option<&Path>,
) -> Result<()> {
    config.validate().context("Invalid engine configuration")?;
    let dataset = load_dataset(data)?;

    let similarity = read_similarity_matrix(similarity_path).with_context(|| {
        format!(
            "Failed to read similarity matrix {}",
            similarity_path.display()
        )
    })?;
    if !similarity.is_symmetric(1e-9) {
        tracing::warn!("Similarity matrix is not symmetric");
    }

    print_heading("User KNN");
    print_value("K", config.k);
    print_value("Normalization", format!("{:?}", config.normalization));
    let RatingRange { min, max } = config.rating_range;
    print_value("Rating range", format!("[{}, {}]", min, max));

    let start = Instant::now();
    let prediction = UserKnn::from_config(config)
        .predict(&dataset.train, &dataset.test, &similarity)
        .context("Prediction failed")?;
    let elapsed = start.elapsed();
    info!("Predicted {} ratings in {:?}", prediction.stats.predicted, elapsed);

    print_stats(&prediction.stats);
    let rmse = knn::rmse(&prediction.ratings, &dataset.test)?
        .ok_or_else(|| anyhow!("No test ratings to evaluate"))?;
    let mae = knn::mae(&prediction.ratings, &dataset.test)?
        .ok_or_else(|| anyhow!("No test ratings to evaluate"))?;
    print_value("RMSE", format!("{:.4}", rmse).bold());
    print_value("MAE", format!("{:.4}", mae).bold());
    print_value("Computation time", format!("{:.3}s", elapsed.as_secs_f64()));

    if let Some(path) = output {
        write_matrix(&prediction.ratings, path)
            .with_context(|| format!("Failed to write predictions to {}", path.display()))?;
        println!("{} Wrote predictions to {}", "✓".green(), path.display());
    }
    Ok(())
}

/// Handle the 'split' command
fn handle_split(data: &DataArgs, train_out: &Path, test_out: &Path) -> Result<()> {
    let dataset = load_dataset(data)?;

    write_matrix(&dataset.train, train_out)
        .with_context(|| format!("Failed to write {}", train_out.display()))?;
    write_matrix(&dataset.test, test_out)
        .with_context(|| format!("Failed to write {}", test_out.display()))?;

    println!("{} Wrote {} and {}", "✓".green(), train_out.display(), test_out.display());
    Ok(())
}

fn print_heading(title: &str) {
    println!("{}", "******************************************".blue());
    println!("{:^42}", title.bold());
    println!("{}", "******************************************".blue());
}

fn print_value(label: &str, value: impl std::fmt::Display) {
    println!("{:<23} │ {:>13}", label, value);
}

fn print_stats(stats: &PredictionStats) {
    print_value("# predictions", stats.predicted);
    print_value("# capped predictions", stats.capped.to_string().yellow());
    print_value("# default predictions", stats.defaulted.to_string().yellow());
}
