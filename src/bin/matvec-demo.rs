use std::ops::Range;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use rand::Rng;

use taskpool::{default_thread_count, Result, WorkerPool};

#[derive(Parser)]
#[command(
    name = "matvec-demo",
    version,
    about = "Parallel matrix x vector multiply on a worker pool"
)]
struct Cli {
    /// Number of worker threads to run
    #[arg(short = 't', long, default_value_t = default_thread_count())]
    threads: usize,

    /// Print the inputs and the result
    #[arg(short, long)]
    verbose: bool,

    /// Number of rows in the multiplied matrix
    #[arg(long, default_value_t = 10000)]
    matrix_rows: usize,

    /// Number of cols in the multiplied matrix
    #[arg(long, default_value_t = 10000)]
    matrix_cols: usize,
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{}", e);
        exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut rng = rand::thread_rng();
    let matrix = Arc::new(generate(cli.matrix_rows * cli.matrix_cols, &mut rng));
    let vector = Arc::new(generate(cli.matrix_cols, &mut rng));

    if cli.verbose {
        print_matrix(&matrix, cli.matrix_rows, cli.matrix_cols);
        print_vector(&vector);
    }

    let pool = WorkerPool::new(cli.threads)?;
    info!(
        "multiplying a {}x{} matrix on {} workers",
        cli.matrix_rows,
        cli.matrix_cols,
        pool.workers()
    );

    // One chunk of rows per worker; each job returns its own owned slice
    // of the result, so no shared buffer is ever written concurrently.
    let mut handles = Vec::new();
    for rows in row_ranges(cli.matrix_rows, cli.threads) {
        let matrix = Arc::clone(&matrix);
        let vector = Arc::clone(&vector);
        let cols = cli.matrix_cols;
        handles.push(pool.submit(move || multiply_rows(&matrix, cols, rows, &vector))?);
    }

    let mut result = Vec::with_capacity(cli.matrix_rows);
    for handle in handles {
        result.extend(handle.get()?);
    }

    if cli.verbose {
        print_vector(&result);
    }

    Ok(())
}

/// Fills a vector with `size` random entries in -9..=9.
fn generate(size: usize, rng: &mut impl Rng) -> Vec<i32> {
    (0..size).map(|_| rng.gen_range(-9..=9)).collect()
}

/// Splits `0..rows` into at most `chunks` contiguous ranges whose sizes
/// differ by at most one, so trailing rows are never dropped when the
/// row count does not divide evenly.
fn row_ranges(rows: usize, chunks: usize) -> Vec<Range<usize>> {
    let chunks = chunks.min(rows).max(1);
    let base = rows / chunks;
    let extra = rows % chunks;
    let mut ranges = Vec::with_capacity(chunks);
    let mut start = 0;
    for i in 0..chunks {
        let len = base + usize::from(i < extra);
        if len == 0 {
            break;
        }
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Multiplies the given rows of a row-major matrix by `vector`.
fn multiply_rows(matrix: &[i32], cols: usize, rows: Range<usize>, vector: &[i32]) -> Vec<i32> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut sum = 0;
        for col in 0..cols {
            sum += matrix[row * cols + col] * vector[col];
        }
        out.push(sum);
    }
    out
}

fn print_matrix(matrix: &[i32], rows: usize, cols: usize) {
    println!();
    for row in 0..rows {
        for col in 0..cols {
            print!("{:2} ", matrix[row * cols + col]);
        }
        println!();
    }
    println!();
}

fn print_vector(vector: &[i32]) {
    println!();
    for value in vector {
        print!("{value:2} ");
    }
    println!();
}
