//! cirbuf - Magic Ring Buffer demo & benchmark
//!
//! Mengukur latency `offer`/`poll` untuk pesan berukuran tetap, termasuk
//! copy yang melewati titik wrap, dan (dengan `--threaded`) throughput
//! producer/consumer di dua thread.
//!
//! Usage:
//!   cargo run --release -- [OPTIONS]

use std::process;
use std::thread;
use std::time::Instant;

use cirbuf::{AllocationError, BufferConfig, CircularBuffer};
use thiserror::Error;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum BenchError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error("message size {message_size} must be in [1, {capacity})")]
    InvalidMessageSize {
        message_size: usize,
        capacity: usize,
    },
}

/// Konfigurasi benchmark
struct BenchConfig {
    buffer: BufferConfig,
    message_size: usize,
    iterations: usize,
    threaded: bool,
    verbose: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            buffer: BufferConfig::default(),
            message_size: 64,
            iterations: 1_000_000,
            threaded: false,
            verbose: false,
        }
    }
}

fn main() {
    let config = parse_args();
    init_tracing(config.verbose);

    info!("🚀 cirbuf - Magic Ring Buffer");

    if let Err(e) = run(&config) {
        error!("❌ benchmark failed: {}", e);
        process::exit(1);
    }

    info!("✅ All benchmarks complete!");
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(config: &BenchConfig) -> Result<(), BenchError> {
    let cb = CircularBuffer::from_config(&config.buffer)?;
    info!(
        capacity = cb.capacity(),
        message_size = config.message_size,
        iterations = config.iterations,
        "buffer ready"
    );

    if config.message_size == 0 || config.message_size >= cb.capacity() {
        return Err(BenchError::InvalidMessageSize {
            message_size: config.message_size,
            capacity: cb.capacity(),
        });
    }

    if config.threaded {
        benchmark_threaded(cb, config);
    } else {
        benchmark_single(cb, config);
    }

    Ok(())
}

fn benchmark_single(mut cb: CircularBuffer, config: &BenchConfig) {
    info!("📊 Offer/Poll Benchmark (single owner)");

    let msg: Vec<u8> = (0..config.message_size).map(|i| i as u8).collect();

    // Warm up
    for _ in 0..1000 {
        cb.offer(&msg);
        cb.poll(msg.len());
    }

    let mut rejected = 0usize;
    let start = Instant::now();
    for _ in 0..config.iterations {
        if cb.offer(&msg) == 0 {
            rejected += 1;
        }
        if let Some(view) = cb.poll(msg.len()) {
            debug_assert_eq!(view, &msg[..]);
        }
    }
    let duration = start.elapsed();

    let ns = duration.as_nanos() as f64 / config.iterations as f64;
    info!("  Operations: {}", config.iterations);
    info!("  Offer+Poll latency: {:.2} ns/op ({:.3} μs/op)", ns, ns / 1000.0);
    info!(
        "  Throughput:   {:.2} MB/sec",
        (config.iterations * config.message_size) as f64 / duration.as_secs_f64() / 1_000_000.0
    );
    debug!(rejected, "offers rejected");
}

fn benchmark_threaded(cb: CircularBuffer, config: &BenchConfig) {
    info!("📊 Producer/Consumer Benchmark (SPSC, lock-free)");

    let (mut producer, mut consumer) = cb.split();
    let iterations = config.iterations;
    let msg: Vec<u8> = (0..config.message_size).map(|i| i as u8).collect();
    let msg_len = msg.len();

    let start = Instant::now();
    let writer = thread::spawn(move || {
        let mut spins = 0u64;
        for _ in 0..iterations {
            while producer.offer(&msg) == 0 {
                spins += 1;
                std::hint::spin_loop();
            }
        }
        spins
    });

    let mut received = 0usize;
    let mut checksum = 0u64;
    while received < iterations {
        match consumer.poll(msg_len) {
            Some(view) => {
                checksum = checksum.wrapping_add(view[0] as u64);
                received += 1;
            }
            None => std::hint::spin_loop(),
        }
    }
    let duration = start.elapsed();

    let spins = writer.join().unwrap_or(0);
    let ns = duration.as_nanos() as f64 / iterations as f64;

    info!("  Messages: {}", iterations);
    info!("  Per message: {:.2} ns ({:.3} μs)", ns, ns / 1000.0);
    info!(
        "  Throughput:  {:.2} M msgs/sec",
        iterations as f64 / duration.as_secs_f64() / 1_000_000.0
    );
    debug!(spins, checksum, "producer back-pressure");
}

fn parse_args() -> BenchConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = BenchConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--capacity" | "-c" => {
                if i + 1 < args.len() {
                    let capacity = args[i + 1].parse().unwrap_or(config.buffer.capacity);
                    config.buffer = config.buffer.capacity(capacity);
                    i += 1;
                }
            }
            "--exact" => {
                config.buffer = config.buffer.exact();
            }
            "--message-size" | "-m" => {
                if i + 1 < args.len() {
                    config.message_size = args[i + 1].parse().unwrap_or(64);
                    i += 1;
                }
            }
            "--iterations" | "-n" => {
                if i + 1 < args.len() {
                    config.iterations = args[i + 1].parse().unwrap_or(1_000_000);
                    i += 1;
                }
            }
            "--threaded" | "-t" => {
                config.threaded = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--help" | "-h" => {
                println!("cirbuf - Magic Ring Buffer benchmark\n");
                println!("Usage: cirbuf [OPTIONS]\n");
                println!("Options:");
                println!("  -c, --capacity <BYTES>      Buffer capacity (default: 65536)");
                println!("      --exact                 Do not round capacity to page size");
                println!("  -m, --message-size <BYTES>  Message size (default: 64)");
                println!("  -n, --iterations <N>        Messages to transfer (default: 1000000)");
                println!("  -t, --threaded              Producer and consumer on separate threads");
                println!("  -v, --verbose               Verbose output");
                println!("  -h, --help                  Show this help");
                process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_message_size_is_an_error() {
        let config = BenchConfig {
            message_size: 0,
            iterations: 10,
            ..BenchConfig::default()
        };
        assert!(matches!(
            run(&config),
            Err(BenchError::InvalidMessageSize { message_size: 0, .. })
        ));

        let capacity = config.buffer.resolved_capacity();
        let config = BenchConfig {
            message_size: capacity,
            iterations: 10,
            ..BenchConfig::default()
        };
        match run(&config) {
            Err(BenchError::InvalidMessageSize {
                message_size,
                capacity: cap,
            }) => {
                assert_eq!(message_size, capacity);
                assert_eq!(cap, capacity);
            }
            other => panic!("expected InvalidMessageSize, got {:?}", other),
        }
    }

    #[test]
    fn test_allocation_failure_is_an_error() {
        let config = BenchConfig {
            buffer: BufferConfig::new().capacity(100).exact(),
            iterations: 10,
            ..BenchConfig::default()
        };
        assert!(matches!(run(&config), Err(BenchError::Allocation(_))));
    }

    #[test]
    fn test_small_run_succeeds() {
        let config = BenchConfig {
            iterations: 100,
            ..BenchConfig::default()
        };
        assert!(run(&config).is_ok());
    }
}
