#![doc = include_str!("../README.md")]

mod inout;
use inout::RandomKeys;

mod stats;
pub use stats::{BenchmarkResult, SearchStats};

use std::hint::black_box;
use std::time::Instant;

use acph::stats::BuildStatsPrinter;
use acph::{GetSize, Map};
use bitm::{BitAccess, BitVec};
use clap::{Parser, ValueEnum};
use cpu_time::{ProcessTime, ThreadTime};

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum KeySource {
    /// Generate 8-byte binary keys with xor-shift 64
    xs64,
    /// Read newline-separated keys from the standard input
    stdin,
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Adaptive columnar perfect hashing benchmark.
struct Conf {
    #[arg(short = 's', long, value_enum, default_value_t = KeySource::xs64)]
    key_source: KeySource,

    /// The number of random keys to generate or maximum number of keys to read from stdin
    #[arg(short = 'n', long)]
    keys_num: Option<usize>,

    /// Number of foreign keys (generated past the included ones) used to test detection of non-contained keys
    #[arg(short = 'f', long, default_value_t = 0)]
    foreign_keys_num: usize,

    /// Number of times to perform the construction
    #[arg(short = 'b', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    build_runs: u32,

    /// Number of times to perform the lookup test
    #[arg(short = 'l', long, default_value_t = 1)]
    lookup_runs: u32,

    /// Whether to check that every key maps to its payload and that foreign keys miss
    #[arg(short = 'v', long, default_value_t = false)]
    verify: bool,

    /// Measure parallel lookup throughput over the rayon thread pool
    #[arg(short = 't', long, default_value_t = false)]
    parallel: bool,

    /// Print per-node construction events
    #[arg(long, default_value_t = false)]
    build_stats: bool,

    /// Print the tree structure after building
    #[arg(short = 'd', long, default_value_t = false)]
    dump: bool,
}

/// Seed of the key generator; fixed so runs are comparable.
const KEY_SEED: u64 = 0x2357_1113_1719_2329;

fn load_keys(conf: &Conf) -> (Vec<Box<[u8]>>, Vec<Box<[u8]>>) {
    match conf.key_source {
        KeySource::xs64 => RandomKeys::new(KEY_SEED)
            .split(conf.keys_num.unwrap_or(1_000_000), conf.foreign_keys_num),
        KeySource::stdin => {
            let stdin = std::io::stdin();
            let mut keys = inout::read_keys(stdin.lock(), conf.keys_num)
                .expect("cannot read keys from stdin");
            let foreign = keys.split_off(keys.len() - conf.foreign_keys_num.min(keys.len()));
            (keys, foreign)
        }
    }
}

fn check_payload(seen: &mut [u64], keys_num: usize, payload: usize) {
    assert!(payload < keys_num, "payload {} out of range", payload);
    assert!(!seen.get_bit(payload), "two keys map to payload {}", payload);
    seen.set_bit(payload);
}

/// Probes the map with every key of `input` and returns per-lookup averages.
/// With `verify`, additionally checks that present keys cover their payloads
/// exactly once (`expect_present`) or that every probe misses.
fn benchmark_lookup(map: &Map<usize>, input: &[Box<[u8]>], expect_present: bool, verify: bool, lookup_runs: u32) -> SearchStats {
    if input.is_empty() || lookup_runs == 0 { return SearchStats::nan(); }
    let mut levels = 0usize;
    let mut not_found = 0usize;
    if verify && expect_present {
        let mut seen = Box::<[u64]>::with_zeroed_bits(input.len());
        for key in input {
            match map.get_stats(key, &mut levels) {
                Some(&payload) => check_payload(&mut seen, input.len(), payload),
                None => not_found += 1,
            }
        }
        assert_eq!(not_found, 0, "{} included keys were not found", not_found);
    } else {
        for key in input {
            if map.get_stats(key, &mut levels).is_none() { not_found += 1; }
        }
        if verify {
            assert_eq!(not_found, input.len(), "a foreign key was found");
        }
    }
    let start_process_moment = ProcessTime::now();
    for _ in 0..lookup_runs {
        for key in input { black_box(map.get(key)); }
    }
    let seconds = start_process_moment.elapsed().as_secs_f64();
    let divider = input.len() as f64;
    SearchStats {
        avg_deep: levels as f64 / divider,
        avg_lookup_time: seconds / (divider * lookup_runs as f64),
        absences: not_found as f64 / divider,
    }
}

fn benchmark_parallel(map: &Map<usize>, input: &[Box<[u8]>], lookup_runs: u32) {
    use rayon::prelude::*;
    let start = Instant::now();
    for _ in 0..lookup_runs {
        input.par_iter().for_each(|key| { black_box(map.get(key)); });
    }
    let seconds = start.elapsed().as_secs_f64();
    println!("parallel lookup [ns/key, wall time, {} threads]: {:.0}",
             rayon::current_num_threads(),
             seconds * 1_000_000_000.0 / (input.len() as f64 * lookup_runs as f64));
}

fn build(conf: &Conf, keys: &[Box<[u8]>], payloads: &[usize]) -> (Map<usize>, f64) {
    let result = if conf.build_stats {
        Map::try_with_stats(keys, payloads, &mut BuildStatsPrinter::stdout())
    } else {
        Map::try_from_entries(keys, payloads)
    };
    let map = match result {
        Ok(map) => map,
        Err(err) => {
            eprintln!("cannot build the map: {}", err);
            std::process::exit(1);
        }
    };
    // Construction is single-threaded, so thread time is the honest measure.
    // The first build above already proved the input valid.
    let start_moment = ThreadTime::now();
    for _ in 0..conf.build_runs {
        black_box(Map::try_from_entries(keys, payloads).unwrap());
    }
    (map, start_moment.elapsed().as_secs_f64() / conf.build_runs as f64)
}

fn main() {
    let conf: Conf = Conf::parse();
    let (keys, foreign) = load_keys(&conf);
    println!("keys: {}, foreign keys: {}", keys.len(), foreign.len());
    let payloads: Vec<usize> = (0..keys.len()).collect();

    let (map, build_time) = build(&conf, &keys, &payloads);
    if conf.dump { print!("{:?}", map); }

    let size_bytes = map.size_bytes();
    let result = BenchmarkResult {
        included: benchmark_lookup(&map, &keys, true, conf.verify, conf.lookup_runs),
        foreign: benchmark_lookup(&map, &foreign, false, conf.verify, conf.lookup_runs),
        size_bytes,
        bits_per_key: 8.0 * size_bytes as f64 / keys.len().max(1) as f64,
        build_time,
        efficiency: map.efficiency(),
    };
    println!("{}", result);

    if conf.parallel {
        benchmark_parallel(&map, &keys, conf.lookup_runs.max(1));
    }
}
