#![allow(dead_code)]

use std::path::Path;

use anyhow::Result;
use fast5kit::{attributes, AttrValue, Basecall, Identity, MultiReadBuilder, ReadGroup, Signal};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

pub const SEED: u64 = 42;

/// A read identifier in the shape acquisition software emits
pub fn read_id() -> String {
    Uuid::new_v4().to_string()
}

/// Basecall text for `id` without a trailing newline
pub fn fastq_for(rng: &mut SmallRng, id: &str) -> String {
    let len = rng.random_range(8..32);
    let seq: String = (0..len).map(|_| b"ACGT"[rng.random_range(0..4)] as char).collect();
    let qual: String = (0..len)
        .map(|_| char::from(rng.random_range(b'!'..=b'I')))
        .collect();
    format!("@{id} runid=test\n{seq}\n+\n{qual}")
}

pub fn random_read(rng: &mut SmallRng, id: &str, with_basecall: bool) -> ReadGroup {
    let len = rng.random_range(100..400);
    let samples: Vec<i16> = (0..len).map(|_| rng.random_range(300..900)).collect();
    ReadGroup {
        signal: Signal {
            attrs: attributes([
                ("duration", AttrValue::UInt(samples.len() as u64)),
                ("read_id", AttrValue::from(id)),
                ("read_number", AttrValue::Int(rng.random_range(1..10_000))),
                ("start_mux", AttrValue::Int(1)),
                ("start_time", AttrValue::UInt(rng.random_range(0..1_000_000))),
            ]),
            samples,
        },
        identity: Identity {
            channel: attributes([
                ("channel_number", AttrValue::from("231")),
                ("digitisation", AttrValue::Float(8192.0)),
                ("offset", AttrValue::Float(4.0)),
                ("range", AttrValue::Float(1443.03)),
                ("sampling_rate", AttrValue::Float(4000.0)),
            ]),
            context: attributes([("experiment_kit", "genomic_dna"), ("sample_frequency", "4000")]),
            tracking: attributes([("device_id", "MN17279"), ("run_id", "8d1b5f0e")]),
        },
        basecall: with_basecall.then(|| Basecall {
            fastq: fastq_for(rng, id),
            attrs: attributes([("name", "basecaller"), ("version", "3.0.3")]),
        }),
    }
}

/// Writes a multi-read container with `n` reads
///
/// Reads whose position is listed in `without_basecall` carry no basecall.
/// Returns the read group names in ascending order.
pub fn write_multi(
    path: &Path,
    n: usize,
    without_basecall: &[usize],
    rng: &mut SmallRng,
) -> Result<Vec<String>> {
    let mut builder = MultiReadBuilder::create(path);
    let mut groups = Vec::with_capacity(n);
    for i in 0..n {
        let id = read_id();
        let group = format!("read_{id}");
        builder.add_read(&group, &random_read(rng, &id, !without_basecall.contains(&i)))?;
        groups.push(group);
    }
    builder.finish()?;
    groups.sort();
    Ok(groups)
}

pub fn rng() -> SmallRng {
    SmallRng::seed_from_u64(SEED)
}
