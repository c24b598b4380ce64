use anyhow::Result;
use fast5kit::{dispatch, dispatch_fn, Worker};

/// Fails every item whose value is divisible by `modulus`
struct Checked {
    modulus: usize,
}
impl Worker for Checked {
    type Item = (usize, String);
    type Output = String;

    fn process(&self, (n, label): (usize, String)) -> fast5kit::Result<String> {
        if n % self.modulus == 0 {
            return Err(anyhow::anyhow!("item {n} rejected").into());
        }
        Ok(format!("{label}-{n}"))
    }
}

fn items(n: usize) -> Vec<(usize, String)> {
    (0..n).map(|i| (i, format!("job{}", i % 3))).collect()
}

fn sorted(mut values: Vec<String>) -> Vec<String> {
    values.sort();
    values
}

#[test]
fn single_worker_matches_pool() -> Result<()> {
    let worker = Checked { modulus: 4 };
    let serial = dispatch(&worker, items(37), 1, false);
    let pooled = dispatch(&worker, items(37), 4, false);

    assert_eq!((serial.total, serial.failures), (37, 10));
    assert_eq!((pooled.total, pooled.failures), (serial.total, serial.failures));
    assert_eq!(sorted(pooled.outputs), sorted(serial.outputs));
    assert_eq!(sorted(pooled.messages), sorted(serial.messages));
    Ok(())
}

#[test]
fn aggregate_is_order_independent() {
    let worker = Checked { modulus: 3 };
    let forward = items(25);
    let mut shuffled = forward.clone();
    shuffled.reverse();
    shuffled.rotate_left(7);

    let a = dispatch(&worker, forward, 4, false);
    let b = dispatch(&worker, shuffled, 4, false);
    assert_eq!(a.failures, b.failures);
    assert_eq!(sorted(a.outputs), sorted(b.outputs));
}

#[test]
fn failing_items_do_not_stop_siblings() {
    let report = dispatch_fn(
        |path: std::path::PathBuf| -> fast5kit::Result<usize> {
            fast5kit::SingleReadContainer::open(&path)?;
            Ok(1)
        },
        vec!["missing_a.fast5".into(), "missing_b.fast5".into()],
        2,
        false,
    );
    assert_eq!(report.total, 2);
    assert_eq!(report.failures, 2);
    assert!(report.messages.iter().any(|m| m.contains("missing_a.fast5")));
    assert!(report.outputs.is_empty());
}
