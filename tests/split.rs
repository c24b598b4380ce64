mod common;

use anyhow::Result;
use fast5kit::{
    split_container, split_directory, split_directory_parallel, MultiReadBuilder,
    MultiReadContainer, SingleReadContainer, SplitConfig, SplitStats,
};

#[test]
fn five_reads_one_without_basecall() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = common::rng();
    let source = dir.path().join("batch_0.fast5");
    let groups = common::write_multi(&source, 5, &[2], &mut rng)?;

    let out = dir.path().join("single");
    let stats = split_container(&source, &out, None)?;
    assert_eq!(stats, SplitStats { processed: 5, errors: 0 });

    let mut written: Vec<_> = std::fs::read_dir(&out)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    written.sort();
    let expected: Vec<_> = groups.iter().map(|g| format!("{g}.fast5")).collect();
    assert_eq!(written, expected);

    let mut with_basecall = 0;
    for group in &groups {
        let container = SingleReadContainer::open(out.join(format!("{group}.fast5")))?;
        let reader = container.reader();
        assert!(!reader.signal()?.is_empty());
        match reader.basecall() {
            Ok(basecall) => {
                assert!(!basecall.fastq.is_empty());
                with_basecall += 1;
            }
            Err(e) => assert!(e.is_not_found()),
        }
    }
    assert_eq!(with_basecall, 4);
    Ok(())
}

#[test]
fn split_preserves_every_piece() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = common::rng();
    let source = dir.path().join("batch_0.fast5");
    common::write_multi(&source, 3, &[], &mut rng)?;

    let out = dir.path().join("single");
    split_container(&source, &out, None)?;

    let multi = MultiReadContainer::open(&source)?;
    for (group, reader) in multi.readers() {
        let single = SingleReadContainer::open(out.join(format!("{group}.fast5")))?;
        assert_eq!(single.reader().load()?, reader.load()?);
    }
    Ok(())
}

#[test]
fn one_faulty_group_costs_one_read() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = common::rng();
    let source = dir.path().join("batch_0.fast5");

    let mut builder = MultiReadBuilder::create(&source);
    let mut groups = Vec::new();
    for _ in 0..6 {
        let id = common::read_id();
        let group = format!("read_{id}");
        builder.add_read(&group, &common::random_read(&mut rng, &id, true))?;
        groups.push(group);
    }
    assert!(builder.remove(&groups[3], "context_tags"));
    builder.finish()?;

    let out = dir.path().join("single");
    let stats = split_container(&source, &out, None)?;
    assert_eq!(stats, SplitStats { processed: 5, errors: 1 });
    assert!(!out.join(format!("{}.fast5", groups[3])).exists());
    for (i, group) in groups.iter().enumerate() {
        if i != 3 {
            assert!(out.join(format!("{group}.fast5")).exists());
        }
    }
    Ok(())
}

#[test]
fn directory_split_sums_per_file_counts() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = common::rng();
    let input = dir.path().join("multi");
    std::fs::create_dir(&input)?;
    for (i, n) in [4, 2, 7].into_iter().enumerate() {
        common::write_multi(&input.join(format!("batch_{i}.fast5")), n, &[0], &mut rng)?;
    }
    std::fs::write(input.join("notes.txt"), "ignored")?;

    let sequential = split_directory(
        &input,
        &SplitConfig::new(dir.path().join("seq")).subdir_per_source(true),
    )?;
    assert_eq!(sequential, SplitStats { processed: 13, errors: 0 });

    for workers in [1, 4] {
        let config = SplitConfig::new(dir.path().join(format!("par_{workers}")))
            .subdir_per_source(true)
            .write_fastq(true);
        let parallel = split_directory_parallel(&input, &config, workers)?;
        assert_eq!(parallel, sequential);

        let fastq = std::fs::read_to_string(
            dir.path().join(format!("par_{workers}/batch_0/batch_0.fastq")),
        )?;
        assert_eq!(fastq.lines().count(), 3 * 4);
    }
    Ok(())
}
