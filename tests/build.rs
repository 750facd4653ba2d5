use anyhow::Result;
use serde::de::DeserializeOwned;
use shardpress::document::RichPointer;
use shardpress::{run_build, BuildConfig, BuildManifest, Document};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn server_line(guild: &str, name: &str, members: i64) -> String {
    format!(
        r#"{{"status":"valid","invite":"inv-{guild}","response":{{"guild":{{"id":"{guild}","name":"{name}"}},"profile":{{"member_count":{members},"online_count":1}}}}}}"#
    )
}

/// Six unique servers, one duplicate crawl, and three junk lines.
fn fixture_log() -> String {
    [
        server_line("g0", "Alpha Base", 60),
        server_line("g1", "Beta Hangout", 10),
        "not even json".to_string(),
        server_line("g2", "Gamma Galaxy", 999),
        r#"{"status":"expired","response":{"guild":{"id":"gone"}}}"#.to_string(),
        server_line("g3", "Delta Lounge", 42),
        String::new(),
        server_line("g1", "Beta Hangout", 50),
        r#"{"status":"valid","response":{"guild":{}}}"#.to_string(),
        server_line("g4", "Epsilon Den", 5),
        server_line("g5", "Zeta Zone", 77),
    ]
    .join("\n")
}

fn small_config(input: &Path, output: &Path) -> BuildConfig {
    BuildConfig {
        input: input.to_string_lossy().into_owned(),
        output_dir: output.to_path_buf(),
        shard_capacity: 4,
        docs_per_batch: 2,
        ..BuildConfig::default()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn json_files_under(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(json_files_under(&path)?);
        } else if path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[test]
fn full_build_produces_the_expected_layout() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("servers.jsonl");
    fs::write(&input, fixture_log())?;
    let out = tmp.path().join("site");

    let summary = run_build(&small_config(&input, &out))?;
    assert_eq!(summary.lines, 10); // the blank line is not counted
    assert_eq!(summary.admitted, 7);
    assert_eq!(summary.rejected, 3);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.documents, 6);
    assert_eq!(summary.shards, 2);

    let manifest: BuildManifest = read_json(&out.join("manifest.json"))?;
    assert_eq!(manifest.total_servers, 6);
    assert_eq!(manifest.total_shards, 2);
    assert_eq!(manifest.servers_per_shard, 4);
    assert_eq!(manifest.docs_per_file, 2);
    assert_eq!(manifest.data_shard_map.len(), 2);
    assert_eq!(
        (manifest.data_shard_map[0].start_id, manifest.data_shard_map[0].end_id),
        (0, 3)
    );
    assert_eq!(
        (manifest.data_shard_map[1].start_id, manifest.data_shard_map[1].end_id),
        (4, 5)
    );

    // Shard 1 holds ids 0..=3 split into two batch files; shard 2 the rest.
    let batch: Vec<Document> = read_json(&out.join("shard-1/data/d_0.json"))?;
    assert_eq!(
        batch.iter().map(|d| d.internal_id).collect::<Vec<_>>(),
        vec![0, 1]
    );
    let batch: Vec<Document> = read_json(&out.join("shard-1/data/d_1.json"))?;
    assert_eq!(
        batch.iter().map(|d| d.internal_id).collect::<Vec<_>>(),
        vec![2, 3]
    );
    let batch: Vec<Document> = read_json(&out.join("shard-2/data/d_0.json"))?;
    assert_eq!(
        batch.iter().map(|d| d.internal_id).collect::<Vec<_>>(),
        vec![4, 5]
    );
    Ok(())
}

#[test]
fn duplicate_crawls_collapse_to_the_best_record() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("servers.jsonl");
    fs::write(
        &input,
        [
            r#"{"status":"valid","response":{"guild":{"id":"1"},"profile":{"member_count":50}},"invite":"abc"}"#,
            r#"{"status":"valid","response":{"guild":{"id":"1"},"profile":{"member_count":100}},"invite":"abc"}"#,
        ]
        .join("\n"),
    )?;
    let out = tmp.path().join("site");

    let summary = run_build(&small_config(&input, &out))?;
    assert_eq!(summary.documents, 1);

    let batch: Vec<Document> = read_json(&out.join("shard-1/data/d_0.json"))?;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].data["profile"]["member_count"], 100);
    Ok(())
}

#[test]
fn internal_ids_are_dense_and_every_pointer_resolves() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("servers.jsonl");
    fs::write(&input, fixture_log())?;
    let out = tmp.path().join("site");
    let config = small_config(&input, &out);
    run_build(&config)?;

    let manifest: BuildManifest = read_json(&out.join("manifest.json"))?;

    // Collect every document from every shard's batch files.
    let mut ids_by_shard: BTreeMap<u32, Vec<u64>> = BTreeMap::new();
    for range in &manifest.data_shard_map {
        let data_dir = out.join(format!("shard-{}/data", range.shard_number));
        for file in json_files_under(&data_dir)? {
            let batch: Vec<Document> = read_json(&file)?;
            for doc in &batch {
                assert!(
                    (range.start_id..=range.end_id).contains(&doc.internal_id),
                    "document {} outside its shard range",
                    doc.internal_id
                );
                ids_by_shard.entry(range.shard_number).or_default().push(doc.internal_id);
            }
        }
    }

    // Dense 0..N-1 permutation, no gaps or repeats.
    let mut all_ids: Vec<u64> = ids_by_shard.values().flatten().copied().collect();
    all_ids.sort_unstable();
    assert_eq!(all_ids, (0..manifest.total_servers).collect::<Vec<_>>());

    // Every pointer in every index bucket resolves within its own shard.
    for range in &manifest.data_shard_map {
        let shard_docs = &ids_by_shard[&range.shard_number];
        let index_dir = out.join(format!("shard-{}/index", range.shard_number));
        let bucket_files = json_files_under(&index_dir)?;
        assert!(!bucket_files.is_empty());
        for file in bucket_files {
            let buckets: BTreeMap<String, Vec<RichPointer>> = read_json(&file)?;
            for pointers in buckets.values() {
                assert!(!pointers.is_empty());
                for pointer in pointers {
                    assert!(
                        shard_docs.contains(&pointer.id),
                        "pointer {} in {} does not resolve",
                        pointer.id,
                        file.display()
                    );
                }
            }
        }
    }
    Ok(())
}

#[test]
fn sort_index_and_numeric_catalog_are_global() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("servers.jsonl");
    fs::write(&input, fixture_log())?;
    let out = tmp.path().join("site");
    run_build(&small_config(&input, &out))?;

    // Member counts: g0=60 g1=50 g2=999 g3=42 g4=5 g5=77, ids in that order.
    let sorted: Vec<u64> = read_json(&out.join("all_servers_sorted_by_members.json"))?;
    assert_eq!(sorted, vec![2, 5, 0, 1, 3, 4]);

    let catalog: BTreeMap<String, Vec<i64>> = read_json(&out.join("numeric_manifest.json"))?;
    assert_eq!(catalog["profile.member_count"], vec![5, 42, 50, 60, 77, 999]);
    assert_eq!(catalog["profile.online_count"], vec![1]);
    assert_eq!(catalog["guild.premium_subscription_count"], Vec::<i64>::new());
    Ok(())
}

#[test]
fn corrupt_numeric_value_aborts_before_manifests() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("servers.jsonl");
    fs::write(
        &input,
        r#"{"status":"valid","invite":"x","response":{"guild":{"id":"1"},"profile":{"member_count":"not_a_number"}}}"#,
    )?;
    let out = tmp.path().join("site");

    let err = run_build(&small_config(&input, &out)).expect_err("build must fail");
    let message = format!("{err:#}");
    assert!(message.contains("profile.member_count"), "{message}");
    assert!(message.contains("not_a_number"), "{message}");

    // Shard files were already written, but no manifest may exist.
    assert!(out.join("shard-1").exists());
    assert!(!out.join("manifest.json").exists());
    assert!(!out.join("numeric_manifest.json").exists());
    assert!(!out.join("all_servers_sorted_by_members.json").exists());
    Ok(())
}

#[test]
fn rebuilds_of_identical_input_are_byte_identical() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let input = tmp.path().join("servers.jsonl");
    fs::write(&input, fixture_log())?;

    let out_a = tmp.path().join("a");
    let out_b = tmp.path().join("b");
    run_build(&small_config(&input, &out_a))?;
    run_build(&small_config(&input, &out_b))?;

    let files_a = json_files_under(&out_a)?;
    let files_b = json_files_under(&out_b)?;
    let rel = |files: &[PathBuf], root: &Path| -> Vec<PathBuf> {
        files.iter().map(|f| f.strip_prefix(root).unwrap().to_path_buf()).collect()
    };
    assert_eq!(rel(&files_a, &out_a), rel(&files_b, &out_b));

    for (a, b) in files_a.iter().zip(&files_b) {
        // The build manifest carries the wall-clock timestamp.
        if a.file_name().is_some_and(|n| n == "manifest.json") {
            continue;
        }
        assert_eq!(
            fs::read(a)?,
            fs::read(b)?,
            "{} differs between rebuilds",
            a.display()
        );
    }
    Ok(())
}

#[test]
fn glob_patterns_combine_multiple_logs() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    fs::write(tmp.path().join("servers-01.jsonl"), server_line("g0", "Alpha", 60))?;
    fs::write(tmp.path().join("servers-02.jsonl"), server_line("g1", "Beta", 10))?;
    let out = tmp.path().join("site");

    let pattern = tmp.path().join("servers-*.jsonl");
    let summary = run_build(&small_config(&pattern, &out))?;
    assert_eq!(summary.documents, 2);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn gzipped_input_builds_identically_to_plain() -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let tmp = tempfile::tempdir()?;
    let plain = tmp.path().join("servers.jsonl");
    fs::write(&plain, fixture_log())?;

    let gz = tmp.path().join("servers.jsonl.gz");
    let mut encoder = GzEncoder::new(fs::File::create(&gz)?, Compression::default());
    encoder.write_all(fixture_log().as_bytes())?;
    encoder.finish()?;

    let out_plain = tmp.path().join("plain");
    let out_gz = tmp.path().join("gz");
    run_build(&small_config(&plain, &out_plain))?;
    run_build(&small_config(&gz, &out_gz))?;

    let sorted_plain: Vec<u64> = read_json(&out_plain.join("all_servers_sorted_by_members.json"))?;
    let sorted_gz: Vec<u64> = read_json(&out_gz.join("all_servers_sorted_by_members.json"))?;
    assert_eq!(sorted_plain, sorted_gz);

    let batch_plain = fs::read(out_plain.join("shard-1/data/d_0.json"))?;
    let batch_gz = fs::read(out_gz.join("shard-1/data/d_0.json"))?;
    assert_eq!(batch_plain, batch_gz);
    Ok(())
}
