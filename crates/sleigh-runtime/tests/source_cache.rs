use sleigh_runtime::{PreprocessStep, SourceCache, SourceHandle, SourceSpec};
use sleigh_runtime::preprocess::pipeline;
use sleigh_types::{Dataset, Values, Variable};
use sleigh_testing::DataWorld;
use sleigh_testing::assertions::{assert_days, assert_sorted, assert_times};
use sleigh_testing::fixtures::{day, forecast, hourly, range, timestamp};

fn asfs(world: &DataWorld) -> SourceCache {
    let spec = SourceSpec::new("asfs", world.source_dir("asfs"), "data_%Y%m%d.json");
    SourceCache::new(spec).unwrap()
}

fn write_day(world: &DataWorld, date: &str, hours: &[u32]) {
    let file = format!("data_{}.json", date.replace('-', ""));
    world.write_json("asfs", &file, &hourly(day(date), hours, "temp"));
}

#[test]
fn test_contained_range_performs_no_io() -> anyhow::Result<()> {
    let world = DataWorld::new();
    write_day(&world, "2024-05-09", &[0, 12]);
    write_day(&world, "2024-05-10", &[0, 12]);
    let mut cache = asfs(&world);

    cache.query(&range("2024-05-09", "2024-05-10T23:00"))?;
    let before = cache.stats();
    assert_eq!(before.files_read, 2);

    let slice = cache.query(&range("2024-05-09T06:00", "2024-05-10T06:00"))?.unwrap();
    let after = cache.stats();
    assert_eq!(after.files_read, before.files_read);
    assert_eq!(after.listings, before.listings);
    assert_eq!(after.queries, before.queries + 1);
    assert_times(&slice, "time", &["2024-05-09T12:00", "2024-05-10T00:00"])?;
    Ok(())
}

#[test]
fn test_loads_accumulate_out_of_order() -> anyhow::Result<()> {
    let world = DataWorld::new();
    for date in ["2024-05-01", "2024-05-02", "2024-05-05", "2024-05-06"] {
        write_day(&world, date, &[0, 6, 18]);
    }
    let mut cache = asfs(&world);

    cache.query(&range("2024-05-05", "2024-05-06T12:00"))?;
    cache.query(&range("2024-05-01", "2024-05-02T12:00"))?;

    let store = cache.store().unwrap();
    assert_sorted(store, "time")?;
    assert_days(store, "time", &["2024-05-01", "2024-05-02", "2024-05-05", "2024-05-06"])?;
    assert_eq!(cache.loaded_files().len(), 4);
    Ok(())
}

#[test]
fn test_slice_is_right_exclusive() -> anyhow::Result<()> {
    let world = DataWorld::new();
    write_day(&world, "2024-05-09", &[0, 6, 12, 18]);
    let mut cache = asfs(&world);

    let slice = cache.query(&range("2024-05-09T06:00", "2024-05-09T18:00"))?.unwrap();
    assert_times(&slice, "time", &["2024-05-09T06:00", "2024-05-09T12:00"])?;
    Ok(())
}

#[test]
fn test_missing_files_are_skipped_and_retried_once_present() -> anyhow::Result<()> {
    let world = DataWorld::new();
    write_day(&world, "2024-05-09", &[0]);
    let mut cache = asfs(&world);

    let report = cache.update(&range("2024-05-09", "2024-05-10T12:00"))?;
    assert_eq!(report.loaded, vec!["data_20240509.json"]);
    assert_eq!(report.missing, vec!["data_20240510.json"]);
    assert!(report.failed.is_empty());

    write_day(&world, "2024-05-10", &[0]);
    let report = cache.update(&range("2024-05-09", "2024-05-10T12:00"))?;
    assert_eq!(report.loaded, vec!["data_20240510.json"]);
    Ok(())
}

#[test]
fn test_corrupt_day_is_isolated_then_recovered() -> anyhow::Result<()> {
    let world = DataWorld::new();
    write_day(&world, "2024-05-01", &[0, 12]);
    world.corrupt("asfs", "data_20240502.json");
    write_day(&world, "2024-05-03", &[0, 12]);
    let mut cache = asfs(&world);
    let three_days = range("2024-05-01", "2024-05-03T23:59");

    let report = cache.update(&three_days)?;
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file, "data_20240502.json");
    let slice = cache.slice(&three_days)?.unwrap();
    assert_days(&slice, "time", &["2024-05-01", "2024-05-03"])?;
    assert!(!cache.is_loaded("data_20240502.json"));
    assert_eq!(cache.stats().load_failures, 1);

    write_day(&world, "2024-05-02", &[0, 12]);
    let reads_before = cache.stats().files_read;
    let slice = cache.query(&three_days)?.unwrap();
    assert_eq!(cache.stats().files_read, reads_before + 1);
    assert_days(&slice, "time", &["2024-05-01", "2024-05-02", "2024-05-03"])?;
    assert_sorted(&slice, "time")?;
    Ok(())
}

#[test]
fn test_incompatible_file_is_rejected_at_merge() -> anyhow::Result<()> {
    let world = DataWorld::new();
    write_day(&world, "2024-05-09", &[0]);
    world.write_json("asfs", "data_20240510.json", &hourly(day("2024-05-10"), &[0], "pressure"));
    let mut cache = asfs(&world);

    let report = cache.update(&range("2024-05-09", "2024-05-10T12:00"))?;
    assert_eq!(report.loaded, vec!["data_20240509.json"]);
    assert!(report.failed[0].reason.starts_with("cannot merge"));
    Ok(())
}

fn write_three_days(world: &DataWorld) {
    for date in ["2024-05-01", "2024-05-02", "2024-05-03"] {
        write_day(world, date, &[0, 12]);
    }
}

fn is_second_day(dataset: &Dataset) -> bool {
    dataset
        .time_bounds("time")
        .is_some_and(|(first, _)| first.date() == day("2024-05-02"))
}

#[test]
fn test_preprocess_output_with_bad_shape_is_skipped() -> anyhow::Result<()> {
    let world = DataWorld::new();
    write_three_days(&world);
    let spec = SourceSpec::new("asfs", world.source_dir("asfs"), "data_%Y%m%d.json")
        .with_preprocess(|mut dataset: Dataset| {
            if is_second_day(&dataset) {
                dataset
                    .data_vars
                    .insert("temp".into(), Variable::new(["time"], Values::Float(vec![0.0])));
            }
            Ok(dataset)
        });
    let mut cache = SourceCache::new(spec)?;
    let window = range("2024-05-01", "2024-05-03T23:59");

    let report = cache.update(&window)?;
    assert_eq!(report.loaded, vec!["data_20240501.json", "data_20240503.json"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file, "data_20240502.json");
    assert!(report.failed[0].reason.contains("invalid dataset"));
    assert!(!cache.is_loaded("data_20240502.json"));

    let slice = cache.query(&window)?.unwrap();
    assert_days(&slice, "time", &["2024-05-01", "2024-05-03"])?;
    assert_eq!(cache.stats().load_failures, 2);
    Ok(())
}

#[test]
fn test_failing_preprocess_keeps_other_days() -> anyhow::Result<()> {
    let world = DataWorld::new();
    write_three_days(&world);
    let spec = SourceSpec::new("asfs", world.source_dir("asfs"), "data_%Y%m%d.json")
        .with_preprocess(|dataset: Dataset| {
            if is_second_day(&dataset) {
                anyhow::bail!("station offline");
            }
            Ok(dataset)
        });
    let mut cache = SourceCache::new(spec)?;

    let report = cache.update(&range("2024-05-01", "2024-05-03T23:59"))?;
    assert_eq!(report.loaded.len(), 2);
    assert_eq!(report.failed[0].reason, "preprocess: station offline");
    assert_days(cache.store().unwrap(), "time", &["2024-05-01", "2024-05-03"])?;
    Ok(())
}

#[test]
fn test_panicking_preprocess_leaves_cache_usable() -> anyhow::Result<()> {
    let world = DataWorld::new();
    write_three_days(&world);
    let spec = SourceSpec::new("asfs", world.source_dir("asfs"), "data_%Y%m%d.json")
        .with_preprocess(|dataset: Dataset| {
            if is_second_day(&dataset) {
                panic!("unexpected gap");
            }
            Ok(dataset)
        });
    let handle = SourceHandle::new(SourceCache::new(spec)?);

    let slice = handle.query(&range("2024-05-01", "2024-05-03T23:59"))?.unwrap();
    assert_days(&slice, "time", &["2024-05-01", "2024-05-03"])?;

    let first_day = handle.query(&range("2024-05-01", "2024-05-02"))?.unwrap();
    assert_days(&first_day, "time", &["2024-05-01"])?;
    // The second query touches 2024-05-02 again and retries it.
    assert_eq!(handle.stats()?.load_failures, 2);
    assert_eq!(
        handle.loaded_files()?.into_iter().collect::<Vec<_>>(),
        vec!["data_20240501.json", "data_20240503.json"]
    );
    Ok(())
}

#[test]
fn test_csv_source() -> anyhow::Result<()> {
    let world = DataWorld::new();
    world.write_raw(
        "met",
        "met_20240509.csv",
        "time,wspd\n2024-05-09T00:00:00,3.5\n2024-05-09T01:00:00,\n",
    );
    let spec = SourceSpec::new("met", world.source_dir("met"), "met_%Y%m%d.csv");
    let mut cache = SourceCache::new(spec)?;

    let slice = cache.query(&range("2024-05-09", "2024-05-10"))?.unwrap();
    let wspd = slice.data_vars["wspd"].values.as_float().unwrap();
    assert_eq!(wspd.len(), 2);
    assert!(wspd[1].is_nan());
    Ok(())
}

#[test]
fn test_forecast_runs_stack_along_init() -> anyhow::Result<()> {
    let world = DataWorld::new();
    for (file, init) in [
        ("gfs_20240509_00.json", "2024-05-09T00:00"),
        ("gfs_20240509_12.json", "2024-05-09T12:00"),
        ("gfs_20240510_00.json", "2024-05-10T00:00"),
    ] {
        let mut run = forecast(timestamp(init), 4);
        run.rename_dim("time", "step")?;
        world.write_json("gfs", file, &run);
    }
    let steps = vec![PreprocessStep::ExpandDims {
        dim: "init".into(),
        from: "time".into(),
    }];
    let run = pipeline(steps);
    let spec = SourceSpec::new("gfs", world.source_dir("gfs"), "gfs_%Y%m%d_*.json")
        .with_run_tags(["00", "06", "12", "18"])
        .with_sort_dim("init")
        .with_preprocess(move |dataset| run(dataset));
    let mut cache = SourceCache::new(spec)?;

    let report = cache.update(&range("2024-05-09", "2024-05-10T06:00"))?;
    assert_eq!(report.loaded.len(), 3);
    assert_eq!(report.missing.len(), 5);

    let slice = cache.slice(&range("2024-05-09T06:00", "2024-05-10T06:00"))?.unwrap();
    assert_times(&slice, "init", &["2024-05-09T12:00", "2024-05-10T00:00"])?;
    assert_eq!(slice.data_vars["t2m"].dims, vec!["init", "step"]);
    assert_eq!(slice.dim_size("step"), Some(4));
    Ok(())
}
