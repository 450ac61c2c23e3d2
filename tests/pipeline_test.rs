//! End-to-end tests: ingestion pipeline, reload protocol and query
//! cache working together over real files.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use thermoflow::{
    IngestionConfig, ReloadCoordinator, ReloadObserver, ReloadState, ServiceError, StoreHandle,
    TemperatureService,
};

fn write_source(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "thermoflow-pipeline-{}-{}.csv",
        name,
        std::process::id()
    ));
    let mut file = File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn stack(
    config: IngestionConfig,
) -> (
    Arc<StoreHandle>,
    Arc<ReloadCoordinator>,
    Arc<TemperatureService>,
) {
    let store = Arc::new(StoreHandle::new());
    let coordinator = Arc::new(ReloadCoordinator::new(Arc::clone(&store), config));
    let service = Arc::new(TemperatureService::new(Arc::clone(&store), 64));
    coordinator.subscribe(Arc::clone(&service) as Arc<dyn ReloadObserver>);
    (store, coordinator, service)
}

fn small_config() -> IngestionConfig {
    IngestionConfig {
        chunk_size: 2,
        pool_size: 4,
        queue_capacity: 2,
    }
}

#[test]
fn test_warsaw_scenario() {
    let (_store, coordinator, service) = stack(small_config());
    let path = write_source(
        "warsaw",
        "warsaw;2021-01-01 00:00:00.000;10.0\n\
         warsaw;2021-06-01 00:00:00.000;20.0\n\
         warsaw;2022-01-01 00:00:00.000;5.0\n",
    );

    let summary = coordinator.run_ingestion(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(summary.status, ReloadState::Completed);
    assert_eq!(summary.records_processed, 3);
    assert_eq!(summary.malformed_count, 0);

    let averages = service.get_yearly_averages("Warsaw");
    assert_eq!(averages.get(&2021), Some(&15.0));
    assert_eq!(averages.get(&2022), Some(&5.0));
    assert_eq!(averages.len(), 2);
}

#[test]
fn test_query_before_any_ingestion_is_empty() {
    let (_store, _coordinator, service) = stack(small_config());
    assert!(service.get_yearly_averages("unknown").is_empty());
}

#[test]
fn test_blank_city_rows_are_counted_and_ignored() {
    let (_store, coordinator, service) = stack(small_config());
    let path = write_source(
        "blank-city",
        "warsaw;2021-01-01 00:00:00.000;10.0\n\
         ;2021-01-01 00:00:00.000;99.0\n",
    );

    let summary = coordinator.run_ingestion(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(summary.records_processed, 1);
    assert_eq!(summary.malformed_count, 1);
    assert_eq!(service.get_yearly_averages("warsaw").get(&2021), Some(&10.0));
}

#[test]
fn test_repeated_queries_between_reloads_are_identical() {
    let (_store, coordinator, service) = stack(small_config());
    let path = write_source("idempotent", "opole;2021-01-01 00:00:00.000;7.5\n");
    coordinator.run_ingestion(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let first = service.get_yearly_averages("opole");
    let second = service.get_yearly_averages("opole");
    assert_eq!(first, second);
}

#[test]
fn test_reload_invalidates_cached_averages() {
    let (_store, coordinator, service) = stack(small_config());
    let path = write_source("invalidate", "berlin;2021-01-01 00:00:00.000;10.0\n");
    coordinator.run_ingestion(&path).unwrap();
    assert_eq!(service.get_yearly_averages("berlin").get(&2021), Some(&10.0));

    // Same file, new data: the cached average must not survive the
    // reload.
    let mut file = File::create(&path).unwrap();
    file.write_all(b"berlin;2021-01-01 00:00:00.000;30.0\n")
        .unwrap();
    drop(file);
    coordinator.run_ingestion(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(service.get_yearly_averages("berlin").get(&2021), Some(&30.0));
}

#[test]
fn test_failed_reload_serves_previous_values() {
    let (_store, coordinator, service) = stack(small_config());
    let path = write_source("failed", "poznań;2021-01-01 00:00:00.000;3.0\n");
    coordinator.run_ingestion(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let before = service.get_yearly_averages("poznań");

    let err = coordinator
        .run_ingestion(&PathBuf::from("/nonexistent/thermoflow.csv"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Io(_)));
    assert_eq!(coordinator.state(), ReloadState::Failed);

    let after = service.get_yearly_averages("poznań");
    assert_eq!(before, after);
    assert_eq!(after.get(&2021), Some(&3.0));
}

/// A query issued while a reload is in flight must observe either the
/// fully-old or the fully-new aggregate, never a mixture of the two.
#[test]
fn test_no_torn_reads_during_reload() {
    let rows = 20_000;
    let old_source: String = (0..rows)
        .map(|i| {
            if i % 2 == 0 {
                "warsaw;2021-01-01 00:00:00.000;10.0\n"
            } else {
                "warsaw;2022-01-01 00:00:00.000;30.0\n"
            }
        })
        .collect();
    let new_source: String = (0..rows)
        .map(|i| {
            if i % 2 == 0 {
                "warsaw;2021-01-01 00:00:00.000;20.0\n"
            } else {
                "warsaw;2022-01-01 00:00:00.000;40.0\n"
            }
        })
        .collect();

    let config = IngestionConfig {
        chunk_size: 64,
        pool_size: 4,
        queue_capacity: 2,
    };
    let (_store, coordinator, service) = stack(config);

    let path = write_source("torn-old", &old_source);
    coordinator.run_ingestion(&path).unwrap();

    let mut file = File::create(&path).unwrap();
    file.write_all(new_source.as_bytes()).unwrap();
    drop(file);

    let old_view = [(2021, 10.0), (2022, 30.0)];
    let new_view = [(2021, 20.0), (2022, 40.0)];

    let done = std::sync::atomic::AtomicBool::new(false);
    thread::scope(|scope| {
        let service = &service;
        let coordinator = &coordinator;
        let done = &done;

        let readers: Vec<_> = (0..3)
            .map(|_| {
                scope.spawn(move || {
                    let mut observations = 0u64;
                    loop {
                        let averages = service.get_yearly_averages("warsaw");
                        let as_pairs: Vec<(i32, f64)> =
                            averages.iter().map(|(&y, &a)| (y, a)).collect();
                        assert!(
                            as_pairs == old_view || as_pairs == new_view,
                            "torn read observed: {:?}",
                            as_pairs
                        );
                        observations += 1;
                        if done.load(std::sync::atomic::Ordering::SeqCst) {
                            break;
                        }
                    }
                    observations
                })
            })
            .collect();

        coordinator.run_ingestion(&path).unwrap();
        done.store(true, std::sync::atomic::Ordering::SeqCst);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
    });
    std::fs::remove_file(&path).ok();

    assert_eq!(
        service
            .get_yearly_averages("warsaw")
            .iter()
            .map(|(&y, &a)| (y, a))
            .collect::<Vec<_>>(),
        new_view
    );
}
