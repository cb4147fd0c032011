use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use thingdeck::download::{deliver, DownloadWatcher};
use thingdeck::{ArchiveAssembler, Error};

#[test]
fn picks_up_a_download_that_finishes_while_polling() {
    let dir = TempDir::new().unwrap();
    let partial = dir.path().join("Thing_From_Future_Full_Deck.zip.crdownload");
    let done = dir.path().join("Thing_From_Future_Full_Deck.zip");
    fs::write(&partial, b"PK").unwrap();

    let mut archive = ArchiveAssembler::new();
    archive.add("Arc/00_Back.png", vec![0; 16]).unwrap();
    let bytes = archive.finalize().unwrap();

    let watcher = DownloadWatcher::new(dir.path(), Duration::from_millis(20), 100);
    let writer = {
        let bytes = bytes.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(40));
            fs::remove_file(&partial).unwrap();
            fs::write(&done, bytes).unwrap();
        })
    };

    let landed = watcher.wait().unwrap();
    writer.join().unwrap();

    let out = dir.path().join("public/Thing_From_Future_Full_Deck.zip");
    deliver(&landed, &out).unwrap();
    assert_eq!(fs::read(out).unwrap(), bytes);
}

#[test]
fn gives_up_after_the_retry_budget() {
    let dir = TempDir::new().unwrap();
    let started = std::time::Instant::now();
    let err = DownloadWatcher::new(dir.path(), Duration::from_millis(10), 4)
        .wait()
        .unwrap_err();
    assert!(matches!(err, Error::DownloadTimeout { retries: 4, interval_ms: 10 }));
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[test]
fn an_archive_left_from_an_earlier_run_is_not_a_new_download() {
    let dir = TempDir::new().unwrap();
    let stale = dir.path().join("Thing_From_Future_Full_Deck.zip");
    fs::write(&stale, b"PK\x05\x06 from yesterday").unwrap();

    let watcher = DownloadWatcher::new(dir.path(), Duration::from_millis(5), 5);
    let err = watcher.wait().unwrap_err();
    assert!(matches!(err, Error::DownloadTimeout { retries: 5, .. }));
    assert!(stale.exists());
}
