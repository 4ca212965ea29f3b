use super::test_helpers::{
    Behavior, StubFetcher, create_test_downloader, create_test_downloader_with,
    leftover_workspaces,
};
use super::*;
use crate::types::{DownloadRequest, FileSet, PackagedResult};
use std::io::Read;
use std::time::Duration;


/// Entry names of a zip archive, in archive order
fn zip_entry_names(path: &Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Content of one archive entry
fn zip_entry(path: &Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}
