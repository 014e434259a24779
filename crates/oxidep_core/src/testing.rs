use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
    let file_path = dir.join(path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// Write a minimal `*.dist-info` for `name` listing `files` in its RECORD.
pub(crate) fn create_dist_info(
    site: &Path,
    name: &str,
    files: &[&str],
    top_level: Option<&str>,
) -> PathBuf {
    let info = format!("{}-1.0.dist-info", name.replace('-', "_"));
    let metadata = format!(
        "Metadata-Version: 2.1\nName: {name}\nVersion: 1.0\n\nLong description.\nName: not-a-header\n"
    );
    create_test_file(site, &format!("{info}/METADATA"), &metadata);
    let mut record: Vec<String> = files.iter().map(|f| format!("{f},sha256=abc,10")).collect();
    record.push(format!("{info}/METADATA,,"));
    record.push(format!("{info}/RECORD,,"));
    create_test_file(site, &format!("{info}/RECORD"), &record.join("\n"));
    if let Some(top_level) = top_level {
        create_test_file(site, &format!("{info}/top_level.txt"), top_level);
    }
    site.join(info)
}
