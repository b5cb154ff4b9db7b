use confquill::{Conf, Options};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper function to create a temporary file path with the given name
fn temp_file_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn write_gzipped(path: &PathBuf, text: &str) {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let file = fs::File::create(path).expect("Failed to create file");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

#[test]
fn test_load_compressed_json() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_file_path(&temp_dir, "app.json.gz");
    write_gzipped(&path, r#"{"name": "Alice", "scores": [95, 87], "meta": {"tags": ["a"]}}"#);

    let conf = Conf::open(&[&path], &Options::default()).expect("Failed to open compressed JSON");

    assert_eq!(conf.get("name").unwrap(), Some(json!("Alice")));
    assert_eq!(conf.get("meta.tags").unwrap(), Some(json!(["a"])));
}

#[test]
fn test_roundtrip_compressed_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_file_path(&temp_dir, "app.yaml.gz");
    write_gzipped(&path, "server:\n  port: 80\n");

    let options = Options {
        autosave: true,
        ..Options::default()
    };
    let mut conf = Conf::open(&[&path], &options).unwrap();
    conf.put("server.host", json!("example.com")).unwrap();

    // Still compressed
    let raw = fs::read(&path).unwrap();
    assert!(raw.starts_with(&[0x1f, 0x8b]));

    let reloaded = Conf::open(&[&path], &Options::default()).unwrap();
    assert_eq!(
        reloaded.eject(),
        json!({"server": {"port": 80, "host": "example.com"}})
    );
}

#[test]
fn test_compressed_entry_in_directory_uses_stem() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_gzipped(&temp_file_path(&temp_dir, "big.json.gz"), r#"{"rows": 3}"#);

    let conf = Conf::open(&[temp_dir.path()], &Options::default()).unwrap();

    assert_eq!(conf.get("big.rows").unwrap(), Some(json!(3)));
}
