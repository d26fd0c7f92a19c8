use std::fs;
use std::path::{Path, PathBuf};

/// Only these files may talk HTTP to the outside world
const ALLOWED_HTTP_CLIENT_OWNERS: &[&str] = &[
    "src/adapters/riot.rs",
    "src/adapters/steam.rs",
    "src/adapters/discord.rs",
];

fn collect_rust_files(root: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rust_files(&path, out);
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

#[test]
fn http_clients_are_built_only_in_adapters() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let src_root = repo_root.join("src");
    let mut files = Vec::new();
    collect_rust_files(&src_root, &mut files);

    let mut offenders = Vec::new();
    for file in files {
        let rel = file
            .strip_prefix(repo_root)
            .unwrap_or(&file)
            .to_string_lossy()
            .replace('\\', "/");
        let content = fs::read_to_string(&file).unwrap_or_default();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            let builds_client = trimmed.contains("Client::builder()")
                || trimmed.contains("reqwest::Client::new(")
                || trimmed.contains("reqwest::get(");
            if !builds_client {
                continue;
            }
            if ALLOWED_HTTP_CLIENT_OWNERS
                .iter()
                .any(|allowed| *allowed == rel)
            {
                continue;
            }
            offenders.push(format!("{rel}:{}: {}", idx + 1, trimmed));
        }
    }

    assert!(
        offenders.is_empty(),
        "HTTP client built outside the adapters:\n{}",
        offenders.join("\n")
    );
}

#[test]
fn tracking_core_does_not_depend_on_adapters() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    collect_rust_files(&repo_root.join("src/tracker"), &mut files);
    collect_rust_files(&repo_root.join("src/services"), &mut files);
    collect_rust_files(&repo_root.join("src/domain"), &mut files);

    let offenders: Vec<String> = files
        .iter()
        .filter(|file| {
            fs::read_to_string(file)
                .unwrap_or_default()
                .contains("crate::adapters")
        })
        .map(|file| file.to_string_lossy().into_owned())
        .collect();

    assert!(
        offenders.is_empty(),
        "core modules reach into adapters: {:?}",
        offenders
    );
}
