#![allow(dead_code)]

pub mod fixtures {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Absolute path of a file under `tests/fixtures`.
    pub fn fixture_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    /// Copy a fixture into `dir` so sibling files (dependency config) can be placed next to it.
    pub fn copy_fixture(name: &str, dir: &Path) -> PathBuf {
        let dest = dir.join(name);
        fs::copy(fixture_path(name), &dest).unwrap();
        dest
    }

    /// Write `content` as a description file named `name` inside `dir`.
    pub fn write_description(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Every file below `root`, relative and with `/` separators, sorted.
    pub fn list_files(root: &Path) -> Vec<String> {
        fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    walk(root, &path, out);
                } else {
                    let rel = path.strip_prefix(root).unwrap();
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        let mut out = Vec::new();
        walk(root, root, &mut out);
        out.sort();
        out
    }
}
