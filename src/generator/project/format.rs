use std::path::Path;
use std::process::Command;

/// Run `cargo fmt` in `dir`. `SDKGEN_CARGO_BIN` overrides the cargo binary.
pub fn format_project(dir: &Path) -> anyhow::Result<()> {
    let cargo_bin = std::env::var("SDKGEN_CARGO_BIN").unwrap_or_else(|_| "cargo".to_string());

    let mut cmd = Command::new(cargo_bin);
    cmd.arg("fmt").current_dir(dir);
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo fmt failed in {}", dir.display());
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    // Serialize environment mutations to avoid test races
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn stub_cargo(dir: &Path, fmt_exit: i32) -> PathBuf {
        let stub = dir.join("cargo");
        fs::write(
            &stub,
            format!("#!/bin/sh\nif [ \"$1\" = \"fmt\" ]; then\n    exit {fmt_exit}\nfi\nexit 0\n"),
        )
        .unwrap();
        let mut perms = fs::metadata(&stub).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&stub, perms).unwrap();
        stub
    }

    fn with_cargo_bin(stub: &Path, dir: &Path) -> anyhow::Result<()> {
        let _guard = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let old_bin = env::var("SDKGEN_CARGO_BIN").ok();
        env::set_var("SDKGEN_CARGO_BIN", stub);
        let res = format_project(dir);
        match old_bin {
            Some(v) => env::set_var("SDKGEN_CARGO_BIN", v),
            None => env::remove_var("SDKGEN_CARGO_BIN"),
        }
        res
    }

    #[test]
    fn test_format_project_noop() {
        let dir = tempfile::tempdir().unwrap();
        let stub = stub_cargo(dir.path(), 0);
        assert!(with_cargo_bin(&stub, dir.path()).is_ok());
    }

    #[test]
    fn test_format_project_error() {
        let dir = tempfile::tempdir().unwrap();
        let stub = stub_cargo(dir.path(), 1);
        let err = with_cargo_bin(&stub, dir.path()).unwrap_err();
        assert!(err.to_string().contains("cargo fmt failed"));
    }
}
