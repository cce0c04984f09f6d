//! Temporary workspaces and input files shared by the CLI tests.

use camino::{Utf8Path, Utf8PathBuf};
use rstest::fixture;
use tempfile::TempDir;

use crate::fence::ExportConfig;

pub(super) struct Sandbox {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Sandbox {
    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub(super) fn write_input(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        write_utf8(&path, contents);
        path
    }

    pub(super) fn config(&self, input: Utf8PathBuf, name: &str) -> ExportConfig {
        let workspace = self.root.join("gis");
        ExportConfig {
            input,
            scratch: workspace.join("scratch"),
            workspace,
            name: name.to_owned(),
            strict: false,
        }
    }

    pub(super) fn read_output(&self, config: &ExportConfig) -> serde_json::Value {
        let path = config.workspace.join(format!("{}.geojson", config.name));
        let raw = std::fs::read_to_string(path.as_std_path()).expect("read output collection");
        serde_json::from_str(&raw).expect("output is JSON")
    }
}

#[fixture]
pub(super) fn sandbox() -> Sandbox {
    let dir = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
    Sandbox { _dir: dir, root }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &str) {
    std::fs::write(path.as_std_path(), contents).expect("write test input");
}
