#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Per-test scratch directory under the system temp dir, removed on drop.
pub struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    pub fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("asm_harness_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).expect("Failed to create scratch dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Writes an executable `/bin/sh` script and returns its path.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.file(name, &format!("#!/bin/sh\n{}\n", body));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");
        path
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.join(name);
        fs::write(&path, contents).expect("Failed to write file");
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// Stand-in for the calculator program: `calc <a> <b> <add|sub|mul|div>`.
pub const CALC: &str = r#"
if [ "$#" -ne 3 ]; then
    echo "Usage: calc <num1> <num2> <add|sub|mul|div>" >&2
    exit 1
fi
case "$3" in
    add) echo $(($1 + $2)) ;;
    sub) echo $(($1 - $2)) ;;
    mul) echo $(($1 * $2)) ;;
    div)
        if [ "$2" -eq 0 ]; then
            echo "error: division by zero" >&2
            exit 1
        fi
        echo $(($1 / $2))
        ;;
    *) echo "unknown operation: $3" >&2; exit 1 ;;
esac
"#;

/// Stand-in for the string processor: uppercases stdin.
pub const UPPERCASE: &str = "tr 'a-z' 'A-Z'";

pub fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}
