use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

/// Files the server reads at runtime, relative to the executable.
const RUNTIME_ASSETS: [&str; 2] = ["config.json", "public"];

fn main() {
    for asset in RUNTIME_ASSETS {
        println!("cargo:rerun-if-changed={asset}");
    }

    let exe_dir = match target_dir() {
        Some(dir) => dir,
        None => {
            println!("cargo:warning=Cannot locate the target directory, runtime assets not copied");
            return;
        }
    };

    for asset in RUNTIME_ASSETS {
        let dst = exe_dir.join(asset);
        match copy_recursive(Path::new(asset), &dst) {
            Ok(files) => println!("cargo:warning=Copied {asset} ({files} file(s)) → {}", dst.display()),
            Err(e) => println!("cargo:warning=Could NOT copy {asset}: {e}"),
        }
    }
}

/// OUT_DIR is target/<profile>/build/<crate>/out; the binary lands three levels up.
fn target_dir() -> Option<PathBuf> {
    let out_dir = env::var_os("OUT_DIR")?;
    Path::new(&out_dir).ancestors().nth(3).map(Path::to_path_buf)
}

/// Copy a file or a whole directory tree, returning the number of files written.
fn copy_recursive(src: &Path, dst: &Path) -> io::Result<usize> {
    if !src.is_dir() {
        fs::copy(src, dst)?;
        return Ok(1);
    }

    fs::create_dir_all(dst)?;
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        copied += copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
    }
    Ok(copied)
}
