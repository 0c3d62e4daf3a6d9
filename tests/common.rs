#![allow(dead_code)]

pub fn template_tar_path() -> std::path::PathBuf {
    cargo_manifest_dir().join("test_assets/template.tar")
}

pub fn cargo_manifest_dir() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn cargo_out_dir() -> std::path::PathBuf {
    cargo_manifest_dir().join("target")
}

/// GNU tar 1.34, `--format=ustar --owner=coder:1000 --group=coder:1000 --mtime=@1700000000`
pub fn load_template_tar() -> Vec<u8> {
    include_bytes!("../test_assets/template.tar").to_vec()
}

/// Seconds since the epoch stamped on every member of `template.tar`.
pub const TEMPLATE_MTIME: u64 = 1_700_000_000;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
