use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use virtboot_config::BoardConfig;

fn main() -> Result<()> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    let board_path = env::var_os("VIRTBOOT_BOARD")
        .map(PathBuf::from)
        .unwrap_or_else(|| manifest_dir.join("board.yaml"));
    println!("cargo:rerun-if-env-changed=VIRTBOOT_BOARD");
    println!("cargo:rerun-if-changed={}", board_path.display());
    println!("cargo:rerun-if-changed=link.x");
    println!("cargo:rerun-if-changed=src/boot.s");

    let board = BoardConfig::from_file(&board_path)?;
    fs::write(out_dir.join("board.rs"), board.render_constants())
        .context("Failed to write board constants")?;

    // Hosted builds only produce the stub `main`.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("none") {
        return Ok(());
    }

    fs::copy(manifest_dir.join("link.x"), out_dir.join("link.x"))
        .context("Failed to copy linker script")?;
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=-Tlink.x");

    Ok(())
}
