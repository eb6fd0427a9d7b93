//! Stamps gc-game with its build identity
//!
//! Exposes `GC_GIT_HASH`, `GC_BUILT_AT` (UTC) and `GC_BUILD_PROFILE` to the
//! crate through `env!`.

use std::path::Path;
use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    let head = Path::new("../.git/HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }
    println!("cargo:rerun-if-changed=build.rs");

    let hash = git_short_hash().unwrap_or_else(|| "nogit".to_string());
    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GC_GIT_HASH={hash}");
    println!("cargo:rustc-env=GC_BUILT_AT={built_at}");
    println!("cargo:rustc-env=GC_BUILD_PROFILE={profile}");
}
