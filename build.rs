use std::{env, process::Command};

fn main() {
    set_env("BUILD_TIMESTAMP", &chrono::Utc::now().format("%Y%m%d.%H%M%S").to_string());
    set_env("GIT_HASH_SHORT", &short_git_hash().unwrap_or_else(|| "unknown".to_string()));
    set_env(
        "TARGET_PLATFORM",
        &format!("{}-{}", cargo_var("CARGO_CFG_TARGET_ARCH"), cargo_var("CARGO_CFG_TARGET_OS")),
    );
    set_env("BUILD_PROFILE", &cargo_var("PROFILE"));

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}

fn set_env(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn cargo_var(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| "unknown".to_string())
}

fn short_git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|hash| !hash.is_empty())
}
