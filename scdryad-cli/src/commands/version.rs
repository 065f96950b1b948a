//! Version command - show version information.

use anyhow::Result;

/// Version information.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the version command.
pub fn run() -> Result<()> {
    println!("scdryad - lifecycle trees for SuperCollider");
    println!();
    println!("Version:     {}", VERSION);
    println!(
        "Platform:    {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!();
    println!("Components:");
    println!("  scdryad-core   Context, lifecycle traits, dispatch, streams, player");
    println!("  scdryad-nodes  sclang and synth control dryads");
    println!("  scdryad-cli    Command-line interface");

    Ok(())
}
