use std::path::Path;

use hpcstat_core::HpcstatConfig;

pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let config = HpcstatConfig::default();
    std::fs::write(path, config.to_toml_string()?)?;
    println!("✓ Generated {}", path.display());

    Ok(())
}
