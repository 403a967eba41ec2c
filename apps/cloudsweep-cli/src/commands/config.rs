//! Effective configuration command

use cloudsweep_core::Config;

pub fn run(config: &Config) -> anyhow::Result<()> {
    print!("{}", config.to_yaml()?);
    Ok(())
}
