use granska_core::config::ExtractConfig;
use granska_core::error::GranskaError;

pub fn run() -> Result<(), GranskaError> {
    print!("{}", ExtractConfig::default().to_toml()?);
    Ok(())
}
