// ABOUTME: Render command implementation.
// ABOUTME: Prints the proxy config for a color to stdout without writing or reloading anything.

use switchyard::config::{Config, EnvFile};
use switchyard::error::Result;
use switchyard::proxy::ProxyConfig;
use switchyard::types::Color;

/// Render the proxy template for `color` and print it.
pub fn render(config: &Config, color: Color) -> Result<()> {
    let env_file = EnvFile::load(&config.env_file)?;
    let proxy = ProxyConfig::for_color(&config.proxy, &config.app, color, env_file.domain()?);
    let rendered = proxy.render()?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}
