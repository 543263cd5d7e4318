//! Environment diagnostic command.

use std::path::{Path, PathBuf};

use console::style;

use crate::browser::find_chrome;
use crate::config::{GuiConfig, Settings};

/// Report whether the machine is ready to run migrations: browser,
/// credentials, base directory and the target URLs.
pub async fn cmd_check(settings: &Settings, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    println!("{}", style("Verificação do ambiente").bold());

    match find_chrome(settings.chrome_path.as_deref()) {
        Ok(path) => println!("  {} Chrome: {}", style("✓").green(), path.display()),
        Err(e) => println!("  {} Chrome: {}", style("✗").red(), e),
    }

    if settings.has_credentials() {
        println!("  {} Credenciais configuradas", style("✓").green());
    } else {
        println!(
            "  {} Credenciais ausentes. Defina USUARIO e SENHA no arquivo .env",
            style("✗").red()
        );
    }

    let config_path = config_path.unwrap_or_else(GuiConfig::default_path);
    let config = GuiConfig::load(&config_path);
    if Path::new(&config.base_dir).is_dir() {
        println!("  {} Diretório base: {}", style("✓").green(), config.base_dir);
    } else {
        println!(
            "  {} Diretório base inexistente: {}",
            style("✗").yellow(),
            config.base_dir
        );
    }

    println!("  URL de login: {}", settings.login_url);
    println!("  Formulário novo: {}", settings.new_form_url());

    Ok(())
}
