//! Web control panel command.

use std::path::PathBuf;

use crate::config::Settings;

/// Start the web control panel.
pub async fn cmd_serve(
    settings: Settings,
    bind: &str,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    println!("🌐 Iniciando interface web...");
    println!("📱 Acesse: http://{}:{}", display_host(&host), port);
    if host == "0.0.0.0" {
        if let Ok(name) = hostname::get() {
            println!("🌍 Acesse pela rede: http://{}:{}", name.to_string_lossy(), port);
        }
    }
    println!("   Ctrl+C para encerrar");

    crate::server::serve(settings, &host, port, config_path).await
}

fn display_host(host: &str) -> &str {
    if host == "0.0.0.0" {
        "localhost"
    } else {
        host
    }
}

/// Parse a bind address that can be:
/// - Just a port: "5001" -> 127.0.0.1:5001
/// - Just a host: "0.0.0.0" -> 0.0.0.0:5000
/// - Host and port: "0.0.0.0:5001" -> 0.0.0.0:5001
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    // Must be just a host, use default port
    Ok((bind.to_string(), 5000))
}
