//! Single-protocol migration command.

use std::io::BufRead;
use std::path::Path;

use console::style;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::ProgressEvent;
use crate::services::Migrator;

/// Run one migration end to end, printing progress to the terminal.
/// The browser stays open for review until the user presses Enter
/// (headed runs only; headless runs close immediately).
pub async fn cmd_migrate(
    settings: &Settings,
    protocol: &str,
    folder: Option<&str>,
) -> anyhow::Result<()> {
    let folder = match folder {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw).into_owned();
            let path = Path::new(&expanded);
            if !path.exists() {
                eprintln!("❌ Erro: Pasta não encontrada: {expanded}");
                eprintln!("⚠️ A migração não será executada.");
                std::process::exit(1);
            }
            if !path.is_dir() {
                eprintln!("❌ Erro: Caminho não é uma pasta: {expanded}");
                eprintln!("⚠️ A migração não será executada.");
                std::process::exit(1);
            }
            println!("📁 Pasta de anexos informada: {expanded}");
            println!("✓ Pasta validada com sucesso");
            Some(expanded)
        }
        None => None,
    };

    println!("{}", "=".repeat(60));
    println!("🚀 MIGRADOR AUTOMÁTICO PEP CELESC");
    println!("{}", "=".repeat(60));
    println!("📋 Protocolo: {protocol}");
    println!("🔗 URL Antiga: {}", settings.legacy_form_url(protocol));
    println!("🔗 URL Nova: {}", settings.new_form_url());
    println!("{}", "=".repeat(60));

    let pb = indicatif::ProgressBar::new(100);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("[{bar:40.green}] {pos:>3}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let printer = {
        let pb = pb.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                pb.set_position(u64::from(event.step.progress_pct()));
                pb.println(format!(
                    "{} [{}] {}",
                    event.state.symbol(),
                    event.step.as_str(),
                    event.message
                ));
                pb.set_message(event.message);
            }
        })
    };

    let mut migrator = Migrator::new(
        settings.clone(),
        protocol,
        folder.as_deref().map(Path::new),
    );
    let result = migrator.run(&tx).await;
    drop(tx);
    let _ = printer.await;

    match result {
        Ok(report) => {
            pb.set_position(100);
            pb.finish_and_clear();

            println!();
            println!("{}", "=".repeat(60));
            println!("✨ MIGRAÇÃO CONCLUÍDA!");
            println!("{}", "=".repeat(60));
            println!("   Campos extraídos: {}", report.fields_extracted);
            println!("   Campos preenchidos: {}", report.fields_filled);
            println!("   Logradouros incluídos: {}", report.streets_included);
            if report.streets_unmatched > 0 {
                println!(
                    "   {} Logradouros não encontrados: {}",
                    style("⚠").yellow(),
                    report.streets_unmatched
                );
            }
            if folder.is_some() {
                println!("   Arquivos enviados: {}", report.files_uploaded);
            }
            println!();
            println!("📌 IMPORTANTE:");
            println!("  • Duas abas estão abertas:");
            println!("    1. Formulário ANTIGO (protocolo {protocol})");
            println!("    2. Formulário NOVO (preenchido)");
            println!("  • Revise ambos os formulários antes de submeter");
            println!("  • NENHUM formulário será submetido automaticamente");

            if !settings.headless {
                println!();
                println!("⚠️ Pressione Enter para fechar o navegador...");
                let mut line = String::new();
                std::io::stdin().lock().read_line(&mut line)?;
            }
            migrator.close().await;
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            eprintln!();
            eprintln!("❌ Erro durante a migração: {e}");
            migrator.close().await;
            Err(e)
        }
    }
}
