//! HTML template for the migration control page.

use crate::utils::html_escape;

/// Render the control page with the configured base directory
/// prefilled. Everything dynamic on the page is drawn client-side
/// from the status endpoint.
pub fn index_page(base_dir: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="utf-8">
    <title>Migrador PEP - Sistema de Migração</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <div class="container">
        <h1>🔄 Migrador PEP - Sistema de Migração</h1>

        <div class="section">
            <h2>⚙️ Configurações</h2>
            <label>Diretório Base:</label>
            <input type="text" id="diretorio_base" value="{}" style="margin-top: 5px;">
        </div>

        <div class="section">
            <h2>📋 Lista de Protocolos e Pastas</h2>
            <p class="hint">
                Formato: PROTOCOLO [TAB] NOME_PASTA (um por linha)<br>
                Exemplo: 701524&#9;ATPS-23-LGS-051
            </p>
            <textarea id="lista_protocolos" placeholder="Cole aqui a lista de protocolos e pastas..."></textarea>
            <div>
                <button onclick="validarLista()">✓ Validar</button>
                <button onclick="limparLista()" class="secondary">🗑️ Limpar</button>
                <button onclick="iniciarMigracao()" class="start">🚀 Iniciar Migração</button>
            </div>
        </div>

        <div class="section">
            <h2>📊 Progresso das Migrações</h2>
            <div id="tabela_progresso">
                <p class="empty-hint">Nenhuma migração iniciada ainda.</p>
            </div>
        </div>
    </div>
    <script src="/static/app.js"></script>
</body>
</html>"#,
        html_escape(base_dir)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_page_prefills_base_dir() {
        let html = index_page("/srv/projetos");
        assert!(html.contains("Migrador PEP - Sistema de Migração"));
        assert!(html.contains(r#"value="/srv/projetos""#));
        assert!(html.contains("/static/style.css"));
        assert!(html.contains("/static/app.js"));
    }

    #[test]
    fn test_index_page_escapes_base_dir() {
        let html = index_page(r#"/tmp/"><script>"#);
        assert!(!html.contains("\"><script>"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
    }
}
