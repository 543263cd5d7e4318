//! Parsing of the pasted protocol/folder batch list.

use std::path::Path;

use regex::Regex;
use thiserror::Error;

use crate::models::MigrationItem;

/// One folder named in the list that does not exist on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFolder {
    pub protocol: String,
    pub folder: String,
}

#[derive(Debug, Error)]
pub enum BatchError {
    /// Any missing folder rejects the whole batch before a browser is
    /// launched. All of them are listed so one fix round suffices.
    #[error("{}", format_missing(.0))]
    FoldersNotFound(Vec<MissingFolder>),
    #[error("Nenhum item válido encontrado")]
    Empty,
}

fn format_missing(missing: &[MissingFolder]) -> String {
    missing
        .iter()
        .map(|m| format!("Pasta não encontrada: {}\nProtocolo: {}", m.folder, m.protocol))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the pasted list into migration items.
///
/// One entry per line: protocol, separator, folder name. The separator
/// is a tab or a run of at least two spaces, which lets folder names
/// keep their single spaces. Lines without both parts are skipped;
/// every named folder must exist under `base_dir` or the whole batch
/// is rejected with the full list of offenders.
pub fn parse_batch(input: &str, base_dir: &Path) -> Result<Vec<MigrationItem>, BatchError> {
    let mut items = Vec::new();
    let mut missing = Vec::new();
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((protocol, folder_name)) = split_line(line) else {
            continue;
        };

        let folder_path = base_dir.join(&folder_name);
        if !folder_path.is_dir() {
            missing.push(MissingFolder {
                protocol,
                folder: folder_path.display().to_string(),
            });
            continue;
        }
        items.push(MigrationItem::new(
            &protocol,
            &folder_name,
            &folder_path.to_string_lossy(),
        ));
    }
    if !missing.is_empty() {
        return Err(BatchError::FoldersNotFound(missing));
    }
    if items.is_empty() {
        return Err(BatchError::Empty);
    }
    Ok(items)
}

fn split_line(line: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else if line.contains("  ") {
        line.split("  ").collect()
    } else {
        let sep = Regex::new(r"\s{2,}").unwrap();
        sep.split(line).collect()
    };
    if parts.len() < 2 {
        return None;
    }
    let protocol = parts[0].trim();
    let folder = parts[1].trim();
    if protocol.is_empty() || folder.is_empty() {
        return None;
    }
    Some((protocol.to_string(), folder.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;

    fn base_with(folders: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for folder in folders {
            std::fs::create_dir(dir.path().join(folder)).unwrap();
        }
        dir
    }

    #[test]
    fn test_tab_separated_lines() {
        let base = base_with(&["pasta_a", "pasta_b"]);
        let items = parse_batch("123456\tpasta_a\n654321\tpasta_b\n", base.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].protocol, "123456");
        assert_eq!(items[0].folder_name, "pasta_a");
        assert_eq!(items[0].status, ItemStatus::Pending);
        assert_eq!(
            items[1].folder_path,
            base.path().join("pasta_b").display().to_string()
        );
    }

    #[test]
    fn test_double_space_keeps_single_spaces_in_folder() {
        let base = base_with(&["Cliente ACME Ltda"]);
        let items = parse_batch("123456  Cliente ACME Ltda", base.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].folder_name, "Cliente ACME Ltda");
    }

    #[test]
    fn test_blank_and_partial_lines_are_skipped() {
        let base = base_with(&["pasta_a"]);
        let input = "\n123456  pasta_a\n\nsó-um-campo\n   \n";
        let items = parse_batch(input, base.path()).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_missing_folder_rejects_batch() {
        let base = base_with(&["pasta_a"]);
        let err = parse_batch("123456\tpasta_x", base.path()).unwrap_err();
        match &err {
            BatchError::FoldersNotFound(missing) => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].protocol, "123456");
                assert!(missing[0].folder.ends_with("pasta_x"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.starts_with("Pasta não encontrada: "));
        assert!(message.contains("\nProtocolo: 123456"));
    }

    #[test]
    fn test_all_missing_folders_are_listed() {
        let base = base_with(&["existe"]);
        let input = "111\tfalta_um\n222\texiste\n333\tfalta_dois\n";
        let err = parse_batch(input, base.path()).unwrap_err();
        match &err {
            BatchError::FoldersNotFound(missing) => {
                assert_eq!(missing.len(), 2);
                assert_eq!(missing[0].protocol, "111");
                assert_eq!(missing[1].protocol, "333");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("falta_um"));
        assert!(message.contains("falta_dois"));
        assert!(message.contains("Protocolo: 111"));
        assert!(message.contains("Protocolo: 333"));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let base = base_with(&[]);
        let err = parse_batch("", base.path()).unwrap_err();
        assert!(matches!(err, BatchError::Empty));
        assert_eq!(err.to_string(), "Nenhum item válido encontrado");
    }

    #[test]
    fn test_tab_wins_over_spaces() {
        let base = base_with(&["pasta  estranha"]);
        // With a tab present, double spaces stay inside the folder name.
        let items = parse_batch("123\tpasta  estranha", base.path()).unwrap();
        assert_eq!(items[0].folder_name, "pasta  estranha");
    }
}
