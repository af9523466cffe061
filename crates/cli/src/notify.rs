use std::path::Path;

/// Print the report at `path` to stdout.
///
/// Returns `false` after printing `Report not found: <path>` when the file is
/// absent, so the caller can exit non-zero.
pub fn print_report(path: &Path) -> anyhow::Result<bool> {
    match read_report(path)? {
        Some(content) => {
            println!("{content}");
            Ok(true)
        },
        None => {
            println!("Report not found: {}", path.display());
            Ok(false)
        },
    }
}

fn read_report(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(path)?))
}
