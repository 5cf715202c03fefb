//! Scan command handler - list the fonts a directory holds

use crate::cli::{OutputFormat, ScanArgs};
use crate::commands::CommandContext;
use crate::error::{FontError, Result};
use crate::fonts::registry::{self, FontRecord};

/// Run the scan command
pub fn run_scan(args: &ScanArgs, ctx: &CommandContext) -> Result<String> {
    let dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => ctx.load_config()?.font_dir(),
    };

    let mut fonts: Vec<FontRecord> = registry::scan(&dir)?.into_values().collect();
    fonts.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    match ctx.format {
        OutputFormat::Json => {
            let json_value = serde_json::json!({
                "directory": dir.to_string_lossy(),
                "count": fonts.len(),
                "fonts": fonts,
            });
            let json =
                serde_json::to_string_pretty(&json_value).map_err(|e| FontError::ConfigError {
                    message: format!("JSON serialization failed: {}", e),
                })?;
            Ok(format!("{}\n", json))
        }
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str(&format!("directory: {}\n", dir.display()));
            output.push_str(&format!("fonts: {}\n", fonts.len()));
            if !fonts.is_empty() {
                output.push('\n');
            }
            for font in &fonts {
                output.push_str(&format!("  {}  {}\n", font.id, font.display_name));
            }
            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TTF: &[u8] = &[0x00, 0x01, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x80];

    #[test]
    fn test_scan_lists_fonts_only() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Inter.ttf"), TTF).unwrap();
        fs::write(temp.path().join("notes.txt"), "hello").unwrap();

        let ctx = CommandContext::new(OutputFormat::Json, None);
        let args = ScanArgs {
            dir: Some(temp.path().to_path_buf()),
        };
        let value: serde_json::Value =
            serde_json::from_str(&run_scan(&args, &ctx).unwrap()).unwrap();
        assert_eq!(value["count"], 1);
        assert_eq!(value["fonts"][0]["name"], "Inter.ttf");
    }

    #[test]
    fn test_scan_missing_dir_fails() {
        let temp = tempdir().unwrap();
        let ctx = CommandContext::new(OutputFormat::Text, None);
        let args = ScanArgs {
            dir: Some(temp.path().join("absent")),
        };
        assert!(matches!(
            run_scan(&args, &ctx),
            Err(FontError::ScanFontDir { .. })
        ));
    }
}
