use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExportError;

pub const INSTRUCTIONS_FILE: &str = "instructions.txt";

/// Write upload instructions into the output root.
pub fn write_instructions(root: &Path, animations_file_name: &str) -> Result<PathBuf, ExportError> {
    let path = root.join(INSTRUCTIONS_FILE);
    let text = format!(
        "HWPBA Output\n\
         \n\
         Upload to Horizon Worlds:\n\
         1) Open Horizon Worlds Creator Portal.\n\
         2) Upload everything under 'HWPBA_Output/assetsToUpload'.\n   \
         - '3dModels' contains all FBX parts and textures.\n   \
         - '{animations_file_name}' is a Text Asset; import it into your world.\n"
    );
    fs::write(&path, text)?;
    Ok(path)
}
