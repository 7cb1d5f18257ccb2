use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(output_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = output_dir {
        settings.output_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.output_dir);
    std::fs::create_dir_all(&resolved)?;
    println!("Output files will be written to {}", resolved.display());
    Ok(())
}
