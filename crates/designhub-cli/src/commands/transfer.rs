use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use designhub_core::design::DesignRepository;

pub async fn export(repo: &dyn DesignRepository, out: &mut impl Write) -> Result<()> {
    let blob = repo.export_all().await?;
    writeln!(out, "{}", blob)?;
    Ok(())
}

pub async fn export_to_file(repo: &dyn DesignRepository, path: &Path, out: &mut impl Write) -> Result<()> {
    let blob = repo.export_all().await?;
    std::fs::write(path, blob).with_context(|| format!("Failed to write {}", path.display()))?;
    writeln!(out, "Exported {} designs to {}", repo.count().await, path.display())?;
    Ok(())
}

pub async fn import(repo: &dyn DesignRepository, input: &str, out: &mut impl Write) -> Result<()> {
    let imported = repo.import_all(input).await?;
    writeln!(out, "Imported {} designs", imported.len())?;
    for name in imported {
        writeln!(out, "  {}", name)?;
    }
    Ok(())
}
