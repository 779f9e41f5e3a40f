use anyhow::{Result, bail};
use std::io::Write;

use designhub_core::design::DesignRepository;

pub async fn usage(repo: &dyn DesignRepository, out: &mut impl Write) -> Result<()> {
    let usage = repo.usage().await;
    writeln!(
        out,
        "{} designs, {:.1} KB of {:.1} KB used ({}%)",
        repo.count().await,
        usage.used as f64 / 1024.0,
        usage.available as f64 / 1024.0,
        usage.percentage
    )?;
    Ok(())
}

pub async fn clear(repo: &dyn DesignRepository, confirmed: bool, out: &mut impl Write) -> Result<()> {
    if !confirmed {
        bail!("Refusing to delete all designs without --yes");
    }
    let count = repo.count().await;
    repo.clear_all().await?;
    writeln!(out, "Deleted {} designs", count)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{output, repo};
    use designhub_core::design::normalize;

    #[tokio::test]
    async fn test_usage_report() {
        let mut out = Vec::new();
        usage(&repo(), &mut out).await.unwrap();

        assert_eq!(output(out), "0 designs, 0.0 KB of 5120.0 KB used (0%)\n");
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let repo = repo();
        repo.save("A", normalize(None)).await.unwrap();
        let mut out = Vec::new();

        assert!(clear(&repo, false, &mut out).await.is_err());
        assert_eq!(repo.count().await, 1);

        clear(&repo, true, &mut out).await.unwrap();
        assert_eq!(repo.count().await, 0);
        assert_eq!(output(out), "Deleted 1 designs\n");
    }
}
