use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::io::Write;

use designhub_core::design::{DesignRepository, newest_first, normalize};

use super::format_millis;

pub async fn list(repo: &dyn DesignRepository, query: Option<&str>, out: &mut impl Write) -> Result<()> {
    let summaries = match query {
        Some(query) => newest_first(&repo.search(query).await),
        None => repo.list_summaries().await,
    };

    if summaries.is_empty() {
        writeln!(out, "No designs found.")?;
        return Ok(());
    }

    for summary in summaries {
        writeln!(
            out,
            "{}\t{} rows\tupdated {}",
            summary.name,
            summary.row_count,
            format_millis(summary.updated_at)
        )?;
    }
    Ok(())
}

pub async fn show(repo: &dyn DesignRepository, name: &str, out: &mut impl Write) -> Result<()> {
    let Some(record) = repo.get_record(name).await else {
        bail!("Design '{}' not found", name);
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
    Ok(())
}

pub async fn save(repo: &dyn DesignRepository, name: &str, input: &str, out: &mut impl Write) -> Result<()> {
    let value: Value = serde_json::from_str(input).context("Design file is not valid JSON")?;
    repo.save(name, normalize(Some(value))).await?;
    writeln!(out, "Saved '{}'", name.trim())?;
    Ok(())
}

pub async fn delete(repo: &dyn DesignRepository, name: &str, out: &mut impl Write) -> Result<()> {
    if !repo.exists(name).await {
        bail!("Design '{}' not found", name);
    }
    repo.delete(name).await?;
    writeln!(out, "Deleted '{}'", name)?;
    Ok(())
}

pub async fn rename(
    repo: &dyn DesignRepository,
    old_name: &str,
    new_name: &str,
    out: &mut impl Write,
) -> Result<()> {
    repo.rename(old_name, new_name).await?;
    writeln!(out, "Renamed '{}' to '{}'", old_name, new_name)?;
    Ok(())
}

pub async fn duplicate(
    repo: &dyn DesignRepository,
    name: &str,
    new_name: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let copy = repo.duplicate(name, new_name).await?;
    writeln!(out, "Duplicated '{}' as '{}'", name, copy)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{output, repo};

    const DOC: &str = r#"{"body": {"rows": [{"id": "a"}, {"id": "b"}], "values": {}}}"#;

    #[tokio::test]
    async fn test_save_then_list_and_show() {
        let repo = repo();
        let mut out = Vec::new();

        save(&repo, "Spring Sale", DOC, &mut out).await.unwrap();
        save(&repo, "Welcome", "{}", &mut out).await.unwrap();
        list(&repo, Some("SPRING"), &mut out).await.unwrap();
        show(&repo, "Spring Sale", &mut out).await.unwrap();

        let text = output(out);
        assert!(text.contains("Saved 'Spring Sale'"));
        assert!(text.contains("Spring Sale\t2 rows\tupdated 2023-11-14"));
        assert!(!text.contains("Welcome\t"));
        assert!(text.contains("\"schemaVersion\": 16"));
    }

    #[tokio::test]
    async fn test_list_empty() {
        let mut out = Vec::new();
        list(&repo(), None, &mut out).await.unwrap();
        assert_eq!(output(out), "No designs found.\n");
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_json() {
        let repo = repo();
        let mut out = Vec::new();

        assert!(save(&repo, "A", "{oops", &mut out).await.is_err());
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_design_errors() {
        let repo = repo();
        let mut out = Vec::new();

        assert!(show(&repo, "Ghost", &mut out).await.is_err());
        assert!(delete(&repo, "Ghost", &mut out).await.is_err());
        assert!(rename(&repo, "Ghost", "B", &mut out).await.is_err());
    }

    #[tokio::test]
    async fn test_rename_duplicate_delete() {
        let repo = repo();
        let mut out = Vec::new();
        save(&repo, "A", DOC, &mut out).await.unwrap();

        rename(&repo, "A", "B", &mut out).await.unwrap();
        duplicate(&repo, "B", None, &mut out).await.unwrap();
        delete(&repo, "B", &mut out).await.unwrap();

        let text = output(out);
        assert!(text.contains("Duplicated 'B' as 'B (Copy)'"));
        assert!(repo.exists("B (Copy)").await);
        assert!(!repo.exists("B").await);
    }
}
