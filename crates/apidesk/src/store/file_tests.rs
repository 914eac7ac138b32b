// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Duration;

use super::*;

fn token(environment: &str, access: &str) -> CachedToken {
    CachedToken {
        environment: environment.to_owned(),
        access_token: access.to_owned(),
        token_type: "Bearer".to_owned(),
        expires_in: 3600,
        expires_at: Utc::now() + Duration::seconds(3600),
        scope: None,
    }
}

fn draft(endpoint: &str) -> AuditDraft {
    AuditDraft {
        collection: "property".to_owned(),
        endpoint: endpoint.to_owned(),
        method: "POST".to_owned(),
        url: "https://api.example/x".to_owned(),
        request_body: Some(r#"{"a":1}"#.to_owned()),
        status_code: 201,
        duration: 12,
        ..AuditDraft::default()
    }
}

#[tokio::test]
async fn tokens_survive_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    {
        let store = FileStore::open(dir.path())?;
        store.upsert(token("opera_cloud", "first")).await?;
        store.upsert(token("opera_cloud", "second")).await?;
        store.upsert(token("distribution", "dist")).await?;
    }

    let reopened = FileStore::open(dir.path())?;
    let opera = reopened.find("opera_cloud").await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
    assert_eq!(opera.access_token, "second");
    assert!(reopened.find("distribution").await?.is_some());
    assert!(reopened.find("ra_storage").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn audit_survives_reopen_in_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    {
        let store = FileStore::open(dir.path())?;
        store.insert(draft("first")).await?;
        store.insert(draft("second")).await?;
    }

    let reopened = FileStore::open(dir.path())?;
    let entries =
        reopened.query(&AuditQuery { collection: None, limit: 10 }).await?;
    let endpoints: Vec<&str> = entries.iter().map(|e| e.endpoint.as_str()).collect();
    assert_eq!(endpoints, ["second", "first"]);
    assert_eq!(entries[0].status_code, 201);
    assert_eq!(entries[0].request_body.as_deref(), Some(r#"{"a":1}"#));
    Ok(())
}

#[tokio::test]
async fn clear_truncates_audit_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::open(dir.path())?;
    store.insert(draft("first")).await?;
    assert_eq!(store.clear().await?, 1);

    let reopened = FileStore::open(dir.path())?;
    assert!(reopened.query(&AuditQuery { collection: None, limit: 10 }).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_audit_lines_are_skipped() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    {
        let store = FileStore::open(dir.path())?;
        store.insert(draft("kept")).await?;
    }
    let path = dir.path().join("audit.jsonl");
    let mut contents = std::fs::read_to_string(&path)?;
    contents.push_str("{not json\n");
    std::fs::write(&path, contents)?;

    let reopened = FileStore::open(dir.path())?;
    let entries = reopened.query(&AuditQuery { collection: None, limit: 10 }).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].endpoint, "kept");
    Ok(())
}

#[tokio::test]
async fn token_save_leaves_no_temp_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::open(dir.path())?;
    store.upsert(token("opera_cloud", "first")).await?;
    store.upsert(token("ra_storage", "ra")).await?;

    let mut names = std::fs::read_dir(dir.path())?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();
    assert_eq!(names, ["tokens.json"]);

    let saved: HashMap<String, CachedToken> =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("tokens.json"))?)?;
    assert_eq!(saved.len(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_inserts_append_whole_lines() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = std::sync::Arc::new(FileStore::open(dir.path())?);

    let mut tasks = Vec::new();
    for i in 0..20 {
        let store = std::sync::Arc::clone(&store);
        tasks.push(tokio::spawn(async move { store.insert(draft(&format!("call-{i}"))).await }));
    }
    for task in tasks {
        task.await??;
    }

    let contents = std::fs::read_to_string(dir.path().join("audit.jsonl"))?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 20);
    for line in lines {
        serde_json::from_str::<AuditLogEntry>(line)?;
    }
    assert_eq!(FileStore::open(dir.path())?.inner.audit_len().await, 20);
    Ok(())
}
