//! Storage example: uploads with automatic quota validation.

use wowsql::{Error, UploadRequest, WowClient};

#[tokio::main]
async fn main() -> wowsql::Result<()> {
    let client = WowClient::connect("https://your-project.wowsql.com", "your-api-key-here")?;
    let storage = client.storage();

    // 1. Check storage quota and usage
    let quota = storage.get_quota(false).await?;
    println!("Plan: {}", quota.plan_name);
    println!("Total storage: {:.2} GB", quota.total_gb());
    println!(
        "Used: {:.2} GB ({:.1}%)",
        quota.used_gb,
        quota.usage_percentage()
    );
    println!("Available: {:.2} GB", quota.available_gb());
    if quota.can_expand() {
        println!("You can expand storage (enterprise plan)");
    }

    // 2. Upload a local file; the guard rejects it before any bytes are
    // transmitted if it would exceed the plan's limit.
    match storage
        .upload_from_path("documents/report.pdf", Some("reports"))
        .await
    {
        Ok(result) => {
            println!("Uploaded: {}", result.file_key);
            println!("  Size: {:.2} MB", result.file_size as f64 / (1024.0 * 1024.0));
            println!("  Bucket: {}", result.bucket_name);
        }
        Err(Error::StorageLimitExceeded { message, .. }) => {
            println!("Upload blocked: {message}");
            let quota = storage.get_quota(true).await?;
            println!("  Available space: {:.4} GB", quota.available_gb());
        }
        Err(Error::NotFound(_)) => println!("File not found"),
        Err(e) => return Err(e),
    }

    // 3. Upload from bytes
    let result = storage
        .upload(
            UploadRequest::new(b"hello wowsql".to_vec(), "hello.txt")
                .folder("notes")
                .content_type("text/plain"),
        )
        .await?;
    println!("Uploaded: {}", result.file_key);

    // 4. Batch upload: validate the aggregate size once, then upload each
    // file with the per-upload check skipped.
    let batch: [(&str, &[u8]); 2] = [("a.txt", b"aaaa"), ("b.txt", b"bbbb")];
    let total: u64 = batch.iter().map(|(_, bytes)| bytes.len() as u64).sum();
    let (allowed, message) = storage.check_upload_allowed(total)?;
    if allowed {
        for (name, bytes) in batch {
            let request = UploadRequest::new(bytes.to_vec(), name).folder("batch");
            let result = storage.upload_with_options(request, false).await?;
            println!("  uploaded {}", result.file_key);
        }
    } else {
        println!("Cannot upload batch: {message}");
    }

    // 5. List files in a folder
    let documents = storage.list_files(Some("documents/")).await?;
    println!("Documents folder: {} files", documents.len());
    for file in documents.iter().take(5) {
        println!("  - {}: {:.2} MB", file.key, file.size_mb());
    }

    // 6. Presigned URL for file access (no quota consult, nothing uploaded)
    let url = storage.get_file_url("documents/report.pdf", 3600).await?;
    println!("Download URL: {}", url.file_url);

    // 7. Delete a file; the quota snapshot refreshes on the next read
    storage.delete_file("old-files/temp.txt").await?;
    let quota = storage.get_quota(false).await?;
    println!("Available storage: {:.2} GB", quota.available_gb());

    Ok(())
}
