//! Basic example demonstrating WowSQL Rust SDK usage.

use serde_json::json;
use wowsql::WowClient;

#[tokio::main]
async fn main() -> wowsql::Result<()> {
    // Connect with your project URL and API key
    let client = WowClient::connect("https://your-project.wowsql.com", "your-api-key-here")?;

    // 1. SELECT - all users
    let users = client.table("users")?.select(["*"]).execute().await?;
    println!("Found {} users", users.count);
    for user in &users.data {
        println!("  - {} ({})", user["name"], user["email"]);
    }

    // 2. SELECT with filters
    let active = client
        .table("users")?
        .select(["id", "name", "email"])
        .eq("status", "active")
        .limit(5)
        .execute()
        .await?;
    println!("Active users: {}", active.count);

    // 3. INSERT - add a new user
    let new_user = client
        .table("users")?
        .insert(json!({
            "name": "Alice Johnson",
            "email": "alice@example.com",
            "age": 28,
            "status": "active"
        }))?
        .execute()
        .await?;
    println!("Inserted user: {:?}", new_user.data);

    // 4. UPDATE - scoped by a predicate
    let updated = client
        .table("users")?
        .update(json!({"name": "Alice Smith"}))?
        .eq("id", 1)
        .execute()
        .await?;
    println!("Updated {} user(s)", updated.count);

    // 5. DELETE - scoped by a predicate
    let deleted = client
        .table("users")?
        .delete()?
        .eq("id", 999)
        .execute()
        .await?;
    println!("Deleted {} user(s)", deleted.count);

    // 6. Complex query
    let results = client
        .table("users")?
        .select(["id", "name", "email", "age"])
        .gt("age", 21)
        .lt("age", 65)
        .like("email", "%@gmail.com")
        .order_by("age", false)
        .limit(10)
        .execute()
        .await?;
    println!("Found {} users matching criteria", results.count);

    // 7. Pagination
    let page_1 = client.table("users")?.limit(20).offset(0).execute().await?;
    let page_2 = client.table("users")?.limit(20).offset(20).execute().await?;
    println!("Page 1: {} users", page_1.data.len());
    println!("Page 2: {} users", page_2.data.len());

    // 8. Utility methods
    let tables = client.list_tables().await?;
    println!("Tables in database: {:?}", tables);

    let schema = client.describe_table("users").await?;
    println!(
        "Users table has {} columns and {} rows",
        schema.columns.len(),
        schema.row_count
    );

    let health = client.health().await?;
    println!("API Status: {}", health.status);

    Ok(())
}
