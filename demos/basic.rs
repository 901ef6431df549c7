use sqlx::PgPool;
use sqlx_unit_of_work::{with_transaction, Accessor, Error, ErrorKind, TransactionManager};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Connect to database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/test".to_string());
    let isolation = std::env::var("TX_ISOLATION").unwrap_or_else(|_| "read committed".to_string());

    let pool = PgPool::connect(&database_url).await?;
    let manager = TransactionManager::new(pool.clone()).with_isolation_level(isolation.as_str())?;

    println!("=== Unit of Work Example (isolation: {}) ===\n", manager.isolation_level());

    // Example 1: Identity and user created together
    println!("1. Creating an identity with its user...");
    with_transaction(&manager, |tx| {
        Box::pin(async move {
            tx.users()?
                .execute("INSERT INTO users (email) VALUES ('alice@example.com')")
                .await?;
            tx.identities()?
                .execute("INSERT INTO identities (username) VALUES ('alice')")
                .await?;
            Ok(())
        })
    })
    .await?;
    println!("   ✓ Identity and user committed\n");

    // Example 2: Manual control with explicit rollback
    println!("2. Rolling back a role grant...");
    let mut tx = manager.begin_transaction().await?;
    tx.identity_roles()?
        .execute("INSERT INTO identity_role (identity_id, role_id) VALUES (1, 1)")
        .await?;
    tx.rollback().await?;
    match tx.identity_roles() {
        Err(Error::AlreadyConsumed) => {
            println!("   ✓ Finished transaction rejects further use\n")
        }
        _ => println!("   ✗ Should have been consumed!\n"),
    }

    // Example 3: Errors roll the unit of work back
    println!("3. Testing automatic rollback on error...");
    let result: Result<(), _> = with_transaction(&manager, |tx| {
        Box::pin(async move {
            tx.invitations()?
                .execute("INSERT INTO invitation (identity_id) VALUES (1)")
                .await?;
            tx.resources()?.execute("SELECT * FROM non_existent_table").await?;
            Ok(())
        })
    })
    .await;

    match result {
        Ok(_) => println!("   ✗ Should have failed!"),
        Err(e) if e.kind() == ErrorKind::Database => {
            println!("   ✓ Transaction rolled back: {}\n", e)
        }
        Err(e) => return Err(e.into()),
    }

    println!("=== All examples completed successfully ===");

    pool.close().await;
    Ok(())
}
