//! Seed the product catalog with sample data.

use rust_decimal::Decimal;
use tracing::info;

/// Sample catalog for local development.
const SAMPLE_PRODUCTS: &[(&str, &str, &str)] = &[
    ("Empanadas (docena)", "A dozen baked beef empanadas", "12.00"),
    ("Pizza muzzarella", "Classic mozzarella pizza", "15.50"),
    ("Milanesa con papas", "Breaded cutlet with fries", "13.00"),
    ("Agua mineral 1.5L", "Still mineral water", "2.50"),
    ("Gaseosa 2.25L", "Soft drink, family size", "4.00"),
];

/// Insert the sample product catalog.
///
/// Idempotent: products already present (matched by name) are skipped.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn products() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let mut inserted = 0_u32;
    for (name, description, price) in SAMPLE_PRODUCTS {
        let price: Decimal = price.parse()?;

        let result = sqlx::query(
            r"
            INSERT INTO products (name, description, price)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM products WHERE name = $1)
            ",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .execute(&pool)
        .await?;

        inserted += u32::try_from(result.rows_affected()).unwrap_or(0);
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!(
        "  Products skipped (already exist): {}",
        SAMPLE_PRODUCTS.len() as u32 - inserted
    );

    Ok(())
}
