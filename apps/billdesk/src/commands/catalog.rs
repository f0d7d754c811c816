//! Catalog commands: seed, catalog.

use clap::Args;

use billdesk::error::AppError;
use billdesk::App;
use billdesk_core::{Category, Product};
use billdesk_db::seed::seed_default_catalog;

use super::Output;

#[derive(Args)]
pub struct CatalogArgs {
    /// Only this category (medical, grocery, drinks)
    #[arg(long)]
    category: Option<Category>,
}

pub async fn seed(app: &App) -> anyhow::Result<()> {
    let Some(db) = app.database() else {
        anyhow::bail!("seeding needs a database");
    };

    let written = seed_default_catalog(&db.catalog())
        .await
        .map_err(AppError::from)?;
    println!("Wrote {} products", written);
    Ok(())
}

pub async fn list(app: &App, args: CatalogArgs, out: Output) -> anyhow::Result<()> {
    let products: Vec<Product> = match args.category {
        Some(category) => app.catalog.by_category(category).await,
        None => app.catalog.snapshot().await.map(|p| p.to_vec()),
    }
    .map_err(AppError::from)?;

    out.emit(&products, || {
        for category in Category::ALL {
            let in_category: Vec<&Product> =
                products.iter().filter(|p| p.category == category).collect();
            if in_category.is_empty() {
                continue;
            }

            println!("{} ({})", category.label(), app.taxes.rate_for(category));
            for product in in_category {
                println!(
                    "  {:<8}{:<24}{:>10}",
                    product.product_id,
                    product.name,
                    product.unit_price.to_string()
                );
            }
        }
    })
}
