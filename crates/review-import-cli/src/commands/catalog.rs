use super::Workspace;
use crate::output::Output;
use crate::CatalogCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Attribute, Cell, Table};
use review_import_core::ProductRepository;

const PREVIEW_CHARS: usize = 60;

pub async fn run_catalog(workspace: &Workspace, cmd: CatalogCommands, output: &Output) -> Result<()> {
    let store = workspace.open_store()?;

    match cmd {
        CatalogCommands::Add { sku, name, parent } => {
            let product = store
                .add_product(&sku, &name, parent.as_deref())
                .map_err(|e| eyre!("{}", e))?;
            match parent {
                Some(parent) => output.success(format!(
                    "Added variant {} of {} (id {})",
                    product.sku, parent, product.id
                )),
                None => output.success(format!("Added product {} (id {})", product.sku, product.id)),
            }
            output.data("product", &product);
        }
        CatalogCommands::Products => {
            let products = store.products()?;
            if products.is_empty() {
                output.info("No products yet. Add one with: review-import catalog add <SKU> <NAME>");
            }

            let mut table = Table::new();
            table.set_header(header(&["ID", "SKU", "Name", "Variant of"]));
            for product in &products {
                let parent = product
                    .parent_id
                    .and_then(|id| products.iter().find(|p| p.id == id))
                    .map(|p| p.sku.clone())
                    .unwrap_or_default();
                table.add_row(vec![
                    Cell::new(product.id),
                    Cell::new(&product.sku),
                    Cell::new(&product.name),
                    Cell::new(parent),
                ]);
            }
            output.table(table);
            output.data("products", &products);
        }
        CatalogCommands::Reviews { sku } => {
            let reviews = match sku {
                Some(sku) => {
                    let product = store
                        .find_by_sku(&sku)?
                        .ok_or_else(|| eyre!("Product not found: {}", sku))?;
                    store.reviews_for_product(product.review_target_id())?
                }
                None => store.reviews()?,
            };

            let mut table = Table::new();
            table.set_header(header(&["ID", "Product", "Author", "Email", "Stars", "Status", "Date", "Review"]));
            for review in &reviews {
                table.add_row(vec![
                    Cell::new(review.id),
                    Cell::new(review.product_id),
                    Cell::new(&review.author_name),
                    Cell::new(&review.author_email),
                    Cell::new(review.rating),
                    Cell::new(format!("{:?}", review.status).to_lowercase()),
                    Cell::new(review.created_at.format("%Y-%m-%d %H:%M:%S")),
                    Cell::new(preview(&review.content)),
                ]);
            }
            output.table(table);
            output.info(format!("{} reviews", reviews.len()));
            output.data("reviews", &reviews);
        }
    }
    Ok(())
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

fn preview(content: &str) -> String {
    let flat = content.replace("<br />", " ").replace(['\r', '\n'], "");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}
