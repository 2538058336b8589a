//! Seed the catalog from a YAML file.
//!
//! The file lists a category tree, product labels and products. Products
//! refer to their category by its name path and to labels by name:
//!
//! ```yaml
//! categories:
//!   - name: Drones
//!     children:
//!       - name: Frames
//! labels:
//!   - name: New
//!     color: "#22cc88"
//! products:
//!   - name: Carbon frame 5"
//!     price: "49.90"
//!     category: [Drones, Frames]
//!     labels: [New]
//!     stock: 4
//!     is_published: true
//! ```
//!
//! Categories and labels that already exist (matched by name, any case) are
//! reused, and products whose name is already taken are skipped, so running
//! the same file twice is harmless. Everything is written in one transaction.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use sqlx::PgConnection;
use tracing::{error, info};

use apogee_admin::db::{self, RepositoryError};
use apogee_core::catalog::{CategoryNode, CategoryTree, Discount, ProductInput};
use apogee_core::content::ProductLabelInput;
use apogee_core::{CategoryId, ProductLabelId};

/// Top-level YAML document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub labels: Vec<ProductLabelInput>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub children: Vec<Self>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    /// Names from the top-level category down.
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub main_image_index: u32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub is_published: bool,
}

impl ProductSeed {
    fn to_input(&self, category_id: Option<CategoryId>, label_ids: Vec<ProductLabelId>) -> ProductInput {
        ProductInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            category_id,
            images: self.images.clone(),
            main_image_index: self.main_image_index,
            stock: self.stock,
            discount: self.discount.clone(),
            label_ids,
            is_published: self.is_published,
        }
    }
}

/// Rows written by a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub labels: usize,
    pub products: usize,
    pub skipped: usize,
}

/// A category to create, parent path first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedCategory {
    parent: Vec<String>,
    name: String,
}

/// Depth-first order, so every parent comes before its children.
fn flatten(specs: &[CategorySeed]) -> Vec<PlannedCategory> {
    let mut planned = Vec::new();
    let mut stack: Vec<(Vec<String>, &CategorySeed)> =
        specs.iter().rev().map(|spec| (Vec::new(), spec)).collect();

    while let Some((parent, spec)) = stack.pop() {
        let mut path = parent.clone();
        path.push(spec.name.trim().to_string());
        for child in spec.children.iter().rev() {
            stack.push((path.clone(), child));
        }
        planned.push(PlannedCategory {
            parent,
            name: spec.name.clone(),
        });
    }

    planned
}

fn path_key(path: &[String]) -> Vec<String> {
    path.iter().map(|name| name.trim().to_lowercase()).collect()
}

/// Check the file on its own, before touching the database.
///
/// Returns every problem found, not only the first.
#[must_use]
pub fn validate_seed(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();

    // Build the tree with placeholder ids to reuse its name and depth rules.
    let mut nodes: Vec<CategoryNode> = Vec::new();
    let mut ids: HashMap<Vec<String>, CategoryId> = HashMap::new();
    let mut next_id = 1;
    for planned in flatten(&seed.categories) {
        let parent = if planned.parent.is_empty() {
            None
        } else if let Some(id) = ids.get(&path_key(&planned.parent)) {
            Some(*id)
        } else {
            // The parent was rejected; its error is already reported.
            continue;
        };

        let tree = match CategoryTree::from_nodes(nodes.clone()) {
            Ok(tree) => tree,
            Err(e) => {
                errors.push(format!("categories: {e}"));
                break;
            }
        };
        match tree.validate_new(parent, &planned.name) {
            Ok(new) => {
                let id = CategoryId::new(next_id);
                next_id += 1;
                let mut path = planned.parent.clone();
                path.push(new.name.clone());
                ids.insert(path_key(&path), id);
                nodes.push(CategoryNode {
                    id,
                    parent_id: new.parent_id,
                    name: new.name,
                });
            }
            Err(e) => errors.push(format!("category \"{}\": {e}", planned.name)),
        }
    }

    let mut label_names = HashSet::new();
    for label in &seed.labels {
        match label.clone().validate() {
            Ok(label) => {
                if !label_names.insert(label.name.to_lowercase()) {
                    errors.push(format!("label \"{}\" is listed twice", label.name));
                }
            }
            Err(e) => errors.push(format!("label \"{}\": {e}", label.name)),
        }
    }

    for product in &seed.products {
        if let Err(e) = product.to_input(None, Vec::new()).validate() {
            errors.push(format!("product \"{}\": {e}", product.name));
        }
    }

    errors
}

/// Parse, validate and load a catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails
/// validation, references unknown categories or labels, or a database
/// operation fails. Nothing is written in that case.
pub async fn catalog(file_path: &Path) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "ADMIN_DATABASE_URL not set")?;

    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading catalog from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(file_path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    info!(
        categories = seed.categories.len(),
        labels = seed.labels.len(),
        products = seed.products.len(),
        "Parsed catalog"
    );

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;
    let summary = load(&mut tx, &seed).await?;
    tx.commit().await?;

    if summary.skipped > 0 {
        info!(skipped = summary.skipped, "Products already present were skipped");
    }
    Ok(summary)
}

async fn load(conn: &mut PgConnection, seed: &CatalogSeed) -> Result<SeedSummary, RepositoryError> {
    let mut summary = SeedSummary::default();

    sqlx::query("LOCK TABLE shop.category IN EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;

    let mut nodes = load_categories(conn).await?;
    let mut tree = CategoryTree::from_nodes(nodes.clone())
        .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
    let mut paths = category_paths(&tree, &nodes);

    for planned in flatten(&seed.categories) {
        let parent = if planned.parent.is_empty() {
            None
        } else {
            let id = paths.get(&path_key(&planned.parent)).ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "parent of category \"{}\" was not created",
                    planned.name
                ))
            })?;
            Some(*id)
        };

        let mut path = planned.parent.clone();
        path.push(planned.name.clone());
        if paths.contains_key(&path_key(&path)) {
            continue;
        }

        let new = tree
            .validate_new(parent, &planned.name)
            .map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        let (id,): (CategoryId,) = sqlx::query_as(
            "INSERT INTO shop.category (parent_id, name, depth) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(new.parent_id)
        .bind(&new.name)
        .bind(i16::from(new.depth))
        .fetch_one(&mut *conn)
        .await?;

        nodes.push(CategoryNode {
            id,
            parent_id: new.parent_id,
            name: new.name,
        });
        tree = CategoryTree::from_nodes(nodes.clone())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        paths.insert(path_key(&path), id);
        summary.categories += 1;
    }

    let mut labels = load_labels(conn).await?;
    for label in &seed.labels {
        let label = label
            .clone()
            .validate()
            .map_err(|e| RepositoryError::Invalid(format!("label \"{}\": {e}", label.name)))?;
        if labels.contains_key(&label.name.to_lowercase()) {
            continue;
        }

        let (id,): (ProductLabelId,) = sqlx::query_as(
            r"
            INSERT INTO shop.product_label (name, color, display_order)
            SELECT $1, $2, COALESCE(MAX(display_order) + 1, 0) FROM shop.product_label
            RETURNING id
            ",
        )
        .bind(&label.name)
        .bind(&label.color)
        .fetch_one(&mut *conn)
        .await?;

        labels.insert(label.name.to_lowercase(), id);
        summary.labels += 1;
    }

    for product in &seed.products {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM shop.product WHERE lower(name) = lower($1))",
        )
        .bind(product.name.trim())
        .fetch_one(&mut *conn)
        .await?;
        if taken {
            summary.skipped += 1;
            continue;
        }

        let category_id = if product.category.is_empty() {
            None
        } else {
            let id = paths.get(&path_key(&product.category)).ok_or_else(|| {
                RepositoryError::Invalid(format!(
                    "product \"{}\": category {} does not exist",
                    product.name,
                    product.category.join(" / ")
                ))
            })?;
            Some(*id)
        };

        let label_ids = product
            .labels
            .iter()
            .map(|name| {
                labels.get(&name.trim().to_lowercase()).copied().ok_or_else(|| {
                    RepositoryError::Invalid(format!(
                        "product \"{}\": label \"{name}\" does not exist",
                        product.name
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let input = product
            .to_input(category_id, label_ids)
            .validate()
            .map_err(|e| RepositoryError::Invalid(format!("product \"{}\": {e}", product.name)))?;
        db::products::insert_product(conn, &input).await?;
        summary.products += 1;
    }

    Ok(summary)
}

async fn load_categories(conn: &mut PgConnection) -> Result<Vec<CategoryNode>, RepositoryError> {
    let rows: Vec<(CategoryId, Option<CategoryId>, String)> =
        sqlx::query_as("SELECT id, parent_id, name FROM shop.category ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, parent_id, name)| CategoryNode {
            id,
            parent_id,
            name,
        })
        .collect())
}

fn category_paths(tree: &CategoryTree, nodes: &[CategoryNode]) -> HashMap<Vec<String>, CategoryId> {
    nodes
        .iter()
        .filter_map(|node| tree.path(node.id).ok().map(|path| (path_key(&path), node.id)))
        .collect()
}

async fn load_labels(
    conn: &mut PgConnection,
) -> Result<HashMap<String, ProductLabelId>, RepositoryError> {
    let rows: Vec<(ProductLabelId, String)> =
        sqlx::query_as("SELECT id, name FROM shop.product_label")
            .fetch_all(&mut *conn)
            .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| (name.to_lowercase(), id))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
categories:
  - name: Drones
    children:
      - name: Frames
        children:
          - name: 5 inch
      - name: Motors
  - name: Printers
labels:
  - name: New
    color: "#22CC88"
products:
  - name: Carbon frame
    price: "49.90"
    category: [Drones, Frames, 5 inch]
    labels: [New]
    stock: 4
    is_published: true
  - name: Nozzle set
    price: "7.50"
"##;

    #[test]
    fn test_parse_sample() {
        let seed: CatalogSeed = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(seed.categories.len(), 2);
        assert_eq!(seed.categories[0].children.len(), 2);
        assert_eq!(seed.products[0].price, Decimal::new(4990, 2));
        assert_eq!(seed.products[0].category, ["Drones", "Frames", "5 inch"]);
        assert!(!seed.products[1].is_published);
        assert!(validate_seed(&seed).is_empty());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result: Result<CatalogSeed, _> = serde_yaml::from_str("categories: []\nproducs: []\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_flatten_puts_parents_first() {
        let seed: CatalogSeed = serde_yaml::from_str(SAMPLE).unwrap();
        let names: Vec<_> = flatten(&seed.categories)
            .into_iter()
            .map(|planned| (planned.parent.join("/"), planned.name))
            .collect();

        assert_eq!(
            names,
            [
                (String::new(), "Drones".to_string()),
                ("Drones".to_string(), "Frames".to_string()),
                ("Drones/Frames".to_string(), "5 inch".to_string()),
                ("Drones".to_string(), "Motors".to_string()),
                (String::new(), "Printers".to_string()),
            ]
        );
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let yaml = r##"
categories:
  - name: Drones
  - name: drones
  - name: A
    children:
      - name: B
        children:
          - name: C
            children:
              - name: D
labels:
  - name: Sale
    color: red
products:
  - name: "  "
    price: "1.00"
  - name: Cheap
    price: "-2"
"##;
        let seed: CatalogSeed = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_seed(&seed);

        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors[0].contains("already exists"));
        assert!(errors[1].contains("levels deep"));
        assert!(errors[2].starts_with("label \"Sale\""));
        assert!(errors[3].contains("product name cannot be empty"));
        assert!(errors[4].contains("price cannot be negative"));
    }

    #[test]
    fn test_duplicate_label_names() {
        let yaml = r##"
labels:
  - name: New
    color: "#000000"
  - name: NEW
    color: "#ffffff"
"##;
        let seed: CatalogSeed = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_seed(&seed);
        assert_eq!(errors, ["label \"NEW\" is listed twice"]);
    }

    #[test]
    fn test_category_paths_match_any_case() {
        let nodes = vec![
            CategoryNode {
                id: CategoryId::new(1),
                parent_id: None,
                name: "Drones".to_string(),
            },
            CategoryNode {
                id: CategoryId::new(2),
                parent_id: Some(CategoryId::new(1)),
                name: "Frames".to_string(),
            },
        ];
        let tree = CategoryTree::from_nodes(nodes.clone()).unwrap();
        let paths = category_paths(&tree, &nodes);

        let key = path_key(&["drones".to_string(), " FRAMES ".to_string()]);
        assert_eq!(paths.get(&key), Some(&CategoryId::new(2)));
    }
}
