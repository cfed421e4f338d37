// src/runner.rs
//
// One function per pipeline stage; the CLI dispatches here. Each scrape
// stage snapshots raw HTML, writes normalized JSON and returns the payload.

use std::error::Error;
use std::path::{Path, PathBuf};

use crate::assets;
use crate::config::{
    ASSETS_DIR, CATEGORY_PATHS, CLASSES_PATH, CONFIG_PATH, ITEMS_PATH,
};
use crate::core::net::WikiClient;
use crate::model::{
    AssetRecord, ClassRecord, HasIcon, ItemRecord, RequirementsDataset,
};
use crate::scrape::classes::parse_classes;
use crate::scrape::items::{dedupe_and_sort, parse_items};
use crate::store;

pub fn scrape_classes(client: &WikiClient) -> Result<Vec<ClassRecord>, Box<dyn Error>> {
    logf!("runner: scraping classes");
    let html = client.fetch(CLASSES_PATH)?;
    store::save_raw_html("classes.html", &html)?;

    let classes = parse_classes(&html, client.base_url());
    logf!("runner: {} classes", classes.len());
    store::save_json("classes.json", &classes)?;
    Ok(classes)
}

pub fn scrape_items(client: &WikiClient) -> Result<Vec<ItemRecord>, Box<dyn Error>> {
    logf!("runner: scraping items");
    let index_html = client.fetch(ITEMS_PATH)?;
    store::save_raw_html("items-index.html", &index_html)?;

    // Only walk the category pages the index actually links; fall back to
    // all of them if the index page layout changed under us.
    let mut categories: Vec<(&str, &str)> = CATEGORY_PATHS
        .iter()
        .copied()
        .filter(|(path, _)| index_html.contains(path))
        .collect();
    if categories.is_empty() {
        logf!("runner: no category links found on index, scraping all categories");
        categories = CATEGORY_PATHS.to_vec();
    }

    let mut all = Vec::new();
    for (path, item_type) in categories {
        let html = client.fetch(path)?;
        let slug = path.trim_start_matches("/wiki/");
        store::save_raw_html(&format!("items-{slug}.html"), &html)?;

        let parsed = parse_items(&html, client.base_url(), Some(item_type));
        logf!("runner: {} {} records", parsed.len(), item_type);
        all.extend(parsed);
    }

    // Single merge pass across all category pages so cross-page duplicate
    // ids are caught.
    let items = dedupe_and_sort(all);
    store::save_json("items.json", &items)?;
    Ok(items)
}

pub fn download_assets(client: &WikiClient) -> Result<Vec<AssetRecord>, Box<dyn Error>> {
    let classes: Vec<ClassRecord> = store::load_json("classes.json")?;
    let items: Vec<ItemRecord> = store::load_json("items.json")?;
    let records = icon_records(&classes, &items);

    logf!("runner: downloading {} assets", records.len());
    let assets = assets::download_assets(client, &records, &PathBuf::from(ASSETS_DIR))?;
    store::save_json("assets.json", &assets)?;
    Ok(assets)
}

pub fn validate_assets() -> Result<assets::ValidationReport, Box<dyn Error>> {
    let classes: Vec<ClassRecord> = store::load_json("classes.json")?;
    let items: Vec<ItemRecord> = store::load_json("items.json")?;
    let assets_list: Vec<AssetRecord> = store::load_json("assets.json")?;
    let records = icon_records(&classes, &items);

    let report_path = store::normalized_path("asset-validation.json");
    assets::validate_assets(&records, &assets_list, &report_path)
}

pub fn build_dataset() -> Result<RequirementsDataset, Box<dyn Error>> {
    let classes: Vec<ClassRecord> = store::load_json("classes.json")?;
    let items: Vec<ItemRecord> = store::load_json("items.json")?;
    let assets_list: Vec<AssetRecord> = store::load_json("assets.json")?;
    let requirements = crate::config::load_requirements(Path::new(CONFIG_PATH))?;

    let dataset = RequirementsDataset::new(
        vec![
            s!("https://www.realmeye.com/wiki/classes"),
            s!("https://www.realmeye.com/wiki/items"),
        ],
        classes,
        items,
        assets_list,
        requirements,
    );
    store::save_json("requirements-dataset.json", &dataset)?;
    Ok(dataset)
}

fn icon_records<'a>(
    classes: &'a [ClassRecord],
    items: &'a [ItemRecord],
) -> Vec<&'a dyn HasIcon> {
    classes
        .iter()
        .map(|c| c as &dyn HasIcon)
        .chain(items.iter().map(|i| i as &dyn HasIcon))
        .collect()
}
