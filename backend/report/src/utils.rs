use catalog::{CatalogTree, FavouriteReport, models::MenuItem};

pub fn price_label(price: f64) -> String {
    format!("RM{price:.2}")
}

pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 favourite".to_string()
    } else {
        format!("{count} favourites")
    }
}

fn item_label(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{count} items")
    }
}

pub fn render_favourites(report: &FavouriteReport) -> String {
    if report.summaries.is_empty() {
        return "No favourite items found.\n".to_string();
    }

    let stats = &report.stats;
    let mut out = format!(
        "Summary Statistics\n  \
         Total Items Favourited: {}\n  \
         Total Favourites:       {}\n  \
         Most Popular Item:      {}\n\n",
        stats.total_items, stats.total_favourites, stats.most_popular
    );

    let rows: Vec<[String; 4]> = report
        .summaries
        .iter()
        .map(|summary| {
            [
                summary.item_name.clone(),
                price_label(summary.price),
                count_label(summary.favourite_count),
                summary.favouriting_users.join(", "),
            ]
        })
        .collect();

    let header = ["Item", "Price (RM)", "Favourite Count", "Favourite Users"];
    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    out.push_str("Favourite Items Overview\n");
    out.push_str(&table_row(&header.map(str::to_string), &widths));
    for row in &rows {
        out.push_str(&table_row(row, &widths));
    }

    out
}

fn table_row(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");

    format!("  {}\n", line.trim_end())
}

pub fn render_catalog(tree: &CatalogTree) -> String {
    if tree.sections.is_empty() && tree.uncategorised.is_empty() {
        return "Catalog is empty.\n".to_string();
    }

    let mut out = String::new();

    for section in &tree.sections {
        out.push_str(&section_text(&section.category.name, &section.items));
    }

    if !tree.uncategorised.is_empty() {
        out.push_str(&section_text("Uncategorised", &tree.uncategorised));
    }

    out
}

fn section_text(title: &str, items: &[MenuItem]) -> String {
    let mut out = format!("{title} ({})\n", item_label(items.len()));

    for item in items {
        out.push_str(&format!("  - {} {}\n", item.name, price_label(item.price)));
    }

    out
}
