use dhobi_core::catalog::Catalog;

pub fn run() -> String {
    let catalog = Catalog::standard();

    let mut lines = vec!["active catalog (first substring match wins):".to_string()];
    for entry in catalog.entries() {
        lines.push(format!("- {} = ₹{}", entry.name, entry.unit_price));
    }

    lines.join("\n")
}
