use std::collections::BTreeSet;

use boxoffice_cart::domain::{
    carts::models::{CartItem, CartSummary},
    products::ProductTypeTag,
};

fn minor_units(amount: u64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

pub(super) fn items(items: &[CartItem]) {
    for item in items {
        let paid = if item.is_paid { "paid" } else { "unpaid" };

        println!("{}\t{}\t{paid}\t{}", item.uuid, item.product, item.owner);
    }
}

pub(super) fn count(label: &str, count: usize) {
    println!("{label}: {count}");
}

pub(super) fn amount(label: &str, amount: u64) {
    println!("{label}: {}", minor_units(amount));
}

pub(super) fn types(types: &BTreeSet<ProductTypeTag>, only_packages: bool) {
    for tag in types {
        println!("{tag}");
    }

    println!("only_packages: {only_packages}");
}

pub(super) fn summary(summary: &CartSummary) {
    for line in &summary.lines {
        println!("{}\t{}\t{}", line.item, line.title, minor_units(line.cost));
    }

    amount("sub_total", summary.sub_total);
    amount("fees", summary.fees);
    amount("total", summary.total);

    if let Some(expires_at) = summary.expires_at {
        println!("expires_at: {expires_at}");
    }
}
