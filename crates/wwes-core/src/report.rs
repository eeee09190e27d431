//! Plain-text corporation report.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::assets::AssetTree;
use crate::corp::CorpSnapshot;
use crate::models::{division_for_flag, Division, Item, Location, DELIVERY_FLAG};
use crate::resolver::{Namespace, Resolver};
use crate::utils::amount_line;

const INDENT: usize = 2;

/// Render wallets, totals and the asset tree.
pub fn render(snapshot: &CorpSnapshot, resolver: &Resolver) -> String {
    let mut lines = vec![format!("Corporation \"{}\"", snapshot.name)];

    for division in snapshot.divisions.values() {
        if division.wallet_name.is_some() || !division.balance.is_zero() {
            lines.push(amount_line(&division.wallet_label(), division.balance));
        }
    }
    lines.push(amount_line("Total", snapshot.balance));
    lines.push(amount_line("Shares", Decimal::from(snapshot.shares)));
    if let Some(per_share) = snapshot.per_share() {
        lines.push(amount_line("Per share", per_share));
    }
    lines.push(String::new());

    let report = AssetReport {
        tree: &snapshot.assets,
        resolver,
        divisions: &snapshot.divisions,
    };

    let mut offices: Vec<&Location> = snapshot.assets.offices().collect();
    offices.sort_by_key(|l| l.name().unwrap_or_default().to_string());
    for office in offices {
        report.location(office, &mut lines);
    }
    for ground in snapshot.assets.ground_locations() {
        report.location(ground, &mut lines);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

struct AssetReport<'a> {
    tree: &'a AssetTree,
    resolver: &'a Resolver,
    divisions: &'a BTreeMap<i32, Division>,
}

impl AssetReport<'_> {
    /// A location heading, then its compartments. Offices are listed on
    /// their own, so they are left out of the station they sit in.
    fn location(&self, location: &Location, lines: &mut Vec<String>) {
        let compartments: Vec<(i32, Vec<&Item>)> = location
            .sublocations()
            .iter()
            .map(|(&flag, ids)| {
                let items = ids
                    .iter()
                    .filter_map(|id| self.tree.item(*id))
                    .filter(|item| !item.is_office())
                    .collect::<Vec<_>>();
                (flag, items)
            })
            .filter(|(_, items)| !items.is_empty())
            .collect();
        if compartments.is_empty() {
            return;
        }

        let heading = location
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Location {}", location.id));
        lines.push(heading);
        for (flag, items) in compartments {
            lines.push(format!("{:indent$}{}", "", self.compartment(flag), indent = INDENT));
            for item in items {
                self.item(item, INDENT * 2, lines);
            }
        }
    }

    fn item(&self, item: &Item, indent: usize, lines: &mut Vec<String>) {
        lines.push(format!(
            "{:indent$}{} {}",
            "",
            self.type_name(item.type_id),
            item.quantity,
            indent = indent
        ));
        if let Some(contents) = self.tree.contents(item) {
            for id in contents.sublocations().values().flatten() {
                if let Some(inner) = self.tree.item(*id) {
                    self.item(inner, indent + INDENT, lines);
                }
            }
        }
    }

    fn type_name(&self, type_id: i64) -> String {
        self.resolver
            .name(Namespace::Type, type_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Type {}", type_id))
    }

    fn compartment(&self, flag: i32) -> String {
        if flag == DELIVERY_FLAG {
            return "Deliveries".to_string();
        }
        match division_for_flag(flag) {
            Some(key) => self
                .divisions
                .get(&key)
                .map(Division::hangar_label)
                .unwrap_or_else(|| Division::new(key).hangar_label()),
            None => format!("Flag {}", flag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quantity, OFFICE_TYPE_ID};
    use crate::testing::FakeNames;
    use chrono::Utc;

    async fn snapshot() -> (CorpSnapshot, Resolver) {
        let mut snapshot = CorpSnapshot::new("Widget Works", Utc::now());
        let mut master = Division::new(1000);
        master.wallet_name = Some("Master Wallet".to_string());
        master.hangar_name = Some("Corp Hangar".to_string());
        master.balance = Decimal::new(1_234_567_89, 2);
        snapshot.divisions.insert(1000, master);
        snapshot.balance = Decimal::new(1_234_567_89, 2);
        snapshot.shares = 1000;

        snapshot.assets = AssetTree::build(vec![
            Item::new(2, OFFICE_TYPE_ID, Quantity::Default, 60_003_760, 70),
            Item::new(3, 654, Quantity::Raw(-1), 2, 4),
            Item::new(4, 17_366, Quantity::Default, 2, 4),
            Item::new(5, 34, Quantity::Normal(5000), 4, 5),
            Item::new(6, 35, Quantity::Normal(12), 60_003_760, DELIVERY_FLAG),
        ]);
        let mut resolver = Resolver::new();
        snapshot
            .assets
            .resolve_names(&mut resolver, &FakeNames::default())
            .await
            .unwrap();
        (snapshot, resolver)
    }

    #[tokio::test]
    async fn test_wallet_section() {
        let (snapshot, resolver) = snapshot().await;
        let text = render(&snapshot, &resolver);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Corporation \"Widget Works\"");
        assert_eq!(lines[1], amount_line("Master Wallet", Decimal::new(1_234_567_89, 2)));
        assert!(lines[2].starts_with("Total") && lines[2].ends_with("1,234,567.89"));
        assert!(lines[3].starts_with("Shares") && lines[3].ends_with("1,000.00"));
        assert!(lines[4].starts_with("Per share") && lines[4].ends_with("1,234.57"));
    }

    #[tokio::test]
    async fn test_asset_section_nesting() {
        let (snapshot, resolver) = snapshot().await;
        let text = render(&snapshot, &resolver);

        let expected = [
            "Office station 60003760 slot 1",
            "  Corp Hangar",
            "    type 654 Original",
            "    type 17366 x1",
            "      type 34 x5000",
            "station 60003760",
            "  Deliveries",
            "    type 35 x12",
        ]
        .join("\n");
        assert!(text.contains(&expected), "unexpected report:\n{}", text);
    }

    #[tokio::test]
    async fn test_no_per_share_without_shares() {
        let (mut snapshot, resolver) = snapshot().await;
        snapshot.shares = 0;
        assert!(!render(&snapshot, &resolver).contains("Per share"));
    }
}
