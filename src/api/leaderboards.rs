// Tracker leaderboard page scraper

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::models::player::LeaderboardEntry;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("table tbody tr").expect("valid selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));

/// Extract (rank, player, value) rows from the leaderboard table.
/// Rows with fewer than three cells are skipped.
pub fn parse_leaderboard(html: &str) -> Vec<LeaderboardEntry> {
    let document = Html::parse_document(html);

    document
        .select(&ROW)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .select(&CELL)
                .map(|td| {
                    td.text()
                        .collect::<Vec<_>>()
                        .join(" ")
                        .split_whitespace()
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();

            if cells.len() < 3 {
                return None;
            }

            Some(LeaderboardEntry {
                rank: cells[0].clone(),
                player: cells[1].clone(),
                value: cells[cells.len() - 1].clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leaderboard() {
        let html = r#"
            <html><body>
            <table class="trn-table">
              <thead><tr><th>Rank</th><th>Player</th><th>Games</th><th>Wins</th></tr></thead>
              <tbody>
                <tr><td>1</td><td><a href="/profile/pc/Ninja">Ninja</a></td><td>9,000</td><td>4,200</td></tr>
                <tr><td>2</td><td>
                    <a href="/profile/pc/Tfue">Tfue</a>
                </td><td>7,000</td><td>3,900</td></tr>
                <tr><td colspan="4">Advertisement</td></tr>
              </tbody>
            </table>
            </body></html>
        "#;

        let rows = parse_leaderboard(html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rank, "1");
        assert_eq!(rows[0].player, "Ninja");
        assert_eq!(rows[0].value, "4,200");
        assert_eq!(rows[1].player, "Tfue");
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(parse_leaderboard("<html></html>").is_empty());
    }
}
