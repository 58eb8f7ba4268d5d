use std::fmt::Write as _;

use crate::pipeline::aggregate;
use crate::state::data::ShoppingItem;

/// Sentence shared instead of a list when there is nothing on it
pub const EMPTY_LIST_TEXT: &str = "My Shopping List is empty";

/// Plain-text summary for the share sheet.
///
/// `items` is the whole list in store order (pending first, newest first).
/// Sections without items are left out.
pub fn shareable_list(items: &[ShoppingItem]) -> String {
    if items.is_empty() {
        return EMPTY_LIST_TEXT.to_string();
    }

    let (bought, pending): (Vec<&ShoppingItem>, Vec<&ShoppingItem>) =
        items.iter().partition(|item| item.is_bought);

    let mut text = String::from("📋 My Shopping List\n\n");
    write_section(&mut text, "🛒 To Buy", &pending);
    write_section(&mut text, "✅ Bought", &bought);

    let stats = aggregate::statistics(items);

    // Writing into a String cannot fail
    let _ = writeln!(text, "💰 Spent: ${}", money(stats.total_cost));
    let _ = write!(text, "📊 Estimated Total: ${}", money(stats.estimated_cost));
    text
}

/// Two decimals, rounding half up on the shortest decimal form of `value`,
/// so 0.125 reads 0.13 and 1.005 reads 1.01.
fn money(value: f64) -> String {
    let shortest = value.abs().to_string();
    let (whole, fraction) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));
    let digits = fraction.as_bytes();
    let digit = |i: usize| digits.get(i).map_or(0, |d| u128::from(d - b'0'));

    let cents = whole
        .parse::<u128>()
        .ok()
        .and_then(|whole| whole.checked_mul(100))
        .map(|cents| cents + digit(0) * 10 + digit(1) + u128::from(digit(2) >= 5));
    let Some(cents) = cents else {
        // NaN, infinity or out of range
        return format!("{:.2}", value);
    };

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

fn write_section(text: &mut String, title: &str, items: &[&ShoppingItem]) {
    if items.is_empty() {
        return;
    }

    let _ = writeln!(text, "{} ({}):", title, items.len());
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(
            text,
            "{}. {} (x{}) - ${}",
            i + 1,
            item.name,
            item.quantity,
            money(item.price)
        );
    }
    text.push('\n');
}
