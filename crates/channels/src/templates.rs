//! Placeholder substitution for notification bodies.
//!
//! Templates reference customer fields as `{{Field}}`; whitespace inside
//! the braces is ignored.

use lottery_core::customer::Customer;
use std::collections::HashMap;

/// Replace every `{{Field}}` with its value from `fields`. Placeholders with
/// no matching field are left as written.
pub fn map_template(template: &str, fields: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match fields.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// `"jOHN  de-silva"` -> `"John Desilva"`: letters and spaces only, each
/// word capitalized.
pub fn proper_case(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn salutation(gender: Option<&str>) -> &'static str {
    match gender {
        Some("Male") => "Mr.",
        Some("Female") => "Ms.",
        _ => "",
    }
}

/// Fields available to templates for one customer.
pub fn customer_fields(customer: &Customer) -> HashMap<String, String> {
    let tier = |t: &Option<lottery_core::TierLabel>| {
        t.as_ref().map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
    };
    let name = proper_case(&customer.full_name());

    let mut fields = HashMap::new();
    fields.insert(
        "Name".to_string(),
        if name.is_empty() { "Valued Customer".to_string() } else { name },
    );
    fields.insert("FirstName".to_string(), customer.first_name.clone());
    fields.insert("LastName".to_string(), customer.last_name.clone());
    fields.insert("MobileNumber".to_string(), customer.mobile_number.clone());
    fields.insert("Email".to_string(), customer.email.clone().unwrap_or_default());
    fields.insert(
        "Salutation".to_string(),
        salutation(customer.gender.as_deref()).to_string(),
    );
    fields.insert(
        "Loyalty_Number".to_string(),
        customer
            .loyalty_number
            .clone()
            .unwrap_or_else(|| customer.mobile_number.clone()),
    );
    fields.insert("Current_Loyalty_Tier".to_string(), tier(&customer.current_tier));
    fields.insert("Last_Month_Loyalty_Tier".to_string(), tier(&customer.last_month_tier));
    fields.insert(
        "Current_Ticket_Count".to_string(),
        customer.current_ticket_count.to_string(),
    );
    fields.insert(
        "Last_Month_Ticket_Count".to_string(),
        customer.last_month_ticket_count.to_string(),
    );
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_map_template_replaces_known() {
        let out = map_template(
            "Dear {{Name}}, you are now {{ Current_Loyalty_Tier }}.",
            &fields(&[("Name", "Nimal"), ("Current_Loyalty_Tier", "Gold")]),
        );
        assert_eq!(out, "Dear Nimal, you are now Gold.");
    }

    #[test]
    fn test_map_template_keeps_unknown_and_unclosed() {
        let out = map_template("Hi {{Nickname}} {{Name", &fields(&[("Name", "x")]));
        assert_eq!(out, "Hi {{Nickname}} {{Name");
    }

    #[test]
    fn test_map_template_repeated_and_adjacent() {
        let out = map_template("{{A}}{{A}}-{{B}}", &fields(&[("A", "1"), ("B", "2")]));
        assert_eq!(out, "11-2");
    }

    #[test]
    fn test_proper_case() {
        assert_eq!(proper_case("  kAMAL  perera, "), "Kamal Perera");
        assert_eq!(proper_case(""), "");
    }

    #[test]
    fn test_salutation() {
        assert_eq!(salutation(Some("Male")), "Mr.");
        assert_eq!(salutation(Some("Female")), "Ms.");
        assert_eq!(salutation(None), "");
    }
}
